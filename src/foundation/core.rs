use std::{fmt, str::FromStr};

use crate::foundation::error::{PosterError, PosterResult};

pub use kurbo::{Point, Rect};

/// WGS84 coordinate in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    /// Latitude, positive north.
    pub lat: f64,
    /// Longitude, positive east.
    pub lon: f64,
}

impl GeoPoint {
    /// Create a validated point (finite, `lat` in `[-90, 90]`, `lon` in `[-180, 180]`).
    pub fn new(lat: f64, lon: f64) -> PosterResult<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(PosterError::validation("coordinates must be finite"));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(PosterError::validation(format!(
                "latitude {lat} is outside [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(PosterError::validation(format!(
                "longitude {lon} is outside [-180, 180]"
            )));
        }
        Ok(Self { lat, lon })
    }

    /// Round both coordinates to `decimals` fractional digits.
    pub fn rounded(self, decimals: u32) -> Self {
        let scale = 10f64.powi(decimals as i32);
        Self {
            lat: (self.lat * scale).round() / scale,
            lon: (self.lon * scale).round() / scale,
        }
    }
}

/// The `(city, country)` pair a location was resolved from.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlaceQuery {
    /// City as typed by the caller.
    pub city: String,
    /// Country as typed by the caller.
    pub country: String,
}

impl fmt::Display for PlaceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.country)
    }
}

/// How a [`Location`] obtained its point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    /// Caller supplied explicit coordinates.
    Override,
    /// Point came from the location resolver.
    Geocoded,
}

/// A resolved poster location.
///
/// Exactly one of `query` (geocoded) or an explicit override produced `point`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Location {
    /// Place query for geocoded locations, `None` for overrides.
    pub query: Option<PlaceQuery>,
    /// Resolved center point.
    pub point: GeoPoint,
    /// Origin of `point`.
    pub source: LocationSource,
}

impl Location {
    /// Location from explicit coordinates.
    pub fn overridden(point: GeoPoint) -> Self {
        Self {
            query: None,
            point,
            source: LocationSource::Override,
        }
    }

    /// Location produced by geocoding `city, country`.
    pub fn geocoded(city: impl Into<String>, country: impl Into<String>, point: GeoPoint) -> Self {
        Self {
            query: Some(PlaceQuery {
                city: city.into(),
                country: country.into(),
            }),
            point,
            source: LocationSource::Geocoded,
        }
    }
}

/// Road category driving theme styling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadClass {
    /// `motorway`, `motorway_link`.
    Motorway,
    /// `trunk`, `primary` and their links.
    Primary,
    /// `secondary`, `secondary_link`.
    Secondary,
    /// `tertiary`, `tertiary_link`.
    Tertiary,
    /// `residential`, `living_street`, `unclassified`.
    Residential,
    /// Every other `highway` value.
    Other,
}

impl RoadClass {
    /// Every class, in ascending draw priority.
    pub const ALL: [Self; 6] = [
        Self::Other,
        Self::Residential,
        Self::Tertiary,
        Self::Secondary,
        Self::Primary,
        Self::Motorway,
    ];

    /// Classify an OSM `highway` tag value.
    pub fn from_highway(tag: &str) -> Self {
        match tag.trim() {
            "motorway" | "motorway_link" => Self::Motorway,
            "trunk" | "trunk_link" | "primary" | "primary_link" => Self::Primary,
            "secondary" | "secondary_link" => Self::Secondary,
            "tertiary" | "tertiary_link" => Self::Tertiary,
            "residential" | "living_street" | "unclassified" => Self::Residential,
            _ => Self::Other,
        }
    }

    /// Lower-case name used in theme files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Motorway => "motorway",
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Tertiary => "tertiary",
            Self::Residential => "residential",
            Self::Other => "other",
        }
    }

    /// Parse a theme-file class name. `default` and `other` are synonyms.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "motorway" => Some(Self::Motorway),
            "primary" => Some(Self::Primary),
            "secondary" => Some(Self::Secondary),
            "tertiary" => Some(Self::Tertiary),
            "residential" => Some(Self::Residential),
            "other" | "default" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for RoadClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Artifact output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Raster PNG at the requested DPI.
    Png,
    /// Single-page vector PDF.
    Pdf,
    /// Vector SVG with text as outlines.
    Svg,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Pdf => "pdf",
            Self::Svg => "svg",
        }
    }

    /// MIME type for download boundaries.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
            Self::Svg => "image/svg+xml",
        }
    }

    /// `true` for pixel-based formats.
    pub fn is_raster(self) -> bool {
        matches!(self, Self::Png)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = PosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "pdf" => Ok(Self::Pdf),
            "svg" => Ok(Self::Svg),
            other => Err(PosterError::render(format!(
                "unsupported output format '{other}' (expected png, pdf or svg)"
            ))),
        }
    }
}

/// Raster canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Largest raster side we are willing to allocate.
    pub const MAX_DIM: u32 = 16_384;

    /// Pixel canvas for a physical print size: `round(width_in * dpi) x round(height_in * dpi)`.
    pub fn for_print(width_in: f64, height_in: f64, dpi: f64) -> PosterResult<Self> {
        validate_print_size(width_in, height_in, dpi)?;

        let w = (width_in * dpi).round();
        let h = (height_in * dpi).round();
        if w < 1.0 || h < 1.0 {
            return Err(PosterError::render(format!(
                "raster canvas {w}x{h} is empty at {dpi} dpi"
            )));
        }
        if w > f64::from(Self::MAX_DIM) || h > f64::from(Self::MAX_DIM) {
            return Err(PosterError::render(format!(
                "raster canvas too large: {w}x{h} (max {0}x{0})",
                Self::MAX_DIM
            )));
        }

        Ok(Self {
            width: w as u32,
            height: h as u32,
        })
    }
}

/// Validate a physical poster size and resolution.
pub fn validate_print_size(width_in: f64, height_in: f64, dpi: f64) -> PosterResult<()> {
    for (name, v) in [("width", width_in), ("height", height_in), ("dpi", dpi)] {
        if !v.is_finite() || v <= 0.0 {
            return Err(PosterError::validation(format!(
                "{name} must be finite and > 0 (got {v})"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
