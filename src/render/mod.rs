//! Poster compositor: scene construction and export to PNG, SVG and PDF.

mod pdf;
mod projection;
mod raster;
mod scene;
mod typography;

use std::path::Path;

pub use projection::{Frame, meters_per_degree_lat, meters_per_degree_lon};
pub use scene::{FADE_BANDS, REFERENCE_WIDTH_IN, UNITS_PER_INCH};
pub use typography::{city_font_pt, city_title, coordinate_line, is_latin_script};

use crate::{
    cache::write_atomic,
    fonts::FontSet,
    foundation::{
        core::{Canvas, Location, OutputFormat, validate_print_size},
        error::{PosterError, PosterResult},
    },
    network::StreetNetwork,
    theme::Theme,
};

/// Everything one render needs. Built fresh per call.
#[derive(Clone, Debug)]
pub struct RenderRequest {
    /// Map center and how it was obtained.
    pub location: Location,
    /// Resolved theme.
    pub theme: Theme,
    /// Features around the center.
    pub network: StreetNetwork,
    /// Fonts for the labels.
    pub font_set: FontSet,
    /// Poster width in inches.
    pub width_in: f64,
    /// Poster height in inches.
    pub height_in: f64,
    /// Raster resolution; ignored by vector formats.
    pub dpi: f64,
    /// City as requested.
    pub city: String,
    /// Country as requested.
    pub country: String,
    /// Overrides the city label.
    pub display_city: Option<String>,
    /// Overrides the country label.
    pub display_country: Option<String>,
    /// Export format.
    pub output_format: OutputFormat,
}

/// A finished poster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedArtifact {
    /// Encoded file contents.
    pub bytes: Vec<u8>,
    /// Encoding of `bytes`.
    pub format: OutputFormat,
    /// Pixel size for raster formats.
    pub pixel_dimensions: Option<Canvas>,
}

impl RenderedArtifact {
    /// Write to `path` through a temp file and rename; a failed write leaves nothing behind.
    pub fn write_to(&self, path: &Path) -> PosterResult<()> {
        write_atomic(path, &self.bytes).map_err(|e| {
            PosterError::render(format!("write '{}': {e}", path.display()))
        })
    }
}

/// Compose and export a poster.
#[tracing::instrument(
    skip(req),
    fields(format = %req.output_format, theme = %req.theme.name, edges = req.network.edges.len())
)]
pub fn render(req: &RenderRequest) -> PosterResult<RenderedArtifact> {
    validate_print_size(req.width_in, req.height_in, req.dpi)?;
    let canvas = match req.output_format {
        OutputFormat::Png => Some(Canvas::for_print(req.width_in, req.height_in, req.dpi)?),
        OutputFormat::Svg | OutputFormat::Pdf => None,
    };

    let fonts = raster::font_context(&req.font_set);
    let svg = scene::build_scene(req, &fonts.family);
    let tree = raster::parse_scene(&svg, &fonts)?;

    let bytes = match (req.output_format, canvas) {
        (OutputFormat::Png, Some(canvas)) => raster::encode_png(&tree, canvas)?,
        (OutputFormat::Svg, _) => raster::encode_svg(&tree, req.width_in, req.height_in),
        (OutputFormat::Pdf, _) => pdf::encode_pdf(&tree, req.width_in, req.height_in)?,
        (OutputFormat::Png, None) => {
            return Err(PosterError::render("raster export without a canvas"));
        }
    };
    tracing::debug!(bytes = bytes.len(), "exported");

    Ok(RenderedArtifact {
        bytes,
        format: req.output_format,
        pixel_dimensions: canvas,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/mod.rs"]
mod tests;
