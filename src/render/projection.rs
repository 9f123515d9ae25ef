//! Local equirectangular projection from geographic points to scene units.

use crate::foundation::core::{GeoPoint, Point, Rect};

/// Meters per degree of latitude at `lat_deg`.
pub fn meters_per_degree_lat(lat_deg: f64) -> f64 {
    let lat = lat_deg.to_radians();
    111_132.92 - 559.82 * (2.0 * lat).cos() + 1.175 * (4.0 * lat).cos()
}

/// Meters per degree of longitude at `lat_deg`.
pub fn meters_per_degree_lon(lat_deg: f64) -> f64 {
    let lat = lat_deg.to_radians();
    111_412.84 * lat.cos() - 93.5 * (3.0 * lat).cos()
}

/// Maps the area around `center` onto a `width x height` canvas.
///
/// The map is centered and fills the canvas: the longer side spans `2 * radius_m`, the
/// shorter side shows proportionally less ground.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    center: GeoPoint,
    width: f64,
    height: f64,
    units_per_m: f64,
    m_per_deg_lat: f64,
    m_per_deg_lon: f64,
}

impl Frame {
    /// Frame for a canvas in scene units.
    pub fn new(center: GeoPoint, radius_m: u32, width: f64, height: f64) -> Self {
        let span_m = 2.0 * f64::from(radius_m.max(1));
        Self {
            center,
            width,
            height,
            units_per_m: width.max(height) / span_m,
            m_per_deg_lat: meters_per_degree_lat(center.lat),
            // Near the poles the longitude scale collapses; keep it positive.
            m_per_deg_lon: meters_per_degree_lon(center.lat).max(1e-6),
        }
    }

    /// Canvas point for a geographic point (y grows downward).
    pub fn project(&self, p: GeoPoint) -> Point {
        let east = (p.lon - self.center.lon) * self.m_per_deg_lon;
        let north = (p.lat - self.center.lat) * self.m_per_deg_lat;
        Point::new(
            self.width / 2.0 + east * self.units_per_m,
            self.height / 2.0 - north * self.units_per_m,
        )
    }

    /// Scene units per ground meter.
    pub fn units_per_meter(&self) -> f64 {
        self.units_per_m
    }

    /// Canvas bounds.
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/projection.rs"]
mod tests;
