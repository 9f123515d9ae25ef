//! Label text and sizing for the poster's title block.

use crate::foundation::core::GeoPoint;

/// City title size in points on a 12-inch-wide poster.
pub const CITY_PT: f64 = 60.0;
/// Smallest city title size after shrinking long names.
pub const CITY_MIN_PT: f64 = 10.0;
/// Names longer than this many characters are shrunk proportionally.
pub const CITY_SHRINK_AFTER: usize = 10;
/// Country line size.
pub const COUNTRY_PT: f64 = 22.0;
/// Coordinate line size.
pub const COORDS_PT: f64 = 14.0;
/// Attribution size.
pub const ATTRIBUTION_PT: f64 = 8.0;
/// Attribution text.
pub const ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// `true` when every letter is Latin (Basic Latin through Latin Extended Additional).
pub fn is_latin_script(text: &str) -> bool {
    text.chars().filter(|c| c.is_alphabetic()).all(|c| {
        let cp = u32::from(c);
        cp < 0x0250 || (0x1E00..=0x1EFF).contains(&cp)
    })
}

/// Upper-cased city title, letter-spaced with two spaces for Latin script.
pub fn city_title(city: &str) -> String {
    let upper = city.trim().to_uppercase();
    if !is_latin_script(&upper) {
        return upper;
    }
    let chars = upper.chars().map(String::from).collect::<Vec<_>>();
    chars.join("  ")
}

/// City title size in points before poster scaling.
pub fn city_font_pt(city: &str) -> f64 {
    let len = city.trim().chars().count();
    if len > CITY_SHRINK_AFTER {
        (CITY_PT * CITY_SHRINK_AFTER as f64 / len as f64).max(CITY_MIN_PT)
    } else {
        CITY_PT
    }
}

/// `40.7128° N / 74.0060° W`
pub fn coordinate_line(p: GeoPoint) -> String {
    let ns = if p.lat >= 0.0 { 'N' } else { 'S' };
    let ew = if p.lon >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}° {ns} / {:.4}° {ew}", p.lat.abs(), p.lon.abs())
}

/// Escape text for XML character data and attribute values.
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/typography.rs"]
mod tests;
