//! Builds the poster as an SVG document in scene units (CSS px, 96 per inch).

use std::fmt::Write as _;

use super::{
    RenderRequest,
    projection::Frame,
    typography::{self, xml_escape},
};
use crate::{
    foundation::{
        color::Color,
        core::{GeoPoint, Point, Rect},
    },
    network::Area,
};

/// Scene units per inch.
pub const UNITS_PER_INCH: f64 = 96.0;
/// Scene units per typographic point.
pub const UNITS_PER_PT: f64 = UNITS_PER_INCH / 72.0;
/// Poster width that theme widths and font sizes are specified for.
pub const REFERENCE_WIDTH_IN: f64 = 12.0;
/// Number of stepped bands per gradient fade.
pub const FADE_BANDS: usize = 64;
/// Fraction of the height each fade covers.
pub const FADE_FRACTION: f64 = 0.25;

const CITY_Y: f64 = 0.86;
const DIVIDER_Y: f64 = 0.875;
const DIVIDER_X: (f64, f64) = (0.4, 0.6);
const COUNTRY_Y: f64 = 0.90;
const COORDS_Y: f64 = 0.93;
const ATTRIBUTION_XY: (f64, f64) = (0.98, 0.98);
const COORDS_OPACITY: f64 = 0.7;
const ATTRIBUTION_OPACITY: f64 = 0.5;

/// Fixed-precision coordinate, keeps output byte-stable and compact.
fn num(v: f64) -> String {
    let s = format!("{v:.2}");
    if s == "-0.00" { "0.00".to_string() } else { s }
}

fn opacity(v: f64) -> String {
    format!("{v:.4}")
}

/// Paint attributes for a theme color, carrying its alpha as an explicit opacity.
fn paint(attr: &str, c: Color) -> String {
    if c.a == 255 {
        format!(r#"{attr}="{}""#, c.to_svg_rgb())
    } else {
        format!(
            r#"{attr}="{}" {attr}-opacity="{}""#,
            c.to_svg_rgb(),
            opacity(c.opacity())
        )
    }
}

fn overlaps(bounds: Rect, canvas: Rect) -> bool {
    bounds.x1 >= canvas.x0 && bounds.x0 <= canvas.x1 && bounds.y1 >= canvas.y0 && bounds.y0 <= canvas.y1
}

/// Projected path data and its bounds, `None` when fewer than two points project.
fn polyline_data(frame: &Frame, points: &[GeoPoint], close: bool) -> Option<(String, Rect)> {
    let mut projected = points.iter().map(|p| frame.project(*p));
    let first: Point = projected.next()?;
    let mut bounds = Rect::from_points(first, first);
    let mut d = format!("M{} {}", num(first.x), num(first.y));
    let mut count = 1;
    for p in projected {
        bounds = bounds.union_pt(p);
        let _ = write!(d, "L{} {}", num(p.x), num(p.y));
        count += 1;
    }
    if count < 2 {
        return None;
    }
    if close {
        d.push('Z');
    }
    Some((d, bounds))
}

fn area_data(frame: &Frame, area: &Area) -> Option<String> {
    let canvas = frame.bounds();
    let mut d = String::new();
    let mut visible = false;
    for ring in &area.rings {
        let Some((ring_d, bounds)) = polyline_data(frame, ring, true) else {
            continue;
        };
        visible |= overlaps(bounds, canvas);
        d.push_str(&ring_d);
    }
    (visible && !d.is_empty()).then_some(d)
}

/// Render the request's scene as an SVG string. Deterministic for equal requests.
pub fn build_scene(req: &RenderRequest, font_family: &str) -> String {
    let w = req.width_in * UNITS_PER_INCH;
    let h = req.height_in * UNITS_PER_INCH;
    let scale = req.width_in / REFERENCE_WIDTH_IN;
    let theme = &req.theme;
    let frame = Frame::new(req.location.point, req.network.radius_m, w, h);
    let canvas = frame.bounds();

    let mut svg = String::with_capacity(64 * 1024);
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}in" height="{}in" viewBox="0 0 {} {}">"#,
        req.width_in,
        req.height_in,
        num(w),
        num(h)
    );
    let _ = writeln!(
        svg,
        r#"<rect x="0" y="0" width="{}" height="{}" {}/>"#,
        num(w),
        num(h),
        paint("fill", theme.background_color)
    );

    for (id, areas, color) in [
        ("water", &req.network.water, theme.water_color),
        ("parks", &req.network.parks, theme.green_color),
    ] {
        let _ = writeln!(svg, r#"<g id="{id}" {} fill-rule="evenodd">"#, paint("fill", color));
        for area in areas {
            if let Some(d) = area_data(&frame, area) {
                let _ = writeln!(svg, r#"<path d="{d}"/>"#);
            }
        }
        svg.push_str("</g>\n");
    }

    let mut edges = req
        .network
        .edges
        .iter()
        .map(|e| (theme.road_style(e.road_class), e))
        .collect::<Vec<_>>();
    // Stable: equal z-order keeps provider order.
    edges.sort_by_key(|(style, _)| style.z_order);

    svg.push_str(r#"<g id="roads" fill="none" stroke-linecap="round" stroke-linejoin="round">"#);
    svg.push('\n');
    for (style, edge) in edges {
        let stroke_w = style.width * scale * UNITS_PER_PT;
        let Some((d, bounds)) = polyline_data(&frame, &edge.geometry, false) else {
            continue;
        };
        if !overlaps(bounds.inflate(stroke_w, stroke_w), canvas) {
            continue;
        }
        let _ = writeln!(
            svg,
            r#"<path d="{d}" {} stroke-width="{}"/>"#,
            paint("stroke", style.color),
            num(stroke_w)
        );
    }
    svg.push_str("</g>\n");

    write_fades(&mut svg, theme.gradient_color, w, h);
    write_labels(&mut svg, req, font_family, w, h, scale);

    svg.push_str("</svg>\n");
    svg
}

/// Top and bottom fades as nested rectangles anchored at the edge.
///
/// Rectangle `j` covers `j + 1` bands at opacity `1 / (j + 1)`; stacked, band `m` ends up at
/// opacity `1 - m / FADE_BANDS`, with no seams between bands.
fn write_fades(svg: &mut String, color: Color, w: f64, h: f64) {
    let fade_h = h * FADE_FRACTION;
    let band_h = fade_h / FADE_BANDS as f64;
    let base = color.opacity();

    let _ = writeln!(svg, r#"<g id="fades" fill="{}">"#, color.to_svg_rgb());
    for j in 0..FADE_BANDS {
        let extent = band_h * (j + 1) as f64;
        let alpha = opacity(base / (j + 1) as f64);
        let _ = writeln!(
            svg,
            r#"<rect x="0" y="0" width="{}" height="{}" fill-opacity="{alpha}"/>"#,
            num(w),
            num(extent)
        );
        let _ = writeln!(
            svg,
            r#"<rect x="0" y="{}" width="{}" height="{}" fill-opacity="{alpha}"/>"#,
            num(h - extent),
            num(w),
            num(extent)
        );
    }
    svg.push_str("</g>\n");
}

fn write_labels(svg: &mut String, req: &RenderRequest, family: &str, w: f64, h: f64, scale: f64) {
    let color = req.theme.label_color;
    let city = req
        .display_city
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(req.city.trim());
    let country = req
        .display_country
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(req.country.trim());
    let family = format!("'{}', sans-serif", xml_escape(&family.replace('\'', "")));
    let pt = |size: f64| num(size * scale * UNITS_PER_PT);

    let _ = writeln!(
        svg,
        r#"<g id="labels" font-family="{family}" {} text-anchor="middle">"#,
        paint("fill", color)
    );

    if !city.is_empty() {
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="{}" font-weight="700" xml:space="preserve">{}</text>"#,
            num(w * 0.5),
            num(h * CITY_Y),
            pt(typography::city_font_pt(city)),
            xml_escape(&typography::city_title(city))
        );
    }

    let _ = writeln!(
        svg,
        r#"<line x1="{}" y1="{y}" x2="{}" y2="{y}" {} stroke-width="{}"/>"#,
        num(w * DIVIDER_X.0),
        num(w * DIVIDER_X.1),
        paint("stroke", color),
        pt(1.0),
        y = num(h * DIVIDER_Y)
    );

    if !country.is_empty() {
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="{}" font-weight="300">{}</text>"#,
            num(w * 0.5),
            num(h * COUNTRY_Y),
            pt(typography::COUNTRY_PT),
            xml_escape(&country.to_uppercase())
        );
    }

    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" font-size="{}" font-weight="400" opacity="{}">{}</text>"#,
        num(w * 0.5),
        num(h * COORDS_Y),
        pt(typography::COORDS_PT),
        opacity(COORDS_OPACITY),
        xml_escape(&typography::coordinate_line(req.location.point))
    );

    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" font-size="{}" font-weight="400" text-anchor="end" opacity="{}">{}</text>"#,
        num(w * ATTRIBUTION_XY.0),
        num(h * ATTRIBUTION_XY.1),
        pt(typography::ATTRIBUTION_PT),
        opacity(ATTRIBUTION_OPACITY),
        xml_escape(typography::ATTRIBUTION)
    );

    svg.push_str("</g>\n");
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;
