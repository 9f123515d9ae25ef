//! Single-page vector PDF from a parsed scene tree.
//!
//! Paths are emitted with their absolute transforms; text arrives already flattened to glyph
//! outlines. Opacity becomes one ExtGState per distinct `(fill, stroke)` alpha pair.

use std::collections::BTreeMap;

use pdf_writer::{
    Content, Finish, Name, Pdf, Rect, Ref, TextStr,
    types::{LineCapStyle, LineJoinStyle},
};
use usvg::tiny_skia_path::PathSegment;

use super::scene::UNITS_PER_INCH;
use crate::foundation::error::PosterResult;

const PT_PER_INCH: f64 = 72.0;

/// Alpha quantized to 1/1000 so equal opacities share one graphics state.
type AlphaKey = (u16, u16);

struct Writer {
    content: Content,
    states: BTreeMap<AlphaKey, usize>,
    skipped: usize,
}

fn quantize(alpha: f32) -> u16 {
    (alpha.clamp(0.0, 1.0) * 1000.0).round() as u16
}

impl Writer {
    fn new() -> Self {
        Self {
            content: Content::new(),
            states: BTreeMap::new(),
            skipped: 0,
        }
    }

    fn alpha_state(&mut self, fill: f32, stroke: f32) -> Option<String> {
        let key = (quantize(fill), quantize(stroke));
        if key == (1000, 1000) {
            return None;
        }
        let next = self.states.len();
        let idx = *self.states.entry(key).or_insert(next);
        Some(format!("GS{idx}"))
    }

    fn group(&mut self, group: &usvg::Group, opacity: f32) {
        let opacity = opacity * group.opacity().get();
        for node in group.children() {
            match node {
                usvg::Node::Group(g) => self.group(g, opacity),
                usvg::Node::Path(p) => self.path(p, opacity),
                usvg::Node::Text(t) => self.group(t.flattened(), opacity),
                usvg::Node::Image(_) => {
                    self.skipped += 1;
                }
            }
        }
    }

    fn path(&mut self, path: &usvg::Path, opacity: f32) {
        if !path.is_visible() {
            return;
        }
        if let Some(fill) = path.fill() {
            match fill.paint() {
                usvg::Paint::Color(c) => {
                    let alpha = opacity * fill.opacity().get();
                    self.begin(path, alpha, 1.0);
                    self.content.set_fill_rgb(
                        f32::from(c.red) / 255.0,
                        f32::from(c.green) / 255.0,
                        f32::from(c.blue) / 255.0,
                    );
                    self.geometry(path);
                    match fill.rule() {
                        usvg::FillRule::EvenOdd => self.content.fill_even_odd(),
                        usvg::FillRule::NonZero => self.content.fill_nonzero(),
                    };
                    self.content.restore_state();
                }
                _ => self.skipped += 1,
            }
        }
        if let Some(stroke) = path.stroke() {
            match stroke.paint() {
                usvg::Paint::Color(c) => {
                    let alpha = opacity * stroke.opacity().get();
                    self.begin(path, 1.0, alpha);
                    self.content
                        .set_stroke_rgb(
                            f32::from(c.red) / 255.0,
                            f32::from(c.green) / 255.0,
                            f32::from(c.blue) / 255.0,
                        )
                        .set_line_width(stroke.width().get())
                        .set_line_cap(match stroke.linecap() {
                            usvg::LineCap::Butt => LineCapStyle::ButtCap,
                            usvg::LineCap::Round => LineCapStyle::RoundCap,
                            usvg::LineCap::Square => LineCapStyle::ProjectingSquareCap,
                        })
                        .set_line_join(match stroke.linejoin() {
                            usvg::LineJoin::Round => LineJoinStyle::RoundJoin,
                            usvg::LineJoin::Bevel => LineJoinStyle::BevelJoin,
                            usvg::LineJoin::Miter | usvg::LineJoin::MiterClip => {
                                LineJoinStyle::MiterJoin
                            }
                        });
                    self.geometry(path);
                    self.content.stroke();
                    self.content.restore_state();
                }
                _ => self.skipped += 1,
            }
        }
    }

    /// Save state, apply alpha and the path's absolute transform.
    fn begin(&mut self, path: &usvg::Path, fill_alpha: f32, stroke_alpha: f32) {
        let state = self.alpha_state(fill_alpha, stroke_alpha);
        self.content.save_state();
        if let Some(name) = state {
            self.content.set_parameters(Name(name.as_bytes()));
        }
        let t = path.abs_transform();
        self.content.transform([t.sx, t.ky, t.kx, t.sy, t.tx, t.ty]);
    }

    fn geometry(&mut self, path: &usvg::Path) {
        let mut start = (0.0f32, 0.0f32);
        let mut last = start;
        for seg in path.data().segments() {
            match seg {
                PathSegment::MoveTo(p) => {
                    self.content.move_to(p.x, p.y);
                    start = (p.x, p.y);
                    last = start;
                }
                PathSegment::LineTo(p) => {
                    self.content.line_to(p.x, p.y);
                    last = (p.x, p.y);
                }
                PathSegment::QuadTo(c, p) => {
                    // Degree elevation: PDF has no quadratic segments.
                    let c1 = (
                        last.0 + 2.0 / 3.0 * (c.x - last.0),
                        last.1 + 2.0 / 3.0 * (c.y - last.1),
                    );
                    let c2 = (
                        p.x + 2.0 / 3.0 * (c.x - p.x),
                        p.y + 2.0 / 3.0 * (c.y - p.y),
                    );
                    self.content.cubic_to(c1.0, c1.1, c2.0, c2.1, p.x, p.y);
                    last = (p.x, p.y);
                }
                PathSegment::CubicTo(c1, c2, p) => {
                    self.content.cubic_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y);
                    last = (p.x, p.y);
                }
                PathSegment::Close => {
                    self.content.close_path();
                    last = start;
                }
            }
        }
    }
}

/// Encode `tree` as a one-page PDF of `width_in x height_in` inches. No timestamps, so equal
/// trees give equal bytes.
pub(crate) fn encode_pdf(tree: &usvg::Tree, width_in: f64, height_in: f64) -> PosterResult<Vec<u8>> {
    let w_pt = (width_in * PT_PER_INCH) as f32;
    let h_pt = (height_in * PT_PER_INCH) as f32;
    let s = (PT_PER_INCH / UNITS_PER_INCH) as f32;

    let mut writer = Writer::new();
    // Scene units, y down -> PDF points, y up.
    writer.content.save_state();
    writer.content.transform([s, 0.0, 0.0, -s, 0.0, h_pt]);
    writer.group(tree.root(), 1.0);
    writer.content.restore_state();
    if writer.skipped > 0 {
        tracing::warn!(skipped = writer.skipped, "pdf export skipped unsupported paints or images");
    }

    let catalog_id = Ref::new(1);
    let pages_id = Ref::new(2);
    let page_id = Ref::new(3);
    let content_id = Ref::new(4);
    let info_id = Ref::new(5);
    let first_state_id = 6;

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id).kids([page_id]).count(1);
    pdf.document_info(info_id)
        .producer(TextStr(concat!("map2poster ", env!("CARGO_PKG_VERSION"))));

    let mut states = writer.states.iter().map(|(k, idx)| (*idx, *k)).collect::<Vec<_>>();
    states.sort_by_key(|(idx, _)| *idx);

    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, w_pt, h_pt));
    page.parent(pages_id);
    page.contents(content_id);
    {
        let mut resources = page.resources();
        let mut gs = resources.ext_g_states();
        for (idx, _) in &states {
            let name = format!("GS{idx}");
            gs.pair(Name(name.as_bytes()), Ref::new(first_state_id + *idx as i32));
        }
        gs.finish();
        resources.finish();
    }
    page.finish();

    for (idx, (fill, stroke)) in &states {
        pdf.ext_graphics(Ref::new(first_state_id + *idx as i32))
            .non_stroking_alpha(f32::from(*fill) / 1000.0)
            .stroking_alpha(f32::from(*stroke) / 1000.0);
    }

    let content = writer.content.finish();
    pdf.stream(content_id, &content);
    Ok(pdf.finish())
}

#[cfg(test)]
#[path = "../../tests/unit/render/pdf.rs"]
mod tests;
