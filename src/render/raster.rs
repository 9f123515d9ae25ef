//! usvg scene parsing with poster fonts, PNG rasterization and SVG export.

use std::{
    collections::{BTreeSet, HashSet},
    io::Cursor,
    sync::{Arc, OnceLock},
};

use anyhow::Context as _;

use crate::{
    fonts::{FontSet, FontSource},
    foundation::{
        core::Canvas,
        error::{PosterError, PosterResult},
    },
};

/// Font database for one render plus the family name the scene should ask for.
pub(crate) struct FontContext {
    pub(crate) fontdb: Arc<usvg::fontdb::Database>,
    pub(crate) family: String,
}

fn system_fonts() -> &'static usvg::fontdb::Database {
    static SYSTEM: OnceLock<usvg::fontdb::Database> = OnceLock::new();
    SYSTEM.get_or_init(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "loaded system fonts");
        db
    })
}

/// Downloaded faces first, then system fonts.
///
/// For downloaded families the scene names the family recorded inside the font file, which
/// may differ in spelling from the requested name.
pub(crate) fn font_context(font_set: &FontSet) -> FontContext {
    let mut family = font_set.family().to_string();

    let mut db = system_fonts().clone();
    if let FontSource::Files { faces, .. } = &font_set.source {
        let before = db.faces().map(|f| f.id).collect::<HashSet<_>>();
        for path in faces.values().collect::<BTreeSet<_>>() {
            if let Err(err) = db.load_font_file(path) {
                tracing::warn!(path = %path.display(), %err, "failed to load font face");
            }
        }
        if let Some(name) = db
            .faces()
            .filter(|f| !before.contains(&f.id))
            .find_map(|f| f.families.first().map(|(name, _)| name.clone()))
        {
            family = name;
        }
    }

    labels_can_render(&db, &family);
    FontContext {
        fontdb: Arc::new(db),
        family,
    }
}

/// `false` (with a warning) when the database has no faces, so every label would be dropped.
fn labels_can_render(db: &usvg::fontdb::Database, family: &str) -> bool {
    if db.is_empty() {
        tracing::warn!(family, "no fonts available, poster labels will not be drawn");
        return false;
    }
    true
}

/// Named family first, then generic families, then any face at all so labels never vanish
/// while a font is installed.
fn font_resolver() -> usvg::FontResolver<'static> {
    usvg::FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<usvg::fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                });
            }
            families.push(usvg::fontdb::Family::SansSerif);
            families.push(usvg::fontdb::Family::Serif);

            let style = match font.style() {
                usvg::FontStyle::Normal => usvg::fontdb::Style::Normal,
                usvg::FontStyle::Italic => usvg::fontdb::Style::Italic,
                usvg::FontStyle::Oblique => usvg::fontdb::Style::Oblique,
            };
            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style,
            };

            if let Some(id) = fontdb.query(&query) {
                return Some(id);
            }
            fontdb.faces().next().map(|f| f.id)
        }),
        select_fallback: usvg::FontResolver::default_fallback_selector(),
    }
}

/// Parse the scene; text is shaped here against `fonts`.
pub(crate) fn parse_scene(svg: &str, fonts: &FontContext) -> PosterResult<usvg::Tree> {
    let opts = usvg::Options {
        fontdb: Arc::clone(&fonts.fontdb),
        font_resolver: font_resolver(),
        ..Default::default()
    };
    usvg::Tree::from_str(svg, &opts)
        .map_err(|e| PosterError::render(format!("scene did not parse: {e}")))
}

/// Rasterize onto `canvas` and encode straight-alpha RGBA PNG.
pub(crate) fn encode_png(tree: &usvg::Tree, canvas: Canvas) -> PosterResult<Vec<u8>> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(canvas.width, canvas.height)
        .ok_or_else(|| PosterError::render("failed to allocate poster pixmap"))?;

    let sx = (canvas.width as f32) / tree.size().width();
    let sy = (canvas.height as f32) / tree.size().height();
    resvg::render(
        tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    let mut straight = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        straight.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    let img = image::RgbaImage::from_raw(canvas.width, canvas.height, straight)
        .ok_or_else(|| PosterError::render("invalid rgba buffer size"))?;

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

/// Serialize the parsed tree (text already converted to outlines) with a physical size.
pub(crate) fn encode_svg(tree: &usvg::Tree, width_in: f64, height_in: f64) -> Vec<u8> {
    let svg = tree.to_string(&usvg::WriteOptions::default());
    with_physical_size(&svg, width_in, height_in).into_bytes()
}

/// Replace the root element's `width`/`height` with inch values.
fn with_physical_size(svg: &str, width_in: f64, height_in: f64) -> String {
    let Some(start) = svg.find("<svg") else {
        return svg.to_string();
    };
    let Some(len) = svg[start..].find('>') else {
        return svg.to_string();
    };
    let end = start + len;

    let mut root = svg[start..end].to_string();
    for (attr, value) in [("width", width_in), ("height", height_in)] {
        let needle = format!(" {attr}=\"");
        let Some(pos) = root.find(&needle) else {
            continue;
        };
        let value_start = pos + needle.len();
        let Some(value_len) = root[value_start..].find('"') else {
            continue;
        };
        root.replace_range(value_start..value_start + value_len, &format!("{value}in"));
    }

    let mut out = String::with_capacity(svg.len() + 8);
    out.push_str(&svg[..start]);
    out.push_str(&root);
    out.push_str(&svg[end..]);
    out
}
