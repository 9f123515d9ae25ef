//! Named visual styles: built-in presets plus an optional directory of user themes.

mod presets;

use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::foundation::{
    color::Color,
    core::RoadClass,
    error::{PosterError, PosterResult},
};

/// Font used when a theme does not name one.
pub const DEFAULT_FONT: &str = "Roboto";

/// Stroke style for one road class.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct RoadStyle {
    /// Stroke color.
    pub color: Color,
    /// Stroke width in points on a 12-inch-wide poster.
    pub width: f64,
    /// Draw order; higher draws later.
    pub z_order: i32,
}

impl RoadStyle {
    /// Built-in `(width, z_order)` for a class.
    pub fn default_metrics(class: RoadClass) -> (f64, i32) {
        match class {
            RoadClass::Motorway => (1.2, 50),
            RoadClass::Primary => (1.0, 40),
            RoadClass::Secondary => (0.8, 30),
            RoadClass::Tertiary => (0.6, 20),
            RoadClass::Residential => (0.4, 10),
            RoadClass::Other => (0.4, 0),
        }
    }
}

/// A fully resolved theme. Every road class has a style.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Theme {
    /// Registry key (file stem).
    pub name: String,
    /// Human-facing title.
    pub display_name: String,
    /// One-line description, may be empty.
    pub description: String,
    /// Canvas fill.
    pub background_color: Color,
    /// Water areas.
    pub water_color: Color,
    /// Parks and other green areas.
    pub green_color: Color,
    /// Color of the top/bottom fades.
    pub gradient_color: Color,
    /// Per-class road styles.
    pub road_styles: BTreeMap<RoadClass, RoadStyle>,
    /// Typography color.
    pub label_color: Color,
    /// Family used when the request names no font.
    pub default_font: String,
}

impl Theme {
    /// Style for `class`, falling back to the `other` style.
    pub fn road_style(&self, class: RoadClass) -> RoadStyle {
        self.road_styles
            .get(&class)
            .or_else(|| self.road_styles.get(&RoadClass::Other))
            .copied()
            .unwrap_or_else(|| {
                let (width, z_order) = RoadStyle::default_metrics(class);
                RoadStyle {
                    color: self.label_color,
                    width,
                    z_order,
                }
            })
    }

    /// Parse and validate theme JSON.
    pub fn from_json(name: &str, json: &str) -> PosterResult<Self> {
        let file: ThemeFile = serde_json::from_str(json)
            .map_err(|e| PosterError::validation(format!("theme '{name}': {e}")))?;
        file.resolve(name)
    }
}

#[derive(Debug, Default, serde::Deserialize)]
struct RoadStyleFile {
    color: Option<String>,
    width: Option<f64>,
    z_order: Option<i32>,
}

/// On-disk theme shape. Unknown keys are ignored so themes can carry extra metadata.
#[derive(Debug, serde::Deserialize)]
struct ThemeFile {
    name: Option<String>,
    #[serde(default)]
    description: String,
    bg: Option<String>,
    text: Option<String>,
    gradient_color: Option<String>,
    water: Option<String>,
    parks: Option<String>,
    road_motorway: Option<String>,
    road_primary: Option<String>,
    road_secondary: Option<String>,
    road_tertiary: Option<String>,
    road_residential: Option<String>,
    road_default: Option<String>,
    #[serde(default)]
    road_styles: BTreeMap<String, RoadStyleFile>,
    default_font: Option<String>,
}

impl ThemeFile {
    fn resolve(self, name: &str) -> PosterResult<Theme> {
        let color = |field: &str, value: Option<&String>| -> PosterResult<Option<Color>> {
            value
                .map(|v| {
                    Color::parse_hex(v).map_err(|e| {
                        PosterError::validation(format!("theme '{name}': field '{field}': {e}"))
                    })
                })
                .transpose()
        };
        let required = |field: &str, value: Option<&String>| -> PosterResult<Color> {
            color(field, value)?.ok_or_else(|| {
                PosterError::validation(format!("theme '{name}': missing required field '{field}'"))
            })
        };

        let background_color = required("bg", self.bg.as_ref())?;
        let label_color = required("text", self.text.as_ref())?;
        let water_color = required("water", self.water.as_ref())?;
        let green_color = required("parks", self.parks.as_ref())?;
        let gradient_color =
            color("gradient_color", self.gradient_color.as_ref())?.unwrap_or(background_color);

        let mut overrides = BTreeMap::new();
        let mut base_override = None;
        for (key, style) in self.road_styles {
            if key.eq_ignore_ascii_case("base") {
                base_override = Some(style);
                continue;
            }
            let class = RoadClass::parse(&key).ok_or_else(|| {
                PosterError::validation(format!("theme '{name}': unknown road class '{key}'"))
            })?;
            overrides.insert(class, style);
        }

        let base_color = match color(
            "road_styles.base.color",
            base_override.as_ref().and_then(|b| b.color.as_ref()),
        )? {
            Some(c) => c,
            None => required("road_default", self.road_default.as_ref())?,
        };

        let flat = |class: RoadClass| match class {
            RoadClass::Motorway => self.road_motorway.as_ref(),
            RoadClass::Primary => self.road_primary.as_ref(),
            RoadClass::Secondary => self.road_secondary.as_ref(),
            RoadClass::Tertiary => self.road_tertiary.as_ref(),
            RoadClass::Residential => self.road_residential.as_ref(),
            RoadClass::Other => self.road_default.as_ref(),
        };

        let mut road_styles = BTreeMap::new();
        for class in RoadClass::ALL {
            let (default_width, default_z) = RoadStyle::default_metrics(class);
            let explicit = overrides.remove(&class).unwrap_or_default();
            let field = format!("road_styles.{class}.color");

            let stroke = match color(&field, explicit.color.as_ref())? {
                Some(c) => c,
                None => color(&format!("road_{class}"), flat(class))?.unwrap_or(base_color),
            };
            let width = explicit
                .width
                .or_else(|| base_override.as_ref().and_then(|b| b.width))
                .unwrap_or(default_width);
            if !width.is_finite() || width <= 0.0 {
                return Err(PosterError::validation(format!(
                    "theme '{name}': road width for {class} must be finite and > 0 (got {width})"
                )));
            }
            road_styles.insert(
                class,
                RoadStyle {
                    color: stroke,
                    width,
                    z_order: explicit.z_order.unwrap_or(default_z),
                },
            );
        }

        let default_font = self
            .default_font
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_FONT.to_string());

        Ok(Theme {
            name: name.to_string(),
            display_name: self
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| title_case(name)),
            description: self.description,
            background_color,
            water_color,
            green_color,
            gradient_color,
            road_styles,
            label_color,
            default_font,
        })
    }
}

fn title_case(name: &str) -> String {
    name.split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Theme names are file stems; anything else can never be loaded.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Enumerates and loads themes.
#[derive(Clone, Debug, Default)]
pub struct ThemeRegistry {
    user_dir: Option<PathBuf>,
}

impl ThemeRegistry {
    /// Registry with only the built-in presets.
    pub fn builtin() -> Self {
        Self { user_dir: None }
    }

    /// Registry that also reads `*.json` files from `dir`; they override presets by name.
    pub fn with_user_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            user_dir: Some(dir.into()),
        }
    }

    /// The optional user theme directory.
    pub fn user_dir(&self) -> Option<&Path> {
        self.user_dir.as_deref()
    }

    /// Sorted names of every loadable theme.
    ///
    /// User files that fail validation are left out (with a warning), as is any preset
    /// they shadow.
    pub fn list_themes(&self) -> PosterResult<Vec<String>> {
        let mut names = presets::PRESETS
            .iter()
            .map(|(n, _)| (*n).to_string())
            .collect::<BTreeSet<_>>();

        for (name, path) in self.user_files()? {
            let loaded = std::fs::read_to_string(&path)
                .map_err(|e| PosterError::validation(format!("{}: {e}", path.display())))
                .and_then(|json| Theme::from_json(&name, &json));
            match loaded {
                Ok(_) => {
                    names.insert(name);
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "skipping invalid theme file");
                    names.remove(&name);
                }
            }
        }
        Ok(names.into_iter().collect())
    }

    /// Load and validate `name`. Repeated loads yield equal values.
    #[tracing::instrument(skip(self))]
    pub fn load_theme(&self, name: &str) -> PosterResult<Theme> {
        let name = name.trim();
        if !is_valid_name(name) {
            return Err(PosterError::theme_not_found(name));
        }

        if let Some((_, path)) = self.user_files()?.into_iter().find(|(n, _)| n == name) {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("read theme '{}'", path.display()))?;
            return Theme::from_json(name, &json).map_err(|e| match e {
                PosterError::Validation(msg) => {
                    PosterError::validation(format!("{}: {msg}", path.display()))
                }
                other => other,
            });
        }

        match presets::find(name) {
            Some(json) => Theme::from_json(name, json),
            None => Err(PosterError::theme_not_found(name)),
        }
    }

    fn user_files(&self) -> PosterResult<Vec<(String, PathBuf)>> {
        let Some(dir) = &self.user_dir else {
            return Ok(Vec::new());
        };
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read theme dir '{}'", dir.display()))
                    .into());
            }
        };

        let mut out = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("read theme dir '{}'", dir.display()))?
                .path();
            let is_json = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"));
            if !is_json || !path.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if is_valid_name(stem) {
                out.push((stem.to_string(), path.clone()));
            }
        }
        // One file per name, whatever the extension's case; listing and loading agree.
        out.sort();
        out.dedup_by(|b, a| a.0 == b.0);
        Ok(out)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/theme/mod.rs"]
mod tests;
