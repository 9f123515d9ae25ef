//! Font family resolution with an on-disk face cache and a fallback to the theme font.

mod google;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

pub use google::GoogleFontsCatalog;

use crate::cache::{CacheNamespace, CacheService, write_atomic};

const MANIFEST: &str = "manifest.json";

/// The three weights posters use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontWeight {
    /// 300, country line.
    Light,
    /// 400, coordinates and attribution.
    Regular,
    /// 700, city name.
    Bold,
}

impl FontWeight {
    /// Every weight, in numeric order.
    pub const ALL: [Self; 3] = [Self::Light, Self::Regular, Self::Bold];

    /// CSS numeric weight.
    pub fn value(self) -> u16 {
        match self {
            Self::Light => 300,
            Self::Regular => 400,
            Self::Bold => 700,
        }
    }

    /// Exact match on a CSS numeric weight.
    pub fn from_value(value: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.value() == value)
    }
}

/// Where the faces of a [`FontSet`] come from.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FontSource {
    /// A family expected to be installed on the system.
    System {
        /// Family name.
        family: String,
    },
    /// Downloaded font files, keyed by CSS weight.
    Files {
        /// Requested family name.
        family: String,
        /// Face file per weight; never empty.
        faces: BTreeMap<u16, PathBuf>,
    },
}

impl FontSource {
    /// Family name.
    pub fn family(&self) -> &str {
        match self {
            Self::System { family } | Self::Files { family, .. } => family,
        }
    }

    /// Face file for `weight`, falling back to regular, then to any face.
    pub fn face(&self, weight: FontWeight) -> Option<&Path> {
        let Self::Files { faces, .. } = self else {
            return None;
        };
        faces
            .get(&weight.value())
            .or_else(|| faces.get(&FontWeight::Regular.value()))
            .or_else(|| faces.values().next())
            .map(PathBuf::as_path)
    }
}

/// Result of font resolution. Never an error: failures surface as `is_fallback`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FontSet {
    /// The family the caller asked for, if any.
    pub requested_family: Option<String>,
    /// Faces to render with.
    pub source: FontSource,
    /// `true` when `requested_family` could not be obtained.
    pub is_fallback: bool,
}

impl FontSet {
    /// Theme default font, installed on the system.
    pub fn system(family: impl Into<String>) -> Self {
        Self {
            requested_family: None,
            source: FontSource::System {
                family: family.into(),
            },
            is_fallback: false,
        }
    }

    /// Family to name in the scene.
    pub fn family(&self) -> &str {
        self.source.family()
    }
}

/// One downloaded face.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontFace {
    /// CSS weight.
    pub weight: u16,
    /// Raw TrueType/OpenType data.
    pub data: Vec<u8>,
}

/// Remote font catalog capability.
pub trait FontCatalog: Send + Sync {
    /// Fetch the faces of `family`. An empty list counts as a failure.
    fn fetch_family(&self, family: &str) -> anyhow::Result<Vec<FontFace>>;
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Manifest {
    family: String,
    faces: BTreeMap<u16, String>,
}

/// Resolves requested families to [`FontSet`]s, caching downloads per family.
pub struct FontManager {
    cache: Arc<CacheService>,
    catalog: Arc<dyn FontCatalog>,
}

impl FontManager {
    /// Manager backed by `cache` and `catalog`.
    pub fn new(cache: Arc<CacheService>, catalog: Arc<dyn FontCatalog>) -> Self {
        Self { cache, catalog }
    }

    /// Resolve `family`, or the theme's `default_font` when none is requested.
    #[tracing::instrument(skip(self))]
    pub fn resolve_font(&self, family: Option<&str>, default_font: &str) -> FontSet {
        let requested = family.map(str::trim).filter(|f| !f.is_empty());
        let Some(requested) = requested else {
            return FontSet::system(default_font);
        };

        match self.cached_or_fetch(requested) {
            Ok(faces) => FontSet {
                requested_family: Some(requested.to_string()),
                source: FontSource::Files {
                    family: requested.to_string(),
                    faces,
                },
                is_fallback: false,
            },
            Err(err) => {
                tracing::warn!(
                    family = requested,
                    fallback = default_font,
                    err = %format!("{err:#}"),
                    "font unavailable, using theme default"
                );
                FontSet {
                    requested_family: Some(requested.to_string()),
                    source: FontSource::System {
                        family: default_font.to_string(),
                    },
                    is_fallback: true,
                }
            }
        }
    }

    fn cached_or_fetch(&self, family: &str) -> anyhow::Result<BTreeMap<u16, PathBuf>> {
        let guard = self.cache.guard(CacheNamespace::Fonts, family);
        let _held = guard.lock();
        let dir = self.cache.entry_dir(CacheNamespace::Fonts, family);

        if let Some(faces) = read_manifest(&dir, family) {
            tracing::debug!(family, "font cache hit");
            return Ok(faces);
        }
        tracing::debug!(family, "font cache miss");

        let fetched = self.catalog.fetch_family(family)?;
        let mut files = BTreeMap::new();
        for face in fetched {
            if FontWeight::from_value(face.weight).is_none() || files.contains_key(&face.weight) {
                continue;
            }
            if face.data.is_empty() {
                anyhow::bail!("empty font data for weight {}", face.weight);
            }
            let file_name = format!("{}.ttf", face.weight);
            write_atomic(&dir.join(&file_name), &face.data)?;
            files.insert(face.weight, file_name);
        }
        if files.is_empty() {
            anyhow::bail!("catalog returned no usable faces for '{family}'");
        }

        let manifest = Manifest {
            family: family.to_string(),
            faces: files,
        };
        write_atomic(&dir.join(MANIFEST), &serde_json::to_vec_pretty(&manifest)?)?;
        tracing::info!(family, faces = manifest.faces.len(), "font cached");

        Ok(manifest
            .faces
            .into_iter()
            .map(|(w, name)| (w, dir.join(name)))
            .collect())
    }
}

/// A complete entry: manifest present, parseable, for this family, with every face on disk.
fn read_manifest(dir: &Path, family: &str) -> Option<BTreeMap<u16, PathBuf>> {
    let bytes = std::fs::read(dir.join(MANIFEST)).ok()?;
    let manifest: Manifest = match serde_json::from_slice(&bytes) {
        Ok(m) => m,
        Err(err) => {
            tracing::warn!(family, %err, "corrupt font manifest, refetching");
            return None;
        }
    };
    if manifest.family != family || manifest.faces.is_empty() {
        return None;
    }
    let faces = manifest
        .faces
        .into_iter()
        .map(|(w, name)| (w, dir.join(name)))
        .collect::<BTreeMap<_, _>>();
    faces.values().all(|p| p.is_file()).then_some(faces)
}

#[cfg(test)]
#[path = "../../tests/unit/fonts/mod.rs"]
mod tests;
