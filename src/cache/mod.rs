//! Disk cache shared by the location resolver, street-network provider and font manager.

use std::{
    collections::HashMap,
    io::Write as _,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::Context as _;
use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::foundation::error::PosterResult;

const KEY_SEED: u64 = 0x6d61_7032_706f_7374;
const MAX_SLUG_LEN: usize = 48;

/// Cache namespaces, one directory each under the cache root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheNamespace {
    /// Normalized `"city,country"` -> `{lat, lon}`.
    Geocode,
    /// `"lat,lon,radius"` -> serialized street network.
    Network,
    /// Font family -> directory of faces plus manifest.
    Fonts,
}

impl CacheNamespace {
    /// Directory name under the cache root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Geocode => "geocode",
            Self::Network => "network",
            Self::Fonts => "fonts",
        }
    }
}

/// Handle to a per-key in-process lock.
///
/// Obtained from [`CacheService::guard`]; hold the value returned by [`KeyGuard::lock`]
/// across "check cache, fetch, write".
#[derive(Clone, Debug)]
pub struct KeyGuard(Arc<Mutex<()>>);

impl KeyGuard {
    /// Block until this key is free. A poisoned lock is recovered, the cache on disk is
    /// the source of truth.
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        match self.0.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Explicit cache root with namespaced, atomically written entries.
///
/// Construction does no I/O; directories appear on first write.
#[derive(Debug)]
pub struct CacheService {
    root: PathBuf,
    guards: Mutex<HashMap<(CacheNamespace, String), Arc<Mutex<()>>>>,
}

impl CacheService {
    /// Cache rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            guards: Mutex::new(HashMap::new()),
        }
    }

    /// The cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one namespace.
    pub fn namespace_dir(&self, ns: CacheNamespace) -> PathBuf {
        self.root.join(ns.dir_name())
    }

    /// File path of a single-file entry.
    pub fn entry_path(&self, ns: CacheNamespace, key: &str) -> PathBuf {
        self.namespace_dir(ns).join(format!("{}.json", entry_stem(key)))
    }

    /// Directory for a multi-file entry (font families).
    pub fn entry_dir(&self, ns: CacheNamespace, key: &str) -> PathBuf {
        self.namespace_dir(ns).join(entry_stem(key))
    }

    /// Raw entry bytes, `None` if absent.
    pub fn read(&self, ns: CacheNamespace, key: &str) -> PosterResult<Option<Vec<u8>>> {
        let path = self.entry_path(ns, key);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("read cache entry '{}'", path.display()))
                .into()),
        }
    }

    /// JSON entry; a missing entry is `None` and so is one that fails to decode.
    pub fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        ns: CacheNamespace,
        key: &str,
    ) -> PosterResult<Option<T>> {
        let Some(bytes) = self.read(ns, key)? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(v) => Ok(Some(v)),
            Err(err) => {
                tracing::warn!(
                    namespace = ns.dir_name(),
                    key,
                    %err,
                    "corrupt cache entry, treating as a miss"
                );
                Ok(None)
            }
        }
    }

    /// Atomically replace an entry.
    pub fn write(&self, ns: CacheNamespace, key: &str, bytes: &[u8]) -> PosterResult<()> {
        write_atomic(&self.entry_path(ns, key), bytes)
    }

    /// Serialize and atomically replace an entry.
    pub fn write_json<T: serde::Serialize>(
        &self,
        ns: CacheNamespace,
        key: &str,
        value: &T,
    ) -> PosterResult<()> {
        let bytes = serde_json::to_vec(value).context("serialize cache entry")?;
        self.write(ns, key, &bytes)
    }

    /// Per-key in-process lock shared by every caller asking for the same key.
    ///
    /// Slots nobody holds a [`KeyGuard`] for are dropped here, so the table only holds keys
    /// that are in flight.
    pub fn guard(&self, ns: CacheNamespace, key: &str) -> KeyGuard {
        let mut guards = match self.guards.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guards.retain(|_, slot| Arc::strong_count(slot) > 1);
        let slot = guards.entry((ns, key.to_string())).or_default();
        KeyGuard(Arc::clone(slot))
    }

    /// Remove every namespace and recreate an empty root.
    #[tracing::instrument(skip(self), fields(root = %self.root.display()))]
    pub fn clear(&self) -> PosterResult<()> {
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("remove cache root '{}'", self.root.display()))
                    .into());
            }
        }
        std::fs::create_dir_all(&self.root)
            .with_context(|| format!("create cache root '{}'", self.root.display()))?;
        tracing::info!("cache cleared");
        Ok(())
    }
}

/// Readable slug plus a 64-bit digest of the exact key.
pub(crate) fn entry_stem(key: &str) -> String {
    let mut slug = String::with_capacity(key.len().min(MAX_SLUG_LEN));
    let mut last_sep = true;
    for ch in key.chars() {
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
        if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' {
            slug.push(ch.to_ascii_lowercase());
            last_sep = false;
        } else if !last_sep {
            slug.push('_');
            last_sep = true;
        }
    }
    let slug = slug.trim_end_matches('_');
    let digest = xxh3_64_with_seed(key.as_bytes(), KEY_SEED);
    if slug.is_empty() {
        format!("{digest:016x}")
    } else {
        format!("{slug}-{digest:016x}")
    }
}

/// Write `bytes` to a temp file next to `path`, then rename it into place.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> PosterResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).with_context(|| format!("create dir '{}'", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in '{}'", dir.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("write temp file for '{}'", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("sync temp file for '{}'", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("persist '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/cache/mod.rs"]
mod tests;
