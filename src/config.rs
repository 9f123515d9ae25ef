//! Engine configuration.
//!
//! Precedence, lowest first: built-in defaults, an optional JSON file, `MAP2POSTER_*`
//! environment variables, then whatever the caller (usually the CLI) sets explicitly.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use anyhow::Context as _;

use crate::foundation::error::{PosterError, PosterResult};

/// Public Nominatim instance.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
/// Public Overpass mirrors, tried in order.
pub const DEFAULT_OVERPASS_URLS: [&str; 2] = [
    "https://overpass-api.de/api/interpreter",
    "https://overpass.kumi.systems/api/interpreter",
];
/// Google Fonts CSS API base.
pub const DEFAULT_GOOGLE_FONTS_URL: &str = "https://fonts.googleapis.com";

/// Runtime configuration shared by the engine and its network capabilities.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Cache root holding the geocode, network and font namespaces.
    pub cache_dir: PathBuf,
    /// Optional directory of extra `*.json` themes.
    pub theme_dir: Option<PathBuf>,
    /// `User-Agent` sent to every upstream (Nominatim requires an identifying one).
    pub user_agent: String,
    /// Nominatim base URL.
    pub nominatim_url: String,
    /// Overpass interpreter endpoints, tried in order until one succeeds.
    pub overpass_urls: Vec<String>,
    /// Google Fonts base URL.
    pub google_fonts_url: String,
    /// Per-request HTTP timeout in seconds.
    pub http_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            theme_dir: None,
            user_agent: format!("map2poster/{}", env!("CARGO_PKG_VERSION")),
            nominatim_url: DEFAULT_NOMINATIM_URL.to_string(),
            overpass_urls: DEFAULT_OVERPASS_URLS.iter().map(ToString::to_string).collect(),
            google_fonts_url: DEFAULT_GOOGLE_FONTS_URL.to_string(),
            http_timeout_secs: 180,
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file; missing fields keep their defaults.
    pub fn from_file(path: &Path) -> PosterResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        serde_json::from_str(&text).map_err(|e| {
            PosterError::validation(format!("invalid config '{}': {e}", path.display()))
        })
    }

    /// Defaults, then the optional file, then the process environment.
    pub fn load(path: Option<&Path>) -> PosterResult<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        cfg.apply_env(|name| std::env::var(name).ok());
        Ok(cfg)
    }

    /// Apply `MAP2POSTER_*` overrides read through `lookup`.
    ///
    /// Unparseable values are ignored so a typo in the environment never aborts a render.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(dir) = non_empty("MAP2POSTER_CACHE_DIR") {
            self.cache_dir = PathBuf::from(dir);
        }
        if let Some(dir) = non_empty("MAP2POSTER_THEME_DIR") {
            self.theme_dir = Some(PathBuf::from(dir));
        }
        if let Some(ua) = non_empty("MAP2POSTER_USER_AGENT") {
            self.user_agent = ua;
        }
        if let Some(url) = non_empty("MAP2POSTER_NOMINATIM_URL") {
            self.nominatim_url = url;
        }
        if let Some(urls) = non_empty("MAP2POSTER_OVERPASS_URLS") {
            let urls = urls
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect::<Vec<_>>();
            if !urls.is_empty() {
                self.overpass_urls = urls;
            }
        }
        if let Some(url) = non_empty("MAP2POSTER_GOOGLE_FONTS_URL") {
            self.google_fonts_url = url;
        }
        if let Some(secs) = parse_env::<u64>(non_empty("MAP2POSTER_HTTP_TIMEOUT_SECS")) {
            self.http_timeout_secs = secs.max(1);
        }
    }

    /// HTTP timeout as a [`Duration`].
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }
}

fn parse_env<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse::<T>().ok())
}

/// `$XDG_CACHE_HOME/map2poster`, else `$HOME/.cache/map2poster`, else `./cache`.
pub fn default_cache_dir() -> PathBuf {
    if let Some(xdg) = std::env::var_os("XDG_CACHE_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg).join("map2poster");
    }
    if let Some(home) = std::env::var_os("HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".cache").join("map2poster");
    }
    PathBuf::from("cache")
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
