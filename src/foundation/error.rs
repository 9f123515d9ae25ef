/// Convenience result type used across map2poster.
pub type PosterResult<T> = Result<T, PosterError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Font resolution problems are deliberately absent: they degrade to a fallback font and are
/// reported through [`crate::FontSet::is_fallback`].
#[derive(thiserror::Error, Debug)]
pub enum PosterError {
    /// Geocoding failed: the place was not found or the upstream service failed.
    #[error("resolution error for '{query}': {reason}")]
    Resolution {
        /// The original, un-normalized query (`"city, country"`).
        query: String,
        /// Human-readable cause.
        reason: String,
    },

    /// No theme with this name exists in the registry.
    #[error("theme not found: '{0}'")]
    ThemeNotFound(String),

    /// The street-network fetch failed or returned unusable data.
    #[error("network data error for {key}: {reason}")]
    NetworkData {
        /// Network cache key (`"lat,lon,radius"`).
        key: String,
        /// Human-readable cause.
        reason: String,
    },

    /// Canvas construction or export failed.
    #[error("render error: {0}")]
    Render(String),

    /// Invalid request parameters or theme data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PosterError {
    /// Build a [`PosterError::Resolution`] value.
    pub fn resolution(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`PosterError::ThemeNotFound`] value.
    pub fn theme_not_found(name: impl Into<String>) -> Self {
        Self::ThemeNotFound(name.into())
    }

    /// Build a [`PosterError::NetworkData`] value.
    pub fn network_data(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NetworkData {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Build a [`PosterError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PosterError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
