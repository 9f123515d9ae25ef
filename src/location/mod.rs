//! Place-name resolution with a persistent geocode cache.

mod nominatim;

use std::sync::Arc;

pub use nominatim::NominatimGeocoder;

use crate::{
    cache::{CacheNamespace, CacheService},
    foundation::{
        core::{GeoPoint, PlaceQuery},
        error::{PosterError, PosterResult},
    },
};

/// Geocoding capability.
///
/// `Ok(None)` means the upstream answered but knows no such place.
pub trait Geocoder: Send + Sync {
    /// Look up the first matching point for `query`.
    fn geocode(&self, query: &PlaceQuery) -> anyhow::Result<Option<GeoPoint>>;
}

/// Resolves `(city, country)` to a point, consulting the geocode cache first.
pub struct LocationResolver {
    cache: Arc<CacheService>,
    geocoder: Arc<dyn Geocoder>,
}

impl LocationResolver {
    /// Resolver backed by `cache` and `geocoder`.
    pub fn new(cache: Arc<CacheService>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { cache, geocoder }
    }

    /// Resolve a place. A hit never touches the geocoder; a miss stores the answer durably.
    #[tracing::instrument(skip(self))]
    pub fn resolve(&self, city: &str, country: &str) -> PosterResult<GeoPoint> {
        let query = PlaceQuery {
            city: city.to_string(),
            country: country.to_string(),
        };
        let shown = query.to_string();
        if city.trim().is_empty() {
            return Err(PosterError::resolution(shown, "city is empty"));
        }

        let key = geocode_key(city, country);
        let guard = self.cache.guard(CacheNamespace::Geocode, &key);
        let _held = guard.lock();

        if let Some(point) = self.cached(&key)? {
            tracing::debug!(%key, "geocode cache hit");
            return Ok(point);
        }
        tracing::debug!(%key, "geocode cache miss");

        let point = match self.geocoder.geocode(&query) {
            Ok(Some(point)) => point,
            Ok(None) => return Err(PosterError::resolution(shown, "place not found")),
            Err(err) => return Err(PosterError::resolution(shown, format!("{err:#}"))),
        };
        let point = GeoPoint::new(point.lat, point.lon)
            .map_err(|e| PosterError::resolution(shown, format!("geocoder returned {e}")))?;

        tracing::info!(%key, lat = point.lat, lon = point.lon, "geocoded");
        self.cache.write_json(CacheNamespace::Geocode, &key, &point)?;
        Ok(point)
    }

    fn cached(&self, key: &str) -> PosterResult<Option<GeoPoint>> {
        let Some(raw) = self
            .cache
            .read_json::<GeoPoint>(CacheNamespace::Geocode, key)?
        else {
            return Ok(None);
        };
        match GeoPoint::new(raw.lat, raw.lon) {
            Ok(p) => Ok(Some(p)),
            Err(err) => {
                tracing::warn!(key, %err, "corrupt geocode cache entry, treating as a miss");
                Ok(None)
            }
        }
    }
}

/// Normalized cache key: trimmed, lower-cased `"city,country"`.
///
/// Backslashes and commas inside either part are backslash-escaped so the separator
/// stays unambiguous.
pub fn geocode_key(city: &str, country: &str) -> String {
    format!("{},{}", key_part(city), key_part(country))
}

fn key_part(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace(',', "\\,")
}

#[cfg(test)]
#[path = "../../tests/unit/location/mod.rs"]
mod tests;
