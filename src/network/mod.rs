//! Street-network retrieval around a point, cached per rounded point and radius.

mod overpass;

use std::{collections::BTreeMap, sync::Arc};

pub use overpass::OverpassSource;

use crate::{
    cache::{CacheNamespace, CacheService},
    foundation::{
        core::{GeoPoint, RoadClass},
        error::{PosterError, PosterResult},
    },
};

/// Decimal places kept when keying the network cache.
pub const KEY_PRECISION: u32 = 4;

/// A closed ring; the last point equals the first.
pub type Ring = Vec<GeoPoint>;

/// One road way.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NetworkEdge {
    /// OSM way id.
    pub way_id: i64,
    /// Raw `highway` tag value.
    pub highway: String,
    /// Styling class derived from `highway`.
    pub road_class: RoadClass,
    /// Polyline, at least two points.
    pub geometry: Vec<GeoPoint>,
}

/// A polygon with optional holes, filled with the even-odd rule.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Area {
    /// Closed rings with at least three distinct points each.
    pub rings: Vec<Ring>,
}

/// Roads, water and parks within `radius_m` of `center`. Immutable once fetched.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StreetNetwork {
    /// Query center (already rounded to [`KEY_PRECISION`]).
    pub center: GeoPoint,
    /// Query radius in meters.
    pub radius_m: u32,
    /// Road nodes by OSM id.
    pub nodes: BTreeMap<i64, GeoPoint>,
    /// Road ways, in provider order.
    pub edges: Vec<NetworkEdge>,
    /// Water polygons.
    pub water: Vec<Area>,
    /// Parks and other green polygons.
    pub parks: Vec<Area>,
}

impl StreetNetwork {
    /// Network with no features.
    pub fn empty(center: GeoPoint, radius_m: u32) -> Self {
        Self {
            center,
            radius_m,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            water: Vec::new(),
            parks: Vec::new(),
        }
    }
}

/// Geographic data capability, bounded by a circle around `center`.
pub trait GeoDataSource: Send + Sync {
    /// Fetch roads, water and parks within `radius_m` of `center`.
    fn fetch_network(&self, center: GeoPoint, radius_m: u32) -> anyhow::Result<StreetNetwork>;
}

/// Cache key: `"{lat:.4},{lon:.4},{radius_m}"`.
pub fn network_key(point: GeoPoint, radius_m: u32) -> String {
    let p = point.rounded(KEY_PRECISION);
    // `+ 0.0` folds -0.0 so both signs of zero share an entry.
    format!("{:.4},{:.4},{radius_m}", p.lat + 0.0, p.lon + 0.0)
}

/// Fetches networks through a [`GeoDataSource`], caching them on disk.
pub struct StreetNetworkProvider {
    cache: Arc<CacheService>,
    source: Arc<dyn GeoDataSource>,
}

impl StreetNetworkProvider {
    /// Provider backed by `cache` and `source`.
    pub fn new(cache: Arc<CacheService>, source: Arc<dyn GeoDataSource>) -> Self {
        Self { cache, source }
    }

    /// Network around `point`. No invalidation: stale data goes away only with a cache clear.
    #[tracing::instrument(skip(self))]
    pub fn fetch(&self, point: GeoPoint, radius_m: u32) -> PosterResult<StreetNetwork> {
        let key = network_key(point, radius_m);
        if radius_m == 0 {
            return Err(PosterError::validation(format!(
                "radius must be > 0 meters (key {key})"
            )));
        }
        let center = point.rounded(KEY_PRECISION);

        let guard = self.cache.guard(CacheNamespace::Network, &key);
        let _held = guard.lock();

        if let Some(net) = self
            .cache
            .read_json::<StreetNetwork>(CacheNamespace::Network, &key)?
        {
            if network_key(net.center, net.radius_m) == key {
                tracing::debug!(%key, edges = net.edges.len(), "network cache hit");
                return Ok(net);
            }
            tracing::warn!(%key, "network cache entry does not match its key, refetching");
        } else {
            tracing::debug!(%key, "network cache miss");
        }

        let mut net = self
            .source
            .fetch_network(center, radius_m)
            .map_err(|e| PosterError::network_data(&key, format!("{e:#}")))?;
        net.center = center;
        net.radius_m = radius_m;

        tracing::info!(
            %key,
            edges = net.edges.len(),
            water = net.water.len(),
            parks = net.parks.len(),
            "network fetched"
        );
        self.cache.write_json(CacheNamespace::Network, &key, &net)?;
        Ok(net)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/network/mod.rs"]
mod tests;
