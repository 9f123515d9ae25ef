use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use super::*;

struct FakeSource {
    calls: AtomicUsize,
    centers: Mutex<Vec<GeoPoint>>,
    fail: bool,
}

impl FakeSource {
    fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            centers: Mutex::new(Vec::new()),
            fail,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GeoDataSource for FakeSource {
    fn fetch_network(&self, center: GeoPoint, radius_m: u32) -> anyhow::Result<StreetNetwork> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.centers.lock().unwrap().push(center);
        if self.fail {
            anyhow::bail!("HTTP 429 Too Many Requests");
        }
        let mut net = StreetNetwork::empty(center, radius_m);
        net.edges.push(NetworkEdge {
            way_id: 1,
            highway: "motorway".into(),
            road_class: RoadClass::Motorway,
            geometry: vec![center, GeoPoint { lat: center.lat + 0.01, lon: center.lon }],
        });
        Ok(net)
    }
}

fn nyc() -> GeoPoint {
    GeoPoint::new(40.712_849, -74.006_051).unwrap()
}

#[test]
fn key_rounds_to_four_decimals() {
    assert_eq!(network_key(nyc(), 12000), "40.7128,-74.0061,12000");
    assert_eq!(
        network_key(GeoPoint { lat: -0.00001, lon: 0.0 }, 1),
        "0.0000,0.0000,1"
    );
}

#[test]
fn second_fetch_for_same_rounded_point_is_cached() {
    let dir = tempfile::tempdir().unwrap();
    let source = FakeSource::new(false);
    let provider = StreetNetworkProvider::new(Arc::new(CacheService::new(dir.path())), source.clone());

    let a = provider.fetch(nyc(), 12000).unwrap();
    let b = provider
        .fetch(GeoPoint::new(40.712_81, -74.006_08).unwrap(), 12000)
        .unwrap();
    assert_eq!(a, b);
    assert_eq!(source.calls(), 1);
    assert_eq!(a.center, GeoPoint { lat: 40.7128, lon: -74.0061 });
    assert_eq!(source.centers.lock().unwrap()[0], a.center);

    provider.fetch(nyc(), 6000).unwrap();
    assert_eq!(source.calls(), 2);
}

#[test]
fn corrupt_entry_is_refetched() {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(CacheService::new(dir.path()));
    let key = network_key(nyc(), 3000);
    cache.write(CacheNamespace::Network, &key, b"{\"center\":").unwrap();

    let source = FakeSource::new(false);
    let provider = StreetNetworkProvider::new(cache.clone(), source.clone());
    let net = provider.fetch(nyc(), 3000).unwrap();
    assert_eq!(source.calls(), 1);
    assert_eq!(net.edges.len(), 1);

    let stored: StreetNetwork = cache
        .read_json(CacheNamespace::Network, &key)
        .unwrap()
        .unwrap();
    assert_eq!(stored, net);
}

#[test]
fn upstream_failure_is_network_data_error_with_key() {
    let dir = tempfile::tempdir().unwrap();
    let provider =
        StreetNetworkProvider::new(Arc::new(CacheService::new(dir.path())), FakeSource::new(true));
    match provider.fetch(nyc(), 1000) {
        Err(PosterError::NetworkData { key, reason }) => {
            assert_eq!(key, "40.7128,-74.0061,1000");
            assert!(reason.contains("429"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn zero_radius_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let source = FakeSource::new(false);
    let provider = StreetNetworkProvider::new(Arc::new(CacheService::new(dir.path())), source.clone());
    assert!(matches!(
        provider.fetch(nyc(), 0),
        Err(PosterError::Validation(_))
    ));
    assert_eq!(source.calls(), 0);
}
