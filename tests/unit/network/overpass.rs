use super::*;

fn p(lat: f64, lon: f64) -> GeoPoint {
    GeoPoint { lat, lon }
}

fn center() -> GeoPoint {
    p(40.7128, -74.006)
}

#[test]
fn query_bounds_every_selector_by_radius() {
    let q = build_query(center(), 12_000, 180);
    assert!(q.starts_with("[out:json][timeout:180];"));
    assert!(q.trim_end().ends_with("out geom;"));
    assert_eq!(q.matches("(around:12000,40.7128,-74.006)").count(), 8);
    assert!(q.contains(r#"way["waterway"="riverbank"]"#));
    assert!(q.contains(r#"relation["type"="multipolygon"]["natural"="water"]"#));
}

#[test]
fn parses_roads_water_and_parks_in_order() {
    let body = r#"{
      "version": 0.6,
      "elements": [
        {"type": "way", "id": 10, "nodes": [1, 2],
         "geometry": [{"lat": 40.71, "lon": -74.01}, {"lat": 40.72, "lon": -74.00}],
         "tags": {"highway": "primary", "name": "Broadway"}},
        {"type": "way", "id": 11, "nodes": [2, 3],
         "geometry": [{"lat": 40.72, "lon": -74.00}, {"lat": 40.73, "lon": -73.99}],
         "tags": {"highway": "footway"}},
        {"type": "way", "id": 12, "geometry": [{"lat": 40.7, "lon": -74.0}],
         "tags": {"highway": "residential"}},
        {"type": "way", "id": 20,
         "geometry": [{"lat": 0, "lon": 0}, {"lat": 0, "lon": 1}, {"lat": 1, "lon": 1}, {"lat": 0, "lon": 0}],
         "tags": {"leisure": "park"}},
        {"type": "way", "id": 21,
         "geometry": [{"lat": 0, "lon": 0}, {"lat": 0, "lon": 1}, {"lat": 1, "lon": 1}],
         "tags": {"landuse": "reservoir"}},
        {"type": "node", "id": 99, "lat": 1.0, "lon": 2.0}
      ]
    }"#;
    let net = parse_response(body, center(), 5000).unwrap();
    assert_eq!(net.radius_m, 5000);
    assert_eq!(
        net.edges.iter().map(|e| e.way_id).collect::<Vec<_>>(),
        vec![10, 11]
    );
    assert_eq!(net.edges[0].road_class, RoadClass::Primary);
    assert_eq!(net.edges[1].road_class, RoadClass::Other);
    assert_eq!(net.nodes.len(), 3);
    assert_eq!(net.parks.len(), 1);
    assert_eq!(net.water.len(), 1);
    // Unclosed water way is closed.
    let ring = &net.water[0].rings[0];
    assert_eq!(ring.first(), ring.last());
    assert_eq!(ring.len(), 4);
}

#[test]
fn multipolygon_outers_are_stitched_and_inners_kept() {
    let body = r#"{
      "elements": [
        {"type": "relation", "id": 1, "tags": {"type": "multipolygon", "natural": "water"},
         "members": [
           {"type": "way", "ref": 1, "role": "outer",
            "geometry": [{"lat": 0, "lon": 0}, {"lat": 0, "lon": 4}]},
           {"type": "way", "ref": 2, "role": "outer",
            "geometry": [{"lat": 4, "lon": 4}, {"lat": 0, "lon": 4}]},
           {"type": "way", "ref": 3, "role": "outer",
            "geometry": [{"lat": 4, "lon": 4}, {"lat": 4, "lon": 0}, {"lat": 0, "lon": 0}]},
           {"type": "way", "ref": 4, "role": "inner",
            "geometry": [{"lat": 1, "lon": 1}, {"lat": 1, "lon": 2}, {"lat": 2, "lon": 2}, {"lat": 1, "lon": 1}]},
           {"type": "node", "ref": 5, "role": "label"}
         ]}
      ]
    }"#;
    let net = parse_response(body, center(), 1000).unwrap();
    assert_eq!(net.water.len(), 1);
    let rings = &net.water[0].rings;
    assert_eq!(rings.len(), 2);
    assert_eq!(
        rings[0],
        vec![p(0.0, 0.0), p(0.0, 4.0), p(4.0, 4.0), p(4.0, 0.0), p(0.0, 0.0)]
    );
}

#[test]
fn degenerate_rings_are_dropped() {
    let rings = stitch_rings(vec![
        vec![p(0.0, 0.0), p(0.0, 1.0), p(0.0, 0.0)],
        vec![p(5.0, 5.0)],
        vec![],
    ]);
    assert!(rings.is_empty());
}

#[test]
fn runtime_error_remark_is_unusable() {
    let body = r#"{"elements": [], "remark": "runtime error: Query timed out in \"query\" at line 3 after 26 seconds."}"#;
    let err = parse_response(body, center(), 1000).unwrap_err();
    assert!(format!("{err:#}").contains("timed out"));
    assert!(parse_response("<html>busy</html>", center(), 1000).is_err());
}
