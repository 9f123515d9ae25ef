use super::*;

fn assert_close(a: f64, b: f64, eps: f64) {
    assert!((a - b).abs() <= eps, "{a} vs {b}");
}

#[test]
fn center_maps_to_canvas_middle() {
    let c = GeoPoint { lat: 40.7128, lon: -74.006 };
    let f = Frame::new(c, 12_000, 1152.0, 1536.0);
    let p = f.project(c);
    assert_close(p.x, 576.0, 1e-9);
    assert_close(p.y, 768.0, 1e-9);
}

#[test]
fn longer_side_spans_twice_the_radius() {
    // Portrait 12x16 in: height (1536 units) covers 24 km north-south.
    let c = GeoPoint { lat: 40.7128, lon: -74.006 };
    let f = Frame::new(c, 12_000, 1152.0, 1536.0);
    assert_close(f.units_per_meter(), 1536.0 / 24_000.0, 1e-12);

    let north_edge = GeoPoint {
        lat: c.lat + 12_000.0 / meters_per_degree_lat(c.lat),
        lon: c.lon,
    };
    assert_close(f.project(north_edge).y, 0.0, 1e-6);

    // Landscape: width is the long side.
    let f = Frame::new(c, 12_000, 1536.0, 1152.0);
    let east_edge = GeoPoint {
        lat: c.lat,
        lon: c.lon + 12_000.0 / meters_per_degree_lon(c.lat),
    };
    assert_close(f.project(east_edge).x, 1536.0, 1e-6);
}

#[test]
fn golden_projection_new_york() {
    // Pinned framing: 12x16 in poster, 12 km radius around Manhattan.
    let f = Frame::new(GeoPoint { lat: 40.7128, lon: -74.006 }, 12_000, 1152.0, 1536.0);
    let p = f.project(GeoPoint { lat: 40.7580, lon: -73.9855 });
    assert_close(meters_per_degree_lat(40.7128), 111_048.33, 0.01);
    assert_close(meters_per_degree_lon(40.7128), 84_499.41, 0.01);
    assert_close(p.x, 686.863, 0.001);
    assert_close(p.y, 446.759, 0.001);
}

#[test]
fn degenerate_radius_does_not_divide_by_zero() {
    let f = Frame::new(GeoPoint { lat: 0.0, lon: 0.0 }, 0, 100.0, 100.0);
    assert!(f.units_per_meter().is_finite());
}
