use std::{collections::HashMap, time::Duration};

use anyhow::Context as _;
use serde::Deserialize;

use super::{Area, GeoDataSource, NetworkEdge, Ring, StreetNetwork};
use crate::{
    foundation::{
        core::{GeoPoint, RoadClass},
        error::PosterResult,
    },
    http,
};

/// [`GeoDataSource`] backed by one or more Overpass API interpreters, tried in order.
#[derive(Debug)]
pub struct OverpassSource {
    client: reqwest::blocking::Client,
    urls: Vec<String>,
    timeout: Duration,
}

impl OverpassSource {
    /// Source querying `urls` in order until one answers.
    pub fn new(urls: Vec<String>, user_agent: &str, timeout: Duration) -> PosterResult<Self> {
        Ok(Self {
            client: http::build_client(user_agent, timeout)?,
            urls,
            timeout,
        })
    }

    fn post(&self, query: &str) -> anyhow::Result<String> {
        if self.urls.is_empty() {
            anyhow::bail!("no overpass endpoints configured");
        }
        let mut errors = Vec::new();
        for url in &self.urls {
            tracing::info!(%url, "overpass request");
            let response = match self.client.post(url).form(&[("data", query)]).send() {
                Ok(r) => r,
                Err(e) => {
                    errors.push(format!("{url}: request failed: {e}"));
                    continue;
                }
            };
            let status = response.status();
            let body = match response.text() {
                Ok(b) => b,
                Err(e) => {
                    errors.push(format!("{url}: response read failed: {e}"));
                    continue;
                }
            };
            if status.is_success() {
                return Ok(body);
            }
            errors.push(format!("{url}: HTTP {status}: {}", http::snippet(&body)));
        }
        anyhow::bail!("all overpass endpoints failed: {}", errors.join(" | "))
    }
}

impl GeoDataSource for OverpassSource {
    fn fetch_network(&self, center: GeoPoint, radius_m: u32) -> anyhow::Result<StreetNetwork> {
        let query = build_query(center, radius_m, self.timeout.as_secs().max(25));
        let body = self.post(&query)?;
        parse_response(&body, center, radius_m)
    }
}

pub(super) fn build_query(center: GeoPoint, radius_m: u32, timeout_s: u64) -> String {
    let around = format!("(around:{radius_m},{},{})", center.lat, center.lon);
    let selectors = [
        r#"way["highway"]"#,
        r#"way["natural"="water"]"#,
        r#"way["waterway"="riverbank"]"#,
        r#"way["landuse"~"^(reservoir|basin)$"]"#,
        r#"relation["type"="multipolygon"]["natural"="water"]"#,
        r#"way["leisure"~"^(park|garden)$"]"#,
        r#"way["landuse"~"^(grass|recreation_ground|village_green)$"]"#,
        r#"relation["type"="multipolygon"]["leisure"~"^(park|garden)$"]"#,
    ];
    let mut q = format!("[out:json][timeout:{timeout_s}];\n(\n");
    for s in selectors {
        q.push_str("  ");
        q.push_str(s);
        q.push_str(&around);
        q.push_str(";\n");
    }
    q.push_str(");\nout geom;\n");
    q
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    remark: Option<String>,
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct Member {
    #[serde(rename = "type")]
    member_type: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    geometry: Vec<Option<LatLon>>,
}

#[derive(Deserialize)]
struct Element {
    #[serde(rename = "type")]
    element_type: String,
    id: i64,
    #[serde(default)]
    nodes: Vec<i64>,
    #[serde(default)]
    geometry: Vec<Option<LatLon>>,
    #[serde(default)]
    members: Vec<Member>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AreaKind {
    Water,
    Park,
}

fn area_kind(tags: &HashMap<String, String>) -> Option<AreaKind> {
    let tag = |k: &str| tags.get(k).map(String::as_str);
    if tag("natural") == Some("water")
        || tag("waterway") == Some("riverbank")
        || matches!(tag("landuse"), Some("reservoir" | "basin"))
    {
        return Some(AreaKind::Water);
    }
    if matches!(tag("leisure"), Some("park" | "garden"))
        || matches!(
            tag("landuse"),
            Some("grass" | "recreation_ground" | "village_green")
        )
    {
        return Some(AreaKind::Park);
    }
    None
}

fn points(geometry: &[Option<LatLon>]) -> Vec<GeoPoint> {
    geometry
        .iter()
        .flatten()
        .filter(|p| p.lat.is_finite() && p.lon.is_finite())
        .map(|p| GeoPoint {
            lat: p.lat,
            lon: p.lon,
        })
        .collect()
}

/// Turn an `out geom;` response into a network, preserving element order.
pub(super) fn parse_response(
    body: &str,
    center: GeoPoint,
    radius_m: u32,
) -> anyhow::Result<StreetNetwork> {
    let response: Response = serde_json::from_str(body).context("invalid overpass JSON")?;
    if let Some(remark) = response.remark.as_deref()
        && remark.to_ascii_lowercase().contains("error")
    {
        anyhow::bail!("overpass remark: {remark}");
    }

    let mut net = StreetNetwork::empty(center, radius_m);
    for el in response.elements {
        match el.element_type.as_str() {
            "way" => {
                let geometry = points(&el.geometry);
                if let Some(highway) = el.tags.get("highway") {
                    if geometry.len() < 2 {
                        continue;
                    }
                    if el.nodes.len() == geometry.len() {
                        for (id, p) in el.nodes.iter().zip(&geometry) {
                            net.nodes.insert(*id, *p);
                        }
                    }
                    net.edges.push(NetworkEdge {
                        way_id: el.id,
                        highway: highway.clone(),
                        road_class: RoadClass::from_highway(highway),
                        geometry,
                    });
                    continue;
                }
                let Some(kind) = area_kind(&el.tags) else {
                    continue;
                };
                let rings = stitch_rings(vec![geometry]);
                push_area(&mut net, kind, rings);
            }
            "relation" => {
                let Some(kind) = area_kind(&el.tags) else {
                    continue;
                };
                let (outer, inner): (Vec<_>, Vec<_>) = el
                    .members
                    .iter()
                    .filter(|m| m.member_type == "way")
                    .partition(|m| m.role != "inner");
                let mut rings = stitch_rings(outer.iter().map(|m| points(&m.geometry)).collect());
                if rings.is_empty() {
                    continue;
                }
                rings.extend(stitch_rings(
                    inner.iter().map(|m| points(&m.geometry)).collect(),
                ));
                push_area(&mut net, kind, rings);
            }
            _ => {}
        }
    }
    Ok(net)
}

fn push_area(net: &mut StreetNetwork, kind: AreaKind, rings: Vec<Ring>) {
    if rings.is_empty() {
        return;
    }
    let area = Area { rings };
    match kind {
        AreaKind::Water => net.water.push(area),
        AreaKind::Park => net.parks.push(area),
    }
}

/// Join open member ways end to end into closed rings; rings with fewer than three
/// distinct points are dropped.
pub(super) fn stitch_rings(mut segments: Vec<Vec<GeoPoint>>) -> Vec<Ring> {
    segments.retain(|s| !s.is_empty());
    segments.reverse();

    let mut rings = Vec::new();
    while let Some(mut ring) = segments.pop() {
        loop {
            let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) else {
                break;
            };
            if ring.len() > 1 && first == last {
                break;
            }
            let next = segments.iter().rposition(|s| {
                s.first() == Some(&last) || s.last() == Some(&last)
            });
            let Some(idx) = next else {
                ring.push(first);
                break;
            };
            let mut seg = segments.remove(idx);
            if seg.first() != Some(&last) {
                seg.reverse();
            }
            ring.extend(seg.into_iter().skip(1));
        }

        ring.dedup();
        let mut distinct = ring.clone();
        distinct.pop();
        distinct.sort_by(|a, b| a.lat.total_cmp(&b.lat).then(a.lon.total_cmp(&b.lon)));
        distinct.dedup();
        if distinct.len() >= 3 {
            rings.push(ring);
        }
    }
    rings
}

#[cfg(test)]
#[path = "../../tests/unit/network/overpass.rs"]
mod tests;
