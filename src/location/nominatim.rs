use std::time::Duration;

use anyhow::Context as _;

use super::Geocoder;
use crate::{
    foundation::{
        core::{GeoPoint, PlaceQuery},
        error::PosterResult,
    },
    http,
};

/// [`Geocoder`] backed by a Nominatim `/search` endpoint.
#[derive(Debug)]
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    base_url: String,
}

#[derive(serde::Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    /// Geocoder for `base_url` (for example `https://nominatim.openstreetmap.org`).
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> PosterResult<Self> {
        Ok(Self {
            client: http::build_client(user_agent, timeout)?,
            base_url: base_url.to_string(),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, query: &PlaceQuery) -> anyhow::Result<Option<GeoPoint>> {
        let url = http::join_url(&self.base_url, "search");
        let q = query.to_string();
        tracing::info!(%url, q, "nominatim search");

        let response = self
            .client
            .get(&url)
            .query(&[("q", q.as_str()), ("format", "json"), ("limit", "1")])
            .send()
            .with_context(|| format!("request {url}"))?;
        let status = response.status();
        let body = response.text().context("read nominatim response")?;
        if !status.is_success() {
            anyhow::bail!("{url}: HTTP {status}: {}", http::snippet(&body));
        }
        parse_search(&body)
    }
}

/// First hit of a `format=json` search response.
fn parse_search(body: &str) -> anyhow::Result<Option<GeoPoint>> {
    let hits: Vec<SearchHit> =
        serde_json::from_str(body).context("invalid nominatim JSON")?;
    let Some(first) = hits.into_iter().next() else {
        return Ok(None);
    };
    let lat: f64 = first
        .lat
        .trim()
        .parse()
        .with_context(|| format!("bad latitude '{}'", first.lat))?;
    let lon: f64 = first
        .lon
        .trim()
        .parse()
        .with_context(|| format!("bad longitude '{}'", first.lon))?;
    Ok(Some(GeoPoint::new(lat, lon)?))
}
