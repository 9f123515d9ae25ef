use std::time::Duration;

use anyhow::Context as _;

use super::{FontCatalog, FontFace, FontWeight};
use crate::{foundation::error::PosterResult, http};

/// [`FontCatalog`] backed by the Google Fonts CSS2 API.
///
/// Non-browser user agents are served TrueType `src` URLs, which is what the text engine loads.
#[derive(Debug)]
pub struct GoogleFontsCatalog {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl GoogleFontsCatalog {
    /// Catalog for `base_url` (for example `https://fonts.googleapis.com`).
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> PosterResult<Self> {
        Ok(Self {
            client: http::build_client(user_agent, timeout)?,
            base_url: base_url.to_string(),
        })
    }

    fn get(&self, url: &str) -> anyhow::Result<reqwest::blocking::Response> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("request {url}"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            anyhow::bail!("{url}: HTTP {status}: {}", http::snippet(&body));
        }
        Ok(response)
    }
}

impl FontCatalog for GoogleFontsCatalog {
    fn fetch_family(&self, family: &str) -> anyhow::Result<Vec<FontFace>> {
        let url = css_url(&self.base_url, family)?;
        tracing::info!(%url, "fetching font css");
        let css = self.get(&url)?.text().context("read font css")?;

        let sources = parse_font_faces(&css)?;
        if sources.is_empty() {
            anyhow::bail!("no @font-face rules for '{family}'");
        }

        let mut faces = Vec::with_capacity(sources.len());
        for (weight, src) in sources {
            let data = self
                .get(&src)?
                .bytes()
                .with_context(|| format!("download {src}"))?
                .to_vec();
            if !is_sfnt(&data) {
                anyhow::bail!("{src}: not a TrueType/OpenType font");
            }
            faces.push(FontFace { weight, data });
        }
        Ok(faces)
    }
}

/// `{base}/css2?family=Name+With+Spaces:wght@300;400;700`
fn css_url(base: &str, family: &str) -> anyhow::Result<String> {
    let family = family.trim();
    if family.is_empty()
        || !family
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
    {
        anyhow::bail!("'{family}' is not a valid font family name");
    }
    let weights = FontWeight::ALL
        .iter()
        .map(|w| w.value().to_string())
        .collect::<Vec<_>>()
        .join(";");
    Ok(format!(
        "{}?family={}:wght@{weights}",
        http::join_url(base, "css2"),
        family.replace(' ', "+")
    ))
}

/// `(weight, url)` for every `@font-face` block, first block per weight wins.
fn parse_font_faces(css: &str) -> anyhow::Result<Vec<(u16, String)>> {
    let block = regex::Regex::new(r"@font-face\s*\{([^}]*)\}")?;
    let weight = regex::Regex::new(r"font-weight\s*:\s*(\d+)")?;
    let src = regex::Regex::new(r#"src\s*:\s*url\(\s*['"]?([^'")\s]+)['"]?\s*\)"#)?;

    let mut out: Vec<(u16, String)> = Vec::new();
    for caps in block.captures_iter(css) {
        let body = &caps[1];
        let Some(w) = weight
            .captures(body)
            .and_then(|c| c[1].parse::<u16>().ok())
        else {
            continue;
        };
        let Some(url) = src.captures(body).map(|c| c[1].to_string()) else {
            continue;
        };
        if !out.iter().any(|(seen, _)| *seen == w) {
            out.push((w, url));
        }
    }
    Ok(out)
}

fn is_sfnt(data: &[u8]) -> bool {
    matches!(
        data.get(..4),
        Some([0x00, 0x01, 0x00, 0x00]) | Some(b"OTTO") | Some(b"true") | Some(b"ttcf")
    )
}
