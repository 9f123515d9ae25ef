//! map2poster turns a place name (or explicit coordinates), a named theme and layout
//! parameters into a styled map poster.
//!
//! # Pipeline overview
//!
//! 1. **Locate**: `city, country -> GeoPoint` through a cached [`Geocoder`], unless the request
//!    carries an explicit point.
//! 2. **Style**: load a [`Theme`] from the [`ThemeRegistry`] and resolve a [`FontSet`].
//! 3. **Fetch**: pull roads, water and parks around the point via a cached [`GeoDataSource`].
//! 4. **Compose and export**: build the scene and export it as PNG, SVG or PDF.
//!
//! Everything that talks to the outside world sits behind a trait ([`Geocoder`],
//! [`GeoDataSource`], [`FontCatalog`]) and every cache lives under one [`CacheService`] root.
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: the same request yields byte-identical SVG/PDF and pixel-identical PNG.
//! - **Degrade, don't fail, on fonts**: a missing font family yields `is_fallback = true`.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cache;
mod config;
mod engine;
mod fonts;
mod foundation;
mod http;
mod location;
mod network;
mod render;
mod theme;

pub use cache::{CacheNamespace, CacheService, KeyGuard};
pub use config::{
    DEFAULT_GOOGLE_FONTS_URL, DEFAULT_NOMINATIM_URL, DEFAULT_OVERPASS_URLS, EngineConfig,
    default_cache_dir,
};
pub use engine::{
    Capabilities, DEFAULT_DPI, DEFAULT_HEIGHT_IN, DEFAULT_RADIUS_M, DEFAULT_THEME,
    DEFAULT_WIDTH_IN, PosterEngine, PosterOutput, PosterRequest,
};
pub use fonts::{
    FontCatalog, FontFace, FontManager, FontSet, FontSource, FontWeight, GoogleFontsCatalog,
};
pub use foundation::color::Color;
pub use foundation::core::{
    Canvas, GeoPoint, Location, LocationSource, OutputFormat, PlaceQuery, RoadClass,
};
pub use foundation::error::{PosterError, PosterResult};
pub use location::{Geocoder, LocationResolver, NominatimGeocoder, geocode_key};
pub use network::{
    Area, GeoDataSource, KEY_PRECISION, NetworkEdge, OverpassSource, Ring, StreetNetwork,
    StreetNetworkProvider, network_key,
};
pub use render::{
    FADE_BANDS, Frame, REFERENCE_WIDTH_IN, RenderRequest, RenderedArtifact, UNITS_PER_INCH,
    city_font_pt, city_title, coordinate_line, is_latin_script, meters_per_degree_lat,
    meters_per_degree_lon, render,
};
pub use theme::{DEFAULT_FONT, RoadStyle, Theme, ThemeRegistry};
