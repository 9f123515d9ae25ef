//! The render-call boundary: resolves inputs and drives the compositor.

use std::sync::Arc;

use crate::{
    cache::CacheService,
    config::EngineConfig,
    fonts::{FontCatalog, FontManager, FontSet, GoogleFontsCatalog},
    foundation::{
        core::{Canvas, GeoPoint, Location, OutputFormat, validate_print_size},
        error::{PosterError, PosterResult},
    },
    location::{Geocoder, LocationResolver, NominatimGeocoder},
    network::{GeoDataSource, OverpassSource, StreetNetworkProvider},
    render::{self, RenderRequest, RenderedArtifact},
    theme::{Theme, ThemeRegistry},
};

/// Theme used when a request does not name one.
pub const DEFAULT_THEME: &str = "terracotta";
/// Default map radius in meters.
pub const DEFAULT_RADIUS_M: u32 = 12_000;
/// Default poster width in inches.
pub const DEFAULT_WIDTH_IN: f64 = 12.0;
/// Default poster height in inches.
pub const DEFAULT_HEIGHT_IN: f64 = 16.0;
/// Default raster resolution.
pub const DEFAULT_DPI: f64 = 300.0;

/// Inputs of one poster render.
#[derive(Clone, Debug, PartialEq)]
pub struct PosterRequest {
    /// City to geocode and label.
    pub city: String,
    /// Country to geocode and label.
    pub country: String,
    /// Explicit center; skips geocoding when set.
    pub point: Option<GeoPoint>,
    /// Theme name.
    pub theme: String,
    /// Map radius in meters.
    pub radius_m: u32,
    /// Poster width in inches.
    pub width_in: f64,
    /// Poster height in inches.
    pub height_in: f64,
    /// City label override.
    pub display_city: Option<String>,
    /// Country label override.
    pub display_country: Option<String>,
    /// Font family to fetch; `None` uses the theme's default font.
    pub font_family: Option<String>,
    /// Export format.
    pub output_format: OutputFormat,
    /// Raster resolution.
    pub dpi: f64,
}

impl PosterRequest {
    /// Request with default theme, radius, size, format and resolution.
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
            point: None,
            theme: DEFAULT_THEME.to_string(),
            radius_m: DEFAULT_RADIUS_M,
            width_in: DEFAULT_WIDTH_IN,
            height_in: DEFAULT_HEIGHT_IN,
            display_city: None,
            display_country: None,
            font_family: None,
            output_format: OutputFormat::Png,
            dpi: DEFAULT_DPI,
        }
    }
}

/// A rendered poster plus what was resolved along the way.
#[derive(Clone, Debug)]
pub struct PosterOutput {
    /// Encoded poster.
    pub artifact: RenderedArtifact,
    /// Center used for the map.
    pub location: Location,
    /// Fonts used for the labels.
    pub font_set: FontSet,
}

/// The external services the engine talks to.
#[derive(Clone)]
pub struct Capabilities {
    /// Place-name lookup.
    pub geocoder: Arc<dyn Geocoder>,
    /// Street-network source.
    pub geo_data: Arc<dyn GeoDataSource>,
    /// Remote font catalog.
    pub fonts: Arc<dyn FontCatalog>,
}

impl Capabilities {
    /// Nominatim, Overpass and Google Fonts, configured from `config`.
    pub fn production(config: &EngineConfig) -> PosterResult<Self> {
        let timeout = config.http_timeout();
        Ok(Self {
            geocoder: Arc::new(NominatimGeocoder::new(
                &config.nominatim_url,
                &config.user_agent,
                timeout,
            )?),
            geo_data: Arc::new(OverpassSource::new(
                config.overpass_urls.clone(),
                &config.user_agent,
                timeout,
            )?),
            fonts: Arc::new(GoogleFontsCatalog::new(
                &config.google_fonts_url,
                &config.user_agent,
                timeout,
            )?),
        })
    }
}

/// Wires the cache, resolver, theme registry, font manager and network provider together.
pub struct PosterEngine {
    cache: Arc<CacheService>,
    themes: ThemeRegistry,
    locations: LocationResolver,
    fonts: FontManager,
    networks: StreetNetworkProvider,
}

impl PosterEngine {
    /// Engine with the production capabilities.
    pub fn new(config: &EngineConfig) -> PosterResult<Self> {
        Ok(Self::with_capabilities(config, Capabilities::production(config)?))
    }

    /// Engine with caller-supplied capabilities.
    pub fn with_capabilities(config: &EngineConfig, caps: Capabilities) -> Self {
        let cache = Arc::new(CacheService::new(&config.cache_dir));
        let themes = match &config.theme_dir {
            Some(dir) => ThemeRegistry::with_user_dir(dir),
            None => ThemeRegistry::builtin(),
        };
        Self {
            locations: LocationResolver::new(Arc::clone(&cache), caps.geocoder),
            fonts: FontManager::new(Arc::clone(&cache), caps.fonts),
            networks: StreetNetworkProvider::new(Arc::clone(&cache), caps.geo_data),
            themes,
            cache,
        }
    }

    /// The shared cache.
    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    /// Sorted names of every loadable theme.
    pub fn list_themes(&self) -> PosterResult<Vec<String>> {
        self.themes.list_themes()
    }

    /// Load a theme by name.
    pub fn load_theme(&self, name: &str) -> PosterResult<Theme> {
        self.themes.load_theme(name)
    }

    /// Geocode `city, country` through the cache.
    pub fn resolve_location(&self, city: &str, country: &str) -> PosterResult<Location> {
        let point = self.locations.resolve(city, country)?;
        Ok(Location::geocoded(city, country, point))
    }

    /// Remove every cached entry.
    pub fn clear_cache(&self) -> PosterResult<()> {
        self.cache.clear()
    }

    /// Full pipeline: location, theme, font, network, render.
    #[tracing::instrument(
        skip(self, req),
        fields(city = %req.city, country = %req.country, theme = %req.theme, format = %req.output_format)
    )]
    pub fn create_poster(&self, req: &PosterRequest) -> PosterResult<PosterOutput> {
        // Cheap checks before any network traffic.
        validate_print_size(req.width_in, req.height_in, req.dpi)?;
        if req.output_format.is_raster() {
            Canvas::for_print(req.width_in, req.height_in, req.dpi)?;
        }
        if req.radius_m == 0 {
            return Err(PosterError::validation("radius must be > 0 meters"));
        }

        let location = match req.point {
            Some(p) => Location::overridden(GeoPoint::new(p.lat, p.lon)?),
            None => self.resolve_location(&req.city, &req.country)?,
        };
        let theme = self.themes.load_theme(&req.theme)?;
        let font_set = self
            .fonts
            .resolve_font(req.font_family.as_deref(), &theme.default_font);
        let network = self.networks.fetch(location.point, req.radius_m)?;

        let render_req = RenderRequest {
            location: location.clone(),
            theme,
            network,
            font_set: font_set.clone(),
            width_in: req.width_in,
            height_in: req.height_in,
            dpi: req.dpi,
            city: req.city.clone(),
            country: req.country.clone(),
            display_city: req.display_city.clone(),
            display_country: req.display_country.clone(),
            output_format: req.output_format,
        };
        let artifact = render::render(&render_req)?;
        tracing::info!(bytes = artifact.bytes.len(), "poster rendered");

        Ok(PosterOutput {
            artifact,
            location,
            font_set,
        })
    }
}
