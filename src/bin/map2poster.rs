use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "map2poster", version, about = "Minimalist map posters for any city")]
struct Cli {
    /// JSON config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Cache root (overrides config and environment).
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Directory of user theme JSON files.
    #[arg(long, global = true)]
    theme_dir: Option<PathBuf>,

    /// More log output (-v debug, -vv trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a poster.
    Render(RenderArgs),
    /// List available theme names, one per line.
    Themes,
    /// Remove every cached geocode, network and font entry.
    ClearCache,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// City to geocode and label.
    #[arg(long)]
    city: String,

    /// Country to geocode and label.
    #[arg(long)]
    country: String,

    /// Latitude override (requires --lon).
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude override (requires --lat).
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,

    /// Theme name.
    #[arg(long, default_value = map2poster::DEFAULT_THEME)]
    theme: String,

    /// Map radius in meters.
    #[arg(long, default_value_t = map2poster::DEFAULT_RADIUS_M)]
    radius: u32,

    /// Poster width in inches.
    #[arg(long, default_value_t = map2poster::DEFAULT_WIDTH_IN)]
    width: f64,

    /// Poster height in inches.
    #[arg(long, default_value_t = map2poster::DEFAULT_HEIGHT_IN)]
    height: f64,

    /// City label override.
    #[arg(long)]
    display_city: Option<String>,

    /// Country label override.
    #[arg(long)]
    display_country: Option<String>,

    /// Google Fonts family for the labels.
    #[arg(long)]
    font: Option<String>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = FormatChoice::Png)]
    format: FormatChoice,

    /// Raster resolution (PNG only).
    #[arg(long, default_value_t = map2poster::DEFAULT_DPI)]
    dpi: f64,

    /// Output path; defaults to `{city}_{theme}.{format}`.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print which font source was used for the labels.
    #[arg(long)]
    dump_fonts: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Pdf,
    Svg,
}

impl From<FormatChoice> for map2poster::OutputFormat {
    fn from(choice: FormatChoice) -> Self {
        match choice {
            FormatChoice::Png => Self::Png,
            FormatChoice::Pdf => Self::Pdf,
            FormatChoice::Svg => Self::Svg,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    match cli.cmd {
        Command::Render(args) => cmd_render(&config, args),
        Command::Themes => cmd_themes(&config),
        Command::ClearCache => cmd_clear_cache(&config),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "map2poster=info",
        1 => "map2poster=debug",
        _ => "map2poster=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<map2poster::EngineConfig> {
    let mut config = map2poster::EngineConfig::load(cli.config.as_deref())
        .context("load configuration")?;
    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = dir.clone();
    }
    if let Some(dir) = &cli.theme_dir {
        config.theme_dir = Some(dir.clone());
    }
    Ok(config)
}

fn cmd_render(config: &map2poster::EngineConfig, args: RenderArgs) -> anyhow::Result<()> {
    let engine = map2poster::PosterEngine::new(config)?;

    let point = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => Some(map2poster::GeoPoint::new(lat, lon)?),
        _ => None,
    };
    let format = map2poster::OutputFormat::from(args.format);
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| default_output_path(&args.city, &args.theme, format));

    let mut req = map2poster::PosterRequest::new(args.city, args.country);
    req.point = point;
    req.theme = args.theme;
    req.radius_m = args.radius;
    req.width_in = args.width;
    req.height_in = args.height;
    req.display_city = args.display_city;
    req.display_country = args.display_country;
    req.font_family = args.font;
    req.output_format = format;
    req.dpi = args.dpi;

    let output = engine
        .create_poster(&req)
        .with_context(|| format!("render poster for '{}, {}'", req.city, req.country))?;

    if args.dump_fonts {
        dump_font_diagnostics(&output.font_set);
    }

    output.artifact.write_to(&out)?;
    match output.artifact.pixel_dimensions {
        Some(px) => eprintln!(
            "wrote {} ({}x{} px, {} bytes)",
            out.display(),
            px.width,
            px.height,
            output.artifact.bytes.len()
        ),
        None => eprintln!("wrote {} ({} bytes)", out.display(), output.artifact.bytes.len()),
    }
    Ok(())
}

fn cmd_themes(config: &map2poster::EngineConfig) -> anyhow::Result<()> {
    let registry = match &config.theme_dir {
        Some(dir) => map2poster::ThemeRegistry::with_user_dir(dir),
        None => map2poster::ThemeRegistry::builtin(),
    };
    for name in registry.list_themes()? {
        println!("{name}");
    }
    Ok(())
}

fn cmd_clear_cache(config: &map2poster::EngineConfig) -> anyhow::Result<()> {
    let cache = map2poster::CacheService::new(&config.cache_dir);
    cache.clear()?;
    eprintln!("cleared {}", cache.root().display());
    Ok(())
}

fn dump_font_diagnostics(font_set: &map2poster::FontSet) {
    eprintln!("font diagnostics:");
    eprintln!(
        "  requested:   {}",
        font_set.requested_family.as_deref().unwrap_or("(theme default)")
    );
    eprintln!("  family:      {}", font_set.family());
    eprintln!("  fallback:    {}", font_set.is_fallback);
    match &font_set.source {
        map2poster::FontSource::System { .. } => eprintln!("  source:      system"),
        map2poster::FontSource::Files { faces, .. } => {
            for (weight, path) in faces {
                eprintln!("  face {weight}:    {}", path.display());
            }
        }
    }
}

fn default_output_path(city: &str, theme: &str, format: map2poster::OutputFormat) -> PathBuf {
    let slug = city.trim().to_lowercase().replace(' ', "_");
    PathBuf::from(format!("{slug}_{theme}.{}", format.extension()))
}
