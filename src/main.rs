use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use map_renderer::{MapCreator, MapSettings, TerrainGraph};

#[derive(Parser, Debug)]
#[command(name = "map_renderer")]
#[command(about = "Render a fantasy map image from a terrain graph")]
struct Args {
    /// Settings file (JSON). Defaults are used when omitted
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Terrain graph file (JSON)
    #[arg(short, long)]
    graph: PathBuf,

    /// Where to write the finished map (PNG)
    #[arg(short, long, default_value = "map.png")]
    output: PathBuf,

    /// Also write the map without icons or text
    #[arg(long)]
    background_output: Option<PathBuf>,

    /// Use this seed for terrain, regions, background and text
    #[arg(long)]
    seed: Option<u64>,

    /// Skip labels
    #[arg(long)]
    no_text: bool,

    /// Log each stage and its timing
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let mut settings = match &args.settings {
        Some(path) => MapSettings::load(path)?,
        None => MapSettings::default(),
    };
    if let Some(seed) = args.seed {
        settings = settings.with_master_seed(seed);
    }
    if args.no_text {
        settings.draw_text = false;
    }

    let graph = TerrainGraph::load(&args.graph)?;
    info!(width = graph.width, height = graph.height, centers = graph.centers.len(), "Loaded graph.");

    let rendered = MapCreator::new(settings).create(Some(graph), None)?;
    rendered.map.save(&args.output)?;
    info!(path = %args.output.display(), "Saved map.");

    if let Some(path) = &args.background_output {
        rendered.land_background.save(path)?;
        info!(path = %path.display(), "Saved land background.");
    }
    Ok(())
}
