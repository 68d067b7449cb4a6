use clap::{Parser, Subcommand};
use cli::{Overrides, RunConfig};
use color_eyre::eyre::{bail, Result};
use drawing::{load_document, ConverterConfig, DwgConverter};
use rooms::{layers::collect_layers, BatchRunner, LayerClassifier, Pipeline};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract rooms from a drawing, or from every drawing in a directory
    Extract {
        /// A .dxf, .dwg or .json drawing, or a directory of them
        input: PathBuf,
        /// Output directory; one sub-directory per drawing
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Run configuration (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Smallest raster room as a percentage of the image
        #[arg(long = "area")]
        min_area_percent: Option<f64>,
        /// Largest raster room as a percentage of the image
        #[arg(long = "max-area")]
        max_area_percent: Option<f64>,
        /// Raster image size in pixels
        #[arg(long = "size")]
        image_size: Option<u32>,
        /// ODA File Converter executable for DWG input
        #[arg(long)]
        oda_path: Option<PathBuf>,
        /// Write intermediate raster images here
        #[arg(long)]
        debug_dir: Option<PathBuf>,
    },
    /// Print how each layer of a drawing is classified
    Layers {
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Convert a DWG file to DXF
    Convert {
        input: PathBuf,
        /// Target file; defaults to the input with a .dxf extension
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        oda_path: Option<PathBuf>,
    },
    /// Print the JSON schema of the run configuration
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input,
            output_dir,
            config,
            min_area_percent,
            max_area_percent,
            image_size,
            oda_path,
            debug_dir,
        } => {
            let mut run_config = load_config(config.as_deref())?;
            run_config.apply(Overrides {
                output_dir,
                min_area_percent,
                max_area_percent,
                image_size,
                oda_path,
                debug_dir,
            });
            extract(&input, run_config)?;
        }
        Commands::Layers { input, config } => {
            let run_config = load_config(config.as_deref())?;
            print_layers(&input, &run_config)?;
        }
        Commands::Convert {
            input,
            output,
            oda_path,
        } => {
            let converter = DwgConverter::new(ConverterConfig {
                oda_path,
                ..ConverterConfig::default()
            });
            let output = output.unwrap_or_else(|| input.with_extension("dxf"));
            let written = converter.convert(&input, &output)?;
            info!("✅ Wrote {}", written.display());
        }
        Commands::Schema => {
            println!("{}", RunConfig::schema()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            Ok(RunConfig::from_file(path)?)
        }
        None => Ok(RunConfig::default()),
    }
}

fn extract(input: &Path, config: RunConfig) -> Result<()> {
    let pipeline = Pipeline::builder().with_config(&config.extraction).build();
    info!("{}", pipeline.info());

    let runner = BatchRunner::new(pipeline, DwgConverter::new(config.converter), &config.output_dir);
    let summary = if input.is_dir() {
        runner.run_directory(input)?
    } else {
        runner.run(&[input.to_path_buf()])
    };

    for outcome in &summary.succeeded {
        info!(
            "{}: {} rooms -> {}",
            outcome.input.display(),
            outcome.room_count,
            outcome.output_dir.display()
        );
    }
    for failure in &summary.failed {
        error!("{}: {}", failure.input.display(), failure.error);
    }

    if summary.total() == 0 {
        warn!("No drawings found in {}", input.display());
    } else if summary.succeeded.is_empty() {
        bail!("All {} drawings failed", summary.total());
    } else {
        info!("✅ Room extraction completed!");
    }
    Ok(())
}

fn print_layers(input: &Path, config: &RunConfig) -> Result<()> {
    let document = load_document(input, &DwgConverter::new(config.converter.clone()))?;
    let layers = collect_layers(&document);
    let classifier = LayerClassifier::new(
        config.extraction.layers.rules.clone(),
        config.extraction.layers.structural.clone(),
    );
    let classification = classifier.classify(&layers);

    println!("{:<32} {:<12} {:>5} {:>8} {:>8} {:>6}", "LAYER", "CATEGORY", "ROOM", "LINES", "POLYS", "TEXT");
    for (name, info) in &layers {
        let (category, room) = classification
            .layers
            .get(name)
            .map(|c| (c.category.to_string(), c.room))
            .unwrap_or_else(|| ("-".to_string(), false));
        println!(
            "{:<32} {:<12} {:>5} {:>8} {:>8} {:>6}",
            name,
            category,
            if room { "yes" } else { "" },
            info.line_count(),
            info.polyline_count(),
            info.text_count()
        );
    }

    for overlap in classification.overlaps() {
        warn!(
            "Layer '{}' is both a room layer and a {} layer",
            overlap.layer, overlap.with
        );
    }
    println!("Keep set: {:?}", classification.keep_set());
    Ok(())
}
