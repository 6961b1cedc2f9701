use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use coiffe_core::{analyze_face, calculate_overlay_position, landmarks_from_json, Landmark};
use coiffe_render::{canvas_handle, export_png, Canvas, RenderOutcome, RenderPipeline, SourceFetcher};
use std::path::{Path, PathBuf};

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "coiffe", about = "Face-shape analysis and hairstyle preview")]
struct Cli {
    /// TOML config file (overrides $COIFFE_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify face shape from a landmark file
    Analyze {
        /// JSON landmark file from the face-mesh detector
        #[arg(short, long)]
        landmarks: PathBuf,
        /// Source image width in pixels
        #[arg(long)]
        width: f64,
        /// Source image height in pixels
        #[arg(long)]
        height: f64,
        /// Print the full classification as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print where a hairstyle template goes on a canvas
    Overlay {
        #[arg(short, long)]
        landmarks: PathBuf,
        #[arg(long)]
        canvas_width: f64,
        #[arg(long)]
        canvas_height: f64,
        /// Template height divided by width
        #[arg(long)]
        aspect: f64,
    },
    /// Render a hairstyle preview over a photo and write it as PNG
    Preview {
        /// Photo source: path, file:// URL or data: URI
        #[arg(long)]
        photo: String,
        /// Hairstyle template source
        #[arg(long)]
        hairstyle: String,
        #[arg(short, long)]
        landmarks: PathBuf,
        /// Output PNG path
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long)]
        display_width: Option<u32>,
        #[arg(long)]
        display_height: Option<u32>,
        #[arg(long)]
        dpr: Option<f64>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze { landmarks, width, height, json } => {
            let points = read_landmarks(&landmarks)?;
            let classification = analyze_face(&points, width, height)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&classification)?);
            } else {
                let m = &classification.measurements;
                println!(
                    "Face shape: {} ({}% confidence)",
                    classification.shape, classification.confidence
                );
                println!("{}", classification.reasoning);
                println!(
                    "width/height {:.2}  jaw/cheekbone {:.2}  forehead/jaw {:.2}  forehead/cheekbone {:.2}",
                    m.width_height_ratio, m.jaw_cheek_ratio, m.forehead_jaw_ratio, m.forehead_cheek_ratio
                );
            }
        }
        Commands::Overlay { landmarks, canvas_width, canvas_height, aspect } => {
            let points = read_landmarks(&landmarks)?;
            let position = calculate_overlay_position(&points, canvas_width, canvas_height, aspect)?;
            println!("{}", serde_json::to_string_pretty(&position)?);
        }
        Commands::Preview {
            photo,
            hairstyle,
            landmarks,
            out,
            display_width,
            display_height,
            dpr,
        } => {
            let points = read_landmarks(&landmarks)?;
            let canvas = canvas_handle(Canvas::new(
                display_width.unwrap_or(config.display_width),
                display_height.unwrap_or(config.display_height),
                dpr.unwrap_or(config.device_pixel_ratio),
            ));
            let pipeline = RenderPipeline::new(SourceFetcher);

            match pipeline.render_preview(&canvas, &photo, &hairstyle, &points).await? {
                RenderOutcome::Drawn { overlay, .. } => {
                    tracing::debug!(?overlay, "preview drawn");
                }
                RenderOutcome::Superseded { generation, latest } => {
                    bail!("render {generation} superseded by {latest}");
                }
            }

            let out = out.unwrap_or(config.output);
            let png = export_png(&canvas).await?;
            tokio::fs::write(&out, &png)
                .await
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Preview written to {}", out.display());
        }
    }

    Ok(())
}

fn read_landmarks(path: &Path) -> Result<Vec<Landmark>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading landmarks {}", path.display()))?;
    let points = landmarks_from_json(&text)
        .with_context(|| format!("parsing landmarks {}", path.display()))?;
    tracing::debug!(path = %path.display(), count = points.len(), "landmarks loaded");
    Ok(points)
}
