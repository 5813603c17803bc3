//! Analyze one or more photos and print the detection result as JSON.
//!
//! Usage:
//!   cargo run --example analyze_photo -- photo.jpg
//!   cargo run --example analyze_photo -- --model seeta_fd_frontal_v1.0.bin --gender male a.png b.jpg
//!
//! Set `RUST_LOG=skintone=debug` to trace each pipeline stage.

use std::path::PathBuf;

use clap::Parser;
use skintone::recommend::{recommend_or_template, TemplateRecommender};
use skintone::{AnalyzerConfig, Presentation, SkinToneAnalyzer};

#[derive(Parser, Debug)]
#[command(name = "analyze_photo")]
#[command(about = "Estimate skin tone from portrait photos", long_about = None)]
struct Args {
    /// Input image files
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// SeetaFace detector model path. Without it, the center region is sampled.
    #[arg(long)]
    model: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Face margin ratio
    #[arg(long)]
    margin: Option<f64>,

    /// Presentation for the palette suggestion (male | female)
    #[arg(long)]
    gender: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AnalyzerConfig::from_file(path)?,
        None => AnalyzerConfig::default(),
    };
    if args.model.is_some() {
        config.model_path = args.model.clone();
    }
    if let Some(margin) = args.margin {
        config.margin_ratio = margin;
    }

    let analyzer = SkinToneAnalyzer::with_config(config)?;
    let presentation = Presentation::from_form_value(args.gender.as_deref());

    for path in &args.images {
        let result = analyzer.analyze(path);
        println!("{}: {}", path.display(), result.to_json()?);

        let rec = recommend_or_template(&TemplateRecommender, result.tone, presentation, result.rgb);
        println!(
            "  palette: {} / {} / {}",
            rec.color_palette.primary, rec.color_palette.secondary, rec.color_palette.accent
        );
    }

    Ok(())
}
