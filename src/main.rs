use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use monocle::{
    config::{AppConfig, Config},
    overlay::{reading_order, selected_text},
    Extraction, Extractor, RecognitionConfig, StrategySet, TesseractRecognizer,
};

/// Recognise the words in a screenshot and print their bounding boxes.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Image to run OCR on.
    image: PathBuf,

    /// Keep only words recognised with a confidence strictly above this.
    #[arg(long)]
    min_confidence: Option<f32>,

    /// Run a single pass with the engine's default settings instead of the configured strategies.
    #[arg(long)]
    single_pass: bool,

    /// Stop waiting after this many milliseconds and print the words found so far.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print the recognised text instead of JSON.
    #[arg(long)]
    text: bool,
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = Args::parse();
    let config = AppConfig::load().context("Could not load main configuration file")?;

    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("Could not read image: `{}`", args.image.display()))?;
    let image = monocle::decode_image(&bytes)
        .with_context(|| format!("Could not decode image: `{}`", args.image.display()))?;

    let strategies = if args.single_pass {
        StrategySet::single(RecognitionConfig::default())
    } else {
        config.strategies
    };
    let min_confidence = args.min_confidence.unwrap_or(config.min_confidence);

    let extractor = Extractor::new(TesseractRecognizer::new(config.tesseract), strategies);
    let mut job = extractor.spawn(image, min_confidence);

    let words = match args.timeout_ms {
        Some(ms) => match job.wait_timeout(Duration::from_millis(ms))? {
            Extraction::Complete(words) => words,
            Extraction::TimedOut(words) => {
                log::warn!(
                    "OCR did not finish within {ms}ms, showing {} words from the passes that completed",
                    words.len()
                );
                words
            }
        },
        None => job.wait()?,
    };

    if args.text {
        println!("{}", selected_text(&words, &reading_order(&words)));
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(&words).context("Could not serialise word boxes")?
        );
    }

    Ok(())
}
