//! `sketch2image` CLI - Generate an image from a sketch.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sketch2image::{Config, Pipeline};

/// Generate an image from a sketch with a pre-trained image-to-image model.
#[derive(Parser, Debug)]
#[command(name = "sketch2image")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input sketch path.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output image path.
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// ONNX model file. Defaults to the model in the user cache directory.
    #[arg(short, long, value_name = "PATH")]
    model: Option<PathBuf>,

    /// Output JPEG quality (1-100).
    #[arg(short, long, default_value = "95", value_name = "INT")]
    quality: u8,

    /// Log model input and output tensors (summary at debug, values at trace).
    #[arg(long)]
    dump_tensors: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = default_log_level(&args);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("sketch2image={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        eprintln!("Error processing image");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Tensor dumps log every value at trace level, so they need the lowest filter.
const fn default_log_level(args: &Args) -> &'static str {
    if args.dump_tensors {
        "trace"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    }
}

fn run(args: &Args) -> Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Please select an image first: {} does not exist", args.input.display());
    }

    let config = Config {
        model_path: args.model.clone(),
        output_quality: args.quality,
        log_tensors: args.dump_tensors,
        ..Config::default()
    };

    let pipeline = Pipeline::new(config).context("Failed to initialize pipeline")?;

    pipeline
        .process(&args.input, &args.output)
        .context("Failed to process image")?;

    println!(
        "Processing complete: {} -> {}",
        args.input.display(),
        args.output.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["sketch2image", "in.png", "out.png"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_default_log_level() {
        assert_eq!(default_log_level(&parse(&[])), "info");
        assert_eq!(default_log_level(&parse(&["--verbose"])), "debug");
        assert_eq!(default_log_level(&parse(&["--dump-tensors"])), "trace");
        assert_eq!(default_log_level(&parse(&["-v", "--dump-tensors"])), "trace");
    }
}
