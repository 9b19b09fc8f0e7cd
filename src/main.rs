//! Isomarch CLI - marching-squares contour images.

use anyhow::{bail, Context};
use isomarch::io::{load_contour_patterns, read_image, write_image};
use isomarch::prelude::*;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Directory checked for pattern files when `--contours` is not given.
const DEFAULT_CONTOUR_DIR: &str = "contours";

struct Options {
    input: PathBuf,
    output: PathBuf,
    threads: usize,
    contours: Option<PathBuf>,
    config: Option<PathBuf>,
    step: Option<usize>,
    sigma: Option<u8>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("isomarch");

    if args.len() == 2 && matches!(args[1].as_str(), "help" | "--help" | "-h") {
        print_usage(program);
        return ExitCode::SUCCESS;
    }

    let options = match parse_args(&args[1..]) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {e}");
            print_usage(program);
            return ExitCode::FAILURE;
        }
    };

    match contour(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_usage(program: &str) {
    eprintln!("Isomarch v{}", isomarch::VERSION);
    eprintln!();
    eprintln!("Usage: {program} <in_file> <out_file> <threads> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --contours <dir>   Pattern directory holding 0.ppm .. 15.ppm");
    eprintln!("                     (default: ./{DEFAULT_CONTOUR_DIR} if present, else generated)");
    eprintln!("  --config <file>    TOML pipeline configuration");
    eprintln!("  --step <n>         Grid step in both directions (default: 8)");
    eprintln!("  --sigma <n>        Brightness threshold 0-255 (default: 200)");
}

fn parse_args(args: &[String]) -> anyhow::Result<Options> {
    if args.len() < 3 {
        bail!("expected <in_file> <out_file> <threads>");
    }
    let threads: usize = args[2]
        .parse()
        .with_context(|| format!("invalid thread count '{}'", args[2]))?;

    let mut options = Options {
        input: PathBuf::from(&args[0]),
        output: PathBuf::from(&args[1]),
        threads,
        contours: None,
        config: None,
        step: None,
        sigma: None,
    };

    let mut i = 3;
    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--contours", Some(v)) => options.contours = Some(PathBuf::from(v)),
            ("--config", Some(v)) => options.config = Some(PathBuf::from(v)),
            ("--step", Some(v)) => {
                options.step = Some(v.parse().with_context(|| format!("invalid step '{v}'"))?);
            }
            ("--sigma", Some(v)) => {
                options.sigma = Some(v.parse().with_context(|| format!("invalid sigma '{v}'"))?);
            }
            (flag, _) => bail!("unknown or incomplete option '{flag}'"),
        }
        i += 2;
    }
    Ok(options)
}

fn contour(options: &Options) -> anyhow::Result<()> {
    let mut config = match &options.config {
        Some(path) => PipelineConfig::from_toml_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(step) = options.step {
        config = config.with_step(step, step);
    }
    if let Some(sigma) = options.sigma {
        config = config.with_sigma(sigma);
    }

    let orchestrator = PhaseOrchestrator::new(config, options.threads)?;
    let patterns = resolve_patterns(options.contours.as_deref(), &config)?;
    let image = read_image(&options.input)?;

    let output = orchestrator.run(image, &patterns)?;
    for stage in [Stage::Rescale, Stage::SampleInterior, Stage::Stamp] {
        let units = output.stats.stage_units(stage);
        if units > 0 {
            info!("{stage}: {units} rows, {:?} worker time", output.stats.stage_total(stage));
        }
    }

    write_image(&output.image, &options.output)?;
    info!("wrote {} ({})", options.output.display(), output.image.dimensions());
    Ok(())
}

fn resolve_patterns(
    dir: Option<&Path>,
    config: &PipelineConfig,
) -> IsomarchResult<ContourPatterns> {
    if let Some(dir) = dir {
        return load_contour_patterns(dir);
    }
    let default_dir = Path::new(DEFAULT_CONTOUR_DIR);
    if default_dir.is_dir() {
        return load_contour_patterns(default_dir);
    }
    warn!("no pattern directory found, generating {} patterns", config.cell_size());
    Ok(ContourPatterns::generate(config.step_x, config.step_y)?)
}
