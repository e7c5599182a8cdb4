//! CLI for converting KML and GPX files to GeoJSON
//!
//! Usage:
//!   geojson_convert <INPUT>... [--format kml|gpx] [--out-dir DIR] [--pretty]
//!
//! A single input without `--out-dir` is written to stdout. Otherwise each
//! input produces `<stem>.geojson` in the output directory, or next to the
//! input; two inputs mapping to the same output file are an error. Inputs are
//! converted in parallel. `RUST_LOG` controls logging
//! (default `warn`); `RUST_LOG=info` adds per-file timing.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use geojson_converter::{to_feature_collection_auto, Dialect};
use rayon::prelude::*;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Kml,
    Gpx,
}

impl From<Format> for Dialect {
    fn from(format: Format) -> Self {
        match format {
            Format::Kml => Dialect::Kml,
            Format::Gpx => Dialect::Gpx,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "geojson_convert", version, about = "Convert KML and GPX files to GeoJSON")]
struct Args {
    /// KML or GPX files to convert
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Input dialect; detected from the file extension, then the root element, when omitted
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Directory for the `<stem>.geojson` outputs
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Indent the GeoJSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let forced = args.format.map(Dialect::from);

    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let to_stdout = args.out_dir.is_none() && args.inputs.len() == 1;
    if !to_stdout {
        check_output_collisions(&args.inputs, args.out_dir.as_deref())?;
    }

    let results: Vec<Result<String>> = args
        .inputs
        .par_iter()
        .map(|input| convert_file(input, forced, args.pretty))
        .collect();

    let mut failures = 0;
    for (input, result) in args.inputs.iter().zip(results) {
        let written = result.and_then(|json| write_output(input, &json, args.out_dir.as_deref(), to_stdout));
        if let Err(err) = written {
            failures += 1;
            tracing::error!("{}: {err:#}", input.display());
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} conversions failed", args.inputs.len());
    }
    Ok(())
}

fn convert_file(input: &Path, forced: Option<Dialect>, pretty: bool) -> Result<String> {
    let start = Instant::now();
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let (dialect, collection) = match forced.or_else(|| Dialect::from_path(input)) {
        Some(dialect) => (dialect, dialect.to_feature_collection(&text)?),
        None => to_feature_collection_auto(&text)?,
    };
    let json = if pretty {
        collection.to_json_pretty()?
    } else {
        collection.to_json()?
    };

    tracing::info!(
        file = %input.display(),
        %dialect,
        features = collection.features.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Converted"
    );
    Ok(json)
}

fn write_output(input: &Path, json: &str, out_dir: Option<&Path>, to_stdout: bool) -> Result<()> {
    if to_stdout {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        return Ok(());
    }

    let target = output_path(input, out_dir);
    std::fs::write(&target, json).with_context(|| format!("Failed to write {}", target.display()))?;
    tracing::debug!(target = %target.display(), "Wrote GeoJSON");
    Ok(())
}

/// `<stem>.geojson`, inside `out_dir` when given, otherwise beside the input
fn output_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    match out_dir {
        Some(dir) => {
            let mut file_name = input.file_stem().map(OsString::from).unwrap_or_default();
            file_name.push(".geojson");
            dir.join(file_name)
        }
        None => input.with_extension("geojson"),
    }
}

/// Fails when two inputs would be written to the same output file
fn check_output_collisions(inputs: &[PathBuf], out_dir: Option<&Path>) -> Result<()> {
    let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
    for input in inputs {
        let target = output_path(input, out_dir);
        if let Some(previous) = claimed.insert(target.clone(), input) {
            anyhow::bail!(
                "{} and {} would both be written to {}",
                previous.display(),
                input.display(),
                target.display()
            );
        }
    }
    Ok(())
}
