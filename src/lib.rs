//! Geometry-aware delimited text reader.
//!
//! `csv-spatial` turns header-annotated, delimiter-separated text into a
//! strongly-typed tabular dataset: an ordered field schema plus typed
//! records, one field of which may carry spatial geometry. Header cells
//! follow the grammar `name[:type[:crsId]]`; geometry is obtained either
//! from a single encoded column (WKT, hex WKB, GeoJSON, KML, GML2, GML3) or
//! synthesized from two coordinate columns (XY or lon/lat, with DMS
//! fallback).
//!
//! The library surface is [`reader::CsvReader`]; the binary wraps it with
//! `schema` and `preview` subcommands.

pub mod cli;
pub mod error;
pub mod geometry;
pub mod header;
pub mod reader;
pub mod schema;
pub mod value;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::cli::{Cli, Commands, PreviewArgs, ReadArgs};
use crate::reader::CsvReader;
use crate::value::Value;

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_spatial", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Schema(args) => handle_schema(&args),
        Commands::Preview(args) => handle_preview(&args),
    }
}

fn handle_schema(args: &ReadArgs) -> Result<()> {
    let reader = CsvReader::new(args.reader_options());
    let dataset = reader
        .read_path(&args.input)
        .with_context(|| format!("Reading {:?}", args.input))?;
    for field in &dataset.schema.fields {
        println!("{}: {}", field.name, field.ty);
    }
    if let Some(crs) = &dataset.schema.crs {
        println!("crs: {crs}");
    }
    info!(
        "Resolved {} field(s) over {} record(s) from {:?}",
        dataset.schema.fields.len(),
        dataset.records.len(),
        args.input
    );
    Ok(())
}

fn handle_preview(args: &PreviewArgs) -> Result<()> {
    let options = args.read.reader_options();
    let delimiter = printable_delimiter(options.separator);
    let reader = CsvReader::new(options);
    let dataset = reader
        .read_path(&args.read.input)
        .with_context(|| format!("Reading {:?}", args.read.input))?;

    let header: Vec<&str> = dataset
        .schema
        .fields
        .iter()
        .map(|field| field.name.as_str())
        .collect();
    println!("{}", header.join(&delimiter));
    for record in dataset.records.iter().take(args.limit) {
        let cells: Vec<String> = record
            .values()
            .iter()
            .map(|value| value.as_ref().map(Value::as_display).unwrap_or_default())
            .collect();
        println!("{}", cells.join(&delimiter));
    }
    info!(
        "Displayed {} of {} record(s) from {:?}",
        dataset.records.len().min(args.limit),
        dataset.records.len(),
        args.read.input
    );
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\t".to_string(),
        other => (other as char).to_string(),
    }
}
