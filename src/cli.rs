use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::reader::{GeometryMode, ReaderOptions};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

#[derive(Debug, Parser)]
#[command(author, version, about = "Read geometry-aware delimited text", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve and print the schema of a delimited file
    Schema(ReadArgs),
    /// Decode a delimited file and print its records
    Preview(PreviewArgs),
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    /// Input file to read
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Geometry acquisition mode
    #[arg(long = "mode", value_enum, default_value_t = GeometryMode::Wkt)]
    pub mode: GeometryMode,
    /// Geometry column name for one-column modes
    #[arg(long = "geometry-column", default_value = "geom")]
    pub geometry_column: String,
    /// X source column (xy mode)
    #[arg(long = "x-column")]
    pub x_column: Option<String>,
    /// Y source column (xy mode)
    #[arg(long = "y-column")]
    pub y_column: Option<String>,
    /// Longitude source column (latlon mode)
    #[arg(long = "lon-column")]
    pub lon_column: Option<String>,
    /// Latitude source column (latlon mode)
    #[arg(long = "lat-column")]
    pub lat_column: Option<String>,
    /// Cell delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
}

impl ReadArgs {
    pub fn reader_options(&self) -> ReaderOptions {
        ReaderOptions {
            separator: resolve_input_delimiter(&self.input, self.delimiter),
            geometry_mode: self.mode,
            geometry_column: self.geometry_column.clone(),
            x_column: self.x_column.clone(),
            y_column: self.y_column.clone(),
            lon_column: self.lon_column.clone(),
            lat_column: self.lat_column.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub read: ReadArgs,
    /// Maximum number of records to print
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_spellings() {
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert_eq!(parse_delimiter("|").unwrap(), b'|');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert!(parse_delimiter("ab").is_err());
    }

    #[test]
    fn tsv_extension_switches_default_delimiter() {
        assert_eq!(
            resolve_input_delimiter(Path::new("points.tsv"), None),
            b'\t'
        );
        assert_eq!(resolve_input_delimiter(Path::new("points.csv"), None), b',');
        assert_eq!(
            resolve_input_delimiter(Path::new("points.tsv"), Some(b'|')),
            b'|'
        );
    }
}
