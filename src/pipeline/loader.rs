//! Dataset loader for delimited text files in a declared encoding

use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use polars::prelude::*;
use tracing::{debug, warn};

use crate::config::InputOptions;
use crate::utils::{create_spinner, finish_with_success};

/// Load a delimited file wholly into memory.
///
/// The raw bytes are decoded from `options.encoding` (any WHATWG label such
/// as `latin1`, `windows-1252` or `utf-8`) before polars parses them, so the
/// CSV reader only ever sees UTF-8.
pub fn load_table(path: &Path, options: &InputOptions) -> Result<DataFrame> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    let text = decode_text(&bytes, &options.encoding)
        .with_context(|| format!("Failed to decode input file: {}", path.display()))?;

    parse_delimited(text.into_owned().into_bytes(), options, None)
        .with_context(|| format!("Failed to parse delimited file: {}", path.display()))
}

/// Load a dataset with a spinner, returning the frame plus shape and memory estimate
pub fn load_table_with_progress(
    path: &Path,
    options: &InputOptions,
) -> Result<(DataFrame, usize, usize, f64)> {
    let spinner = create_spinner(&format!("Loading {}...", path.display()));
    let df = load_table(path, options)?;
    let (rows, cols) = df.shape();
    let memory_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);
    finish_with_success(&spinner, &format!("Loaded {} rows × {} columns", rows, cols));
    Ok((df, rows, cols, memory_mb))
}

/// Read just the header row of a delimited file
pub fn read_column_names(path: &Path, options: &InputOptions) -> Result<Vec<String>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    let text = decode_text(&bytes, &options.encoding)?;
    let df = parse_delimited(text.into_owned().into_bytes(), options, Some(1))?;
    Ok(df.get_column_names().iter().map(|s| s.to_string()).collect())
}

/// Decode raw bytes using an encoding label.
///
/// Malformed sequences are replaced with U+FFFD and reported as a warning;
/// an unknown label is an error.
pub fn decode_text<'a>(bytes: &'a [u8], label: &str) -> Result<Cow<'a, str>> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| anyhow::anyhow!("Unsupported text encoding: '{}'", label))?;

    let (text, used, had_errors) = encoding.decode(bytes);
    debug!(encoding = used.name(), bytes = bytes.len(), "decoded input");
    if had_errors {
        warn!(
            encoding = used.name(),
            "input contained malformed sequences; they were replaced"
        );
    }
    Ok(text)
}

fn parse_delimited(bytes: Vec<u8>, options: &InputOptions, n_rows: Option<usize>) -> Result<DataFrame> {
    // 0 means full table scan
    let schema_length = if options.infer_schema_length == 0 {
        None
    } else {
        Some(options.infer_schema_length)
    };

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(schema_length)
        .with_n_rows(n_rows)
        .with_parse_options(CsvParseOptions::default().with_separator(options.separator as u8))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    Ok(df)
}
