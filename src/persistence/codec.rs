//! Text Model Codec
//!
//! One entry per line: `word v1 v2 ... vN`. No header, the dimension is
//! implied by the number of components.

use std::fmt::Write as _;
use std::io::{self, Write};

/// Parse a single model row into its word and vector.
///
/// Tokens are split on any whitespace run, so tab-separated rows and
/// trailing `\r` are accepted. Returns the failure reason on a malformed row.
pub fn parse_line(line: &str) -> Result<(String, Vec<f64>), String> {
    let mut tokens = line.split_whitespace();

    let word = tokens.next().ok_or_else(|| "empty row".to_string())?;

    let vector = tokens
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|e| format!("could not parse float '{}' for '{}': {}", token, word, e))
        })
        .collect::<Result<Vec<f64>, String>>()?;

    if vector.is_empty() {
        return Err(format!("no vector components for '{}'", word));
    }

    Ok((word.to_string(), vector))
}

/// Format a single entry as a model row (without the trailing newline).
///
/// Components use fixed-point notation with 6 fraction digits.
pub fn format_entry(word: &str, vector: &[f64]) -> String {
    let mut row = String::with_capacity(word.len() + vector.len() * 10);
    row.push_str(word);
    for value in vector {
        let _ = write!(row, " {:.6}", value);
    }
    row
}

/// Write a single entry followed by a newline
pub fn write_entry<W: Write>(writer: &mut W, word: &str, vector: &[f64]) -> io::Result<()> {
    let mut row = format_entry(word, vector);
    row.push('\n');
    writer.write_all(row.as_bytes())
}
