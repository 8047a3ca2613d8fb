//! Error-sample input format
//!
//! One sample per line, either `error` or `error,delta_t`. Blank lines and lines
//! starting with `#` are skipped. Whitespace around fields is ignored.

use anyhow::{Context, Result};
use std::io::BufRead;
use tickpid_core::{TickPidError, TickPidResult};

/// One parsed input line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSample {
    /// 1-based line number in the source
    pub line: usize,
    pub error: f64,
    /// Elapsed time since the previous sample (seconds), if the line gave one
    pub delta_t: Option<f64>,
}

/// Parse a single line; `Ok(None)` for blank and comment lines
pub fn parse_line(line: &str) -> TickPidResult<Option<(f64, Option<f64>)>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.split(',').map(str::trim);
    let error = parse_field(fields.next(), "error")?;
    let delta_t = match fields.next() {
        Some(field) => Some(parse_field(Some(field), "delta_t")?),
        None => None,
    };
    if fields.next().is_some() {
        return Err(TickPidError::invalid_input(format!(
            "expected `error` or `error,delta_t`, got '{}'",
            line
        )));
    }

    Ok(Some((error, delta_t)))
}

fn parse_field(field: Option<&str>, name: &str) -> TickPidResult<f64> {
    let field = field.unwrap_or_default();
    field
        .parse::<f64>()
        .map_err(|e| TickPidError::invalid_input(format!("bad {} '{}': {}", name, field, e)))
}

/// Read every sample from `reader`
pub fn read_samples<R: BufRead>(reader: R) -> Result<Vec<InputSample>> {
    let mut samples = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("reading line {}", line_no))?;
        if let Some((error, delta_t)) =
            parse_line(&line).with_context(|| format!("line {}", line_no))?
        {
            samples.push(InputSample {
                line: line_no,
                error,
                delta_t,
            });
        }
    }

    Ok(samples)
}

/// Convert per-sample elapsed times into absolute timestamps in nanoseconds
///
/// The first sample sits at 0. A missing, non-positive or non-finite
/// `delta_t` falls back to `default_dt`; a non-positive `default_dt` leaves
/// the timestamp unchanged.
pub fn timestamps(samples: &[InputSample], default_dt: f64) -> Vec<u64> {
    let mut now = 0u64;
    samples
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            if i > 0 {
                let dt = sample
                    .delta_t
                    .filter(|dt| dt.is_finite() && *dt > 0.0)
                    .unwrap_or(default_dt);
                if dt.is_finite() && dt > 0.0 {
                    now = now.saturating_add((dt * 1e9).round() as u64);
                }
            }
            now
        })
        .collect()
}
