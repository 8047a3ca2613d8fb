//! `tickpid params`: inspect and edit the YAML parameter file

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tickpid_core::{RuntimeParams, TickPidError};

fn open(path: &Path) -> Result<RuntimeParams> {
    if path.exists() {
        RuntimeParams::from_file(path).with_context(|| format!("loading {}", path.display()))
    } else {
        Ok(RuntimeParams::with_defaults())
    }
}

/// Interpret a command-line value as JSON (numbers, booleans, lists), falling back to a string
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Print every parameter as `key: value`
pub fn list(path: &Path, out: &mut impl Write) -> Result<()> {
    for (key, value) in open(path)?.get_all() {
        writeln!(out, "{}: {}", key, value)?;
    }
    Ok(())
}

/// Print a single parameter value
pub fn get(path: &Path, key: &str, out: &mut impl Write) -> Result<()> {
    let value: Value = open(path)?.require(key)?;
    writeln!(out, "{}", value)?;
    Ok(())
}

/// Set a parameter and save the file
///
/// Controller parameters (`pid_*`) must be numbers.
pub fn set(path: &Path, key: &str, raw: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(TickPidError::invalid_input("parameter key must not be empty").into());
    }
    let value = parse_value(raw);
    if key.starts_with("pid_") && !value.is_number() {
        return Err(TickPidError::invalid_input(format!(
            "'{}' must be a number, got '{}'",
            key, raw
        ))
        .into());
    }
    let params = open(path)?;
    params.set(key, value)?;
    params
        .save_to(path)
        .with_context(|| format!("saving {}", path.display()))?;
    tracing::info!("Set {} = {} in {}", key, raw, path.display());
    Ok(())
}

/// Restore the defaults and save the file
pub fn reset(path: &Path) -> Result<()> {
    let params = RuntimeParams::with_defaults();
    params
        .save_to(path)
        .with_context(|| format!("saving {}", path.display()))?;
    tracing::info!("Reset parameters in {}", path.display());
    Ok(())
}
