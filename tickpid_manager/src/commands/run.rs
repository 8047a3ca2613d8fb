//! `tickpid run`: replay an error sequence through the controller node

use crate::input::{read_samples, timestamps};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use tickpid_core::{RuntimeParams, Scheduler};
use tickpid_library::nodes::pid_controller::DEFAULT_DELTA_T;
use tickpid_library::{ControlOutput, ErrorSample, PidConfig, PidControllerNode};

/// Options for a replay run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Sample file; stdin when absent
    pub input: Option<PathBuf>,
    /// Parameter file; `.tickpid/params.yaml` (or defaults) when absent
    pub params: Option<PathBuf>,
    pub kp: Option<f64>,
    pub ki: Option<f64>,
    pub kd: Option<f64>,
    /// Time step for samples that do not carry one
    pub dt: Option<f64>,
    /// Print one JSON object per output instead of a table
    pub json: bool,
}

/// Resolve gains: parameter store first, then command-line overrides
pub fn resolve_config(options: &RunOptions, params: &RuntimeParams) -> Result<PidConfig> {
    let mut config = PidConfig::from_params(params).context("reading gains")?;
    if let Some(kp) = options.kp {
        config.kp = kp;
    }
    if let Some(ki) = options.ki {
        config.ki = ki;
    }
    if let Some(kd) = options.kd {
        config.kd = kd;
    }
    Ok(config)
}

fn load_params(options: &RunOptions) -> Result<RuntimeParams> {
    let params = match &options.params {
        Some(path) => RuntimeParams::from_file(path)
            .with_context(|| format!("loading parameters from {}", path.display()))?,
        None => RuntimeParams::init()?,
    };
    if let Some(dt) = options.dt {
        params.set("pid_default_dt", dt)?;
    }
    Ok(params)
}

/// Run the replay, writing outputs to `out`. Returns the number of outputs written.
pub fn run(options: &RunOptions, out: &mut impl Write) -> Result<usize> {
    let params = load_params(options)?;
    let config = resolve_config(options, &params)?;
    if !config.is_finite() {
        tracing::warn!(
            "Non-finite gains (kp={}, ki={}, kd={}); outputs will not be finite",
            config.kp,
            config.ki,
            config.kd
        );
    }

    let samples = match &options.input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            read_samples(BufReader::new(file))
                .with_context(|| format!("reading samples from {}", path.display()))?
        }
        None => read_samples(io::stdin().lock()).context("reading samples from stdin")?,
    };
    tracing::info!(
        "Replaying {} samples with kp={} ki={} kd={}",
        samples.len(),
        config.kp,
        config.ki,
        config.kd
    );

    let default_dt = params.get_checked("pid_default_dt", DEFAULT_DELTA_T)?;
    let stamps = timestamps(&samples, default_dt);

    let (node, sample_tx, output_rx) = PidControllerNode::with_channels(config);
    let mut scheduler = Scheduler::new().with_name("tickpid_run").with_params(params);
    scheduler.add(Box::new(node), 0, Some(true));

    if !options.json {
        writeln!(
            out,
            "{:>6} {:>12} {:>10} {:>12} {:>12} {:>12} {:>12}",
            "tick", "error", "dt", "eP", "eI", "eD", "u"
        )?;
    }

    let mut written = 0;
    for (sample, &timestamp_ns) in samples.iter().zip(&stamps) {
        let mut message = ErrorSample::at(sample.error, timestamp_ns);
        if let Some(delta_t) = sample.delta_t {
            message = message.with_delta_t(delta_t);
        }
        sample_tx
            .send(message)
            .context("controller node stopped accepting samples")?;
        scheduler.tick_once()?;

        for output in output_rx.try_iter() {
            write_output(out, &output, options.json)?;
            written += 1;
        }
    }

    scheduler.shutdown();
    out.flush()?;

    tracing::info!("Wrote {} outputs", written);
    Ok(written)
}

fn write_output(out: &mut impl Write, output: &ControlOutput, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string(output)?)?;
    } else {
        let t = &output.terms;
        writeln!(
            out,
            "{:>6} {:>12.6} {:>10.6} {:>12.6} {:>12.6} {:>12.6} {:>12.6}",
            output.tick, t.error, output.delta_t, t.e_p, t.e_i, t.e_d, t.u
        )?;
    }
    Ok(())
}
