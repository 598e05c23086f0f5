//! Loading configuration, stepping the field and reporting results.

use std::fmt;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use contagion_core::{StatusCounts, TickId};
use contagion_engine::{FieldConfig, RealtimeConfig, RealtimeField, SimulationField, TimeSeries};
use serde::Serialize;
use tracing::{debug, info};

/// Everything `contagion run` needs, independent of the argument parser.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config: Option<PathBuf>,
    pub ticks: u64,
    pub seed: Option<u64>,
    pub destination: bool,
    /// Tick rate in Hz when stepping on the background thread.
    pub realtime: Option<f64>,
    pub until_eradicated: bool,
    pub output: Option<PathBuf>,
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub ticks_run: u64,
    pub final_tick: TickId,
    pub max_infected: u32,
    pub eradication_tick: Option<TickId>,
    pub counts: StatusCounts,
}

impl RunSummary {
    fn of(field: &SimulationField, ticks_run: u64) -> Self {
        Self {
            seed: field.seed(),
            ticks_run,
            final_tick: field.current_tick(),
            max_infected: field.max_infected(),
            eradication_tick: field.eradication_tick(),
            counts: field.counts(),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "seed:         {}", self.seed)?;
        writeln!(f, "ticks run:    {}", self.ticks_run)?;
        writeln!(f, "final tick:   {}", self.final_tick)?;
        writeln!(f, "max infected: {}", self.max_infected)?;
        match self.eradication_tick {
            Some(tick) => writeln!(f, "eradicated:   tick {tick}")?,
            None => writeln!(f, "eradicated:   no")?,
        }
        write!(
            f,
            "final counts: susceptible {} / infected {} / removed {}",
            self.counts.susceptible, self.counts.infected, self.counts.removed
        )
    }
}

/// Run one simulation as described by `opts`.
pub fn run(opts: &RunOptions) -> Result<RunSummary> {
    let config = load_config(opts.config.as_deref(), opts.seed)?;
    let mut field = SimulationField::new(config).context("invalid field configuration")?;
    field.set_destination_seeking(opts.destination);
    info!(
        population = field.subjects().len(),
        seed = field.seed(),
        ticks = opts.ticks,
        realtime = opts.realtime.is_some(),
        "Starting simulation"
    );

    let (summary, series) = match opts.realtime {
        None => run_lockstep(field, opts),
        Some(rate) => run_realtime(field, rate, opts)?,
    };

    if let Some(path) = &opts.output {
        write_time_series(path, &series)?;
        info!(path = %path.display(), samples = series.len(), "Time series written");
    }
    info!(
        ticks = summary.ticks_run,
        max_infected = summary.max_infected,
        "Simulation finished"
    );
    Ok(summary)
}

/// The default configuration rendered as TOML.
pub fn default_config_toml() -> Result<String> {
    FieldConfig::default()
        .to_toml()
        .context("could not render default configuration")
}

fn load_config(path: Option<&Path>, seed: Option<u64>) -> Result<FieldConfig> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("could not read {}", path.display()))?;
            FieldConfig::from_toml(&text)
                .with_context(|| format!("invalid configuration in {}", path.display()))?
        }
        None => FieldConfig::default(),
    };
    if seed.is_some() {
        config.seed = seed;
    }
    Ok(config)
}

fn run_lockstep(mut field: SimulationField, opts: &RunOptions) -> (RunSummary, TimeSeries) {
    let mut ticks_run = 0;
    while ticks_run < opts.ticks {
        if opts.until_eradicated && field.eradication_tick().is_some() {
            break;
        }
        field.advance();
        ticks_run += 1;
    }
    (RunSummary::of(&field, ticks_run), field.time_series().clone())
}

fn run_realtime(
    field: SimulationField,
    rate: f64,
    opts: &RunOptions,
) -> Result<(RunSummary, TimeSeries)> {
    // The driver pauses itself on the target tick.
    let realtime = RealtimeConfig {
        tick_rate_hz: rate,
        tick_limit: (opts.ticks > 0).then_some(opts.ticks),
        ..RealtimeConfig::default()
    };
    let mut driver = RealtimeField::from_field(field, realtime)
        .context("could not start realtime driver")?;
    let poll = driver.config().tick_budget().min(Duration::from_millis(50));

    let mut cursor = 0;
    loop {
        let (published, next) = driver.snapshots_since(cursor);
        cursor = next;
        for snap in &published {
            debug!(
                tick = snap.tick.0,
                susceptible = snap.counts.susceptible,
                infected = snap.counts.infected,
                removed = snap.counts.removed,
                "Progress"
            );
        }
        if driver.ticks_advanced() >= opts.ticks {
            break;
        }
        if opts.until_eradicated && published.iter().any(|s| s.eradication_tick.is_some()) {
            break;
        }
        thread::sleep(poll);
    }

    let report = driver.shutdown();
    Ok(driver.with_field(|field| {
        (
            RunSummary::of(field, report.ticks_advanced),
            field.time_series().clone(),
        )
    }))
}

fn write_time_series(path: &Path, series: &TimeSeries) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("could not create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), series)
        .with_context(|| format!("could not write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contagion_test_utils::certain_spread_config;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("contagion-cli-{}-{name}", std::process::id()))
    }

    #[test]
    fn lockstep_runs_requested_ticks() {
        let summary = run(&RunOptions {
            ticks: 25,
            seed: Some(3),
            ..RunOptions::default()
        })
        .unwrap();
        assert_eq!(summary.ticks_run, 25);
        assert_eq!(summary.seed, 3);
        assert_eq!(summary.final_tick, TickId(201 + 25));
        assert_eq!(summary.counts.total(), 200);
    }

    #[test]
    fn until_eradicated_stops_early() {
        let path = temp_path("outbreak.toml");
        let text = certain_spread_config(10).to_toml().unwrap();
        fs::write(&path, text).unwrap();

        let summary = run(&RunOptions {
            config: Some(path.clone()),
            ticks: 10_000,
            until_eradicated: true,
            ..RunOptions::default()
        })
        .unwrap();
        fs::remove_file(&path).ok();

        let eradicated = summary.eradication_tick.expect("outbreak burns out");
        assert_eq!(summary.final_tick, eradicated.next());
        assert!(summary.ticks_run < 10_000);
        assert_eq!(summary.counts.removed, 10);
    }

    #[test]
    fn output_is_json_time_series() {
        let path = temp_path("series.json");
        run(&RunOptions {
            ticks: 10,
            seed: Some(5),
            output: Some(path.clone()),
            ..RunOptions::default()
        })
        .unwrap();
        let text = fs::read_to_string(&path).unwrap();
        fs::remove_file(&path).ok();

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        let samples = value["samples"].as_array().unwrap();
        assert_eq!(samples.len(), 10);
        assert_eq!(samples[0]["tick"], 201);
        assert!(samples[0]["counts"]["infected"].is_u64());
    }

    #[test]
    fn seed_flag_overrides_file() {
        let config = load_config(None, Some(11)).unwrap();
        assert_eq!(config.seed, Some(11));
        assert_eq!(load_config(None, None).unwrap().seed, None);
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = load_config(Some(Path::new("/nonexistent/contagion.toml")), None).unwrap_err();
        assert!(format!("{err:#}").contains("could not read"));
    }

    #[test]
    fn realtime_run_reaches_tick_target() {
        let summary = run(&RunOptions {
            ticks: 20,
            seed: Some(8),
            realtime: Some(1_000.0),
            ..RunOptions::default()
        })
        .unwrap();
        assert_eq!(summary.ticks_run, 20);
        assert_eq!(summary.final_tick, TickId(201 + 20));
        assert_eq!(summary.counts.total(), 200);
    }

    #[test]
    fn invalid_rate_is_an_error() {
        let err = run(&RunOptions {
            ticks: 1,
            realtime: Some(0.0),
            ..RunOptions::default()
        })
        .unwrap_err();
        assert!(format!("{err:#}").contains("tick_rate_hz"));
    }

    #[test]
    fn defaults_parse_back() {
        let text = default_config_toml().unwrap();
        assert_eq!(FieldConfig::from_toml(&text).unwrap(), FieldConfig::default());
    }
}
