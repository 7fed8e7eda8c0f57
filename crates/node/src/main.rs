mod clock;
mod config;
mod report;
mod sensor;
#[cfg(feature = "sim")]
mod sim;
mod store;

use anyhow::{Context, Result};
use irrigation_forecast::{run_cycle, CycleInputs};
use std::{env, time::Duration};
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

use config::NodeConfig;
use report::Report;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ── Config ──────────────────────────────────────────────────────
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "node.toml".to_string());
    let cfg = config::load(&config_path)?;

    // One cycle per invocation; the sleep/wake host re-runs the binary.
    // WAKE_EVERY_S keeps the process alive and repeats the cycle instead.
    let wake_every_s: Option<u64> = match env::var("WAKE_EVERY_S") {
        Ok(v) => Some(
            v.trim()
                .parse()
                .with_context(|| format!("invalid WAKE_EVERY_S: {v:?}"))?,
        ),
        Err(_) => None,
    };

    let Some(every_s) = wake_every_s else {
        return wake(&cfg).await;
    };

    let every_s = if every_s == 0 {
        u64::from(cfg.site.sample_interval_min) * 60
    } else {
        every_s
    };
    tracing::info!(every_s, "repeating wake cycles");

    loop {
        if let Err(e) = wake(&cfg).await {
            tracing::error!("wake cycle failed: {e:#}");
        }
        sleep(Duration::from_secs(every_s)).await;
    }
}

/// One power cycle: load retained state, read, decide, persist, report.
async fn wake(cfg: &NodeConfig) -> Result<()> {
    // Always reload from disk so repeated cycles behave like cold boots.
    let mut state = store::load(&cfg.state_path)?;

    let ts = clock::now_unix();
    let reading = sensor::acquire(cfg.site.altitude_m, ts as f64)?;
    let month = clock::current_month(cfg.time_source, ts);

    let result = run_cycle(
        &mut state,
        &cfg.site,
        CycleInputs {
            temperature_c: reading.temperature_c,
            pressure_hpa: reading.pressure_hpa,
            month,
        },
    )?;

    store::save(&cfg.state_path, &state)?;

    // Reporting is best-effort: the retained state is already committed.
    let report = Report::new(&cfg.node_id, ts, &reading, &result);
    if let Err(e) = report::publish(&cfg.mqtt, &report).await {
        tracing::warn!(node_id = %cfg.node_id, "report not delivered: {e:#}");
    }

    Ok(())
}
