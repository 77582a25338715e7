/*!
 * Leak Monitor - Demo Entry Point
 *
 * Runs one diagnostics session against this process:
 * - A small component tree with a remounted sidebar
 * - One chart component that leaks a buffer while mounted
 * - The session report printed as JSON at the end
 *
 * Environment variables:
 * - LEAK_MONITOR_SESSION_MINUTES: session length (default: 0.5)
 * - plus the MonitorConfig and tracing variables
 */

use anyhow::Context;
use leak_monitor::core::limits::DEFAULT_SESSION_MINUTES;
use leak_monitor::{init_tracing, LeakMonitor, MonitorConfig, TracingSink};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const LEAK_STEP_BYTES: usize = 8 * 1024 * 1024;
const LEAK_CAP_BYTES: usize = 512 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = MonitorConfig::from_env().context("invalid monitor configuration")?;
    let minutes = session_minutes()?;
    let tick = config.session_tick_interval;

    let monitor = LeakMonitor::with_system_provider(config, Arc::new(TracingSink))
        .context("failed to build monitor")?;

    let memory = monitor.get_memory_info().context("memory metrics unavailable")?;
    info!(
        total_mb = memory.total_memory,
        available_mb = memory.available_memory,
        app_mb = memory.app_memory,
        pressure = %memory.memory_pressure(),
        "leak monitor starting"
    );

    monitor.start_session(minutes).await?;

    let app = monitor.start_component_tracking("App")?;
    let dashboard = monitor.start_component_tracking("Dashboard")?;
    let chart = monitor.start_component_tracking("LeakyChart")?;

    let sidebar = monitor.start_component_tracking("Sidebar")?;
    monitor.stop_component_tracking(&sidebar);
    let sidebar = monitor.start_component_tracking("Sidebar")?;

    let leak = tokio::spawn(async move {
        let mut retained: Vec<Vec<u8>> = Vec::new();
        let mut interval = tokio::time::interval(tick);
        loop {
            interval.tick().await;
            if retained.len() * LEAK_STEP_BYTES < LEAK_CAP_BYTES {
                retained.push(vec![1u8; LEAK_STEP_BYTES]);
            }
        }
    });

    let budget = Duration::from_secs_f64(minutes * 60.0);
    tokio::select! {
        _ = tokio::time::sleep(budget) => info!("session budget elapsed"),
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "ctrl-c handler failed");
            }
            info!("interrupted");
        }
    }

    for id in [&sidebar, &chart, &dashboard, &app] {
        monitor.stop_component_tracking(id);
    }
    leak.abort();

    let report = monitor.stop_session().await;
    let json = serde_json::to_string_pretty(&report).context("failed to render report")?;
    println!("{}", json);

    info!(
        suspects = ?report.suspect_names(),
        leaks = report.leaks_detected.len(),
        "leak monitor finished"
    );
    Ok(())
}

fn session_minutes() -> anyhow::Result<f64> {
    match std::env::var("LEAK_MONITOR_SESSION_MINUTES") {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .with_context(|| format!("LEAK_MONITOR_SESSION_MINUTES is not a number: {:?}", raw)),
        Err(_) => Ok(DEFAULT_SESSION_MINUTES),
    }
}
