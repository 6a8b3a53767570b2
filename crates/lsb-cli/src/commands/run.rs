//! The `lsb run` handler: one session, one tick loop, one report.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use lsb_bridge::{Decision, Session};
use lsb_config::RunConfig;

use crate::chart::ChartWindow;
use crate::feed::TickReader;
use crate::position::PositionBook;

/// Global name the chart window publishes under; scripts index it as
/// `chart[0].close` etc.
const CHART_GLOBAL: &str = "chart";

#[derive(Clone, Copy, Debug, Default, Serialize)]
struct DecisionCounts {
    noop: u64,
    long: u64,
    short: u64,
    close: u64,
}

impl DecisionCounts {
    fn record(&mut self, decision: Decision) {
        match decision {
            Decision::Noop => self.noop += 1,
            Decision::Long => self.long += 1,
            Decision::Short => self.short += 1,
            Decision::Close => self.close += 1,
        }
    }
}

/// Printed as the final JSON line of a successful run.
#[derive(Clone, Debug, Serialize)]
struct RunReport {
    ticks_processed: u64,
    decisions: DecisionCounts,
    closed_trades: u64,
    realized_profit: f64,
}

pub fn run(script: &str, config: Option<&str>, ticks_override: Option<i64>) -> Result<()> {
    let script = Path::new(script);

    let session = Session::create(script)?;
    if let Some(config_path) = config {
        session.load_auxiliary(Path::new(config_path))?;
    }

    let mut run_config = RunConfig::read_from(&session)?;
    if let Some(ticks) = ticks_override {
        run_config.max_ticks = ticks;
        run_config.validate()?;
    }
    info!(
        config = %serde_json::to_string(&run_config).context("serialize config")?,
        "effective run configuration"
    );

    let reader = TickReader::open(Path::new(&run_config.csv_path))?;
    let mut chart = ChartWindow::new(
        CHART_GLOBAL,
        run_config.chart_period_secs,
        run_config.chart_depth as usize,
    );
    let mut book = PositionBook::new();
    let mut counts = DecisionCounts::default();
    let mut processed: u64 = 0;

    for tick in reader {
        if processed >= run_config.max_ticks as u64 {
            break;
        }
        let tick = tick?;

        if chart.process_tick(&tick) {
            chart.publish(&session)?;
        }

        session.set_number_var("current_bid", tick.bid)?;
        session.set_number_var("current_ask", tick.ask)?;
        session.set_number_var("current_spread", tick.spread())?;
        session.set_bool_var("has_open_trades", book.has_open_position())?;

        let decision = session.tick()?;
        match decision {
            Decision::Long => book.open_long(&tick),
            Decision::Short => book.open_short(&tick),
            Decision::Close => book.close_all(&tick),
            Decision::Noop => {}
        }
        if decision != Decision::Noop {
            debug!(tick = processed, decision = decision.as_str(), "decision");
        }

        counts.record(decision);
        processed += 1;
    }

    session.close();

    let report = RunReport {
        ticks_processed: processed,
        decisions: counts,
        closed_trades: book.closed_count(),
        realized_profit: book.realized_profit(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize run report")?
    );
    Ok(())
}
