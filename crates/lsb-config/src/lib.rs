//! lsb-config
//!
//! Run configuration sourced from a Lua file through the bridge itself:
//! the config script runs in a session and the host reads typed globals
//! back out. A strategy file can therefore carry its own configuration, or
//! a separate overrides script can be layered on via `load_auxiliary`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::debug;

use lsb_bridge::Session;

/// Effective run configuration, read from typed globals.
///
/// Required globals: `CSV_PATH` (string), `MAX_TICKS`, `CHART_PERIOD_SECS`,
/// `CHART_DEPTH` (integers). Absent or mistyped globals fail the load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunConfig {
    /// Tick CSV path, relative to the working directory.
    pub csv_path: String,
    /// Upper bound on ticks driven through the strategy.
    pub max_ticks: i64,
    /// Candle period for the published chart window.
    pub chart_period_secs: i64,
    /// Closed candles retained in the published chart window.
    pub chart_depth: i64,
}

impl RunConfig {
    /// Read configuration from `path` using a short-lived session of its
    /// own, the single-file setup where one script carries both config
    /// globals and the tick handler.
    pub fn load(path: &Path) -> Result<Self> {
        let session = Session::create(path)
            .with_context(|| format!("failed to load config script {}", path.display()))?;
        let config = Self::read_from(&session);
        session.close();
        config
    }

    /// Read the configuration globals from an already-open session.
    pub fn read_from(session: &Session) -> Result<Self> {
        let config = Self {
            csv_path: session.get_string_var("CSV_PATH").context("CSV_PATH")?,
            max_ticks: session.get_int_var("MAX_TICKS").context("MAX_TICKS")?,
            chart_period_secs: session
                .get_int_var("CHART_PERIOD_SECS")
                .context("CHART_PERIOD_SECS")?,
            chart_depth: session.get_int_var("CHART_DEPTH").context("CHART_DEPTH")?,
        };
        config.validate()?;
        debug!(?config, "run configuration loaded");
        Ok(config)
    }

    /// Bounds checks shared by every load path. Call again after mutating a
    /// field (e.g. a CLI tick-count override).
    pub fn validate(&self) -> Result<()> {
        if self.csv_path.is_empty() {
            bail!("CSV_PATH must not be empty");
        }
        if self.max_ticks < 1 {
            bail!("MAX_TICKS must be > 0 (got {})", self.max_ticks);
        }
        if self.chart_period_secs < 1 {
            bail!(
                "CHART_PERIOD_SECS must be > 0 (got {})",
                self.chart_period_secs
            );
        }
        if self.chart_depth < 1 {
            bail!("CHART_DEPTH must be > 0 (got {})", self.chart_depth);
        }
        Ok(())
    }
}
