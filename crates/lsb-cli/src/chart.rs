//! Candle window published to the script as a nested table.
//!
//! Lua-facing indexing: index 0 is the current period's incomplete candle;
//! closed candles occupy 1..=depth, most recent first.

use anyhow::Result;

use lsb_bridge::{Session, TableBuilder};

use crate::feed::Tick;

/// One bid-side OHLC candle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    /// Period ordinal: tick epoch seconds / period length.
    id: i64,
}

impl Candle {
    fn from_tick(id: i64, tick: &Tick) -> Self {
        Self {
            open: tick.bid,
            high: tick.bid,
            low: tick.bid,
            close: tick.bid,
            volume: 1,
            id,
        }
    }

    fn update(&mut self, tick: &Tick) {
        if tick.bid > self.high {
            self.high = tick.bid;
        } else if tick.bid < self.low {
            self.low = tick.bid;
        }
        self.close = tick.bid;
        self.volume += 1;
    }
}

/// Bounded window of candles aggregated from ticks.
pub struct ChartWindow {
    name: String,
    period_secs: i64,
    depth: usize,
    /// Index 0 is the open candle; the window never exceeds depth + 1.
    candles: Vec<Candle>,
}

impl ChartWindow {
    pub fn new(name: &str, period_secs: i64, depth: usize) -> Self {
        Self {
            name: name.to_string(),
            period_secs,
            depth,
            candles: Vec::with_capacity(depth + 1),
        }
    }

    /// Fold one tick into the window. Returns true when the tick rolled the
    /// window into a new period (the just-closed candle is now at index 1),
    /// which is the moment worth republishing to the script.
    pub fn process_tick(&mut self, tick: &Tick) -> bool {
        let id = tick.ts / self.period_secs;

        match self.candles.first().map(|c| c.id) {
            None => {
                self.candles.insert(0, Candle::from_tick(id, tick));
                false
            }
            Some(current) if id > current => {
                self.candles.insert(0, Candle::from_tick(id, tick));
                self.candles.truncate(self.depth + 1);
                true
            }
            Some(_) => {
                self.candles[0].update(tick);
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn candle(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    /// Publish the window under the chart's global name: outer table keyed
    /// by candle index, each value a table of open/high/low/close/volume.
    pub fn publish(&self, session: &Session) -> Result<()> {
        let mut builder = TableBuilder::begin(self.candles.len());

        for (index, candle) in self.candles.iter().enumerate() {
            builder.stage_integer(index as i64)?;
            builder.begin_nested(5)?;

            for (field, value) in [
                ("open", candle.open),
                ("high", candle.high),
                ("low", candle.low),
                ("close", candle.close),
            ] {
                builder.stage_string(field)?;
                builder.stage_number(value)?;
                builder.commit_entry()?;
            }
            builder.stage_string("volume")?;
            builder.stage_integer(candle.volume)?;
            builder.commit_entry()?;

            builder.close_table()?;
            builder.commit_entry()?;
        }

        builder.finalize(session, &self.name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(ts: i64, bid: f64) -> Tick {
        Tick {
            ts,
            bid,
            ask: bid + 0.0002,
        }
    }

    #[test]
    fn ticks_within_one_period_update_the_open_candle() {
        let mut chart = ChartWindow::new("chart", 60, 4);

        assert!(!chart.process_tick(&tick(0, 1.00)));
        assert!(!chart.process_tick(&tick(10, 1.05)));
        assert!(!chart.process_tick(&tick(59, 1.02)));

        assert_eq!(chart.len(), 1);
        let candle = chart.candle(0).unwrap();
        assert_eq!(candle.open, 1.00);
        assert_eq!(candle.high, 1.05);
        assert_eq!(candle.low, 1.00);
        assert_eq!(candle.close, 1.02);
        assert_eq!(candle.volume, 3);
    }

    #[test]
    fn a_new_period_closes_the_candle_and_reports_roll() {
        let mut chart = ChartWindow::new("chart", 60, 4);

        chart.process_tick(&tick(0, 1.00));
        assert!(chart.process_tick(&tick(60, 1.10)));

        assert_eq!(chart.len(), 2);
        assert_eq!(chart.candle(1).unwrap().close, 1.00);
        assert_eq!(chart.candle(0).unwrap().open, 1.10);
    }

    #[test]
    fn window_depth_is_bounded() {
        let mut chart = ChartWindow::new("chart", 60, 2);

        for period in 0..10 {
            chart.process_tick(&tick(period * 60, 1.0 + period as f64 / 100.0));
        }

        // depth closed candles + the open one.
        assert_eq!(chart.len(), 3);
        assert_eq!(chart.candle(0).unwrap().open, 1.09);
    }
}
