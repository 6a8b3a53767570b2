//! CSV tick feed: one `timestamp,bid,ask` record per line, timestamps as
//! UTC epoch seconds. Blank lines are skipped; malformed lines fail the run
//! with their line number.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use anyhow::{Context, Result};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    /// UTC epoch seconds.
    pub ts: i64,
    pub bid: f64,
    pub ask: f64,
}

impl Tick {
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }

    /// Parse a `timestamp,bid,ask` CSV line.
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.trim().split(',');

        let ts = parts
            .next()
            .filter(|s| !s.is_empty())
            .context("missing timestamp field")?
            .trim()
            .parse::<i64>()
            .context("timestamp must be epoch seconds")?;
        let bid = parts
            .next()
            .context("missing bid field")?
            .trim()
            .parse::<f64>()
            .context("bid must be a number")?;
        let ask = parts
            .next()
            .context("missing ask field")?
            .trim()
            .parse::<f64>()
            .context("ask must be a number")?;

        Ok(Tick { ts, bid, ask })
    }
}

/// Line-by-line tick reader over a CSV file.
pub struct TickReader {
    lines: Lines<BufReader<File>>,
    line_no: u64,
}

impl TickReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open tick csv {}", path.display()))?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }
}

impl Iterator for TickReader {
    type Item = Result<Tick>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line_no = self.line_no;

            match line {
                Ok(l) if l.trim().is_empty() => continue,
                Ok(l) => {
                    return Some(
                        Tick::parse(&l).with_context(|| format!("tick csv line {line_no}")),
                    )
                }
                Err(e) => {
                    return Some(
                        Err(e).with_context(|| format!("tick csv read at line {line_no}")),
                    )
                }
            }
        }
    }
}
