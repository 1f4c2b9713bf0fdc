//! Expected-threat (xT) lookup: a published 12x8 grid of pitch-control
//! values, used to score passes by the change in threat between their start
//! and end cells.
//!
//! Fetching the grid is the caller's problem; this module takes the raw JSON
//! (or a closure producing it) and owns parsing, validation, bucketing and
//! the process-wide cache.

use once_cell::sync::OnceCell;
use polars::prelude::*;
use serde::Deserialize;
use tracing::debug;

use crate::catalog::whoscored::{END_X_COL, END_Y_COL, EVENT_TYPE_COL, X_COL, Y_COL};
use crate::error::Result;
use crate::events::EventKind;

pub const GRID_COLUMNS: usize = 12;
pub const GRID_ROWS: usize = 8;

/// The published grid location, for callers wiring up a fetch.
pub const GRID_URL: &str = "https://karun.in/blog/data/open_xt_12x8_v1.json";

static GRID: OnceCell<ExpectedThreatGrid> = OnceCell::new();

/// Threat values over a 12-wide, 8-tall division of the pitch. Row index
/// follows y, column index follows x, both in 0..100 pitch coordinates.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct ExpectedThreatGrid {
    cells: Vec<Vec<f64>>,
}

impl ExpectedThreatGrid {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let grid: ExpectedThreatGrid = serde_json::from_str(raw)?;
        if grid.cells.len() != GRID_ROWS || grid.cells.iter().any(|r| r.len() != GRID_COLUMNS) {
            anyhow::bail!(
                "expected a {}x{} grid, got {} rows",
                GRID_COLUMNS,
                GRID_ROWS,
                grid.cells.len()
            );
        }
        Ok(grid)
    }

    /// The process-wide grid, loading it through `fetch` on first use. A
    /// failed load propagates as an error; a successful load is cached for
    /// the life of the process and `fetch` is never called again.
    pub fn global<F>(fetch: F) -> anyhow::Result<&'static ExpectedThreatGrid>
    where
        F: FnOnce() -> anyhow::Result<String>,
    {
        GRID.get_or_try_init(|| {
            debug!("loading expected-threat grid");
            Self::from_json(&fetch()?)
        })
    }

    /// Threat value of the cell containing (x, y). Coordinates outside the
    /// pitch clamp to the edge cells.
    pub fn value(&self, x: f64, y: f64) -> f64 {
        let column = bucket(x, GRID_COLUMNS);
        let row = bucket(y, GRID_ROWS);
        self.cells[row][column]
    }
}

fn bucket(coordinate: f64, cells: usize) -> usize {
    let idx = (coordinate / 100.0 * cells as f64).floor();
    (idx.max(0.0) as usize).min(cells - 1)
}

/// Per-event net threat: end-cell value minus start-cell value for passes,
/// zero for everything else.
pub fn net_pass_value(events: &DataFrame, grid: &ExpectedThreatGrid) -> Result<Column> {
    let kinds = events
        .column(EVENT_TYPE_COL)?
        .cast(&DataType::Int64)?;
    let kinds = kinds.i64()?;
    let as_f64 = |name: &str| -> Result<Column> {
        Ok(events.column(name)?.cast(&DataType::Float64)?)
    };
    let x = as_f64(X_COL)?;
    let y = as_f64(Y_COL)?;
    let end_x = as_f64(END_X_COL)?;
    let end_y = as_f64(END_Y_COL)?;

    let mut values = Vec::with_capacity(events.height());
    for i in 0..events.height() {
        let is_pass = kinds.get(i) == Some(EventKind::Pass.code());
        let value = if is_pass {
            let (Some(sx), Some(sy), Some(ex), Some(ey)) = (
                x.f64()?.get(i),
                y.f64()?.get(i),
                end_x.f64()?.get(i),
                end_y.f64()?.get(i),
            ) else {
                values.push(0.0);
                continue;
            };
            grid.value(ex, ey) - grid.value(sx, sy)
        } else {
            0.0
        };
        values.push(value);
    }

    Ok(Series::new("net_xt".into(), values).into_column())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_rows() -> String {
        // Each row holds its row index in every cell, so value() exposes the
        // y bucketing directly.
        let rows: Vec<String> = (0..GRID_ROWS)
            .map(|r| {
                let cells = vec![format!("{r}.0"); GRID_COLUMNS].join(",");
                format!("[{cells}]")
            })
            .collect();
        format!("[{}]", rows.join(","))
    }

    #[test]
    fn parses_and_buckets() {
        let grid = ExpectedThreatGrid::from_json(&uniform_rows()).unwrap();
        assert_eq!(grid.value(0.0, 0.0), 0.0);
        assert_eq!(grid.value(50.0, 50.0), 4.0);
        // Edge coordinates clamp into the last cell.
        assert_eq!(grid.value(100.0, 100.0), 7.0);
    }

    #[test]
    fn wrong_shape_is_rejected() {
        assert!(ExpectedThreatGrid::from_json("[[1.0, 2.0]]").is_err());
    }

    #[test]
    fn non_pass_events_score_zero() {
        let grid = ExpectedThreatGrid::from_json(&uniform_rows()).unwrap();
        let events = df!(
            "event_type" => &[1i64, 16],
            "x" => &[10.0, 10.0],
            "y" => &[10.0, 10.0],
            "endX" => &[90.0, 90.0],
            "endY" => &[90.0, 90.0],
        )
        .unwrap();
        let out = net_pass_value(&events, &grid).unwrap();
        let values: Vec<f64> = out
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        // y moves from bucket 0 to bucket 7.
        assert_eq!(values, vec![7.0, 0.0]);
    }
}
