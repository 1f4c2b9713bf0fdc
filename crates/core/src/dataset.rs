//! The `Data` wrapper: a working table, the original table it came from, and
//! the grouping keys describing its current row grain.
//!
//! Operations return new `Data` values instead of mutating. The original
//! table rides along untouched so consumers that need pre-aggregation detail
//! (possession factors) can still reach it after the working table has been
//! grouped.

use anyhow::Context;
use polars::prelude::*;
use tracing::{debug, warn};

use crate::attributes::registry::AttributeRegistry;
use crate::attributes::{has_column, Attribute, DataSource};
use crate::catalog::fbref;
use crate::error::Result;
use crate::ops::attach_column;

#[derive(Clone, Debug)]
pub struct Data {
    table: DataFrame,
    original: DataFrame,
    grouping_keys: Vec<Attribute>,
}

impl Data {
    /// Wraps a table as-is; the table is its own original and the row grain
    /// is unaggregated.
    pub fn new(table: DataFrame) -> Self {
        Self {
            original: table.clone(),
            table,
            grouping_keys: Vec::new(),
        }
    }

    /// Pairs a working table with a different original table, for callers
    /// that aggregated or trimmed outside this crate.
    pub fn with_original(table: DataFrame, original: DataFrame) -> Self {
        Self {
            table,
            original,
            grouping_keys: Vec::new(),
        }
    }

    pub(crate) fn with_parts(
        table: DataFrame,
        original: DataFrame,
        grouping_keys: Vec<Attribute>,
    ) -> Self {
        Self {
            table,
            original,
            grouping_keys,
        }
    }

    pub fn table(&self) -> &DataFrame {
        &self.table
    }

    pub fn original(&self) -> &DataFrame {
        &self.original
    }

    pub fn grouping_keys(&self) -> &[Attribute] {
        &self.grouping_keys
    }

    pub fn n(&self) -> usize {
        self.table.height()
    }

    /// Attaches derived attributes to the working table, in the given order.
    pub fn with_attributes(mut self, attributes: &[Attribute]) -> Result<Self> {
        for attr in attributes {
            let column = attr.compute(&self.table)?;
            attach_column(&mut self.table, column, attr.display_name())?;
        }
        Ok(self)
    }

    /// Builds a dataset from a raw FBref match-level table.
    ///
    /// Rows from the excluded-teams list are dropped (FBref reuses competition
    /// strings across leagues), duplicate player/date rows are collapsed, the
    /// registered native load pipelines run, and every recalc-flagged FBref
    /// derived attribute is attached. Derived attachment is best-effort:
    /// a failing formula is logged and skipped, since callers routinely load
    /// seasons that predate some stats.
    pub fn from_fbref(frame: DataFrame, registry: &AttributeRegistry) -> anyhow::Result<Self> {
        let excluded = Series::new("".into(), fbref::EXCLUDED_TEAMS);
        let frame = frame
            .lazy()
            .filter(col(fbref::TEAM_COL).is_in(lit(excluded)).not())
            .collect()
            .context("removing excluded teams from FBref table")?;

        let subset = [fbref::PLAYER_ID_COL.to_string(), fbref::DATE_COL.to_string()];
        let mut frame = frame
            .unique_stable(Some(&subset), UniqueKeepStrategy::First, None)
            .context("deduplicating FBref rows on player/date")?;

        apply_native_pipelines(&mut frame, registry, DataSource::FbRef)
            .context("running FBref native load pipelines")?;

        for attr in registry.by_source(DataSource::FbRef) {
            if !attr.is_derived() || !attr.recalculates_on_aggregation() {
                continue;
            }
            match attr.compute(&frame) {
                Ok(column) => attach_column(&mut frame, column, attr.display_name())?,
                Err(e) => {
                    warn!(attribute = attr.display_name(), error = %e, "skipping derived attribute");
                }
            }
        }

        debug!(rows = frame.height(), "FBref dataset loaded");
        Ok(Self::new(frame))
    }

    /// Builds a dataset from a raw Understat shot-level table.
    ///
    /// Native columns run their load pipelines and take their `us_`-prefixed
    /// display names; derived attributes are attached and any failure is an
    /// error, since the Understat catalog has no optional columns.
    pub fn from_understat(frame: DataFrame, registry: &AttributeRegistry) -> anyhow::Result<Self> {
        let mut frame = frame;
        apply_native_pipelines(&mut frame, registry, DataSource::Understat)
            .context("running Understat native load pipelines")?;

        for attr in registry.by_source(DataSource::Understat) {
            if !attr.is_derived() {
                continue;
            }
            let column = attr
                .compute(&frame)
                .with_context(|| format!("attaching '{}'", attr.display_name()))?;
            attach_column(&mut frame, column, attr.display_name())?;
        }

        debug!(rows = frame.height(), "Understat dataset loaded");
        Ok(Self::new(frame))
    }
}

/// Runs the load pipeline for every registered native attribute of `source`
/// whose provider-name column is present, leaving the column under its
/// display name. Absent columns are skipped.
fn apply_native_pipelines(
    frame: &mut DataFrame,
    registry: &AttributeRegistry,
    source: DataSource,
) -> Result<()> {
    for attr in registry.by_source(source) {
        if !attr.is_native() || !has_column(frame, attr.name()) {
            continue;
        }
        let raw = frame.drop_in_place(attr.name())?;
        let mut loaded = attr.load_series(raw.take_materialized_series())?;
        loaded.rename(attr.display_name().into());
        frame.with_column(loaded)?;
    }
    Ok(())
}
