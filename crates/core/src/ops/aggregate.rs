//! Rule-driven aggregation with post-hoc recomputation of derived columns.

use std::collections::BTreeSet;

use polars::prelude::*;
use tracing::debug;

use crate::attributes::registry::AttributeRegistry;
use crate::attributes::Attribute;
use crate::dataset::Data;
use crate::error::{CoreError, Result};
use crate::ops::attach_column;

/// Groups the working table by the keys' display names and reduces every
/// registered column by its aggregation rule.
///
/// Columns whose rule is `None` are dropped by the reduction. Afterwards,
/// every derived attribute flagged `recalculate_on_aggregation` that was
/// present in the *input* table is recomputed against the aggregated rows and
/// re-attached, so ratios of sums replace sums of ratios. Presence is judged
/// against the input table on purpose: a rule-less recalc column that the
/// grouping dropped still comes back.
///
/// Registered attributes absent from the input table are skipped silently; a
/// recomputed formula referencing a column the aggregated table lacks is an
/// error.
pub fn aggregate_by(data: &Data, registry: &AttributeRegistry, keys: &[Attribute]) -> Result<Data> {
    let frame = data.table();
    let input_columns: BTreeSet<String> = frame
        .get_column_names()
        .iter()
        .map(|n| n.as_str().to_string())
        .collect();

    let key_names: Vec<String> = keys.iter().map(|k| k.display_name().to_string()).collect();
    for key in &key_names {
        if !input_columns.contains(key) {
            return Err(CoreError::missing_column(key, "aggregate_by grouping key"));
        }
    }

    let mut agg_exprs = Vec::new();
    for attr in registry.all() {
        let name = attr.display_name();
        if key_names.iter().any(|k| k == name) || !input_columns.contains(name) {
            continue;
        }
        if let Some(expr) = attr.aggregation().agg_expr(name) {
            agg_exprs.push(expr.alias(name));
        }
    }
    debug!(
        keys = ?key_names,
        reduced = agg_exprs.len(),
        "aggregating table"
    );

    let group_exprs: Vec<Expr> = key_names.iter().map(|k| col(k.as_str())).collect();
    let mut aggregated = frame
        .clone()
        .lazy()
        .group_by(group_exprs)
        .agg(agg_exprs)
        .collect()?;

    for attr in registry.all() {
        if !attr.recalculates_on_aggregation() || !input_columns.contains(attr.display_name()) {
            continue;
        }
        let column = attr.compute(&aggregated)?;
        attach_column(&mut aggregated, column, attr.display_name())?;
    }

    Ok(Data::with_parts(
        aggregated,
        data.original().clone(),
        keys.to_vec(),
    ))
}
