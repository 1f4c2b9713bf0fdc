//! Per-90-minute normalization.

use std::collections::BTreeSet;

use polars::prelude::*;
use tracing::debug;

use crate::attributes::registry::AttributeRegistry;
use crate::attributes::Attribute;
use crate::dataset::Data;
use crate::error::{CoreError, Result};
use crate::ops::attach_column;

/// Rescales every normalizable numeric registered column to a per-90-minute
/// rate, then recomputes recalc-flagged derived columns from the normalized
/// bases.
///
/// The minutes column itself must be present (`MissingDependency` otherwise)
/// and is never rescaled, regardless of how it was registered. All rescales
/// are computed in one pass from the same pre-normalization minutes column,
/// so the result does not depend on registration order.
pub fn per_90(data: &Data, registry: &AttributeRegistry, minutes: &Attribute) -> Result<Data> {
    let frame = data.table();
    let present: BTreeSet<String> = frame
        .get_column_names()
        .iter()
        .map(|n| n.as_str().to_string())
        .collect();

    let minutes_name = minutes.display_name();
    if !present.contains(minutes_name) {
        return Err(CoreError::MissingDependency {
            column: minutes_name.to_string(),
            operation: "per_90".to_string(),
        });
    }

    let mut rescales = Vec::new();
    for attr in registry.all() {
        let name = attr.display_name();
        if name == minutes_name
            || !attr.is_normalizable()
            || !attr.data_type().is_numeric()
            || !present.contains(name)
        {
            continue;
        }
        rescales.push(
            (col(name).cast(DataType::Float64) / col(minutes_name).cast(DataType::Float64)
                * lit(90.0))
            .alias(name),
        );
    }
    debug!(rescaled = rescales.len(), minutes = minutes_name, "per-90 normalization");

    let mut normalized = frame.clone().lazy().with_columns(rescales).collect()?;

    for attr in registry.all() {
        if !attr.recalculates_on_aggregation() || !present.contains(attr.display_name()) {
            continue;
        }
        let column = attr.compute(&normalized)?;
        attach_column(&mut normalized, column, attr.display_name())?;
    }

    Ok(Data::with_parts(
        normalized,
        data.original().clone(),
        data.grouping_keys().to_vec(),
    ))
}
