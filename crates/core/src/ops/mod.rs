//! Table operations. Each consumes a [`crate::dataset::Data`] and returns a
//! new one; tables are never mutated in place.

pub mod aggregate;
pub mod filter;
pub mod normalize;
pub mod possession;
pub mod rank;

use polars::prelude::*;

use crate::error::Result;

/// Attaches a computed column, broadcasting length-1 results (scalar
/// reductions such as `Sum`) to the table height.
pub(crate) fn attach_column(frame: &mut DataFrame, mut column: Column, name: &str) -> Result<()> {
    column.rename(name.into());
    if column.len() == 1 && frame.height() != 1 {
        let series = column
            .as_materialized_series()
            .new_from_index(0, frame.height());
        frame.with_column(series.into_column())?;
    } else {
        frame.with_column(column)?;
    }
    Ok(())
}

pub(crate) fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}
