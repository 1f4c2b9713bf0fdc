//! Percentile ranking.

use polars::prelude::*;

use crate::attributes::Attribute;
use crate::dataset::Data;
use crate::error::{CoreError, Result};

/// Adds a `<name>_rank` column per requested attribute: fractional percentile
/// rank in (0, 1], ties averaged. `descending` ranks the largest value first,
/// for stats where more is better.
pub fn percentile_rank(data: &Data, attributes: &[Attribute], descending: bool) -> Result<Data> {
    let frame = data.table();
    for attr in attributes {
        if !crate::attributes::has_column(frame, attr.display_name()) {
            return Err(CoreError::missing_column(
                attr.display_name(),
                "percentile_rank",
            ));
        }
    }

    let height = frame.height();
    if height == 0 {
        return Ok(Data::with_parts(
            frame.clone(),
            data.original().clone(),
            data.grouping_keys().to_vec(),
        ));
    }

    let rank_exprs: Vec<Expr> = attributes
        .iter()
        .map(|attr| {
            let name = attr.display_name();
            (col(name)
                .rank(
                    RankOptions {
                        method: RankMethod::Average,
                        descending,
                    },
                    None,
                )
                .cast(DataType::Float64)
                / lit(height as f64))
            .alias(format!("{name}_rank"))
        })
        .collect();

    let ranked = frame.clone().lazy().with_columns(rank_exprs).collect()?;
    Ok(Data::with_parts(
        ranked,
        data.original().clone(),
        data.grouping_keys().to_vec(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::DataSource;

    #[test]
    fn ascending_rank_is_fractional() {
        let xg = Attribute::float("xg", DataSource::FbRef).build();
        let frame = df!(
            "player" => &["A", "B", "C", "D"],
            "xg" => &[0.1, 0.4, 0.2, 0.3],
        )
        .unwrap();
        let data = Data::new(frame);
        let ranked = percentile_rank(&data, &[xg], false).unwrap();
        let ranks: Vec<f64> = ranked
            .table()
            .column("xg_rank")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(ranks, vec![0.25, 1.0, 0.5, 0.75]);
    }

    #[test]
    fn descending_rank_puts_best_first() {
        let xg = Attribute::float("xg", DataSource::FbRef).build();
        let frame = df!(
            "player" => &["A", "B"],
            "xg" => &[0.1, 0.4],
        )
        .unwrap();
        let data = Data::new(frame);
        let ranked = percentile_rank(&data, &[xg], true).unwrap();
        let ranks: Vec<f64> = ranked
            .table()
            .column("xg_rank")
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(ranks, vec![1.0, 0.5]);
    }
}
