//! Possession adjustment: rescales counting stats to a 50/50-possession
//! baseline using league-wide touch shares.
//!
//! The factor computation must run on the dataset's *original* table. The
//! working table has usually been aggregated by player, which destroys the
//! per-match team/opponent touch structure the factors are derived from.

use std::collections::BTreeSet;

use polars::prelude::*;

use crate::attributes::{has_column, Attribute};
use crate::dataset::Data;
use crate::error::{CoreError, Result};
use crate::ops::is_numeric_dtype;

pub const PCT_IN_POSSESSION_FACTOR: &str = "pct_in_possession_factor";
pub const PCT_OUT_POSSESSION_FACTOR: &str = "pct_out_possession_factor";
pub const TOTAL_TOUCH_FACTOR: &str = "total_touch_factor";
pub const FULL_IN_POSSESSION_MULT: &str = "full_in_possession_mult";
pub const FULL_OUT_POSSESSION_MULT: &str = "full_out_possession_mult";

/// Columns the adjustment needs plus the stats scaled by the
/// out-of-possession factor (defensive actions) and the numeric columns left
/// untouched (minutes, season).
pub struct PossessionContext {
    pub team: Attribute,
    pub opponent: Attribute,
    pub touches: Attribute,
    pub out_of_possession: Vec<Attribute>,
    pub exempt: Vec<Attribute>,
}

/// Computes one factor row per team from a full (pre-aggregation) table,
/// assuming a double round-robin league.
pub fn possession_factors(frame: &DataFrame, ctx: &PossessionContext) -> Result<DataFrame> {
    let team = ctx.team.display_name();
    let opponent = ctx.opponent.display_name();
    let touches = ctx.touches.display_name();
    for required in [team, opponent, touches] {
        if !has_column(frame, required) {
            return Err(CoreError::missing_column(required, "possession_factors"));
        }
    }

    let n_teams = frame.column(team)?.as_materialized_series().n_unique()? as f64;
    let total_matches = n_teams * (n_teams - 1.0);
    let matches_per_team = 2.0 * (n_teams - 1.0);

    let totals = frame
        .clone()
        .lazy()
        .select([col(touches).cast(DataType::Float64).sum().alias("total")])
        .collect()?;
    let league_touches = totals
        .column("total")?
        .f64()?
        .get(0)
        .unwrap_or(0.0);
    let average_touches_per_match = league_touches / total_matches;

    let team_touches = frame
        .clone()
        .lazy()
        .group_by([col(team)])
        .agg([col(touches)
            .cast(DataType::Float64)
            .sum()
            .alias("team_touches")]);
    let opponent_touches = frame
        .clone()
        .lazy()
        .group_by([col(opponent)])
        .agg([col(touches)
            .cast(DataType::Float64)
            .sum()
            .alias("opponent_touches")])
        .rename([opponent], [team], true);

    let factors = team_touches
        .join(
            opponent_touches,
            [col(team)],
            [col(team)],
            JoinArgs::new(JoinType::Inner),
        )
        .with_columns([
            (col("team_touches") / lit(matches_per_team)).alias("team_touches"),
            (col("opponent_touches") / lit(matches_per_team)).alias("opponent_touches"),
        ])
        .with_column(
            (col("team_touches") + col("opponent_touches")).alias("total_touches_per_game"),
        )
        .with_columns([
            (col("team_touches") / col("total_touches_per_game")).alias("pct_team_touches"),
            (col("opponent_touches") / col("total_touches_per_game"))
                .alias("pct_opponent_touches"),
            (lit(average_touches_per_match) / col("total_touches_per_game"))
                .alias(TOTAL_TOUCH_FACTOR),
        ])
        .with_columns([
            (lit(0.5) / col("pct_team_touches")).alias(PCT_IN_POSSESSION_FACTOR),
            (lit(0.5) / col("pct_opponent_touches")).alias(PCT_OUT_POSSESSION_FACTOR),
        ])
        .with_columns([
            (col(TOTAL_TOUCH_FACTOR) * col(PCT_IN_POSSESSION_FACTOR))
                .alias(FULL_IN_POSSESSION_MULT),
            (col(TOTAL_TOUCH_FACTOR) * col(PCT_OUT_POSSESSION_FACTOR))
                .alias(FULL_OUT_POSSESSION_MULT),
        ])
        .collect()?;

    Ok(factors)
}

/// Joins the per-team possession factors onto the working table and scales
/// every numeric column: out-of-possession stats by the out factor, the rest
/// by the in factor. Exempt columns and the join/factor columns are left
/// alone; the factor columns are dropped from the result.
pub fn possession_adjust(data: &Data, ctx: &PossessionContext) -> Result<Data> {
    let team = ctx.team.display_name();
    if !has_column(data.table(), team) {
        return Err(CoreError::missing_column(team, "possession_adjust"));
    }

    let factors = possession_factors(data.original(), ctx)?
        .lazy()
        .select([
            col(team),
            col(PCT_IN_POSSESSION_FACTOR),
            col(PCT_OUT_POSSESSION_FACTOR),
        ]);

    let out_names: BTreeSet<&str> = ctx
        .out_of_possession
        .iter()
        .map(|a| a.display_name())
        .collect();
    let exempt_names: BTreeSet<&str> = ctx.exempt.iter().map(|a| a.display_name()).collect();

    let mut scale_exprs = Vec::new();
    for (name, dtype) in data
        .table()
        .get_column_names()
        .iter()
        .zip(data.table().dtypes().iter())
    {
        let name = name.as_str();
        if !is_numeric_dtype(dtype) || exempt_names.contains(name) || name == team {
            continue;
        }
        let factor = if out_names.contains(name) {
            col(PCT_OUT_POSSESSION_FACTOR)
        } else {
            col(PCT_IN_POSSESSION_FACTOR)
        };
        scale_exprs.push((col(name).cast(DataType::Float64) * factor).alias(name));
    }

    let mut adjusted = data
        .table()
        .clone()
        .lazy()
        .join(factors, [col(team)], [col(team)], JoinArgs::new(JoinType::Inner))
        .with_columns(scale_exprs)
        .collect()?;
    let _ = adjusted.drop_in_place(PCT_IN_POSSESSION_FACTOR)?;
    let _ = adjusted.drop_in_place(PCT_OUT_POSSESSION_FACTOR)?;

    Ok(Data::with_parts(
        adjusted,
        data.original().clone(),
        data.grouping_keys().to_vec(),
    ))
}
