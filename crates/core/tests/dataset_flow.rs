use chrono::NaiveDate;
use polars::prelude::*;

use pitchframe_core::catalog::fbref;
use pitchframe_core::{
    aggregate_by, filter, per_90, AttributeRegistry, Data, Filter, FilterOp,
};

fn raw_fbref_frame() -> DataFrame {
    df!(
        "player_id" => &["p1", "p1", "p1", "p2", "p3"],
        "player" => &["Ana", "Ana", "Ana", "Bea", "Cleo"],
        "date" => &["2021-09-01", "2021-09-01", "2021-09-08", "2021-09-01", "2021-09-01"],
        "squad" => &["Arsenal", "Arsenal", "Arsenal", "Chelsea", "Zenit"],
        "position" => &["FW", "FW", "FW,MF", "MF", "FW"],
        "minutes" => &["90", "90", "45", "90", "90"],
        "goals" => &["1", "1", "", "0", "2"],
        "shots_total" => &["4", "4", "2", "1", "5"],
        "shots_on_target" => &["2", "2", "1", "0", "3"],
        "pens_made" => &["0", "0", "", "0", "1"],
    )
    .unwrap()
}

fn load() -> (AttributeRegistry, fbref::FbrefCatalog, Data) {
    let mut registry = AttributeRegistry::new();
    let catalog = fbref::install(&mut registry).unwrap();
    let data = Data::from_fbref(raw_fbref_frame(), &registry).unwrap();
    (registry, catalog, data)
}

#[test]
fn load_excludes_teams_and_deduplicates() {
    let (_, _, data) = load();
    // One Zenit row dropped, one duplicate Ana row collapsed.
    assert_eq!(data.n(), 3);
    let squads: Vec<&str> = data
        .table()
        .column("squad")
        .unwrap()
        .str()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert!(!squads.contains(&"Zenit"));
}

#[test]
fn load_runs_pipelines_and_attaches_formulas() {
    let (_, _, data) = load();
    let table = data.table();

    // Blank strings became typed zeros.
    assert_eq!(table.column("goals").unwrap().dtype(), &DataType::Float64);
    assert_eq!(table.column("date").unwrap().dtype(), &DataType::Date);
    let dates: Vec<NaiveDate> = table
        .column("date")
        .unwrap()
        .as_materialized_series()
        .date()
        .unwrap()
        .as_date_iter()
        .flatten()
        .collect();
    assert_eq!(dates[0], NaiveDate::from_ymd_opt(2021, 9, 1).unwrap());

    // shot_pct has all its inputs; the npxg family does not and is skipped.
    let pct: Vec<f64> = table
        .column("shot_pct")
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(pct, vec![50.0, 50.0, 0.0]);
    assert!(table.column("npxg_outperform").is_err());
    assert!(table.column("non_penalty_goals").is_ok());
}

#[test]
fn season_totals_then_rates() {
    let (registry, catalog, data) = load();

    let by_player = aggregate_by(&data, &registry, &[catalog.player_id.clone()]).unwrap();
    let table = by_player
        .table()
        .sort(["player_id"], SortMultipleOptions::default())
        .unwrap();
    let minutes: Vec<f64> = table
        .column("minutes")
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert_eq!(minutes, vec![135.0, 90.0]);
    // Distinct positions joined by the label aggregation.
    let positions: Vec<&str> = table
        .column("position")
        .unwrap()
        .str()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert!(positions[0].contains("FW"));
    assert!(positions[0].contains("FW,MF"));

    let rates = per_90(&by_player, &registry, &catalog.minutes).unwrap();
    let sorted = rates
        .table()
        .sort(["player_id"], SortMultipleOptions::default())
        .unwrap();
    let goals: Vec<f64> = sorted
        .column("goals")
        .unwrap()
        .f64()
        .unwrap()
        .into_no_null_iter()
        .collect();
    assert!((goals[0] - 1.0 / 135.0 * 90.0).abs() < 1e-9);
    assert_eq!(goals[1], 0.0);
}

#[test]
fn filters_compose_conjunctively() {
    let (_, catalog, data) = load();
    let selected = filter(
        &data,
        &[
            Filter::new(&catalog.position, FilterOp::Contains, "FW"),
            Filter::new(&catalog.minutes, FilterOp::GreaterOrEqual, 90.0),
        ],
    )
    .unwrap();
    assert_eq!(selected.n(), 1);

    let reordered = filter(
        &data,
        &[
            Filter::new(&catalog.minutes, FilterOp::GreaterOrEqual, 90.0),
            Filter::new(&catalog.position, FilterOp::Contains, "FW"),
        ],
    )
    .unwrap();
    assert_eq!(reordered.n(), selected.n());
}
