//! Understat shot-level catalog. Every native column takes a `us_` display
//! name so an Understat table can sit next to FBref columns without clashes.

use crate::attributes::expression as fx;
use crate::attributes::registry::AttributeRegistry;
use crate::attributes::{Aggregation, AttrType, Attribute, DataSource};
use crate::error::Result;

pub struct UnderstatCatalog {
    pub id: Attribute,
    pub minute: Attribute,
    pub result: Attribute,
    pub x: Attribute,
    pub y: Attribute,
    pub xg: Attribute,
    pub player: Attribute,
    pub home_or_away: Attribute,
    pub player_id: Attribute,
    pub situation: Attribute,
    pub season: Attribute,
    pub shot_type: Attribute,
    pub match_id: Attribute,
    pub home_team: Attribute,
    pub away_team: Attribute,
    pub home_goals: Attribute,
    pub away_goals: Attribute,
    pub date: Attribute,
    pub player_assisted: Attribute,
    pub last_action: Attribute,
    pub player_team: Attribute,
}

pub fn install(registry: &mut AttributeRegistry) -> Result<UnderstatCatalog> {
    let src = DataSource::Understat;

    let id = Attribute::int("id", src)
        .rename_to("us_id")
        .normalizable(false)
        .build();
    let minute = Attribute::int("minute", src)
        .rename_to("us_minute")
        .normalizable(false)
        .build();
    let result = Attribute::string("result", src).rename_to("us_result").build();
    // Shot coordinates average rather than sum under aggregation.
    let x = Attribute::float("X", src)
        .rename_to("us_X")
        .agg(Aggregation::Mean)
        .normalizable(false)
        .build();
    let y = Attribute::float("Y", src)
        .rename_to("us_Y")
        .agg(Aggregation::Mean)
        .normalizable(false)
        .build();
    let xg = Attribute::float("xG", src)
        .rename_to("us_xG")
        .normalizable(false)
        .build();
    let player = Attribute::string("player", src).rename_to("us_player").build();
    let home_or_away = Attribute::string("h_a", src)
        .rename_to("us_home_or_away")
        .build();
    let player_id = Attribute::int("player_id", src)
        .rename_to("us_player_id")
        .normalizable(false)
        .build();
    let situation = Attribute::string("situation", src)
        .rename_to("us_situation")
        .build();
    let season = Attribute::int("season", src)
        .rename_to("us_season")
        .agg(Aggregation::First)
        .normalizable(false)
        .build();
    let shot_type = Attribute::string("shotType", src)
        .rename_to("us_shot_type")
        .build();
    let match_id = Attribute::int("match_id", src)
        .rename_to("us_match_id")
        .normalizable(false)
        .build();
    let home_team = Attribute::string("h_team", src)
        .rename_to("us_home_team")
        .build();
    let away_team = Attribute::string("a_team", src)
        .rename_to("us_away_team")
        .build();
    let home_goals = Attribute::int("h_goals", src)
        .rename_to("us_home_goals")
        .normalizable(false)
        .build();
    let away_goals = Attribute::int("a_goals", src)
        .rename_to("us_away_goals")
        .normalizable(false)
        .build();
    let date = Attribute::date("date", src).rename_to("us_date").build();
    let player_assisted = Attribute::string("player_assisted", src)
        .rename_to("us_player_assisted")
        .build();
    let last_action = Attribute::string("lastAction", src)
        .rename_to("us_last_action")
        .build();

    let player_team = Attribute::derived(
        "us_player_team",
        src,
        fx::iff(
            fx::col(&home_or_away).eq(fx::lit("h")),
            fx::col(&home_team),
            fx::col(&away_team),
        ),
    )
    .data_type(AttrType::Str)
    .agg(Aggregation::First)
    .recalculate(false)
    .build();

    let catalog = UnderstatCatalog {
        id,
        minute,
        result,
        x,
        y,
        xg,
        player,
        home_or_away,
        player_id,
        situation,
        season,
        shot_type,
        match_id,
        home_team,
        away_team,
        home_goals,
        away_goals,
        date,
        player_assisted,
        last_action,
        player_team,
    };

    for attr in [
        &catalog.id,
        &catalog.minute,
        &catalog.result,
        &catalog.x,
        &catalog.y,
        &catalog.xg,
        &catalog.player,
        &catalog.home_or_away,
        &catalog.player_id,
        &catalog.situation,
        &catalog.season,
        &catalog.shot_type,
        &catalog.match_id,
        &catalog.home_team,
        &catalog.away_team,
        &catalog.home_goals,
        &catalog.away_goals,
        &catalog.date,
        &catalog.player_assisted,
        &catalog.last_action,
        &catalog.player_team,
    ] {
        registry.register(attr.clone())?;
    }

    Ok(catalog)
}
