//! FBref match-level catalog: native stat columns plus the derived formulas
//! computed from them.

use crate::attributes::expression as fx;
use crate::attributes::registry::AttributeRegistry;
use crate::attributes::{Aggregation, Attribute, DataSource};
use crate::catalog::list_all_values;
use crate::error::Result;

pub const TEAM_COL: &str = "squad";
pub const PLAYER_ID_COL: &str = "player_id";
pub const DATE_COL: &str = "date";

/// Teams dropped at load time. FBref reuses competition strings across
/// leagues (Russian and English Premier League, German and Austrian
/// Bundesliga), so these sneak into top-5 pulls.
pub const EXCLUDED_TEAMS: &[&str] = &[
    "CSKA Moscow",
    "Spartak Moscow",
    "Shakhtar",
    "Loko Moscow",
    "Krasnodar",
    "Dynamo Mosc",
    "Zenit",
    "Rostov",
    "Dynamo Kyiv",
    "RB Salzburg",
    "LASK",
    "Rubin Kazan",
    "Arsenal Tula",
    "Samara",
    "Sochi",
    "Austria Wien",
    "Sturm Graz",
    "Rapid Wien",
    "CS Emelec",
    "Independiente",
    "SK Dnipro-1",
];

pub struct FbrefCatalog {
    pub season: Attribute,
    pub player_id: Attribute,
    pub player: Attribute,
    pub date: Attribute,
    pub competition: Attribute,
    pub team: Attribute,
    pub opponent: Attribute,
    pub position: Attribute,
    pub minutes: Attribute,

    pub goals: Attribute,
    pub assists: Attribute,
    pub pens_made: Attribute,
    pub pens_att: Attribute,
    pub shots_total: Attribute,
    pub shots_on_target: Attribute,
    pub xg: Attribute,
    pub npxg: Attribute,
    pub xa: Attribute,
    pub sca: Attribute,
    pub sca_passes_dead: Attribute,
    pub gca: Attribute,
    pub passes_completed: Attribute,
    pub passes: Attribute,
    pub progressive_passes: Attribute,
    pub touches: Attribute,
    pub dribbles: Attribute,
    pub dribbles_completed: Attribute,
    pub cards_yellow: Attribute,
    pub cards_red: Attribute,
    pub fouls: Attribute,
    pub fouled: Attribute,
    pub ball_recoveries: Attribute,
    pub aerials_won: Attribute,
    pub aerials_lost: Attribute,

    pub tackles: Attribute,
    pub tackles_won: Attribute,
    pub interceptions: Attribute,
    pub blocks: Attribute,
    pub blocked_shots: Attribute,
    pub blocked_passes: Attribute,
    pub clearances: Attribute,
    pub pressures: Attribute,
    pub pressure_regains: Attribute,

    pub shot_pct: Attribute,
    pub xg_per_shot: Attribute,
    pub xg_outperform: Attribute,
    pub non_penalty_goals: Attribute,
    pub sca_live: Attribute,
    pub npxg_per_shot: Attribute,
    pub npxg_outperform: Attribute,
    pub npxg_outperform_per_shot: Attribute,
    pub non_penalty_goals_per_shot: Attribute,
}

impl FbrefCatalog {
    /// Defensive-action stats, scaled by the out-of-possession factor in
    /// possession adjustment.
    pub fn out_of_possession(&self) -> Vec<Attribute> {
        vec![
            self.tackles.clone(),
            self.tackles_won.clone(),
            self.interceptions.clone(),
            self.blocks.clone(),
            self.blocked_shots.clone(),
            self.blocked_passes.clone(),
            self.clearances.clone(),
            self.pressures.clone(),
            self.pressure_regains.clone(),
        ]
    }
}

pub fn install(registry: &mut AttributeRegistry) -> Result<FbrefCatalog> {
    let src = DataSource::FbRef;

    let season = Attribute::int("season", src)
        .agg(Aggregation::First)
        .normalizable(false)
        .build();
    let player_id = Attribute::string(PLAYER_ID_COL, src).build();
    let player = Attribute::string("player", src).build();
    let date = Attribute::date(DATE_COL, src).agg(Aggregation::None).build();
    let competition = Attribute::string("comp", src).agg(list_all_values()).build();
    let team = Attribute::string(TEAM_COL, src).agg(list_all_values()).build();
    let opponent = Attribute::string("opponent", src).agg(list_all_values()).build();
    let position = Attribute::string("position", src).agg(list_all_values()).build();
    // Minutes is the per-90 denominator; normalizing it would be circular.
    let minutes = Attribute::float("minutes", src).normalizable(false).build();

    let goals = Attribute::float("goals", src).build();
    let assists = Attribute::float("assists", src).build();
    let pens_made = Attribute::float("pens_made", src).build();
    let pens_att = Attribute::float("pens_att", src).build();
    let shots_total = Attribute::float("shots_total", src).build();
    let shots_on_target = Attribute::float("shots_on_target", src).build();
    let xg = Attribute::float("xg", src).build();
    let npxg = Attribute::float("npxg", src).build();
    let xa = Attribute::float("xa", src).build();
    let sca = Attribute::float("sca", src).build();
    let sca_passes_dead = Attribute::float("sca_passes_dead", src).build();
    let gca = Attribute::float("gca", src).build();
    let passes_completed = Attribute::float("passes_completed", src).build();
    let passes = Attribute::float("passes", src).build();
    let progressive_passes = Attribute::float("progressive_passes", src).build();
    let touches = Attribute::float("touches", src).build();
    let dribbles = Attribute::float("dribbles", src).build();
    let dribbles_completed = Attribute::float("dribbles_completed", src).build();
    let cards_yellow = Attribute::float("cards_yellow", src).build();
    let cards_red = Attribute::float("cards_red", src).build();
    let fouls = Attribute::float("fouls", src).build();
    let fouled = Attribute::float("fouled", src).build();
    let ball_recoveries = Attribute::float("ball_recoveries", src).build();
    let aerials_won = Attribute::float("aerials_won", src).build();
    let aerials_lost = Attribute::float("aerials_lost", src).build();

    let tackles = Attribute::float("tackles", src).build();
    let tackles_won = Attribute::float("tackles_won", src).build();
    let interceptions = Attribute::float("interceptions", src).build();
    let blocks = Attribute::float("blocks", src).build();
    let blocked_shots = Attribute::float("blocked_shots", src).build();
    let blocked_passes = Attribute::float("blocked_passes", src).build();
    let clearances = Attribute::float("clearances", src).build();
    let pressures = Attribute::float("pressures", src).build();
    let pressure_regains = Attribute::float("pressure_regains", src).build();

    let shot_pct = Attribute::derived(
        "shot_pct",
        src,
        fx::col(&shots_on_target) / fx::col(&shots_total) * fx::lit(100.0),
    )
    .build();
    let xg_per_shot =
        Attribute::derived("xg_per_shot", src, fx::col(&xg) / fx::col(&shots_total)).build();
    let xg_outperform =
        Attribute::derived("xg_outperform", src, fx::col(&goals) - fx::col(&xg)).build();
    let non_penalty_goals = Attribute::derived(
        "non_penalty_goals",
        src,
        fx::col(&goals) - fx::col(&pens_made),
    )
    .build();
    let sca_live =
        Attribute::derived("sca_live", src, fx::col(&sca) - fx::col(&sca_passes_dead)).build();
    let npxg_per_shot =
        Attribute::derived("npxg_per_shot", src, fx::col(&npxg) / fx::col(&shots_total)).build();
    // The remaining formulas read non_penalty_goals and npxg_outperform, so
    // they must be declared after them; attachment runs in registry order.
    let npxg_outperform = Attribute::derived(
        "npxg_outperform",
        src,
        fx::col(&non_penalty_goals) - fx::col(&npxg),
    )
    .build();
    let npxg_outperform_per_shot = Attribute::derived(
        "npxg_outperform_per_shot",
        src,
        fx::col(&npxg_outperform) / fx::col(&shots_total),
    )
    .build();
    let non_penalty_goals_per_shot = Attribute::derived(
        "non_penalty_goals_per_shot",
        src,
        fx::col(&non_penalty_goals) / fx::col(&shots_total),
    )
    .build();

    let catalog = FbrefCatalog {
        season,
        player_id,
        player,
        date,
        competition,
        team,
        opponent,
        position,
        minutes,
        goals,
        assists,
        pens_made,
        pens_att,
        shots_total,
        shots_on_target,
        xg,
        npxg,
        xa,
        sca,
        sca_passes_dead,
        gca,
        passes_completed,
        passes,
        progressive_passes,
        touches,
        dribbles,
        dribbles_completed,
        cards_yellow,
        cards_red,
        fouls,
        fouled,
        ball_recoveries,
        aerials_won,
        aerials_lost,
        tackles,
        tackles_won,
        interceptions,
        blocks,
        blocked_shots,
        blocked_passes,
        clearances,
        pressures,
        pressure_regains,
        shot_pct,
        xg_per_shot,
        xg_outperform,
        non_penalty_goals,
        sca_live,
        npxg_per_shot,
        npxg_outperform,
        npxg_outperform_per_shot,
        non_penalty_goals_per_shot,
    };

    for attr in [
        &catalog.season,
        &catalog.player_id,
        &catalog.player,
        &catalog.date,
        &catalog.competition,
        &catalog.team,
        &catalog.opponent,
        &catalog.position,
        &catalog.minutes,
        &catalog.goals,
        &catalog.assists,
        &catalog.pens_made,
        &catalog.pens_att,
        &catalog.shots_total,
        &catalog.shots_on_target,
        &catalog.xg,
        &catalog.npxg,
        &catalog.xa,
        &catalog.sca,
        &catalog.sca_passes_dead,
        &catalog.gca,
        &catalog.passes_completed,
        &catalog.passes,
        &catalog.progressive_passes,
        &catalog.touches,
        &catalog.dribbles,
        &catalog.dribbles_completed,
        &catalog.cards_yellow,
        &catalog.cards_red,
        &catalog.fouls,
        &catalog.fouled,
        &catalog.ball_recoveries,
        &catalog.aerials_won,
        &catalog.aerials_lost,
        &catalog.tackles,
        &catalog.tackles_won,
        &catalog.interceptions,
        &catalog.blocks,
        &catalog.blocked_shots,
        &catalog.blocked_passes,
        &catalog.clearances,
        &catalog.pressures,
        &catalog.pressure_regains,
        &catalog.shot_pct,
        &catalog.xg_per_shot,
        &catalog.xg_outperform,
        &catalog.non_penalty_goals,
        &catalog.sca_live,
        &catalog.npxg_per_shot,
        &catalog.npxg_outperform,
        &catalog.npxg_outperform_per_shot,
        &catalog.non_penalty_goals_per_shot,
    ] {
        registry.register(attr.clone())?;
    }

    Ok(catalog)
}
