//! Event classification over raw WhoScored-style event tables.
//!
//! Everything here is a pure predicate builder: functions return polars
//! boolean [`Expr`]s over the catalog's event columns, to be composed with
//! `and`/`or` and handed to a lazy filter. Pitch coordinates run 0..100 on
//! both axes, attacking left to right; distances scale x by 1.2 and y by 0.8
//! to approximate real pitch proportions.

use polars::prelude::*;

use crate::catalog::whoscored::{END_X_COL, END_Y_COL, EVENT_TYPE_COL, QUALIFIERS_COL, X_COL, Y_COL};

/// Raw event taxonomy, by provider code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum EventKind {
    Pass = 1,
    OffsidePass = 2,
    TakeOn = 3,
    Foul = 4,
    CornerAwarded = 6,
    Tackle = 7,
    Interception = 8,
    Turnover = 9,
    Save = 10,
    Claim = 11,
    Clearance = 12,
    MissedShots = 13,
    ShotOnPost = 14,
    SavedShot = 15,
    Goal = 16,
    Card = 17,
    SubstitutionOff = 18,
    SubstitutionOn = 19,
    FormationChange = 40,
    Punch = 41,
    GoodSkill = 42,
    Aerial = 44,
    Challenge = 45,
    BallRecovery = 49,
    Dispossessed = 50,
    Error = 51,
    KeeperPickup = 52,
    CrossNotClaimed = 53,
    Smother = 54,
    OffsideProvoked = 55,
    ShieldBallOpp = 56,
    PenaltyFaced = 58,
    KeeperSweeper = 59,
    ChanceMissed = 60,
    BallTouch = 61,
    OtherBallContact = 73,
    BlockedPass = 74,
    OffsideGiven = 10000,
}

impl EventKind {
    pub fn code(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum CardKind {
    Yellow = 31,
    SecondYellow = 32,
    Red = 33,
}

/// Shot attempts regardless of outcome.
pub const SHOT_KINDS: [EventKind; 4] = [
    EventKind::MissedShots,
    EventKind::ShotOnPost,
    EventKind::SavedShot,
    EventKind::Goal,
];

/// On-ball events that count as touches.
pub const TOUCH_KINDS: [EventKind; 3] =
    [EventKind::Pass, EventKind::OffsidePass, EventKind::TakeOn];

pub const MIDDLE_GOAL: (f64, f64) = (100.0, 50.0);
pub const TOP_GOAL: (f64, f64) = (100.0, 56.0);
pub const BOTTOM_GOAL: (f64, f64) = (100.0, 44.0);

pub fn event_is(kind: EventKind) -> Expr {
    col(EVENT_TYPE_COL).eq(lit(kind.code()))
}

fn event_in(kinds: &[EventKind]) -> Expr {
    let codes: Vec<i64> = kinds.iter().map(|k| k.code()).collect();
    col(EVENT_TYPE_COL).is_in(lit(Series::new("".into(), codes)))
}

/// Whether the event carries the named qualifier.
pub fn has_qualifier(display_name: &str) -> Expr {
    col(QUALIFIERS_COL)
        .str()
        .contains_literal(lit(display_name.to_string()))
}

/// Shot attempts of any outcome, excluding own goals.
pub fn is_shot() -> Expr {
    event_in(&SHOT_KINDS).and(has_qualifier("OwnGoal").not())
}

pub fn is_pass() -> Expr {
    event_is(EventKind::Pass)
}

/// Passes from open play.
pub fn is_open_play_pass() -> Expr {
    is_pass()
        .and(has_qualifier("CornerTaken").not())
        .and(has_qualifier("FreekickTaken").not())
        .and(has_qualifier("ThrowIn").not())
}

pub fn is_touch() -> Expr {
    event_in(&TOUCH_KINDS)
}

/// Squared scaled distance from an event coordinate pair to a fixed point.
fn squared_distance_to(x_col: &str, y_col: &str, target: (f64, f64)) -> Expr {
    let dx = (lit(target.0) - col(x_col)) * lit(1.2);
    let dy = (lit(target.1) - col(y_col)) * lit(0.8);
    dx.clone() * dx + dy.clone() * dy
}

fn min3(a: Expr, b: Expr, c: Expr) -> Expr {
    let ab = when(a.clone().lt(b.clone())).then(a).otherwise(b);
    when(ab.clone().lt(c.clone())).then(ab).otherwise(c)
}

/// Passes that move the ball at least 25% closer to the goal mouth, corners
/// excluded. Distances are to the nearest of the goal's centre and posts;
/// the comparison uses squared distances, which is order-preserving.
pub fn is_progressive() -> Expr {
    let start = min3(
        squared_distance_to(X_COL, Y_COL, MIDDLE_GOAL),
        squared_distance_to(X_COL, Y_COL, TOP_GOAL),
        squared_distance_to(X_COL, Y_COL, BOTTOM_GOAL),
    );
    let end = min3(
        squared_distance_to(END_X_COL, END_Y_COL, MIDDLE_GOAL),
        squared_distance_to(END_X_COL, END_Y_COL, TOP_GOAL),
        squared_distance_to(END_X_COL, END_Y_COL, BOTTOM_GOAL),
    );
    end.lt(start * lit(0.75 * 0.75))
        .and(is_pass())
        .and(has_qualifier("CornerTaken").not())
}

/// Pitch bands along the attacking direction. Each zone maps to a fixed
/// coordinate predicate; compose with an event predicate via [`in_zone`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerticalZone {
    DefensivePenaltyArea,
    DefensiveThird,
    MiddleThird,
    AttackingThird,
    AttackingPenaltyArea,
}

impl VerticalZone {
    pub const ALL: [VerticalZone; 5] = [
        VerticalZone::DefensivePenaltyArea,
        VerticalZone::DefensiveThird,
        VerticalZone::MiddleThird,
        VerticalZone::AttackingThird,
        VerticalZone::AttackingPenaltyArea,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            VerticalZone::DefensivePenaltyArea => "def_pen_area",
            VerticalZone::DefensiveThird => "def_3rd",
            VerticalZone::MiddleThird => "mid_3rd",
            VerticalZone::AttackingThird => "att_3rd",
            VerticalZone::AttackingPenaltyArea => "att_pen_area",
        }
    }

    /// Bounding box as ((x1, y1), (x2, y2)) in pitch coordinates.
    fn bounds(self) -> ((f64, f64), (f64, f64)) {
        match self {
            VerticalZone::DefensivePenaltyArea => ((0.0, 21.1), (17.0, 78.9)),
            VerticalZone::DefensiveThird => ((0.0, 0.0), (100.0 / 3.0, 100.0)),
            VerticalZone::MiddleThird => ((100.0 / 3.0, 0.0), (200.0 / 3.0, 100.0)),
            VerticalZone::AttackingThird => ((200.0 / 3.0, 0.0), (100.0, 100.0)),
            VerticalZone::AttackingPenaltyArea => ((83.0, 21.1), (100.0, 78.9)),
        }
    }

    /// Coordinate predicate for the zone, over the start coordinates or,
    /// with `end_coordinates`, over where the event finished.
    pub fn predicate(self, end_coordinates: bool) -> Expr {
        let (x_col, y_col) = if end_coordinates {
            (END_X_COL, END_Y_COL)
        } else {
            (X_COL, Y_COL)
        };
        let ((x1, y1), (x2, y2)) = self.bounds();
        col(x_col)
            .gt_eq(lit(x1))
            .and(col(x_col).lt_eq(lit(x2)))
            .and(col(y_col).gt_eq(lit(y1)))
            .and(col(y_col).lt_eq(lit(y2)))
    }
}

/// Restricts an event predicate to a pitch zone.
pub fn in_zone(base: Expr, zone: VerticalZone, end_coordinates: bool) -> Expr {
    base.and(zone.predicate(end_coordinates))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events() -> DataFrame {
        df!(
            "event_type" => &[1i64, 1, 16, 13, 6, 3],
            "x" => &[50.0, 91.0, 95.0, 88.0, 100.0, 40.0],
            "y" => &[50.0, 50.0, 50.0, 44.0, 0.0, 70.0],
            "endX" => &[85.0, 93.0, 100.0, 100.0, 95.0, 45.0],
            "endY" => &[50.0, 50.0, 50.0, 50.0, 50.0, 72.0],
            "qualifiers" => &["", "CornerTaken", "", "OwnGoal", "", ""],
        )
        .unwrap()
    }

    fn matching(expr: Expr) -> usize {
        events()
            .lazy()
            .filter(expr)
            .collect()
            .unwrap()
            .height()
    }

    #[test]
    fn shots_exclude_own_goals() {
        // Rows 2 and 3 are shot kinds but row 3 carries OwnGoal.
        assert_eq!(matching(is_shot()), 1);
    }

    #[test]
    fn progressive_requires_a_pass_without_corner() {
        // Row 0 halves its goal distance; row 1 barely moves; row 5 goes
        // backwards-ish. Only row 0 qualifies.
        assert_eq!(matching(is_progressive()), 1);
    }

    #[test]
    fn touches_cover_passes_and_take_ons() {
        assert_eq!(matching(is_touch()), 3);
    }

    #[test]
    fn zone_predicates_partition_thirds() {
        let in_attacking = matching(in_zone(is_touch(), VerticalZone::AttackingThird, false));
        let in_middle = matching(in_zone(is_touch(), VerticalZone::MiddleThird, false));
        let in_defensive = matching(in_zone(is_touch(), VerticalZone::DefensiveThird, false));
        assert_eq!(in_attacking + in_middle + in_defensive, 3);
        assert_eq!(in_attacking, 1);
    }
}
