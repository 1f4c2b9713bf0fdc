//! WhoScored raw-event catalog: one row per touch-level event, consumed by
//! the predicates in [`crate::events`] and the expected-threat lookup.

use crate::attributes::registry::AttributeRegistry;
use crate::attributes::{Aggregation, Attribute, DataSource};
use crate::error::Result;

pub const EVENT_TYPE_COL: &str = "event_type";
pub const X_COL: &str = "x";
pub const Y_COL: &str = "y";
pub const END_X_COL: &str = "endX";
pub const END_Y_COL: &str = "endY";
pub const QUALIFIERS_COL: &str = "qualifiers";

pub struct WhoscoredCatalog {
    pub event_type: Attribute,
    pub outcome_type: Attribute,
    pub x: Attribute,
    pub y: Attribute,
    pub end_x: Attribute,
    pub end_y: Attribute,
    /// Flattened qualifier display names for the event, as a single string.
    pub qualifiers: Attribute,
}

pub fn install(registry: &mut AttributeRegistry) -> Result<WhoscoredCatalog> {
    let src = DataSource::WhoScored;

    let catalog = WhoscoredCatalog {
        event_type: Attribute::int(EVENT_TYPE_COL, src)
            .agg(Aggregation::First)
            .normalizable(false)
            .build(),
        outcome_type: Attribute::int("outcome_type", src)
            .agg(Aggregation::First)
            .normalizable(false)
            .build(),
        x: Attribute::float(X_COL, src).normalizable(false).build(),
        y: Attribute::float(Y_COL, src).normalizable(false).build(),
        end_x: Attribute::float(END_X_COL, src).normalizable(false).build(),
        end_y: Attribute::float(END_Y_COL, src).normalizable(false).build(),
        qualifiers: Attribute::string(QUALIFIERS_COL, src)
            .agg(Aggregation::None)
            .build(),
    };

    for attr in [
        &catalog.event_type,
        &catalog.outcome_type,
        &catalog.x,
        &catalog.y,
        &catalog.end_x,
        &catalog.end_y,
        &catalog.qualifiers,
    ] {
        registry.register(attr.clone())?;
    }

    Ok(catalog)
}
