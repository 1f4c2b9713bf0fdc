//! Fixed provider catalogs. Each `install` registers the provider's
//! attributes into a caller-supplied registry and returns a struct of handles
//! for building expressions, filters and grouping keys.

pub mod fbref;
pub mod understat;
pub mod whoscored;

use std::sync::Arc;

use polars::prelude::*;

use crate::attributes::Aggregation;

/// Aggregation that keeps every distinct value, comma-joined. Used for
/// labels like team or position where a grouped row spans several values.
pub fn list_all_values() -> Aggregation {
    Aggregation::Custom(Arc::new(|name| col(name).unique().str().join(",", true)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::registry::AttributeRegistry;

    #[test]
    fn catalogs_install_side_by_side() {
        let mut registry = AttributeRegistry::new();
        let fb = fbref::install(&mut registry).unwrap();
        let us = understat::install(&mut registry).unwrap();
        let ws = whoscored::install(&mut registry).unwrap();

        assert!(registry.get("goals").is_some());
        assert!(registry.get("us_player_team").is_some());
        assert!(registry.get("event_type").is_some());
        assert_eq!(fb.minutes.display_name(), "minutes");
        assert_eq!(us.xg.display_name(), "us_xG");
        assert_eq!(ws.event_type.name(), "event_type");
    }

    #[test]
    fn installing_a_catalog_twice_is_a_duplicate_error() {
        let mut registry = AttributeRegistry::new();
        fbref::install(&mut registry).unwrap();
        assert!(fbref::install(&mut registry).is_err());
    }
}
