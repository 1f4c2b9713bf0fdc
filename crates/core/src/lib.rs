//! Declarative column algebra for tabular football data.
//!
//! The crate models stat columns as registered [`attributes::Attribute`]s,
//! native ones loaded from a provider table, derived ones defined once as
//! expression trees and recomputed whenever an operation changes their
//! inputs. Operations ([`ops::aggregate::aggregate_by`],
//! [`ops::normalize::per_90`], filters, ranking, possession adjustment) take
//! and return immutable [`dataset::Data`] values backed by polars.

pub mod attributes;
pub mod catalog;
pub mod dataset;
pub mod error;
pub mod events;
pub mod ops;
pub mod xthreat;

pub use attributes::expression::{AttrExpr, BinaryOp, LiteralValue};
pub use attributes::registry::AttributeRegistry;
pub use attributes::{Aggregation, AttrType, Attribute, DataSource};
pub use dataset::Data;
pub use error::{CoreError, Result};
pub use ops::aggregate::aggregate_by;
pub use ops::filter::{filter, Filter, FilterOp, FilterValue};
pub use ops::normalize::per_90;
pub use ops::possession::{possession_adjust, possession_factors, PossessionContext};
pub use ops::rank::percentile_rank;
pub use xthreat::ExpectedThreatGrid;
