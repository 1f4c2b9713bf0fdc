//! Attribute definitions: typed column descriptors shared between provider
//! catalogs, the registry and the table operations.
//!
//! An [`Attribute`] is a cheap-clone handle (`Arc` inner) so catalogs can hand
//! the same definition to expressions, filters and grouping keys without
//! lifetime plumbing.

pub mod expression;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use self::expression::AttrExpr;

/// Provider a column originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSource {
    FbRef,
    Understat,
    WhoScored,
}

/// Logical column type; drives the cast stage of the load pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrType {
    Float,
    Int,
    Str,
    Date,
}

impl AttrType {
    pub fn is_numeric(self) -> bool {
        matches!(self, AttrType::Float | AttrType::Int)
    }

    pub(crate) fn polars_dtype(self) -> DataType {
        match self {
            AttrType::Float => DataType::Float64,
            AttrType::Int => DataType::Int64,
            AttrType::Str => DataType::String,
            AttrType::Date => DataType::Date,
        }
    }
}

/// How a column folds when rows are grouped. `None` means the naive reduction
/// drops the column; recalc-flagged derived attributes get re-added afterwards.
#[derive(Clone)]
pub enum Aggregation {
    None,
    Sum,
    Mean,
    First,
    /// Caller-supplied reduction, given the column's display name.
    Custom(Arc<dyn Fn(&str) -> Expr + Send + Sync>),
}

impl Aggregation {
    pub fn agg_expr(&self, name: &str) -> Option<Expr> {
        match self {
            Aggregation::None => None,
            Aggregation::Sum => Some(col(name).sum()),
            Aggregation::Mean => Some(col(name).mean()),
            Aggregation::First => Some(col(name).first()),
            Aggregation::Custom(build) => Some(build(name)),
        }
    }
}

impl fmt::Debug for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::None => f.write_str("None"),
            Aggregation::Sum => f.write_str("Sum"),
            Aggregation::Mean => f.write_str("Mean"),
            Aggregation::First => f.write_str("First"),
            Aggregation::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Optional provider-specific fixup applied to a native column before the
/// standard cast pipeline.
pub type SeriesTransform = Arc<dyn Fn(Series) -> PolarsResult<Series> + Send + Sync>;

/// A derived attribute computed by arbitrary table logic rather than an
/// expression tree.
pub type TableFn = Arc<dyn Fn(&DataFrame) -> Result<Column> + Send + Sync>;

#[derive(Clone)]
pub enum DerivedBody {
    Expression(AttrExpr),
    Callable(TableFn),
}

#[derive(Clone)]
pub(crate) enum AttributeKind {
    Native {
        transform: Option<SeriesTransform>,
    },
    Derived {
        recalculate_on_aggregation: bool,
        body: DerivedBody,
    },
}

pub(crate) struct AttributeInner {
    name: String,
    rename_to: Option<String>,
    data_type: AttrType,
    aggregation: Aggregation,
    source: DataSource,
    normalizable: bool,
    kind: AttributeKind,
}

/// A typed column descriptor. Equality is by name only: two attributes with
/// the same name describe the same column.
#[derive(Clone)]
pub struct Attribute {
    inner: Arc<AttributeInner>,
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.inner.name == other.inner.name
    }
}

impl Eq for Attribute {}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.inner.name)
            .field("data_type", &self.inner.data_type)
            .field("source", &self.inner.source)
            .field("derived", &self.is_derived())
            .finish()
    }
}

impl Attribute {
    pub fn float(name: &str, source: DataSource) -> NativeBuilder {
        NativeBuilder::new(name, AttrType::Float, source)
    }

    pub fn int(name: &str, source: DataSource) -> NativeBuilder {
        NativeBuilder::new(name, AttrType::Int, source)
    }

    pub fn string(name: &str, source: DataSource) -> NativeBuilder {
        NativeBuilder::new(name, AttrType::Str, source)
    }

    pub fn date(name: &str, source: DataSource) -> NativeBuilder {
        NativeBuilder::new(name, AttrType::Date, source)
    }

    /// A derived attribute defined by an expression tree.
    pub fn derived(name: &str, source: DataSource, expr: AttrExpr) -> DerivedBuilder {
        DerivedBuilder::new(name, source, DerivedBody::Expression(expr))
    }

    /// A derived attribute defined by an arbitrary table function.
    pub fn derived_fn<F>(name: &str, source: DataSource, f: F) -> DerivedBuilder
    where
        F: Fn(&DataFrame) -> Result<Column> + Send + Sync + 'static,
    {
        DerivedBuilder::new(name, source, DerivedBody::Callable(Arc::new(f)))
    }

    /// The provider-side column name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The name the column carries inside tables: `rename_to` when set,
    /// otherwise the provider name.
    pub fn display_name(&self) -> &str {
        self.inner.rename_to.as_deref().unwrap_or(&self.inner.name)
    }

    pub fn data_type(&self) -> AttrType {
        self.inner.data_type
    }

    pub fn aggregation(&self) -> &Aggregation {
        &self.inner.aggregation
    }

    pub fn source(&self) -> DataSource {
        self.inner.source
    }

    pub fn is_normalizable(&self) -> bool {
        self.inner.normalizable
    }

    pub fn is_native(&self) -> bool {
        matches!(self.inner.kind, AttributeKind::Native { .. })
    }

    pub fn is_derived(&self) -> bool {
        matches!(self.inner.kind, AttributeKind::Derived { .. })
    }

    /// Whether the attribute must be recomputed after an aggregation or
    /// normalization changed its inputs. Always false for natives.
    pub fn recalculates_on_aggregation(&self) -> bool {
        match &self.inner.kind {
            AttributeKind::Native { .. } => false,
            AttributeKind::Derived {
                recalculate_on_aggregation,
                ..
            } => *recalculate_on_aggregation,
        }
    }

    /// Runs the native load pipeline on a raw provider series:
    /// user transform, pre-cast fixup, cast, post-cast fixup.
    ///
    /// For numeric types the pre stage rewrites blank strings to "0" and the
    /// post stage fills null and NaN with zero, so provider gaps read as zero
    /// counts. Derived attributes pass through untouched.
    pub fn load_series(&self, series: Series) -> Result<Series> {
        let AttributeKind::Native { transform } = &self.inner.kind else {
            return Ok(series);
        };
        let mut s = series;
        if let Some(t) = transform {
            s = t(s)?;
        }
        if self.inner.data_type.is_numeric() {
            s = blank_strings_to_zero(s)?;
        }
        s = s.cast(&self.inner.data_type.polars_dtype())?;
        s = match self.inner.data_type {
            AttrType::Float => fill_invalid_floats(s)?,
            AttrType::Int => fill_missing_ints(s)?,
            _ => s,
        };
        Ok(s)
    }

    /// Materializes the attribute's column from a table.
    ///
    /// Natives are a plain lookup by display name; derived attributes run
    /// their body against the table.
    pub fn compute(&self, frame: &DataFrame) -> Result<Column> {
        match &self.inner.kind {
            AttributeKind::Native { .. } => {
                let name = self.display_name();
                if !has_column(frame, name) {
                    return Err(CoreError::missing_column(name, "native attribute lookup"));
                }
                Ok(frame.column(name)?.clone())
            }
            AttributeKind::Derived { body, .. } => {
                let mut column = match body {
                    DerivedBody::Expression(expr) => expr.evaluate(frame)?,
                    DerivedBody::Callable(f) => f(frame)?,
                };
                column.rename(self.display_name().into());
                Ok(column)
            }
        }
    }
}

pub(crate) fn has_column(frame: &DataFrame, name: &str) -> bool {
    frame.get_column_names().iter().any(|c| c.as_str() == name)
}

fn blank_strings_to_zero(series: Series) -> PolarsResult<Series> {
    if series.dtype() != &DataType::String {
        return Ok(series);
    }
    let name = series.name().clone();
    let fixed: StringChunked = series
        .str()?
        .into_iter()
        .map(|v| v.map(|x| if x.trim().is_empty() { "0" } else { x }))
        .collect();
    Ok(fixed.with_name(name).into_series())
}

fn fill_invalid_floats(series: Series) -> PolarsResult<Series> {
    let name = series.name().clone();
    let filled: Float64Chunked = series
        .f64()?
        .into_iter()
        .map(|v| match v {
            Some(x) if !x.is_nan() => Some(x),
            _ => Some(0.0),
        })
        .collect();
    Ok(filled.with_name(name).into_series())
}

fn fill_missing_ints(series: Series) -> PolarsResult<Series> {
    let name = series.name().clone();
    let filled: Int64Chunked = series
        .i64()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(0)))
        .collect();
    Ok(filled.with_name(name).into_series())
}

/// Builder for native attributes. Float and int columns default to sum
/// aggregation and are normalizable; strings and dates default to first and
/// are not.
pub struct NativeBuilder {
    name: String,
    rename_to: Option<String>,
    data_type: AttrType,
    aggregation: Aggregation,
    source: DataSource,
    normalizable: bool,
    transform: Option<SeriesTransform>,
}

impl NativeBuilder {
    fn new(name: &str, data_type: AttrType, source: DataSource) -> Self {
        let (aggregation, normalizable) = if data_type.is_numeric() {
            (Aggregation::Sum, true)
        } else {
            (Aggregation::First, false)
        };
        Self {
            name: name.to_string(),
            rename_to: None,
            data_type,
            aggregation,
            source,
            normalizable,
            transform: None,
        }
    }

    pub fn agg(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn rename_to(mut self, name: &str) -> Self {
        self.rename_to = Some(name.to_string());
        self
    }

    pub fn normalizable(mut self, normalizable: bool) -> Self {
        self.normalizable = normalizable;
        self
    }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(Series) -> PolarsResult<Series> + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(f));
        self
    }

    pub fn build(self) -> Attribute {
        Attribute {
            inner: Arc::new(AttributeInner {
                name: self.name,
                rename_to: self.rename_to,
                data_type: self.data_type,
                aggregation: self.aggregation,
                source: self.source,
                normalizable: self.normalizable,
                kind: AttributeKind::Native {
                    transform: self.transform,
                },
            }),
        }
    }
}

/// Builder for derived attributes. Defaults: float, no aggregation rule,
/// recomputed after aggregation, not normalizable.
pub struct DerivedBuilder {
    name: String,
    data_type: AttrType,
    aggregation: Aggregation,
    source: DataSource,
    normalizable: bool,
    recalculate: bool,
    body: DerivedBody,
}

impl DerivedBuilder {
    fn new(name: &str, source: DataSource, body: DerivedBody) -> Self {
        Self {
            name: name.to_string(),
            data_type: AttrType::Float,
            aggregation: Aggregation::None,
            source,
            normalizable: false,
            recalculate: true,
            body,
        }
    }

    pub fn data_type(mut self, data_type: AttrType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn agg(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn normalizable(mut self, normalizable: bool) -> Self {
        self.normalizable = normalizable;
        self
    }

    pub fn recalculate(mut self, recalculate: bool) -> Self {
        self.recalculate = recalculate;
        self
    }

    pub fn build(self) -> Attribute {
        Attribute {
            inner: Arc::new(AttributeInner {
                name: self.name,
                rename_to: None,
                data_type: self.data_type,
                aggregation: self.aggregation,
                source: self.source,
                normalizable: self.normalizable,
                kind: AttributeKind::Derived {
                    recalculate_on_aggregation: self.recalculate,
                    body: self.body,
                },
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::expression as fx;

    #[test]
    fn native_builder_defaults_follow_type() {
        let shots = Attribute::float("shots_total", DataSource::FbRef).build();
        assert!(shots.is_native());
        assert!(shots.is_normalizable());
        assert!(matches!(shots.aggregation(), Aggregation::Sum));

        let team = Attribute::string("team", DataSource::FbRef).build();
        assert!(!team.is_normalizable());
        assert!(matches!(team.aggregation(), Aggregation::First));
    }

    #[test]
    fn display_name_prefers_rename() {
        let xg = Attribute::float("xg_expected", DataSource::Understat)
            .rename_to("us_xg")
            .build();
        assert_eq!(xg.name(), "xg_expected");
        assert_eq!(xg.display_name(), "us_xg");
    }

    #[test]
    fn numeric_load_pipeline_fills_blanks_and_nulls() {
        let attr = Attribute::float("goals", DataSource::FbRef).build();
        let raw = Series::new("goals".into(), &[Some("2"), Some(""), None, Some("1.5")]);
        let loaded = attr.load_series(raw).unwrap();
        assert_eq!(loaded.dtype(), &DataType::Float64);
        let values: Vec<f64> = loaded.f64().unwrap().into_no_null_iter().collect();
        assert_eq!(values, vec![2.0, 0.0, 0.0, 1.5]);
    }

    #[test]
    fn user_transform_runs_before_cast() {
        // The transform sees the raw strings; a post-cast hook could not.
        let attr = Attribute::int("yellow_cards", DataSource::FbRef)
            .transform(|s| {
                let name = s.name().clone();
                let fixed: StringChunked = s
                    .str()?
                    .into_iter()
                    .map(|v| v.map(|x| x.trim_start_matches('~')))
                    .collect();
                Ok(fixed.with_name(name).into_series())
            })
            .build();
        let raw = Series::new("yellow_cards".into(), &["~3", "1", ""]);
        let loaded = attr.load_series(raw).unwrap();
        let values: Vec<i64> = loaded.i64().unwrap().into_no_null_iter().collect();
        assert_eq!(values, vec![3, 1, 0]);
    }

    #[test]
    fn callable_derived_sees_the_whole_table() {
        let margin = Attribute::derived_fn("margin", DataSource::FbRef, |frame| {
            let scored = frame.column("goals_for")?.f64()?;
            let conceded = frame.column("goals_against")?.f64()?;
            let diff: Float64Chunked = scored
                .into_iter()
                .zip(conceded)
                .map(|(a, b)| Some(a.unwrap_or(0.0) - b.unwrap_or(0.0)))
                .collect();
            Ok(diff.into_series().into_column())
        })
        .build();

        let frame = df!(
            "goals_for" => &[3.0, 0.0],
            "goals_against" => &[1.0, 2.0],
        )
        .unwrap();
        let column = margin.compute(&frame).unwrap();
        let values: Vec<f64> = column
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(values, vec![2.0, -2.0]);
    }

    #[test]
    fn compute_is_idempotent_on_an_unchanged_table() {
        let goals = Attribute::float("goals", DataSource::FbRef).build();
        let shots = Attribute::float("shots_total", DataSource::FbRef).build();
        let conversion = Attribute::derived(
            "conversion",
            DataSource::FbRef,
            fx::col(&goals) / fx::col(&shots) * fx::lit(100.0),
        )
        .build();

        let frame = df!(
            "goals" => &[1.0, 2.0],
            "shots_total" => &[2.0, 8.0],
        )
        .unwrap();
        let first = conversion.compute(&frame).unwrap();
        let second = conversion.compute(&frame).unwrap();
        assert_eq!(
            first.as_materialized_series(),
            second.as_materialized_series()
        );
    }

    #[test]
    fn derived_compute_names_column_after_attribute() {
        let goals = Attribute::float("goals", DataSource::FbRef).build();
        let doubled = Attribute::derived(
            "goals_doubled",
            DataSource::FbRef,
            fx::col(&goals) * fx::lit(2.0),
        )
        .build();

        let frame = df!("goals" => &[1.0, 3.0]).unwrap();
        let column = doubled.compute(&frame).unwrap();
        assert_eq!(column.name().as_str(), "goals_doubled");
        let values: Vec<f64> = column
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(values, vec![2.0, 6.0]);
    }
}
