//! Row filters: declarative (attribute, operator, value) triples lowered to
//! polars predicates.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::attributes::{has_column, Attribute};
use crate::dataset::Data;
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Equal,
    NotEqual,
    IsIn,
    Contains,
    NotContains,
    ContainsOneOf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterValue {
    Float(f64),
    Int(i64),
    Str(String),
    List(Vec<String>),
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        FilterValue::Float(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Int(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Str(v.to_string())
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(v: Vec<String>) -> Self {
        FilterValue::List(v)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(v: Vec<&str>) -> Self {
        FilterValue::List(v.into_iter().map(str::to_string).collect())
    }
}

/// A single row-selection criterion. Filters only select rows; they never
/// change columns or values.
#[derive(Clone)]
pub struct Filter {
    attribute: Attribute,
    op: FilterOp,
    value: FilterValue,
}

impl Filter {
    pub fn new(attribute: &Attribute, op: FilterOp, value: impl Into<FilterValue>) -> Self {
        Self {
            attribute: attribute.clone(),
            op,
            value: value.into(),
        }
    }

    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    fn scalar_lit(&self) -> Result<Expr> {
        match &self.value {
            FilterValue::Float(v) => Ok(lit(*v)),
            FilterValue::Int(v) => Ok(lit(*v)),
            FilterValue::Str(v) => Ok(lit(v.clone())),
            FilterValue::List(_) => Err(CoreError::invalid_filter(format!(
                "operator {:?} on '{}' takes a scalar value, got a list",
                self.op,
                self.attribute.display_name()
            ))),
        }
    }

    fn list_values(&self) -> Result<&[String]> {
        match &self.value {
            FilterValue::List(values) => Ok(values),
            _ => Err(CoreError::invalid_filter(format!(
                "operator {:?} on '{}' takes a list of values",
                self.op,
                self.attribute.display_name()
            ))),
        }
    }

    fn substring(&self) -> Result<&str> {
        match &self.value {
            FilterValue::Str(v) => Ok(v),
            _ => Err(CoreError::invalid_filter(format!(
                "operator {:?} on '{}' takes a string value",
                self.op,
                self.attribute.display_name()
            ))),
        }
    }

    /// Lowers the criterion to a polars boolean expression.
    pub fn predicate(&self) -> Result<Expr> {
        let column = col(self.attribute.display_name());
        match self.op {
            FilterOp::GreaterThan => Ok(column.gt(self.scalar_lit()?)),
            FilterOp::GreaterOrEqual => Ok(column.gt_eq(self.scalar_lit()?)),
            FilterOp::LessThan => Ok(column.lt(self.scalar_lit()?)),
            FilterOp::LessOrEqual => Ok(column.lt_eq(self.scalar_lit()?)),
            FilterOp::Equal => Ok(column.eq(self.scalar_lit()?)),
            FilterOp::NotEqual => Ok(column.neq(self.scalar_lit()?)),
            FilterOp::IsIn => {
                let values = self.list_values()?;
                let series = Series::new("".into(), values);
                Ok(column.is_in(lit(series)))
            }
            FilterOp::Contains => {
                Ok(column.str().contains_literal(lit(self.substring()?.to_string())))
            }
            FilterOp::NotContains => Ok(column
                .str()
                .contains_literal(lit(self.substring()?.to_string()))
                .not()),
            FilterOp::ContainsOneOf => {
                let values = self.list_values()?;
                if values.is_empty() {
                    return Err(CoreError::invalid_filter(format!(
                        "ContainsOneOf on '{}' requires at least one value",
                        self.attribute.display_name()
                    )));
                }
                let mut pred: Option<Expr> = None;
                for value in values {
                    let clause = col(self.attribute.display_name())
                        .str()
                        .contains_literal(lit(value.clone()));
                    pred = Some(match pred {
                        Some(p) => p.or(clause),
                        None => clause,
                    });
                }
                Ok(pred.unwrap())
            }
        }
    }

    pub fn apply(&self, frame: &DataFrame) -> Result<DataFrame> {
        let name = self.attribute.display_name();
        if !has_column(frame, name) {
            return Err(CoreError::missing_column(name, "filter"));
        }
        Ok(frame.clone().lazy().filter(self.predicate()?).collect()?)
    }
}

/// Applies the filters in order. Selection is conjunctive, so the order only
/// affects intermediate sizes, not the result.
pub fn filter(data: &Data, filters: &[Filter]) -> Result<Data> {
    let mut frame = data.table().clone();
    for f in filters {
        frame = f.apply(&frame)?;
    }
    Ok(Data::with_parts(
        frame,
        data.original().clone(),
        data.grouping_keys().to_vec(),
    ))
}
