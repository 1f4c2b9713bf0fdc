//! The expression tree behind derived attributes.
//!
//! Formulas are built once at catalog-definition time and evaluated lazily
//! against whatever table they are asked to run on, so the same definition
//! yields per-match ratios on raw rows and season ratios on aggregated rows.
//!
//! Trees lower to polars [`Expr`]s; division casts both operands to `Float64`
//! so integer columns follow float division semantics (zero denominators
//! produce inf/NaN instead of erroring).

use std::collections::BTreeSet;
use std::ops;

use polars::prelude::*;

use crate::attributes::{has_column, Attribute};
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Float(f64),
    Int(i64),
    Str(String),
    Bool(bool),
}

impl From<f64> for LiteralValue {
    fn from(v: f64) -> Self {
        LiteralValue::Float(v)
    }
}

impl From<i64> for LiteralValue {
    fn from(v: i64) -> Self {
        LiteralValue::Int(v)
    }
}

impl From<&str> for LiteralValue {
    fn from(v: &str) -> Self {
        LiteralValue::Str(v.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(v: String) -> Self {
        LiteralValue::Str(v)
    }
}

impl From<bool> for LiteralValue {
    fn from(v: bool) -> Self {
        LiteralValue::Bool(v)
    }
}

#[derive(Clone)]
pub enum AttrExpr {
    Literal(LiteralValue),
    Column(Attribute),
    Binary {
        op: BinaryOp,
        lhs: Box<AttrExpr>,
        rhs: Box<AttrExpr>,
    },
    Sum(Box<AttrExpr>),
    If {
        condition: Box<AttrExpr>,
        when_true: Box<AttrExpr>,
        when_false: Box<AttrExpr>,
    },
}

/// Leaf referencing an attribute's column by display name.
pub fn col(attribute: &Attribute) -> AttrExpr {
    AttrExpr::Column(attribute.clone())
}

/// Constant leaf.
pub fn lit(value: impl Into<LiteralValue>) -> AttrExpr {
    AttrExpr::Literal(value.into())
}

/// Column-wise total of the operand.
pub fn sum(operand: AttrExpr) -> AttrExpr {
    AttrExpr::Sum(Box::new(operand))
}

/// Row-wise conditional.
pub fn iff(condition: AttrExpr, when_true: AttrExpr, when_false: AttrExpr) -> AttrExpr {
    AttrExpr::If {
        condition: Box::new(condition),
        when_true: Box::new(when_true),
        when_false: Box::new(when_false),
    }
}

impl AttrExpr {
    fn binary(op: BinaryOp, lhs: AttrExpr, rhs: AttrExpr) -> AttrExpr {
        AttrExpr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Row-wise equality. A method rather than `PartialEq` so that `==` keeps
    /// its ordinary meaning on the tree itself.
    pub fn eq(self, other: AttrExpr) -> AttrExpr {
        AttrExpr::binary(BinaryOp::Equal, self, other)
    }

    /// Collects the display names of every column the tree reads.
    pub fn required_columns(&self, out: &mut BTreeSet<String>) {
        match self {
            AttrExpr::Literal(_) => {}
            AttrExpr::Column(attr) => {
                out.insert(attr.display_name().to_string());
            }
            AttrExpr::Binary { lhs, rhs, .. } => {
                lhs.required_columns(out);
                rhs.required_columns(out);
            }
            AttrExpr::Sum(operand) => operand.required_columns(out),
            AttrExpr::If {
                condition,
                when_true,
                when_false,
            } => {
                condition.required_columns(out);
                when_true.required_columns(out);
                when_false.required_columns(out);
            }
        }
    }

    /// Lowers the tree to a polars expression.
    pub fn to_polars(&self) -> Expr {
        match self {
            AttrExpr::Literal(value) => match value {
                LiteralValue::Float(v) => polars::prelude::lit(*v),
                LiteralValue::Int(v) => polars::prelude::lit(*v),
                LiteralValue::Str(v) => polars::prelude::lit(v.clone()),
                LiteralValue::Bool(v) => polars::prelude::lit(*v),
            },
            AttrExpr::Column(attr) => polars::prelude::col(attr.display_name()),
            AttrExpr::Binary { op, lhs, rhs } => {
                let l = lhs.to_polars();
                let r = rhs.to_polars();
                match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Subtract => l - r,
                    BinaryOp::Multiply => l * r,
                    BinaryOp::Divide => {
                        l.cast(DataType::Float64) / r.cast(DataType::Float64)
                    }
                    BinaryOp::Equal => l.eq(r),
                }
            }
            AttrExpr::Sum(operand) => operand.to_polars().sum(),
            AttrExpr::If {
                condition,
                when_true,
                when_false,
            } => when(condition.to_polars())
                .then(when_true.to_polars())
                .otherwise(when_false.to_polars()),
        }
    }

    /// Evaluates the tree against a table.
    ///
    /// Referenced columns are checked up front so an out-of-order catalog
    /// definition surfaces as a `MissingColumn` error naming the offender.
    pub fn evaluate(&self, frame: &DataFrame) -> Result<Column> {
        let mut required = BTreeSet::new();
        self.required_columns(&mut required);
        for name in &required {
            if !has_column(frame, name) {
                return Err(CoreError::missing_column(name, "expression evaluation"));
            }
        }
        let mut out = frame
            .clone()
            .lazy()
            .select([self.to_polars().alias("__expr_out")])
            .collect()?;
        Ok(out.drop_in_place("__expr_out")?)
    }
}

impl ops::Add for AttrExpr {
    type Output = AttrExpr;
    fn add(self, rhs: AttrExpr) -> AttrExpr {
        AttrExpr::binary(BinaryOp::Add, self, rhs)
    }
}

impl ops::Sub for AttrExpr {
    type Output = AttrExpr;
    fn sub(self, rhs: AttrExpr) -> AttrExpr {
        AttrExpr::binary(BinaryOp::Subtract, self, rhs)
    }
}

impl ops::Mul for AttrExpr {
    type Output = AttrExpr;
    fn mul(self, rhs: AttrExpr) -> AttrExpr {
        AttrExpr::binary(BinaryOp::Multiply, self, rhs)
    }
}

impl ops::Div for AttrExpr {
    type Output = AttrExpr;
    fn div(self, rhs: AttrExpr) -> AttrExpr {
        AttrExpr::binary(BinaryOp::Divide, self, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::DataSource;

    fn floats(column: &Column) -> Vec<f64> {
        column
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect()
    }

    #[test]
    fn ratio_formula_evaluates_per_row() {
        let goals = Attribute::float("goals", DataSource::FbRef).build();
        let shots = Attribute::float("shots_total", DataSource::FbRef).build();
        let pct = col(&goals) / col(&shots) * lit(100.0);

        let frame = df!(
            "goals" => &[1.0, 2.0, 1.0, 3.0, 1.0],
            "shots_total" => &[2.0, 2.0, 2.0, 3.0, 3.0],
        )
        .unwrap();
        let out = pct.evaluate(&frame).unwrap();
        let values = floats(&out);
        assert_eq!(values[0], 50.0);
        assert_eq!(values[1], 100.0);
        assert!((values[4] - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn integer_division_follows_float_semantics() {
        let goals = Attribute::int("goals", DataSource::FbRef).build();
        let shots = Attribute::int("shots_total", DataSource::FbRef).build();
        let ratio = col(&goals) / col(&shots);

        let frame = df!(
            "goals" => &[1i64, 0, 2],
            "shots_total" => &[2i64, 0, 0],
        )
        .unwrap();
        let out = ratio.evaluate(&frame).unwrap();
        let values: Vec<f64> = out
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        assert_eq!(values[0], 0.5);
        assert!(values[1].is_nan() || values[1] == 0.0 || values[1].is_infinite());
        assert!(values[2].is_infinite() || values[2].is_nan());
    }

    #[test]
    fn sum_broadcasts_a_total() {
        let touches = Attribute::float("touches", DataSource::WhoScored).build();
        let share = col(&touches) / sum(col(&touches));

        let frame = df!("touches" => &[10.0, 30.0]).unwrap();
        let out = share.evaluate(&frame).unwrap();
        assert_eq!(floats(&out), vec![0.25, 0.75]);
    }

    #[test]
    fn conditional_selects_between_columns() {
        let side = Attribute::string("h_a", DataSource::Understat).build();
        let home = Attribute::string("home_team", DataSource::Understat).build();
        let away = Attribute::string("away_team", DataSource::Understat).build();
        let team = iff(col(&side).eq(lit("h")), col(&home), col(&away));

        let frame = df!(
            "h_a" => &["h", "a"],
            "home_team" => &["Arsenal", "Spurs"],
            "away_team" => &["Chelsea", "Wolves"],
        )
        .unwrap();
        let out = team.evaluate(&frame).unwrap();
        let values: Vec<&str> = out
            .as_materialized_series()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(values, vec!["Arsenal", "Wolves"]);
    }

    #[test]
    fn missing_input_is_reported_by_name() {
        let goals = Attribute::float("goals", DataSource::FbRef).build();
        let shots = Attribute::float("shots_total", DataSource::FbRef).build();
        let expr = col(&goals) / col(&shots);

        let frame = df!("goals" => &[1.0]).unwrap();
        let err = expr.evaluate(&frame).unwrap_err();
        match err {
            CoreError::MissingColumn { column, .. } => assert_eq!(column, "shots_total"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
