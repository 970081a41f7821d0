//! # Boundary Predicate
//!
//! Builds the `WHERE` fragment selecting the rows strictly after a cursor in
//! the query's sort order. For sort keys `k1..kn` and cursor values `v1..vn` it
//! is the row-value comparison `(k1, .., kn) > (v1, .., vn)` unrolled column by
//! column, a "staircase":
//!
//! ```text
//!    (k1 > v1)
//! OR (k1 = v1 AND k2 > v2)
//! OR (k1 = v1 AND k2 = v2 AND k3 > v3) ...
//! ```
//!
//! Unrolling lets each step use its own operator (`>` for ascending keys, `<`
//! for descending ones) and its own NULL handling, which a single SQL tuple
//! comparison cannot express:
//!
//! - a NULL cursor value matches with `IS NULL` in the equality prefix;
//! - a NULL cursor value at the boundary step selects `IS NOT NULL` when NULLs
//!   sort first, and nothing at all when NULLs sort last (no non-NULL value
//!   sorts after a trailing NULL group);
//! - a non-NULL cursor value on a nullable column also admits `IS NULL` when
//!   NULLs sort last, since NULL fails every comparison.
//!
//! Backward pages are built against the reversed order, so "after" always
//! means "further in the direction of travel".
//!
//! Keys missing from the cursor carry no information and are dropped before
//! the staircase is built; cursor entries that match no sort key are ignored.
//! Values are bound as statement parameters, so they can never collide with
//! parameters of the surrounding query.

use sea_orm::{
    Condition,
    sea_query::{Expr, SimpleExpr},
};

use crate::codec::{CursorDirection, CursorPayload};
use crate::order::{Direction, NullPlacement, OrderKey, OrderSpec};
use crate::value::CursorValue;

/// Predicate restricting a query to the rows after a cursor
#[derive(Debug, Clone)]
pub enum Boundary {
    /// No sort key has a cursor value; the query is not restricted
    Unbounded,
    /// Every step is impossible; the page is empty
    Empty,
    /// One condition per non-degenerate step, OR-ed together
    Staircase(Vec<Condition>),
}

impl Boundary {
    /// Number of OR-ed steps (zero for `Unbounded` and `Empty`)
    #[must_use]
    pub fn steps(&self) -> usize {
        match self {
            Self::Staircase(steps) => steps.len(),
            Self::Unbounded | Self::Empty => 0,
        }
    }

    /// The condition to AND into the query's `WHERE`, or `None` when unbounded
    #[must_use]
    pub fn into_condition(self) -> Option<Condition> {
        match self {
            Self::Unbounded => None,
            Self::Empty => Some(Condition::all().add(SimpleExpr::Custom("1 = 0".to_string()))),
            Self::Staircase(steps) => Some(
                steps
                    .into_iter()
                    .fold(Condition::any(), |any, step| any.add(step)),
            ),
        }
    }
}

/// Build the boundary predicate for `payload` over `spec`.
///
/// `expr_of` renders a key as SQL; `is_nullable` reports whether the key's
/// column may hold NULL.
pub fn build_boundary<X, N>(
    spec: &OrderSpec,
    payload: &CursorPayload,
    expr_of: X,
    is_nullable: N,
) -> Boundary
where
    X: Fn(&OrderKey) -> SimpleExpr,
    N: Fn(&str) -> bool,
{
    let travel = match payload.direction {
        CursorDirection::Next => spec.clone(),
        CursorDirection::Prev => spec.reversed(),
    };

    let known: Vec<(&OrderKey, &CursorValue)> = travel
        .iter()
        .filter_map(|key| payload.values.get(&key.key).map(|value| (key, value)))
        .collect();

    if known.is_empty() {
        return Boundary::Unbounded;
    }

    let mut steps = Vec::with_capacity(known.len());
    for (position, (key, value)) in known.iter().enumerate() {
        let Some(edge) = edge_test(key, value, expr_of(key), is_nullable(&key.key)) else {
            continue;
        };

        let step = known[..position]
            .iter()
            .fold(Condition::all(), |all, (prior, prior_value)| {
                all.add(equality(expr_of(prior), prior_value))
            })
            .add(edge);
        steps.push(step);
    }

    if steps.is_empty() {
        Boundary::Empty
    } else {
        Boundary::Staircase(steps)
    }
}

fn equality(expr: SimpleExpr, value: &CursorValue) -> SimpleExpr {
    match value.to_query_value() {
        Some(value) => Expr::expr(expr).eq(value),
        None => Expr::expr(expr).is_null(),
    }
}

/// Test admitting the rows strictly after `value` on this key, `None` when no
/// row can be
fn edge_test(
    key: &OrderKey,
    value: &CursorValue,
    expr: SimpleExpr,
    nullable: bool,
) -> Option<Condition> {
    let nulls = key.effective_nulls();

    let Some(value) = value.to_query_value() else {
        return match nulls {
            NullPlacement::First => Some(Condition::all().add(Expr::expr(expr).is_not_null())),
            NullPlacement::Last => None,
        };
    };

    let past = match key.direction {
        Direction::Asc => Expr::expr(expr.clone()).gt(value),
        Direction::Desc => Expr::expr(expr.clone()).lt(value),
    };

    if nullable && nulls == NullPlacement::Last {
        Some(
            Condition::any()
                .add(past)
                .add(Expr::expr(expr).is_null()),
        )
    } else {
        Some(Condition::all().add(past))
    }
}
