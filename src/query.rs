//! # Keyset Queries
//!
//! A [`KeysetQuery`] wraps a composed Sea-ORM `Select` (filters and joins
//! already applied) together with the explicit [`OrderSpec`] it is paginated
//! by, and a registry of computed expressions referenced from that spec.
//!
//! The `Select` itself must not carry an `ORDER BY`: the keyset query owns the
//! ordering and replaces whatever the select had when it builds a page query.

use std::collections::BTreeMap;

use sea_orm::{
    EntityTrait, IdenStatic, QueryTrait, Select,
    sea_query::{Alias, Expr, SelectStatement, SimpleExpr},
};

use crate::codec::{CursorDirection, CursorPayload};
use crate::order::{Direction, NullPlacement, OrderKey, OrderSpec, SortExpr};
use crate::predicate::{Boundary, build_boundary};
use crate::value::ValueKind;

/// Prefix of the aliases column sort keys are projected under
pub const CURSOR_COLUMN_PREFIX: &str = "_cursor_";

/// Alias the sort key at `position` is projected under
#[must_use]
pub fn cursor_column(position: usize) -> String {
    format!("{CURSOR_COLUMN_PREFIX}{position}")
}

/// A SQL expression sorted on under an alias (e.g. a search rank)
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedExpr {
    pub expr: SimpleExpr,
    /// How the projected value is read back from a row
    pub kind: ValueKind,
    pub nullable: bool,
}

impl ComputedExpr {
    /// A nullable expression of the given kind
    #[must_use]
    pub fn new(expr: SimpleExpr, kind: ValueKind) -> Self {
        Self {
            expr,
            kind,
            nullable: true,
        }
    }

    /// The expression never yields NULL
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// A composed select plus the ordering it is paginated by
#[derive(Debug, Clone)]
pub struct KeysetQuery<E: EntityTrait> {
    select: Select<E>,
    order: OrderSpec,
    computed: BTreeMap<String, ComputedExpr>,
}

impl<E: EntityTrait> KeysetQuery<E> {
    #[must_use]
    pub fn new(select: Select<E>) -> Self {
        Self {
            select,
            order: OrderSpec::new(),
            computed: BTreeMap::new(),
        }
    }

    /// The explicit ordering, highest priority first
    #[must_use]
    pub fn order_spec(&self) -> &OrderSpec {
        &self.order
    }

    pub fn set_order_spec(&mut self, order: OrderSpec) {
        self.order = order;
    }

    #[must_use]
    pub fn with_order_spec(mut self, order: OrderSpec) -> Self {
        self.order = order;
        self
    }

    /// Order by a column of the paginated entity
    #[must_use]
    pub fn order_by(self, column: E::Column, direction: Direction) -> Self {
        self.order_by_key(Self::column_key(column, direction))
    }

    #[must_use]
    pub fn order_by_with_nulls(
        self,
        column: E::Column,
        direction: Direction,
        nulls: NullPlacement,
    ) -> Self {
        self.order_by_key(Self::column_key(column, direction).with_nulls(nulls))
    }

    /// Append an arbitrary key; a key whose name is already ordered on is ignored
    #[must_use]
    pub fn order_by_key(mut self, key: OrderKey) -> Self {
        if !self.order.push(key) {
            tracing::debug!("Ignoring duplicate sort key");
        }
        self
    }

    /// Register `computed` under `alias`, project it and order by it.
    ///
    /// An alias that is already ordered on keeps its first expression.
    #[must_use]
    pub fn order_by_computed(
        mut self,
        alias: impl Into<String>,
        computed: ComputedExpr,
        direction: Direction,
    ) -> Self {
        let alias = alias.into();
        let key = OrderKey::new(alias.clone(), SortExpr::Computed(alias.clone()), direction);
        if self.order.push(key) {
            self.computed.insert(alias, computed);
        } else {
            tracing::debug!(alias = %alias, "Ignoring duplicate computed sort key");
        }
        self
    }

    #[must_use]
    pub fn computed(&self, alias: &str) -> Option<&ComputedExpr> {
        self.computed.get(alias)
    }

    /// The SQL a key is compared and ordered with.
    ///
    /// Computed keys use the registered expression itself, since most
    /// databases do not accept select aliases inside `WHERE`.
    #[must_use]
    pub fn sort_expr(&self, key: &OrderKey) -> SimpleExpr {
        match &key.expr {
            SortExpr::Computed(alias) => self
                .computed
                .get(alias)
                .map_or_else(|| Expr::col(Alias::new(alias)).into(), |c| c.expr.clone()),
            column => column
                .column_expr()
                .unwrap_or_else(|| Expr::col(Alias::new(&key.key)).into()),
        }
    }

    /// Boundary predicate for the rows after `payload`
    pub fn boundary<N>(&self, payload: &CursorPayload, is_nullable: N) -> Boundary
    where
        N: Fn(&str) -> bool,
    {
        build_boundary(&self.order, payload, |key| self.sort_expr(key), is_nullable)
    }

    /// The statement for one page: boundary ANDed into `WHERE`, `ORDER BY`
    /// in the direction of travel with explicit NULL placement, and `LIMIT`.
    ///
    /// Column keys are additionally projected as [`cursor_column`] aliases and
    /// computed keys under their own alias, so their values can be read back
    /// from each row.
    #[must_use]
    pub fn build(
        &self,
        boundary: Boundary,
        direction: CursorDirection,
        limit: u64,
    ) -> SelectStatement {
        let mut statement = self.select.clone().into_query();

        for (position, key) in self.order.iter().enumerate() {
            match &key.expr {
                SortExpr::Computed(alias) => {
                    statement.expr_as(self.sort_expr(key), Alias::new(alias));
                }
                SortExpr::Column { .. } => {
                    statement.expr_as(self.sort_expr(key), Alias::new(cursor_column(position)));
                }
            }
        }

        if let Some(condition) = boundary.into_condition() {
            statement.cond_where(condition);
        }

        let travel = match direction {
            CursorDirection::Next => self.order.clone(),
            CursorDirection::Prev => self.order.reversed(),
        };

        statement.clear_order_by();
        for key in &travel {
            statement.order_by_expr_with_nulls(
                self.sort_expr(key),
                key.direction.into(),
                key.effective_nulls().into(),
            );
        }

        statement.limit(limit);
        statement
    }

    fn column_key(column: E::Column, direction: Direction) -> OrderKey {
        let name = column.as_str();
        OrderKey::new(
            name,
            SortExpr::column(E::default().table_name(), name),
            direction,
        )
    }
}
