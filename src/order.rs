//! # Order Specifications
//!
//! An [`OrderSpec`] is the explicit, ordered list of sort keys a paginated query
//! runs with. Position defines priority: the first key is the primary sort, the
//! second breaks ties of the first, and so on.
//!
//! Every key knows where its NULLs sort. When no placement is given the SQL
//! standard default applies: `NULLS LAST` for ascending keys and `NULLS FIRST`
//! for descending keys. The boundary predicate depends on that placement, so the
//! generated `ORDER BY` always spells it out rather than trusting the database
//! default (`SQLite` and `MySQL` sort NULLs first in ascending order).

use sea_orm::sea_query::{Alias, Expr, NullOrdering, Order, SimpleExpr};
use serde::{Deserialize, Serialize};

/// Sort direction of a single key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Where NULLs sort when the key does not say
    #[must_use]
    pub const fn default_nulls(self) -> NullPlacement {
        match self {
            Self::Asc => NullPlacement::Last,
            Self::Desc => NullPlacement::First,
        }
    }

    /// Parse "asc"/"desc" in any case
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if value.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }
}

impl From<Direction> for Order {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Asc => Order::Asc,
            Direction::Desc => Order::Desc,
        }
    }
}

/// Position of NULL values relative to non-NULL values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NullPlacement {
    First,
    Last,
}

impl NullPlacement {
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::First => Self::Last,
            Self::Last => Self::First,
        }
    }
}

impl From<NullPlacement> for NullOrdering {
    fn from(placement: NullPlacement) -> Self {
        match placement {
            NullPlacement::First => NullOrdering::First,
            NullPlacement::Last => NullOrdering::Last,
        }
    }
}

/// The SQL a sort key is evaluated with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SortExpr {
    /// A column, optionally qualified with its table (or join alias)
    Column {
        table: Option<String>,
        column: String,
    },
    /// An expression registered on the query under this alias
    Computed(String),
}

impl SortExpr {
    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Column {
            table: Some(table.into()),
            column: column.into(),
        }
    }

    pub fn unqualified(column: impl Into<String>) -> Self {
        Self::Column {
            table: None,
            column: column.into(),
        }
    }

    /// Column reference for `Column` keys; `None` for computed keys, which only
    /// the owning query can resolve.
    #[must_use]
    pub fn column_expr(&self) -> Option<SimpleExpr> {
        match self {
            Self::Column {
                table: Some(table),
                column,
            } => Some(Expr::col((Alias::new(table), Alias::new(column))).into()),
            Self::Column {
                table: None,
                column,
            } => Some(Expr::col(Alias::new(column)).into()),
            Self::Computed(_) => None,
        }
    }
}

/// One entry of an `ORDER BY` list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderKey {
    /// Name the cursor payload stores this key's value under (e.g. `title`, `author.name`)
    pub key: String,
    pub expr: SortExpr,
    pub direction: Direction,
    /// Explicit NULL placement; `None` means the direction's default
    pub nulls: Option<NullPlacement>,
}

impl OrderKey {
    pub fn new(key: impl Into<String>, expr: SortExpr, direction: Direction) -> Self {
        Self {
            key: key.into(),
            expr,
            direction,
            nulls: None,
        }
    }

    #[must_use]
    pub fn with_nulls(mut self, nulls: NullPlacement) -> Self {
        self.nulls = Some(nulls);
        self
    }

    /// NULL placement this key actually sorts with
    #[must_use]
    pub fn effective_nulls(&self) -> NullPlacement {
        self.nulls.unwrap_or_else(|| self.direction.default_nulls())
    }

    /// Flip direction and NULL placement.
    ///
    /// A default placement stays implicit: the default of the flipped direction
    /// is exactly the flipped default, so `reversed().reversed()` is the
    /// original key.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            key: self.key.clone(),
            expr: self.expr.clone(),
            direction: self.direction.reversed(),
            nulls: self.nulls.map(NullPlacement::reversed),
        }
    }
}

/// Ordered, duplicate-free list of sort keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSpec {
    keys: Vec<OrderKey>,
}

impl OrderSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key. Returns `false` (and keeps the existing entry) when a key
    /// with the same name is already present.
    pub fn push(&mut self, key: OrderKey) -> bool {
        if self.contains(&key.key) {
            return false;
        }
        self.keys.push(key);
        true
    }

    #[must_use]
    pub fn keys(&self) -> &[OrderKey] {
        &self.keys
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OrderKey> {
        self.keys.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k.key == key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OrderKey> {
        self.keys.iter().find(|k| k.key == key)
    }

    /// Every key flipped; used to run a backward page as a forward query
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            keys: self.keys.iter().map(OrderKey::reversed).collect(),
        }
    }

    /// Append `key` unless a key with the same name exists, making the order total
    #[must_use]
    pub fn with_tiebreaker(mut self, key: OrderKey) -> Self {
        self.push(key);
        self
    }
}

impl FromIterator<OrderKey> for OrderSpec {
    fn from_iter<I: IntoIterator<Item = OrderKey>>(iter: I) -> Self {
        let mut spec = Self::new();
        for key in iter {
            spec.push(key);
        }
        spec
    }
}

impl<'a> IntoIterator for &'a OrderSpec {
    type Item = &'a OrderKey;
    type IntoIter = std::slice::Iter<'a, OrderKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}
