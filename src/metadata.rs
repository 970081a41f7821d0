//! # Entity Metadata
//!
//! Sort keys are plain strings: `title` names a column of the paginated entity,
//! `author.name` a column reached through the `author` relation. An
//! [`EntityGraph`] is the declared relation graph those keys are resolved
//! against. It answers two questions for the pagination code:
//!
//! - may this key's column hold NULL? (the boundary predicate must include NULL
//!   rows explicitly when they sort after the cursor)
//! - where does this key's value come from in a fetched row?
//!
//! A key that passes through a has-many relation has no single value per row,
//! so its value is always unknown and it never constrains a page.
//!
//! ```rust,ignore
//! let graph = EntityGraph::<post::Entity>::new()
//!     .with_relation(RelationNode::new::<author::Entity>("author", Cardinality::One))
//!     .with_relation(RelationNode::new::<comment::Entity>("comments", Cardinality::Many));
//!
//! assert!(graph.is_nullable("author.nickname"));
//! ```

use sea_orm::{ColumnTrait, EntityTrait, IdenStatic, Iterable, PrimaryKeyToColumn};

use crate::order::{Direction, OrderKey, SortExpr};
use crate::value::ValueKind;

/// How many related rows a relation yields per parent row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly one related row (inner join)
    One,
    /// Zero or one related row (left join); every column may read as NULL
    OptionalOne,
    /// Any number of related rows
    Many,
}

/// Declared shape of one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub nullable: bool,
    /// `None` when the column type cannot be carried in a cursor
    pub kind: Option<ValueKind>,
}

impl ColumnMeta {
    pub fn of<C: ColumnTrait>(column: C) -> Self {
        let def = column.def();
        Self {
            name: column.as_str().to_string(),
            nullable: def.is_null(),
            kind: ValueKind::from_column_type(def.get_column_type()),
        }
    }
}

/// A relation reachable from the paginated entity
#[derive(Debug, Clone)]
pub struct RelationNode {
    pub name: String,
    /// Table name or join alias the relation's columns are qualified with
    pub table: String,
    pub cardinality: Cardinality,
    columns: Vec<ColumnMeta>,
    relations: Vec<RelationNode>,
}

impl RelationNode {
    pub fn new<R: EntityTrait>(name: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            table: R::default().table_name().to_string(),
            cardinality,
            columns: R::Column::iter().map(ColumnMeta::of).collect(),
            relations: Vec::new(),
        }
    }

    /// Use when the query joins the relation under an alias
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.table = alias.into();
        self
    }

    #[must_use]
    pub fn with_relation(mut self, relation: RelationNode) -> Self {
        self.relations.push(relation);
        self
    }

    fn column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn relation(&self, name: &str) -> Option<&RelationNode> {
        self.relations.iter().find(|r| r.name == name)
    }
}

/// Where a sort key's value lives
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRef<'g, C> {
    /// A column of the paginated entity itself
    Root { column: C, meta: &'g ColumnMeta },
    /// A column reached through one or more relations
    Related {
        table: &'g str,
        meta: &'g ColumnMeta,
        /// Some relation on the path may yield no row
        optional: bool,
        /// Some relation on the path is has-many; the value is unknown
        through_many: bool,
    },
}

/// The paginated entity's columns plus its declared relations
pub struct EntityGraph<E: EntityTrait> {
    table: String,
    columns: Vec<(E::Column, ColumnMeta)>,
    relations: Vec<RelationNode>,
}

impl<E: EntityTrait> Clone for EntityGraph<E> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            columns: self.columns.clone(),
            relations: self.relations.clone(),
        }
    }
}

impl<E: EntityTrait> Default for EntityGraph<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> EntityGraph<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: E::default().table_name().to_string(),
            columns: E::Column::iter().map(|c| (c, ColumnMeta::of(c))).collect(),
            relations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_relation(mut self, relation: RelationNode) -> Self {
        self.relations.push(relation);
        self
    }

    /// Resolve a dotted key against the graph
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<FieldRef<'_, E::Column>> {
        let mut segments = key.split('.');
        let first = segments.next()?;
        let rest: Vec<&str> = segments.collect();

        let Some((column_name, relation_path)) = rest.split_last() else {
            return self
                .columns
                .iter()
                .find(|(_, meta)| meta.name == first)
                .map(|(column, meta)| FieldRef::Root {
                    column: *column,
                    meta,
                });
        };

        let mut node = self.relations.iter().find(|r| r.name == first)?;
        let mut optional = node.cardinality != Cardinality::One;
        let mut through_many = node.cardinality == Cardinality::Many;

        for name in relation_path {
            node = node.relation(name)?;
            optional |= node.cardinality != Cardinality::One;
            through_many |= node.cardinality == Cardinality::Many;
        }

        node.column(column_name).map(|meta| FieldRef::Related {
            table: &node.table,
            meta,
            optional,
            through_many,
        })
    }

    /// Whether the key's column may be NULL in a result row.
    ///
    /// Unknown keys count as nullable: an extra `IS NULL` branch never drops a
    /// row that belongs on the page.
    #[must_use]
    pub fn is_nullable(&self, key: &str) -> bool {
        match self.resolve(key) {
            Some(FieldRef::Root { meta, .. }) => meta.nullable,
            Some(FieldRef::Related { meta, optional, .. }) => meta.nullable || optional,
            None => true,
        }
    }

    /// Build an order key for `key`, qualified with the table it lives on
    #[must_use]
    pub fn order_key(&self, key: &str, direction: Direction) -> Option<OrderKey> {
        let expr = match self.resolve(key)? {
            FieldRef::Root { meta, .. } => SortExpr::column(&self.table, &meta.name),
            FieldRef::Related { table, meta, .. } => SortExpr::column(table, &meta.name),
        };
        Some(OrderKey::new(key, expr, direction))
    }

    /// Ascending key on the first primary-key column, used as tiebreaker
    #[must_use]
    pub fn primary_key(&self) -> Option<OrderKey> {
        let column = E::PrimaryKey::iter().next()?.into_column();
        self.order_key(column.as_str(), Direction::Asc)
    }
}
