//! # cursorcrate
//!
//! Cursor-based (keyset) pagination for Sea-ORM queries served through Axum.
//!
//! A page query is a composed `Select` plus an explicit ordering
//! ([`KeysetQuery`]). Each page carries opaque cursors holding the sort-key
//! values of its first and last rows; following a cursor turns those values
//! into a `WHERE` predicate selecting the rows just past them, so every page
//! costs one indexed range scan regardless of how deep it is.
//!
//! ```rust,ignore
//! use cursorcrate::{Direction, EntityGraph, KeysetQuery, PaginationConfig, paginate};
//!
//! let query = KeysetQuery::new(post::Entity::find())
//!     .order_by(post::Column::Score, Direction::Desc)
//!     .order_by(post::Column::Id, Direction::Asc);
//!
//! let config = PaginationConfig::default();
//! let first = paginate(&db, &query, &EntityGraph::new(), 20, None, &config).await?;
//! let second = paginate(&db, &query, &EntityGraph::new(), 20, first.next_cursor.as_deref(), &config).await?;
//! ```

pub mod codec;
pub mod config;
pub mod errors;
pub mod metadata;
pub mod models;
pub mod order;
pub mod page;
pub mod predicate;
pub mod query;
pub mod search;
pub mod sort;
pub mod traits;
pub mod value;

pub use codec::{CursorDirection, CursorPayload, decode, encode};
pub use config::{MalformedCursorPolicy, PaginationConfig};
pub use errors::{MalformedCursor, PaginationError};
pub use metadata::{Cardinality, EntityGraph, RelationNode};
pub use models::{CursorOptions, Page};
pub use order::{Direction, NullPlacement, OrderKey, OrderSpec, SortExpr};
pub use page::paginate;
pub use predicate::{Boundary, build_boundary};
pub use query::{ComputedExpr, KeysetQuery};
pub use serde_with;
pub use traits::CursorResource;
pub use value::{CursorValue, ValueKind};
