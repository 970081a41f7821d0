//! # Page Assembly
//!
//! [`paginate`] runs one keyset page query and turns the result into a
//! [`Page`]. The query fetches one row more than the page size; whether that
//! extra row came back is the only signal used to detect a further page, so no
//! `COUNT(*)` is ever issued.
//!
//! Backward pages run against the reversed ordering, then the rows are flipped
//! back so a page always reads in the query's forward order:
//!
//! ```text
//! direction  overfetched  has_next  has_prev
//! next       yes          yes       yes (when a cursor was given)
//! next       no           no        yes (when a cursor was given)
//! prev       yes          yes       yes
//! prev       no           yes       no
//! ```

use sea_orm::{ConnectionTrait, EntityTrait, FromQueryResult, ModelTrait, QueryResult};

use crate::codec::{self, CursorDirection, CursorPayload};
use crate::config::{MalformedCursorPolicy, PaginationConfig};
use crate::errors::PaginationError;
use crate::metadata::{EntityGraph, FieldRef};
use crate::models::Page;
use crate::order::{OrderKey, SortExpr};
use crate::predicate::Boundary;
use crate::query::{KeysetQuery, cursor_column};
use crate::value::{CursorValue, ValueKind};

/// Fetch the page of `query` that `cursor` points at (the first page when
/// `cursor` is `None`).
///
/// # Errors
///
/// - `PaginationError::InvalidPageSize` when `page_size` is zero
/// - `PaginationError::MalformedCursor` when the cursor cannot be decoded and
///   the config rejects malformed cursors
/// - `PaginationError::Query` when the database query fails
pub async fn paginate<E, C>(
    db: &C,
    query: &KeysetQuery<E>,
    graph: &EntityGraph<E>,
    page_size: u64,
    cursor: Option<&str>,
    config: &PaginationConfig,
) -> Result<Page<E::Model>, PaginationError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if page_size == 0 {
        return Err(PaginationError::InvalidPageSize { requested: 0 });
    }

    let payload = match cursor.map(codec::decode) {
        None => None,
        Some(Ok(payload)) => Some(payload),
        Some(Err(err)) => match config.malformed_cursor {
            MalformedCursorPolicy::Reject => return Err(err.into()),
            MalformedCursorPolicy::FirstPage => {
                tracing::warn!(error = %err, "Ignoring malformed cursor, serving first page");
                None
            }
        },
    };

    let direction = payload
        .as_ref()
        .map_or(CursorDirection::Next, |payload| payload.direction);
    let boundary = payload.as_ref().map_or(Boundary::Unbounded, |payload| {
        query.boundary(payload, |key| is_nullable(query, graph, key))
    });

    tracing::debug!(
        direction = direction.as_str(),
        page_size,
        steps = boundary.steps(),
        "Fetching page"
    );

    let statement = query.build(boundary, direction, page_size.saturating_add(1));
    let backend = db.get_database_backend();
    let mut rows = db.query_all(backend.build(&statement)).await?;

    let limit = usize::try_from(page_size).unwrap_or(usize::MAX);
    let overfetched = rows.len() > limit;
    if overfetched {
        rows.truncate(limit);
    }
    if direction == CursorDirection::Prev {
        rows.reverse();
    }

    tracing::debug!(rows = rows.len(), overfetched, "Fetched page");

    let has_next = overfetched || direction == CursorDirection::Prev;
    let has_prev = payload.is_some() && (overfetched || direction == CursorDirection::Next);

    let models = rows
        .iter()
        .map(|row| E::Model::from_query_result(row, ""))
        .collect::<Result<Vec<_>, _>>()?;

    let next_cursor = if has_next {
        models
            .last()
            .zip(rows.last())
            .map(|(model, row)| cursor_for(query, graph, model, row, CursorDirection::Next))
    } else {
        None
    };
    let previous_cursor = if has_prev {
        models
            .first()
            .zip(rows.first())
            .map(|(model, row)| cursor_for(query, graph, model, row, CursorDirection::Prev))
    } else {
        None
    };

    Ok(Page {
        rows: models,
        next_cursor,
        previous_cursor,
    })
}

fn is_nullable<E: EntityTrait>(query: &KeysetQuery<E>, graph: &EntityGraph<E>, key: &str) -> bool {
    match query.order_spec().get(key).map(|k| &k.expr) {
        Some(SortExpr::Computed(alias)) => query.computed(alias).is_none_or(|c| c.nullable),
        _ => graph.is_nullable(key),
    }
}

/// Encode a cursor pointing just past `model` (or just before it for `Prev`)
fn cursor_for<E: EntityTrait>(
    query: &KeysetQuery<E>,
    graph: &EntityGraph<E>,
    model: &E::Model,
    row: &QueryResult,
    direction: CursorDirection,
) -> String {
    let mut payload = CursorPayload::new(direction);
    for (position, key) in query.order_spec().iter().enumerate() {
        match key_value(query, graph, position, key, model, row) {
            Some(value) => {
                payload.values.insert(key.key.clone(), value);
            }
            None => tracing::debug!(key = %key.key, "Sort key value unknown, omitted from cursor"),
        }
    }
    codec::encode(&payload)
}

/// Value of one sort key in a fetched row; `None` when it cannot be determined
fn key_value<E: EntityTrait>(
    query: &KeysetQuery<E>,
    graph: &EntityGraph<E>,
    position: usize,
    key: &OrderKey,
    model: &E::Model,
    row: &QueryResult,
) -> Option<CursorValue> {
    match &key.expr {
        SortExpr::Computed(alias) => query
            .computed(alias)
            .map_or(ValueKind::F64, |c| c.kind)
            .read(row, alias),
        SortExpr::Column { .. } => match graph.resolve(&key.key)? {
            FieldRef::Root { column, .. } => CursorValue::from_query_value(model.get(column)),
            FieldRef::Related {
                through_many: true, ..
            } => None,
            FieldRef::Related { meta, .. } => meta.kind?.read(row, &cursor_column(position)),
        },
    }
}
