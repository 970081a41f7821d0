use sea_orm::{DatabaseBackend, sea_query::SimpleExpr};

use crate::query::ComputedExpr;
use crate::value::ValueKind;

// Basic safety limits
const MAX_SEARCH_QUERY_LENGTH: usize = 10_000;

/// Escape LIKE wildcards so user input only matches literally
fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn quote_identifier(name: &str, backend: DatabaseBackend) -> String {
    match backend {
        DatabaseBackend::MySql => format!("`{}`", name.replace('`', "``")),
        _ => format!("\"{}\"", name.replace('"', "\"\"")),
    }
}

fn truncate_query(query: &str) -> &str {
    let mut end = query.len().min(MAX_SEARCH_QUERY_LENGTH);
    while !query.is_char_boundary(end) {
        end -= 1;
    }
    query[..end].trim()
}

/// Build a relevance score for `query` over `columns`, usable as a computed
/// sort key (`KeysetQuery::order_by_computed`).
///
/// PostgreSQL uses trigram similarity (requires `pg_trgm`); other backends
/// score 1.0 when the concatenated columns contain the query, 0.0 otherwise.
/// Returns `None` for an empty query or no columns.
#[must_use]
pub fn fulltext_rank(
    query: &str,
    columns: &[&str],
    backend: DatabaseBackend,
) -> Option<ComputedExpr> {
    let query = truncate_query(query);
    if columns.is_empty() || query.is_empty() {
        return None;
    }

    let sql = match backend {
        DatabaseBackend::Postgres => postgres_rank(query, columns),
        DatabaseBackend::MySql => mysql_rank(query, columns),
        _ => fallback_rank(query, columns),
    };

    Some(ComputedExpr::new(SimpleExpr::Custom(sql), ValueKind::F64).not_null())
}

fn postgres_rank(query: &str, columns: &[&str]) -> String {
    let concat_sql = columns
        .iter()
        .map(|name| {
            format!(
                "COALESCE({}::text, '')",
                quote_identifier(name, DatabaseBackend::Postgres)
            )
        })
        .collect::<Vec<_>>()
        .join(" || ' ' || ");
    let escaped_query = query.replace('\'', "''");

    format!("CAST(SIMILARITY({concat_sql}, '{escaped_query}') AS DOUBLE PRECISION)")
}

fn mysql_rank(query: &str, columns: &[&str]) -> String {
    let concat_sql = columns
        .iter()
        .map(|name| {
            format!(
                "COALESCE(CAST({} AS CHAR), '')",
                quote_identifier(name, DatabaseBackend::MySql)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    let escaped_query = escape_like_wildcards(query)
        .replace('\\', "\\\\")
        .replace('\'', "''");

    format!(
        "CASE WHEN UPPER(CONCAT_WS(' ', {concat_sql})) LIKE UPPER('%{escaped_query}%') THEN 1.0 ELSE 0.0 END"
    )
}

fn fallback_rank(query: &str, columns: &[&str]) -> String {
    let concat_sql = columns
        .iter()
        .map(|name| {
            format!(
                "COALESCE(CAST({} AS TEXT), '')",
                quote_identifier(name, DatabaseBackend::Sqlite)
            )
        })
        .collect::<Vec<_>>()
        .join(" || ' ' || ");
    let escaped_query = escape_like_wildcards(query).replace('\'', "''");

    format!(
        "CASE WHEN UPPER({concat_sql}) LIKE UPPER('%{escaped_query}%') ESCAPE '\\' THEN 1.0 ELSE 0.0 END"
    )
}
