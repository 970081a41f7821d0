use sea_orm::EntityTrait;

use crate::metadata::EntityGraph;
use crate::order::{Direction, NullPlacement, OrderKey, OrderSpec};

/// One requested sort term, before it is resolved against an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortTerm {
    pub key: String,
    pub direction: Direction,
    pub nulls: Option<NullPlacement>,
}

impl SortTerm {
    fn new(key: &str, direction: Direction, nulls: Option<NullPlacement>) -> Self {
        Self {
            key: key.to_string(),
            direction,
            nulls,
        }
    }
}

/// Parse React Admin's `["column", "ORDER"]` form
fn parse_json_sort(json: &str) -> Vec<SortTerm> {
    let Ok(sort_vec) = serde_json::from_str::<Vec<String>>(json) else {
        tracing::warn!(sort = json, "Ignoring unparseable sort parameter");
        return Vec::new();
    };
    let Some(column) = sort_vec.first() else {
        return Vec::new();
    };
    let direction = sort_vec
        .get(1)
        .and_then(|order| Direction::parse(order))
        .unwrap_or(Direction::Asc);
    vec![SortTerm::new(column, direction, None)]
}

/// Parse one REST term: `-score`, `title_desc`, `score_asc_nulls_first`, `id`
fn parse_term(term: &str) -> Option<SortTerm> {
    let term = term.trim();
    let (mut rest, mut direction) = match term.strip_prefix('-') {
        Some(rest) => (rest, Some(Direction::Desc)),
        None => (term, None),
    };

    let mut nulls = None;
    if let Some(stripped) = rest.strip_suffix("_nulls_first") {
        rest = stripped;
        nulls = Some(NullPlacement::First);
    } else if let Some(stripped) = rest.strip_suffix("_nulls_last") {
        rest = stripped;
        nulls = Some(NullPlacement::Last);
    }

    if direction.is_none() {
        if let Some(stripped) = rest.strip_suffix("_desc") {
            rest = stripped;
            direction = Some(Direction::Desc);
        } else if let Some(stripped) = rest.strip_suffix("_asc") {
            rest = stripped;
            direction = Some(Direction::Asc);
        }
    }

    if rest.is_empty() {
        return None;
    }
    Some(SortTerm::new(
        rest,
        direction.unwrap_or(Direction::Asc),
        nulls,
    ))
}

/// Parse a `sort` request parameter, supporting both React Admin and REST formats.
///
/// - React Admin: `["title", "DESC"]`
/// - REST: `created_at_desc,-score,title`, each term optionally suffixed with
///   `_nulls_first` or `_nulls_last`
#[must_use]
pub fn parse_sort(sort: Option<&str>) -> Vec<SortTerm> {
    match sort.map(str::trim) {
        None | Some("") => Vec::new(),
        Some(sort) if sort.starts_with('[') => parse_json_sort(sort),
        Some(sort) => sort.split(',').filter_map(parse_term).collect(),
    }
}

/// Resolve requested terms into an order spec for `E`.
///
/// Keys that are unknown to the graph, or not in `allowed` when `allowed` is
/// non-empty, are skipped with a warning. The primary key is appended
/// ascending unless already present, so the resulting order is total.
#[must_use]
pub fn resolve_sort<E: EntityTrait>(
    terms: &[SortTerm],
    graph: &EntityGraph<E>,
    allowed: &[&str],
) -> OrderSpec {
    let mut spec = OrderSpec::new();
    for term in terms {
        if !allowed.is_empty() && !allowed.contains(&term.key.as_str()) {
            tracing::warn!(key = %term.key, "Ignoring sort on non-sortable key");
            continue;
        }
        let Some(key) = graph.order_key(&term.key, term.direction) else {
            tracing::warn!(key = %term.key, "Ignoring sort on unknown key");
            continue;
        };
        let key = match term.nulls {
            Some(nulls) => key.with_nulls(nulls),
            None => key,
        };
        spec.push(key);
    }

    match graph.primary_key() {
        Some(tiebreaker) => spec.with_tiebreaker(tiebreaker),
        None => spec,
    }
}

/// Build the order key list straight from a request parameter
#[must_use]
pub fn order_from_request<E: EntityTrait>(
    sort: Option<&str>,
    graph: &EntityGraph<E>,
    allowed: &[&str],
) -> OrderSpec {
    resolve_sort(&parse_sort(sort), graph, allowed)
}

/// Name-only view of a spec, handy for logs
#[must_use]
pub fn describe(spec: &OrderSpec) -> String {
    spec.iter()
        .map(|OrderKey { key, direction, .. }| match direction {
            Direction::Asc => key.clone(),
            Direction::Desc => format!("-{key}"),
        })
        .collect::<Vec<_>>()
        .join(",")
}
