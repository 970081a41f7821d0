use async_trait::async_trait;
use sea_orm::{Condition, DatabaseConnection, EntityTrait, QueryFilter, Select};

use crate::config::PaginationConfig;
use crate::errors::PaginationError;
use crate::metadata::EntityGraph;
use crate::models::Page;
use crate::order::OrderSpec;
use crate::page::paginate;
use crate::query::KeysetQuery;
use crate::sort::{describe, order_from_request};

/// An API resource that can be listed page by page with cursors.
///
/// ```rust,ignore
/// impl CursorResource for Post {
///     type EntityType = post::Entity;
///     const RESOURCE_NAME_PLURAL: &'static str = "posts";
///
///     fn sortable_keys() -> Vec<&'static str> {
///         vec!["title", "score", "author.name"]
///     }
/// }
///
/// let page = Post::get_page(&db, Condition::all(), Some("-score"), 20, None, &config).await?;
/// ```
#[async_trait]
pub trait CursorResource: Sized + Send + Sync
where
    Self::EntityType: EntityTrait + Sync,
    <Self::EntityType as EntityTrait>::Model: Sync,
    Self: From<<Self::EntityType as EntityTrait>::Model>,
{
    type EntityType: EntityTrait + Sync;

    const RESOURCE_NAME_PLURAL: &'static str;

    /// Relations sort keys may reach through; the bare entity by default
    fn entity_graph() -> EntityGraph<Self::EntityType> {
        EntityGraph::new()
    }

    /// Keys accepted in the `sort` parameter; empty accepts every graph key
    fn sortable_keys() -> Vec<&'static str> {
        vec![]
    }

    /// Order used when the request asks for none (primary key ascending)
    fn default_order(graph: &EntityGraph<Self::EntityType>) -> OrderSpec {
        order_from_request(None, graph, &[])
    }

    /// The select pages are cut from. Override to add joins for relation keys.
    fn base_query(condition: &Condition) -> Select<Self::EntityType> {
        Self::EntityType::find().filter(condition.clone())
    }

    async fn get_page(
        db: &DatabaseConnection,
        condition: Condition,
        sort: Option<&str>,
        page_size: u64,
        cursor: Option<&str>,
        config: &PaginationConfig,
    ) -> Result<Page<Self>, PaginationError> {
        let graph = Self::entity_graph();
        let order = if sort.is_some() {
            order_from_request(sort, &graph, &Self::sortable_keys())
        } else {
            Self::default_order(&graph)
        };
        tracing::debug!(
            resource = Self::RESOURCE_NAME_PLURAL,
            order = %describe(&order),
            "Paginating resource"
        );

        let query = KeysetQuery::new(Self::base_query(&condition)).with_order_spec(order);
        let page = paginate(db, &query, &graph, page_size, cursor, config).await?;
        Ok(page.map(Self::from))
    }
}
