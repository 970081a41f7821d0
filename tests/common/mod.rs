#![allow(dead_code)]

use axum::{
    Router,
    extract::{Query, State},
};
use cursorcrate::{
    CursorOptions, CursorResource, EntityGraph, KeysetQuery, MalformedCursorPolicy, Page,
    PaginationConfig, PaginationError, paginate,
};
use sea_orm::{ActiveValue::Set, Condition, Database, DatabaseConnection, DbErr, EntityTrait};
use sea_orm_migration::prelude::*;
use serde::Serialize;

pub mod entities;

use entities::{author, comment, event, person, post};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    init_tracing();
    let db = Database::connect("sqlite::memory:").await?;

    // Run migrations
    Migrator::up(&db, None).await?;

    Ok(db)
}

pub async fn seed_people(
    db: &DatabaseConnection,
    rows: &[(i32, &str, i32, Option<i32>)],
) -> Result<(), DbErr> {
    let models = rows.iter().map(|&(id, name, age, score)| person::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        age: Set(age),
        score: Set(score),
    });
    person::Entity::insert_many(models).exec_without_returning(db).await?;
    Ok(())
}

pub async fn seed_authors(
    db: &DatabaseConnection,
    rows: &[(i32, &str, Option<&str>)],
) -> Result<(), DbErr> {
    let models = rows.iter().map(|&(id, name, nickname)| author::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        nickname: Set(nickname.map(str::to_string)),
    });
    author::Entity::insert_many(models).exec_without_returning(db).await?;
    Ok(())
}

pub async fn seed_posts(db: &DatabaseConnection, rows: &[(i32, &str, i32)]) -> Result<(), DbErr> {
    let models = rows.iter().map(|&(id, title, author_id)| post::ActiveModel {
        id: Set(id),
        title: Set(title.to_string()),
        author_id: Set(author_id),
    });
    post::Entity::insert_many(models).exec_without_returning(db).await?;
    Ok(())
}

pub async fn seed_comments(db: &DatabaseConnection, rows: &[(i32, i32, &str)]) -> Result<(), DbErr> {
    let models = rows.iter().map(|&(id, post_id, body)| comment::ActiveModel {
        id: Set(id),
        post_id: Set(post_id),
        body: Set(body.to_string()),
    });
    comment::Entity::insert_many(models).exec_without_returning(db).await?;
    Ok(())
}

pub async fn seed_events(
    db: &DatabaseConnection,
    rows: &[(i32, sea_orm::prelude::DateTimeWithTimeZone)],
) -> Result<(), DbErr> {
    let models = rows.iter().map(|&(id, at)| event::ActiveModel {
        id: Set(id),
        at: Set(at),
    });
    event::Entity::insert_many(models).exec_without_returning(db).await?;
    Ok(())
}

/// API representation of a person, listed through `CursorResource`
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Person {
    pub id: i32,
    pub name: String,
    pub age: i32,
}

impl From<person::Model> for Person {
    fn from(model: person::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            age: model.age,
        }
    }
}

impl CursorResource for Person {
    type EntityType = person::Entity;

    const RESOURCE_NAME_PLURAL: &'static str = "people";

    fn sortable_keys() -> Vec<&'static str> {
        vec!["name", "age", "score"]
    }
}

async fn list_people(
    State(db): State<DatabaseConnection>,
    Query(options): Query<CursorOptions>,
) -> Result<Page<Person>, PaginationError> {
    let config = PaginationConfig::default()
        .with_max_page_size(3)
        .with_malformed_cursor(MalformedCursorPolicy::Reject);
    let page_size = config.resolve_page_size(options.limit)?;
    Person::get_page(
        &db,
        Condition::all(),
        options.sort.as_deref(),
        page_size,
        options.cursor.as_deref(),
        &config,
    )
    .await
}

pub fn setup_test_app(db: DatabaseConnection) -> Router {
    let api = Router::new()
        .route("/people", axum::routing::get(list_people))
        .with_state(db);

    Router::new().nest("/api/v1", api)
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateTables)]
    }
}

pub struct CreateTables;

#[async_trait::async_trait]
impl MigrationName for CreateTables {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(People::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(People::Id).integer().not_null().primary_key())
                    .col(ColumnDef::new(People::Name).string().not_null())
                    .col(ColumnDef::new(People::Age).integer().not_null())
                    .col(ColumnDef::new(People::Score).integer().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Authors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Authors::Id).integer().not_null().primary_key())
                    .col(ColumnDef::new(Authors::Name).string().not_null())
                    .col(ColumnDef::new(Authors::Nickname).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Posts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Posts::Id).integer().not_null().primary_key())
                    .col(ColumnDef::new(Posts::Title).string().not_null())
                    .col(ColumnDef::new(Posts::AuthorId).integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Comments::Id).integer().not_null().primary_key())
                    .col(ColumnDef::new(Comments::PostId).integer().not_null())
                    .col(ColumnDef::new(Comments::Body).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Events::Id).integer().not_null().primary_key())
                    .col(ColumnDef::new(Events::At).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum People {
    Table,
    Id,
    Name,
    Age,
    Score,
}

#[derive(DeriveIden)]
enum Authors {
    Table,
    Id,
    Name,
    Nickname,
}

#[derive(DeriveIden)]
enum Posts {
    Table,
    Id,
    Title,
    AuthorId,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    PostId,
    Body,
}

#[derive(DeriveIden)]
enum Events {
    Table,
    Id,
    At,
}

/// Follow `next_cursor` from the first page to the last, returning each page's ids
pub async fn walk_forward<E: EntityTrait>(
    db: &DatabaseConnection,
    query: &KeysetQuery<E>,
    graph: &EntityGraph<E>,
    page_size: u64,
    id: impl Fn(&E::Model) -> i32,
) -> Vec<Vec<i32>> {
    let config = PaginationConfig::default();
    let mut pages = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = paginate(db, query, graph, page_size, cursor.as_deref(), &config)
            .await
            .expect("page query failed");
        pages.push(page.rows.iter().map(&id).collect());
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
        assert!(pages.len() < 100, "pagination did not terminate");
    }
    pages
}
