use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

mod common;
use common::{seed_people, setup_test_app, setup_test_db};

async fn setup() -> axum::Router {
    let db = setup_test_db().await.expect("Failed to setup test database");
    seed_people(
        &db,
        &[
            (1, "Ann", 40, Some(7)),
            (2, "Bob", 30, None),
            (3, "Cid", 30, Some(3)),
            (4, "Dee", 20, None),
            (5, "Eli", 10, Some(9)),
        ],
    )
    .await
    .unwrap();
    setup_test_app(db)
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn ids(body: &Value) -> Vec<i64> {
    body["rows"]
        .as_array()
        .expect("rows should be an array")
        .iter()
        .map(|row| row["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_list_first_page() {
    let app = setup().await;

    let (status, body) = get(&app, "/api/v1/people?limit=2&sort=-age").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 2]);
    assert_eq!(body["rows"][0]["name"], "Ann");
    assert!(body["nextCursor"].is_string());
    assert!(
        body.get("previousCursor").is_none(),
        "missing cursors should be omitted, not null"
    );
}

#[tokio::test]
async fn test_follow_cursors_over_http() {
    let app = setup().await;

    let (_, first) = get(&app, "/api/v1/people?limit=2&sort=-age").await;
    let next = first["nextCursor"].as_str().unwrap();

    let (status, second) = get(&app, &format!("/api/v1/people?limit=2&sort=-age&cursor={next}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&second), vec![3, 4]);
    assert!(second["nextCursor"].is_string());

    let previous = second["previousCursor"].as_str().unwrap();
    let (status, back) = get(&app, &format!("/api/v1/people?limit=2&sort=-age&cursor={previous}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&back), vec![1, 2]);
    assert!(back.get("previousCursor").is_none());
}

#[tokio::test]
async fn test_page_size_is_clamped() {
    let app = setup().await;

    let (status, body) = get(&app, "/api/v1/people?limit=50").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_zero_page_size_is_bad_request() {
    let app = setup().await;

    let (status, body) = get(&app, "/api/v1/people?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Page size must be a positive integer, got 0");
}

#[tokio::test]
async fn test_malformed_cursor_is_bad_request() {
    let app = setup().await;

    let (status, body) = get(&app, "/api/v1/people?cursor=not-a-cursor").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"].as_str().unwrap().starts_with("Malformed cursor"),
        "unexpected error body: {body}"
    );
}

#[tokio::test]
async fn test_unsortable_keys_fall_back_to_primary_key() {
    let app = setup().await;

    let (status, body) = get(&app, "/api/v1/people?sort=id_desc").await;
    assert_eq!(status, StatusCode::OK);
    // `id` is not in the sortable list, so the default order applies
    assert_eq!(ids(&body), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_sort_with_null_placement_over_http() {
    let app = setup().await;

    let (_, first) = get(&app, "/api/v1/people?limit=3&sort=score_nulls_first").await;
    assert_eq!(ids(&first), vec![2, 4, 3]);

    let next = first["nextCursor"].as_str().unwrap();
    let (_, second) = get(&app, &format!("/api/v1/people?limit=3&sort=score_nulls_first&cursor={next}")).await;
    assert_eq!(ids(&second), vec![1, 5]);
    assert!(second.get("nextCursor").is_none());
}
