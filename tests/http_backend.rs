//! `HttpBackend` against a local `wiremock` server.

#![allow(non_snake_case)]

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ecotracker::adapters::{HttpBackend, MemoryDom};
use ecotracker::error::ApiError;
use ecotracker::ports::{CentersApi, NotificationApi, SearchApi};

fn backend(server: &MockServer, csrf: Option<&str>) -> HttpBackend {
    HttpBackend::new(&server.uri(), csrf.map(str::to_string)).expect("build backend")
}

#[tokio::test]
async fn unread_count__should_read_count_field() {
    // Given
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notifications/unread-count/"))
        .and(header("X-Requested-With", "XMLHttpRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 42})))
        .expect(1)
        .mount(&server)
        .await;

    // When
    let count = backend(&server, None).unread_count().await;

    // Then
    assert_eq!(count.expect("count"), 42);
}

#[tokio::test]
async fn mark_read__should_post_with_csrf_header() {
    // Given
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notifications/17/mark-read/"))
        .and(header("X-CSRFToken", "secret-token"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    // When
    let applied = backend(&server, Some("secret-token")).mark_read(17).await;

    // Then
    assert!(applied.expect("mark read"));
}

#[tokio::test]
async fn from_page__should_send_the_cookie_csrf_token() {
    // Given
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notifications/mark-all-read/"))
        .and(header("X-CSRFToken", "cookie token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    let dom = MemoryDom::new();
    dom.set_cookies("sessionid=abc; csrftoken=cookie%20token");

    // When
    let backend = HttpBackend::from_page(&server.uri(), &dom).expect("build backend");
    let applied = backend.mark_all_read().await;

    // Then
    assert!(applied.expect("mark all read"));
    assert_eq!(backend.base_url().as_str(), format!("{}/", server.uri()));
}

#[tokio::test]
async fn delete__should_report_declined_change() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notifications/3/delete/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;

    let applied = backend(&server, Some("t")).delete(3).await;

    assert!(!applied.expect("delete"));
}

#[tokio::test]
async fn mark_all_read__should_surface_non_success_status() {
    // Given
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/notifications/mark-all-read/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    // When
    let result = backend(&server, None).mark_all_read().await;

    // Then
    match result {
        Err(ApiError::Status { status, url }) => {
            assert_eq!(status, 403);
            assert!(url.ends_with("/notifications/mark-all-read/"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn search__should_send_query_and_parse_results() {
    // Given
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/centers/search/"))
        .and(query_param("q", "glass bottles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"url": "/centers/1/", "title": "Glass Depot", "description": "Bottles", "distance": 0.4},
            {"url": "/centers/2/", "title": "Mixed Yard"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    // When
    let results = backend(&server, None)
        .search("/centers/search/", "glass bottles")
        .await
        .expect("search");

    // Then
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].distance, Some(0.4));
    assert_eq!(results[1].description, "");
    assert_eq!(results[1].distance, None);
}

#[tokio::test]
async fn search__should_fail_on_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/centers/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = backend(&server, None).search("/centers/search/", "x").await;

    assert!(matches!(result, Err(ApiError::Http(_))));
}

#[tokio::test]
async fn centers__should_filter_by_material_type() {
    // Given
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/centers/api/centers/"))
        .and(query_param("material_type", "glass"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "centers": [{
                "id": 1,
                "name": "Glass Depot",
                "address": "1 Main St",
                "latitude": 40.7,
                "longitude": -74.0,
                "availability_percentage": 72.0,
                "accepted_materials": ["glass"]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    // When
    let centers = backend(&server, None)
        .centers(Some("glass"))
        .await
        .expect("centers");

    // Then
    assert_eq!(centers.len(), 1);
    assert!(centers[0].accepts("glass"));
}
