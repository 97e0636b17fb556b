mod common;

use actix_web::{http::StatusCode, test, App};
use serde_json::{json, Value};
use uuid::Uuid;

use civic_feed_service::config::FeedConfig;
use civic_feed_service::configure;
use common::{fixture, fixture_with, seed_item};

fn ids(body: &Value) -> Vec<String> {
    body["reports"]
        .as_array()
        .expect("reports array")
        .iter()
        .map(|r| r["id"].as_str().expect("id").to_string())
        .collect()
}

#[actix_web::test]
async fn test_feed_is_ranked_by_engagement() {
    let fx = fixture();
    let quiet = seed_item(&fx.store, fx.city_a, "Broken bench", 1, 0).await;
    let popular = seed_item(&fx.store, fx.city_a, "New playground", 1, 25).await;
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;

    let req = test::TestRequest::get()
        .uri(&format!("/feed/city/{}", fx.city_a))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["hasMore"], false);
    assert_eq!(
        ids(&body),
        vec![popular.id.to_string(), quiet.id.to_string()]
    );

    let first = &body["reports"][0];
    assert_eq!(first["likesCount"], 25);
    assert_eq!(first["isLikedByUser"], false);
    assert_eq!(first["kind"], "report");
    assert!(first["engagementScore"].as_f64().unwrap() > 0.0);
}

#[actix_web::test]
async fn test_feed_never_returns_other_tenants_items() {
    let fx = fixture();
    let local = seed_item(&fx.store, fx.city_a, "Street light out", 200, 0).await;
    seed_item(&fx.store, fx.city_b, "Viral elsewhere", 0, 10_000).await;
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;

    let req = test::TestRequest::get()
        .uri(&format!("/feed/city/{}?limit=100", fx.city_a))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(ids(&body), vec![local.id.to_string()]);
    for report in body["reports"].as_array().unwrap() {
        assert_eq!(report["cityId"], fx.city_a.to_string());
    }
}

#[actix_web::test]
async fn test_pagination_walks_the_ranking_once() {
    let fx = fixture();
    for i in 0..7 {
        seed_item(&fx.store, fx.city_a, &format!("item {}", i), i, 7 - i as u64).await;
    }
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;

    let mut seen = Vec::new();
    for (page, expect_more) in [(1, true), (2, true), (3, false)] {
        let req = test::TestRequest::get()
            .uri(&format!("/feed/city/{}?page={}&limit=3", fx.city_a, page))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["page"], page);
        assert_eq!(body["total"], 7);
        assert_eq!(body["hasMore"], expect_more);
        seen.extend(ids(&body));
    }

    assert_eq!(seen.len(), 7);
    let mut unique = seen.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 7);

    let req = test::TestRequest::get()
        .uri(&format!("/feed/city/{}?page=4&limit=3", fx.city_a))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(ids(&body).is_empty());
    assert_eq!(body["hasMore"], false);
}

#[actix_web::test]
async fn test_limit_is_clamped_to_max_page_size() {
    let fx = fixture_with(FeedConfig {
        default_page_size: 2,
        max_page_size: 3,
    });
    for i in 0..5 {
        seed_item(&fx.store, fx.city_a, &format!("item {}", i), i, 0).await;
    }
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;

    let req = test::TestRequest::get()
        .uri(&format!("/feed/city/{}?limit=1000", fx.city_a))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(&body).len(), 3);
    assert_eq!(body["hasMore"], true);

    let req = test::TestRequest::get()
        .uri(&format!("/feed/city/{}", fx.city_a))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(&body).len(), 2);
}

#[actix_web::test]
async fn test_feed_request_validation() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;

    let bad_uris = [
        "/feed/city/not-a-city".to_string(),
        format!("/feed/city/{}?page=0", fx.city_a),
        format!("/feed/city/{}?limit=-5", fx.city_a),
        format!("/feed/city/{}?userId=someone", fx.city_a),
    ];
    for uri in bad_uris {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], 400);
    }
}

#[actix_web::test]
async fn test_unknown_tenant_vs_empty_tenant() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;

    let req = test::TestRequest::get()
        .uri(&format!("/feed/city/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&format!("/feed/city/{}", fx.city_b))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], 0);
    assert_eq!(body["hasMore"], false);
}

#[actix_web::test]
async fn test_hidden_item_excluded_only_for_its_owner() {
    let fx = fixture();
    let target = seed_item(&fx.store, fx.city_a, "Dumped mattress", 2, 0).await;
    let other = seed_item(&fx.store, fx.city_a, "Park cleanup", 3, 0).await;
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;

    let hider = Uuid::new_v4();
    let req = test::TestRequest::post()
        .uri(&format!("/feed/hide/{}", target.id))
        .set_json(json!({ "userId": hider, "cityId": fx.city_a }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["hidden"], true);

    let req = test::TestRequest::get()
        .uri(&format!("/feed/city/{}?userId={}", fx.city_a, hider))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(ids(&body), vec![other.id.to_string()]);

    let req = test::TestRequest::get()
        .uri(&format!("/feed/city/{}?userId={}", fx.city_a, Uuid::new_v4()))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 2);

    let req = test::TestRequest::delete()
        .uri(&format!("/feed/hide/{}", target.id))
        .set_json(json!({ "userId": hider }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["hidden"], false);

    let req = test::TestRequest::get()
        .uri(&format!("/feed/city/{}?userId={}", fx.city_a, hider))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 2);
}

#[actix_web::test]
async fn test_hide_rejects_foreign_tenant() {
    let fx = fixture();
    let item = seed_item(&fx.store, fx.city_a, "Closed library", 2, 0).await;
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri(&format!("/feed/hide/{}", item.id))
        .set_json(json!({ "userId": Uuid::new_v4(), "cityId": fx.city_b }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_feed_personalization_follows_viewer() {
    let fx = fixture();
    let item = seed_item(&fx.store, fx.city_a, "Bus stop shelter", 1, 0).await;
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;

    let liker = Uuid::new_v4();
    let req = test::TestRequest::post()
        .uri(&format!("/feed/like/{}", item.id))
        .set_json(json!({ "userId": liker, "cityId": fx.city_a }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/feed/city/{}?userId={}", fx.city_a, liker))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["reports"][0]["isLikedByUser"], true);
    assert_eq!(body["reports"][0]["likesCount"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/feed/city/{}", fx.city_a))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["reports"][0]["isLikedByUser"], false);
    assert_eq!(body["reports"][0]["likesCount"], 1);
}

#[actix_web::test]
async fn test_item_lookup() {
    let fx = fixture();
    let item = seed_item(&fx.store, fx.city_a, "Crosswalk paint", 1, 0).await;
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri(&format!("/feed/share/{}", item.id))
        .set_json(json!({ "userId": Uuid::new_v4() }))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri(&format!("/feed/item/{}?cityId={}", item.id, fx.city_a))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["id"], item.id.to_string());
    assert_eq!(body["sharesCount"], 1);
    assert!(body["cachedScore"].as_f64().unwrap() > 0.0);
    assert!(body["lastScoreUpdate"].is_string());

    let req = test::TestRequest::get()
        .uri(&format!("/feed/item/{}?cityId={}", item.id, fx.city_b))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("/feed/item/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_health_endpoints() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;

    for uri in ["/health", "/api/v1/health/live"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "OK");
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/health/ready")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["ready"], true);
    assert_eq!(body["checks"]["storage"]["status"], "healthy");

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
