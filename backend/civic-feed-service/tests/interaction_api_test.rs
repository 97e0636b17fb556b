mod common;

use actix_web::{http::StatusCode, test, App};
use serde_json::{json, Value};
use uuid::Uuid;

use civic_feed_service::configure;
use civic_feed_service::repository::ContentRepository;
use common::{fixture, seed_item};

#[actix_web::test]
async fn test_like_toggles_on_repeated_calls() {
    let fx = fixture();
    let item = seed_item(&fx.store, fx.city_a, "Pothole on Elm", 1, 0).await;
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;
    let user = Uuid::new_v4();

    let expected = [(1, true, "added"), (0, false, "removed"), (1, true, "added")];
    for (likes, liked, action) in expected {
        let req = test::TestRequest::post()
            .uri(&format!("/feed/like/{}", item.id))
            .set_json(json!({ "userId": user, "cityId": fx.city_a }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["likesCount"], likes);
        assert_eq!(body["isLiked"], liked);
        assert_eq!(body["action"], action);
    }
}

#[actix_web::test]
async fn test_view_duration_only_grows() {
    let fx = fixture();
    let item = seed_item(&fx.store, fx.city_a, "Graffiti on library", 1, 0).await;
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;
    let user = Uuid::new_v4();

    for (duration, stored) in [(5.0, 5.0), (3.0, 5.0), (10.0, 10.0)] {
        let req = test::TestRequest::post()
            .uri(&format!("/feed/view/{}", item.id))
            .set_json(json!({ "userId": user, "duration": duration }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["viewsCount"], 1);

        let record = fx.store.view_record(item.id, user).expect("view record");
        assert_eq!(record.duration, stored);
    }

    let req = test::TestRequest::post()
        .uri(&format!("/feed/view/{}", item.id))
        .set_json(json!({ "userId": Uuid::new_v4() }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["viewsCount"], 2);
}

#[actix_web::test]
async fn test_share_counts_once_per_user() {
    let fx = fixture();
    let item = seed_item(&fx.store, fx.city_a, "Farmers market", 1, 0).await;
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;
    let user = Uuid::new_v4();

    for already_shared in [false, true, true] {
        let req = test::TestRequest::post()
            .uri(&format!("/feed/share/{}", item.id))
            .set_json(json!({ "userId": user }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["sharesCount"], 1);
        assert_eq!(body["alreadyShared"], already_shared);
    }
}

#[actix_web::test]
async fn test_cross_tenant_interaction_is_forbidden_and_inert() {
    let fx = fixture();
    let item = seed_item(&fx.store, fx.city_a, "Fallen tree", 1, 0).await;
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;

    for kind in ["like", "view", "share"] {
        let req = test::TestRequest::post()
            .uri(&format!("/feed/{}/{}", kind, item.id))
            .set_json(json!({ "userId": Uuid::new_v4(), "cityId": fx.city_b, "duration": 4 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN, "{}", kind);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Access denied");
        assert_eq!(body["status"], 403);
    }

    let stored = fx.store.get_item(item.id).await.unwrap().unwrap();
    assert_eq!(stored.engagement.likes_count, 0);
    assert_eq!(stored.engagement.views_count, 0);
    assert_eq!(stored.engagement.shares_count, 0);
    assert!(stored.last_score_update.is_none());
}

#[actix_web::test]
async fn test_invalid_requests_are_rejected_before_storage() {
    let fx = fixture();
    let item = seed_item(&fx.store, fx.city_a, "Noise complaint", 1, 0).await;
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;
    let user = Uuid::new_v4();

    let cases = vec![
        (format!("/feed/like/{}", item.id), json!({})),
        (format!("/feed/like/{}", item.id), json!({ "userId": "" })),
        (format!("/feed/like/{}", item.id), json!({ "userId": "user-1" })),
        ("/feed/like/42".to_string(), json!({ "userId": user })),
        (
            format!("/feed/share/{}", item.id),
            json!({ "userId": user, "cityId": "springfield" }),
        ),
        (
            format!("/feed/view/{}", item.id),
            json!({ "userId": user, "duration": -1.0 }),
        ),
        (
            format!("/feed/view/{}", item.id),
            json!({ "userId": user, "duration": "long" }),
        ),
    ];

    for (uri, payload) in cases {
        let req = test::TestRequest::post()
            .uri(&uri)
            .set_json(payload.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(
            resp.status(),
            StatusCode::BAD_REQUEST,
            "{} {}",
            uri,
            payload
        );
    }

    let req = test::TestRequest::post()
        .uri(&format!("/feed/like/{}", item.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let stored = fx.store.get_item(item.id).await.unwrap().unwrap();
    assert_eq!(stored.engagement.likes_count, 0);
    assert_eq!(stored.engagement.views_count, 0);
    assert_eq!(stored.engagement.shares_count, 0);
}

#[actix_web::test]
async fn test_unknown_item_is_not_found() {
    let fx = fixture();
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;

    for kind in ["like", "view", "share", "hide"] {
        let req = test::TestRequest::post()
            .uri(&format!("/feed/{}/{}", kind, Uuid::new_v4()))
            .set_json(json!({ "userId": Uuid::new_v4() }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", kind);
    }
}

#[actix_web::test]
async fn test_interactions_refresh_cached_score() {
    let fx = fixture();
    let item = seed_item(&fx.store, fx.city_a, "Snow removal", 1, 0).await;
    let app = test::init_service(App::new().app_data(fx.state.clone()).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri(&format!("/feed/like/{}", item.id))
        .set_json(json!({ "userId": Uuid::new_v4() }))
        .to_request();
    test::call_service(&app, req).await;

    let stored = fx.store.get_item(item.id).await.unwrap().unwrap();
    assert_eq!(stored.engagement.likes_count, 1);
    assert!(stored.engagement_score > 0.0);
    assert!(stored.last_score_update.is_some());
}
