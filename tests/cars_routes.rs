use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use carzone_db::{Database, MemoryStore};
use carzone_kernel::settings::{MissingEmailPolicy, Settings, StoreBackend};
use carzone_kernel::InitCtx;
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    fn with_settings(mut settings: Settings) -> Self {
        settings.database.backend = StoreBackend::Memory;
        let store = Arc::new(MemoryStore::new());
        let db = Database::from_store(store.clone());
        let registry = carzone_app::bootstrap::build_registry(&settings, &db);
        let router = carzone_http::build_router(&registry, &settings);
        Self { router, store }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn insert(&self, car: Value) -> String {
        let (status, ack) = self.send(Method::POST, "/cars", Some(car)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack["acknowledged"], true);
        ack["insertedId"].as_str().unwrap().to_string()
    }
}

fn red_racer() -> Value {
    json!({
        "name": "Red Racer",
        "subcategory": "sports car",
        "sellerEmail": "a@x.com",
        "price": 10,
        "quantity": 2
    })
}

fn names(listings: &Value) -> Vec<&str> {
    listings
        .as_array()
        .unwrap()
        .iter()
        .map(|car| car["name"].as_str().unwrap())
        .collect()
}

fn prices(listings: &Value) -> Vec<f64> {
    listings
        .as_array()
        .unwrap()
        .iter()
        .map(|car| car["price"].as_f64().unwrap())
        .collect()
}

#[tokio::test]
async fn liveness_text_at_root() {
    let app = TestApp::new();
    let (status, body) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Toy Car Zone server is running"));
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let app = TestApp::new();
    let id = app.insert(red_racer()).await;

    let (status, car) = app.get(&format!("/cars/{id}")).await;
    assert_eq!(status, StatusCode::OK);

    let mut expected = red_racer();
    expected["_id"] = json!(id);
    assert_eq!(car, expected);
}

#[tokio::test]
async fn unknown_id_returns_null() {
    let app = TestApp::new();
    let (status, body) = app.get("/cars/64b7f0c2a1b2c3d4e5f60718").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn client_string_id_is_not_addressable() {
    let app = TestApp::new();
    let raw = "64b7f0c2a1b2c3d4e5f60718";
    let (status, ack) = app
        .send(Method::POST, "/cars", Some(json!({"_id": raw, "name": "x"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["insertedId"], json!(raw));

    let (status, body) = app.get(&format!("/cars/{raw}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn malformed_id_is_a_bad_request() {
    let app = TestApp::new();

    let (status, body) = app.get("/cars/not-an-id").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_identifier");

    let (status, _) = app
        .send(Method::PATCH, "/cars/123", Some(json!({"price": 1})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send(Method::DELETE, "/cars/xyz", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_is_capped_at_twenty() {
    let app = TestApp::new();
    for n in 0..25 {
        app.insert(json!({"name": format!("Car {n}")})).await;
    }

    let (status, body) = app.get("/cars").await;
    assert_eq!(status, StatusCode::OK);
    let listed = names(&body);
    assert_eq!(listed.len(), 20);
    assert_eq!(listed[0], "Car 0");
}

#[tokio::test]
async fn list_cap_is_configurable() {
    let mut settings = Settings::default();
    settings.listings.list_limit = 3;
    let app = TestApp::with_settings(settings);
    for n in 0..5 {
        app.insert(json!({"name": format!("Car {n}")})).await;
    }

    let (_, body) = app.get("/cars").await;
    assert_eq!(names(&body).len(), 3);
}

#[tokio::test]
async fn category_slug_matches_exact_subcategory() {
    let app = TestApp::new();
    app.insert(red_racer()).await;
    app.insert(json!({"name": "Hauler", "subcategory": "truck"})).await;
    app.insert(json!({"name": "Kart", "subcategory": "sports car mini"})).await;

    let (status, body) = app.get("/categories/sports-car").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Red Racer"]);

    let (_, body) = app.get("/categories/police-car").await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn my_toys_filters_by_seller() {
    let app = TestApp::new();
    app.insert(red_racer()).await;
    app.insert(json!({"name": "Other", "sellerEmail": "b@x.com"})).await;
    app.insert(json!({"name": "Orphan"})).await;

    let (_, body) = app.get("/my-toys?email=a@x.com").await;
    assert_eq!(names(&body), vec!["Red Racer"]);

    // Absent email matches listings without a seller by default.
    let (_, body) = app.get("/my-toys").await;
    assert_eq!(names(&body), vec!["Orphan"]);
}

#[tokio::test]
async fn missing_email_policy_is_configurable() {
    let mut settings = Settings::default();
    settings.listings.missing_email = MissingEmailPolicy::MatchAll;
    let app = TestApp::with_settings(settings);
    app.insert(red_racer()).await;
    app.insert(json!({"name": "Orphan"})).await;
    let (_, body) = app.get("/my-toys").await;
    assert_eq!(names(&body).len(), 2);

    let mut settings = Settings::default();
    settings.listings.missing_email = MissingEmailPolicy::Reject;
    let app = TestApp::with_settings(settings);
    let (status, body) = app.get("/sort-car/low").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "missing_parameter");
}

#[tokio::test]
async fn search_is_case_insensitive_substring() {
    let app = TestApp::new();
    app.insert(red_racer()).await;
    app.insert(json!({"name": "Blue Bird"})).await;
    app.insert(json!({"name": "Bored Ape"})).await;

    let (status, body) = app.get("/search/RED").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Red Racer", "Bored Ape"]);

    let (_, body) = app.get("/search/r.d").await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn sort_car_orders_by_price() {
    let app = TestApp::new();
    for price in [30, 5, 12, 5, 99] {
        app.insert(json!({"name": format!("P{price}"), "sellerEmail": "a@x.com", "price": price}))
            .await;
    }
    app.insert(json!({"name": "Elsewhere", "sellerEmail": "b@x.com", "price": 1}))
        .await;

    let (_, body) = app.get("/sort-car/low?email=a@x.com").await;
    let ascending = prices(&body);
    assert_eq!(ascending.len(), 5);
    assert!(ascending.windows(2).all(|w| w[0] <= w[1]));

    let (_, body) = app.get("/sort-car/high?email=a@x.com").await;
    let descending = prices(&body);
    assert_eq!(descending.len(), 5);
    assert!(descending.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn gallery_returns_only_pictures() {
    let app = TestApp::new();
    for n in 0..8 {
        app.insert(json!({"name": format!("Car {n}"), "pictureUrl": format!("https://img/{n}.png")}))
            .await;
    }

    let (status, body) = app.get("/gallery-images").await;
    assert_eq!(status, StatusCode::OK);
    let pictures = body.as_array().unwrap();
    assert_eq!(pictures.len(), 6);
    for picture in pictures {
        let fields: Vec<_> = picture.as_object().unwrap().keys().collect();
        assert_eq!(fields, vec!["pictureUrl"]);
    }
}

#[tokio::test]
async fn patch_overwrites_three_fields_idempotently() {
    let app = TestApp::new();
    let id = app.insert(red_racer()).await;
    let uri = format!("/cars/{id}");
    let update = json!({"price": 15, "quantity": 1, "description": "used"});

    let (status, first) = app.send(Method::PATCH, &uri, Some(update.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["matchedCount"], 1);
    assert_eq!(first["modifiedCount"], 1);
    let (_, after_first) = app.get(&uri).await;

    let (_, second) = app.send(Method::PATCH, &uri, Some(update)).await;
    assert_eq!(second["matchedCount"], 1);
    assert_eq!(second["modifiedCount"], 0);
    let (_, after_second) = app.get(&uri).await;

    assert_eq!(after_first, after_second);
    assert_eq!(after_second["price"], 15);
    assert_eq!(after_second["quantity"], 1);
    assert_eq!(after_second["description"], "used");
    assert_eq!(after_second["name"], "Red Racer");

    // Search and category still find the updated listing.
    let (_, found) = app.get("/search/red").await;
    assert_eq!(names(&found), vec!["Red Racer"]);
    let (_, found) = app.get("/categories/sports-car").await;
    assert_eq!(names(&found), vec!["Red Racer"]);
}

#[tokio::test]
async fn patch_nulls_absent_fields_and_reports_no_match() {
    let app = TestApp::new();
    let id = app.insert(red_racer()).await;

    app.send(Method::PATCH, &format!("/cars/{id}"), Some(json!({"price": 20})))
        .await;
    let (_, car) = app.get(&format!("/cars/{id}")).await;
    assert_eq!(car["price"], 20);
    assert_eq!(car["quantity"], Value::Null);

    let (status, ack) = app
        .send(
            Method::PATCH,
            "/cars/64b7f0c2a1b2c3d4e5f60718",
            Some(json!({"price": 1})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["matchedCount"], 0);
}

#[tokio::test]
async fn delete_then_get_is_null() {
    let app = TestApp::new();
    let id = app.insert(red_racer()).await;
    let uri = format!("/cars/{id}");

    let (status, ack) = app.send(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack, json!({"acknowledged": true, "deletedCount": 1}));

    let (_, body) = app.get(&uri).await;
    assert_eq!(body, Value::Null);

    let (_, ack) = app.send(Method::DELETE, &uri, None).await;
    assert_eq!(ack["deletedCount"], 0);
}

#[tokio::test]
async fn store_failures_surface_as_internal_errors() {
    let app = TestApp::new();
    app.insert(red_racer()).await;
    carzone_db::DocumentStore::shutdown(app.store.as_ref())
        .await
        .unwrap();

    let (status, body) = app.get("/cars").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "internal_error");
}

#[tokio::test]
async fn lifecycle_declares_name_index() {
    let settings = Settings::default();
    let store = Arc::new(MemoryStore::new());
    let db = Database::from_store(store.clone());
    let registry = carzone_app::bootstrap::build_registry(&settings, &db);
    let ctx = InitCtx {
        settings: &settings,
        db: &db,
    };

    registry.init_core_modules(&ctx).await.unwrap();
    registry.init_custom_modules(&ctx).await.unwrap();
    registry.ensure_indexes(&ctx).await.unwrap();
    assert_eq!(store.index_names("toyCars").await, vec!["toyCarsName"]);

    registry.stop_custom_modules().await.unwrap();
    registry.stop_core_modules().await.unwrap();
    assert!(db.ping().await.is_err());
}

#[tokio::test]
async fn responses_carry_request_id_and_cors() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/cars")
                .header(header::ORIGIN, "https://toys.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}
