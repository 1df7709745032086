use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use bulk_loader::{BulkInsert, ImportRecord};
use ids::ThemeId;
use repositories::in_memory::{FailingSetsRepo, InMemoryStore};
use routing::{AuthState, StaticToken};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use sets_core::model::Set;
use sets_core::{SetEngine, SetRepository};
use sets_routes::routes;
use sets_routes::state::SetAppState;

const READER: &str = "reader-token";
const WRITER: &str = "writer-token";

const CSV_HEADER: &str = "set_num,year,name,theme_id,num_parts,img_url";

#[derive(Clone)]
struct TestEngine<R> {
    repo: R,
}

impl<R: SetRepository> SetEngine for TestEngine<R> {
    type Repo = R;

    fn repo(&self) -> Self::Repo {
        self.repo.clone()
    }
}

fn auth_state() -> AuthState {
    AuthState::with_static_tokens([
        StaticToken::new(READER, "reader", &["CATALOG_READ"]),
        StaticToken::new(WRITER, "writer", &["CATALOG_READ", "CATALOG_WRITE"]),
    ])
}

fn server_with<R: SetRepository>(repo: R) -> TestServer {
    let router = routes::build(SetAppState::new(TestEngine { repo }), auth_state(), None);
    TestServer::new(router).expect("test server created")
}

/// Themes 1 (Town) and 2 (Space) exist, no sets.
#[fixture]
async fn server() -> TestServer {
    let store = InMemoryStore::new();
    store
        .themes()
        .bulk_insert(vec![
            ImportRecord::root(ThemeId::new(1), "Town"),
            ImportRecord::root(ThemeId::new(2), "Space"),
        ])
        .await
        .expect("themes seeded");
    server_with(store.sets())
}

fn fire_station() -> Value {
    json!({
        "num": "6382-1",
        "name": "Fire Station",
        "year": 1987,
        "num_parts": 387,
        "img_url": "https://cdn.example.com/sets/6382-1.jpg",
        "theme_id": 1
    })
}

async fn create(server: &TestServer, body: Value) -> Set {
    let response = server
        .post("/sets")
        .authorization_bearer(WRITER)
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

async fn import(server: &TestServer, rows: &[&str]) -> TestResponse {
    let contents = std::iter::once(CSV_HEADER)
        .chain(rows.iter().copied())
        .collect::<Vec<_>>()
        .join("\n");
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(contents.into_bytes())
            .file_name("sets.csv")
            .mime_type("text/csv"),
    );
    server
        .post("/sets/bulk")
        .authorization_bearer(WRITER)
        .multipart(form)
        .await
}

#[rstest]
#[tokio::test]
async fn create_then_get(#[future] server: TestServer) {
    let server = server.await;

    let created = create(&server, fire_station()).await;
    assert_eq!("6382-1", created.num);
    assert_eq!(ThemeId::new(1), created.theme_id);
    assert!(created.updated.is_none());

    let response = server
        .get(&format!("/sets/{}", created.id))
        .authorization_bearer(READER)
        .await;
    response.assert_status_ok();
    assert_eq!(created, response.json::<Set>());
}

#[rstest]
#[tokio::test]
async fn list_filters_by_theme_and_name(#[future] server: TestServer) {
    let server = server.await;

    server
        .get("/sets")
        .authorization_bearer(READER)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    create(&server, fire_station()).await;
    let mut galaxy = fire_station();
    galaxy["num"] = json!("6980-1");
    galaxy["name"] = json!("Galaxy Commander");
    galaxy["theme_id"] = json!(2);
    create(&server, galaxy).await;

    let response = server
        .get("/sets")
        .add_query_param("theme_id", 2)
        .authorization_bearer(READER)
        .await;
    response.assert_status_ok();
    let sets: Vec<Set> = response.json();
    assert_eq!(1, sets.len());
    assert_eq!("6980-1", sets[0].num);

    let response = server
        .get("/sets")
        .add_query_param("name", "fire")
        .authorization_bearer(READER)
        .await;
    let sets: Vec<Set> = response.json();
    assert_eq!(1, sets.len());
    assert_eq!("Fire Station", sets[0].name);

    let response = server
        .get("/sets")
        .add_query_param("limit", 1)
        .add_query_param("offset", 1)
        .authorization_bearer(READER)
        .await;
    let sets: Vec<Set> = response.json();
    assert_eq!(1, sets.len());
    assert_eq!("6980-1", sets[0].num);
}

#[rstest]
#[case::negative_year(json!({"year": -1}), "year cannot be negative")]
#[case::relative_url(json!({"img_url": "sets/6382-1.jpg"}), "img_url must be an absolute http or https URL")]
#[case::ftp_url(json!({"img_url": "ftp://cdn.example.com/6382-1.jpg"}), "img_url must be an absolute http or https URL")]
#[case::blank_name(json!({"name": " "}), "name cannot be blank")]
#[case::negative_parts(json!({"num_parts": -3}), "num_parts cannot be negative")]
#[tokio::test]
async fn create_rejects_invalid_fields(
    #[future] server: TestServer,
    #[case] overrides: Value,
    #[case] detail: &str,
) {
    let server = server.await;
    let mut body = fire_station();
    if let (Some(body), Some(overrides)) = (body.as_object_mut(), overrides.as_object()) {
        body.extend(overrides.clone());
    }

    let response = server
        .post("/sets")
        .authorization_bearer(WRITER)
        .json(&body)
        .await;

    response.assert_status_unprocessable_entity();
    assert_eq!(
        json!({"detail": detail, "kind": "validation"}),
        response.json::<Value>()
    );
}

#[rstest]
#[tokio::test]
async fn create_rejects_unknown_theme_and_taken_num(#[future] server: TestServer) {
    let server = server.await;

    let mut orphan = fire_station();
    orphan["theme_id"] = json!(99);
    let response = server
        .post("/sets")
        .authorization_bearer(WRITER)
        .json(&orphan)
        .await;
    response.assert_status_bad_request();
    assert_eq!(
        json!({"detail": "Theme provided doesn't exist", "kind": "missing_reference"}),
        response.json::<Value>()
    );

    create(&server, fire_station()).await;
    let response = server
        .post("/sets")
        .authorization_bearer(WRITER)
        .json(&fire_station())
        .await;
    response.assert_status_bad_request();
    assert_eq!(
        json!({"detail": "Set already exists", "kind": "duplicate_key"}),
        response.json::<Value>()
    );
}

#[rstest]
#[tokio::test]
async fn patch_updates_only_given_fields(#[future] server: TestServer) {
    let server = server.await;
    let created = create(&server, fire_station()).await;

    let response = server
        .patch(&format!("/sets/{}", created.id))
        .authorization_bearer(WRITER)
        .json(&json!({"name": "Fire Station (reissue)", "theme_id": 2}))
        .await;

    response.assert_status_ok();
    let patched: Set = response.json();
    assert_eq!("Fire Station (reissue)", patched.name);
    assert_eq!(ThemeId::new(2), patched.theme_id);
    assert_eq!(created.num, patched.num);
    assert_eq!(created.year, patched.year);
    assert!(patched.updated.is_some());
}

#[rstest]
#[tokio::test]
async fn patch_rejections(#[future] server: TestServer) {
    let server = server.await;
    let created = create(&server, fire_station()).await;
    let mut other = fire_station();
    other["num"] = json!("6390-1");
    create(&server, other).await;
    let path = format!("/sets/{}", created.id);

    server
        .patch(&path)
        .authorization_bearer(WRITER)
        .json(&json!({"theme_id": 99}))
        .await
        .assert_status_bad_request();

    let response = server
        .patch(&path)
        .authorization_bearer(WRITER)
        .json(&json!({"num": "6390-1"}))
        .await;
    response.assert_status_bad_request();
    assert_eq!("duplicate_key", response.json::<Value>()["kind"]);

    server
        .patch(&path)
        .authorization_bearer(WRITER)
        .json(&json!({"year": -5}))
        .await
        .assert_status_unprocessable_entity();

    let response = server
        .patch("/sets/404")
        .authorization_bearer(WRITER)
        .json(&json!({"name": "Ghost"}))
        .await;
    response.assert_status_not_found();
    assert_eq!(
        json!({"detail": "Set 404 doesn't exist"}),
        response.json::<Value>()
    );
}

#[rstest]
#[tokio::test]
async fn delete_removes_the_set(#[future] server: TestServer) {
    let server = server.await;
    let created = create(&server, fire_station()).await;
    let path = format!("/sets/{}", created.id);

    server
        .delete(&path)
        .authorization_bearer(READER)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    server
        .delete(&path)
        .authorization_bearer(WRITER)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get(&path)
        .authorization_bearer(READER)
        .await
        .assert_status_not_found();

    server
        .delete(&path)
        .authorization_bearer(WRITER)
        .await
        .assert_status_not_found();
}

#[rstest]
#[tokio::test]
async fn import_loads_every_row(#[future] server: TestServer) {
    let server = server.await;

    let response = import(
        &server,
        &[
            "6382-1,1987,Fire Station,1,387,https://cdn.example.com/6382-1.jpg",
            "6980-1,1986,Galaxy Commander,2,413,https://cdn.example.com/6980-1.jpg",
        ],
    )
    .await;

    response.assert_status(StatusCode::CREATED);
    assert_eq!(
        json!({"detail": "Successfully imported", "batches": 1, "imported": 2}),
        response.json::<Value>()
    );

    let sets: Vec<Set> = server
        .get("/sets")
        .authorization_bearer(READER)
        .await
        .json();
    assert_eq!(
        vec!["6382-1", "6980-1"],
        sets.iter().map(|s| s.num.as_str()).collect::<Vec<_>>()
    );
}

#[rstest]
#[tokio::test]
async fn import_with_repeated_num_inserts_nothing(#[future] server: TestServer) {
    let server = server.await;

    let response = import(
        &server,
        &[
            "6382-1,1987,Fire Station,1,387,https://cdn.example.com/6382-1.jpg",
            "6382-1,1987,Fire Station,1,387,https://cdn.example.com/6382-1.jpg",
        ],
    )
    .await;

    response.assert_status_bad_request();
    assert_eq!(
        json!({"detail": "Import contains duplicate set nums: 6382-1", "kind": "duplicate_key"}),
        response.json::<Value>()
    );
    server
        .get("/sets")
        .authorization_bearer(READER)
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[rstest]
#[tokio::test]
async fn import_with_unknown_theme_inserts_nothing(#[future] server: TestServer) {
    let server = server.await;

    let response = import(
        &server,
        &[
            "6382-1,1987,Fire Station,1,387,https://cdn.example.com/6382-1.jpg",
            "1592-1,1983,Town Square,42,471,https://cdn.example.com/1592-1.jpg",
        ],
    )
    .await;

    response.assert_status_bad_request();
    assert_eq!(
        json!({"detail": "Theme provided doesn't exist", "kind": "missing_reference"}),
        response.json::<Value>()
    );
    server
        .get("/sets")
        .authorization_bearer(READER)
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[rstest]
#[tokio::test]
async fn import_rejects_existing_num(#[future] server: TestServer) {
    let server = server.await;
    create(&server, fire_station()).await;

    let response = import(
        &server,
        &["6382-1,1987,Fire Station,1,387,https://cdn.example.com/6382-1.jpg"],
    )
    .await;

    response.assert_status_bad_request();
    assert_eq!(
        json!({"detail": "Set already exists", "kind": "duplicate_key"}),
        response.json::<Value>()
    );
}

#[rstest]
#[tokio::test]
async fn import_validates_rows(#[future] server: TestServer) {
    let server = server.await;

    let response = import(
        &server,
        &["6382-1,1987,Fire Station,1,387,not a url"],
    )
    .await;

    response.assert_status_unprocessable_entity();
    assert_eq!(
        json!({
            "detail": "set 6382-1: img_url must be an absolute http or https URL",
            "kind": "validation"
        }),
        response.json::<Value>()
    );
}

#[rstest]
#[tokio::test]
async fn import_rejects_missing_columns(#[future] server: TestServer) {
    let server = server.await;
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"set_num,name\n6382-1,Fire Station".to_vec())
            .file_name("sets.csv")
            .mime_type("text/csv"),
    );

    let response = server
        .post("/sets/bulk")
        .authorization_bearer(WRITER)
        .multipart(form)
        .await;

    response.assert_status_bad_request();
    assert_eq!("invalid_file", response.json::<Value>()["kind"]);
}

#[rstest]
#[tokio::test]
async fn import_with_unreadable_row_names_the_cause(#[future] server: TestServer) {
    let server = server.await;

    let response = import(&server, &["6382-1,nineteen,Fire Station,1,367,"]).await;

    response.assert_status_bad_request();
    let body = response.json::<Value>();
    assert_eq!("invalid_file", body["kind"]);
    let detail = body["detail"].as_str().unwrap_or_default();
    assert!(detail.starts_with("row on line 2 could not be read: "), "{detail}");
    assert!(detail.contains("invalid digit"), "{detail}");
}

#[tokio::test]
async fn store_failures_are_internal_errors() {
    let server = server_with(FailingSetsRepo);

    let response = server.get("/sets/1").authorization_bearer(READER).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json!({"detail": "an internal error occurred"}),
        response.json::<Value>()
    );

    server
        .post("/sets")
        .authorization_bearer(WRITER)
        .json(&fire_station())
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}
