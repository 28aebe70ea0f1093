use axum::http::{self, Request, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine};
use http_body_util::BodyExt;
use mock_server::{app, List, Member};
use serde_json::Value;
use tower::ServiceExt;

const KEY: &str = "key-test";
const BOUNDARY: &str = "mock-boundary";

fn auth() -> String {
    format!("Basic {}", STANDARD.encode(format!("api:{KEY}")))
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, auth())
        .body(String::new())
        .unwrap()
}

fn form_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, auth())
        .header(
            http::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(body.to_string())
        .unwrap()
}

fn multipart_request(method: &str, uri: &str, fields: &[(&str, &str)]) -> Request<String> {
    let mut body = String::new();
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, auth())
        .header(
            http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(body)
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_credentials_return_401() {
    let resp = app(KEY)
        .oneshot(Request::builder().uri("/lists").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_key_returns_401() {
    let resp = app("key-other").oneshot(get("/lists")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- lists ---

#[tokio::test]
async fn list_lists_empty() {
    let resp = app(KEY).oneshot(get("/lists")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["total_count"], 0);
    assert_eq!(body["items"], serde_json::json!([]));
}

#[tokio::test]
async fn create_list_defaults_access_level() {
    let resp = app(KEY)
        .oneshot(form_request("POST", "/lists", "address=dev%40x.com&name=Dev"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let list: List = body_json(resp).await;
    assert_eq!(list.address, "dev@x.com");
    assert_eq!(list.name, "Dev");
    assert_eq!(list.access_level, "everyone");
    assert_eq!(list.members_count, 0);
    assert!(!list.created_at.is_empty());
}

#[tokio::test]
async fn create_list_without_address_returns_400() {
    let resp = app(KEY)
        .oneshot(form_request("POST", "/lists", "name=Nameless"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("address"));
}

#[tokio::test]
async fn create_list_rejects_unknown_access_level() {
    let resp = app(KEY)
        .oneshot(form_request(
            "POST",
            "/lists",
            "address=dev%40x.com&access_level=admins",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_list_not_found() {
    let resp = app(KEY).oneshot(get("/lists/missing@x.com")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["message"], "Mailing list not found");
}

#[tokio::test]
async fn update_list_not_found() {
    let resp = app(KEY)
        .oneshot(form_request("PUT", "/lists/missing@x.com", "name=Nope"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_list_not_found() {
    let resp = app(KEY)
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/lists/missing@x.com")
                .header(http::header::AUTHORIZATION, auth())
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- members ---

#[tokio::test]
async fn members_of_missing_list_return_404() {
    let resp = app(KEY)
        .oneshot(get("/lists/missing@x.com/members"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_subscribed_filter_returns_400() {
    let resp = app(KEY)
        .oneshot(get("/lists/missing@x.com/members?subscribed=maybe"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- full lifecycle ---

#[tokio::test]
async fn lists_and_members_lifecycle() {
    use tower::Service;

    let mut app = app(KEY).into_service();

    macro_rules! call {
        ($req:expr) => {
            ServiceExt::ready(&mut app)
                .await
                .unwrap()
                .call($req)
                .await
                .unwrap()
        };
    }

    // create list
    let resp = call!(form_request(
        "POST",
        "/lists",
        "address=dev%40x.com&name=Dev&access_level=members"
    ));
    assert_eq!(resp.status(), StatusCode::OK);

    // duplicate list
    let resp = call!(form_request("POST", "/lists", "address=dev%40x.com"));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // create member with vars
    let resp = call!(multipart_request(
        "POST",
        "/lists/dev@x.com/members",
        &[
            ("upsert", "no"),
            ("address", "a@b.com"),
            ("name", "Alice"),
            ("vars", r#"{"age":30}"#),
        ],
    ));
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    let member: Member = serde_json::from_value(body["member"].clone()).unwrap();
    assert!(member.subscribed);
    assert_eq!(member.vars["age"], 30);

    // duplicate without upsert
    let resp = call!(multipart_request(
        "POST",
        "/lists/dev@x.com/members",
        &[("upsert", "no"), ("address", "a@b.com")],
    ));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // duplicate with upsert merges
    let resp = call!(multipart_request(
        "POST",
        "/lists/dev@x.com/members",
        &[("upsert", "yes"), ("address", "a@b.com"), ("subscribed", "no")],
    ));
    assert_eq!(resp.status(), StatusCode::OK);

    // second member
    let resp = call!(multipart_request(
        "POST",
        "/lists/dev@x.com/members",
        &[("upsert", "no"), ("address", "c@d.com")],
    ));
    assert_eq!(resp.status(), StatusCode::OK);

    // bad vars
    let resp = call!(multipart_request(
        "POST",
        "/lists/dev@x.com/members",
        &[("upsert", "no"), ("address", "e@f.com"), ("vars", "{oops")],
    ));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // filter
    let resp = call!(get("/lists/dev@x.com/members?subscribed=no"));
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["total_count"], 1);
    assert_eq!(body["items"][0]["address"], "a@b.com");
    assert_eq!(body["items"][0]["name"], "Alice"); // kept by upsert

    // count on the list
    let resp = call!(get("/lists/dev@x.com"));
    let body: Value = body_json(resp).await;
    assert_eq!(body["list"]["members_count"], 2);
    assert_eq!(body["list"]["access_level"], "members");

    // update member address
    let resp = call!(multipart_request(
        "PUT",
        "/lists/dev@x.com/members/a@b.com",
        &[("address", "alice@b.com"), ("subscribed", "yes")],
    ));
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["member"]["address"], "alice@b.com");
    assert_eq!(body["member"]["subscribed"], true);

    let resp = call!(get("/lists/dev@x.com/members/a@b.com"));
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = call!(get("/lists/dev@x.com/members/alice@b.com"));
    assert_eq!(resp.status(), StatusCode::OK);

    // rename list, old address is gone
    let resp = call!(form_request("PUT", "/lists/dev@x.com", "address=eng%40x.com"));
    assert_eq!(resp.status(), StatusCode::OK);
    let list: List = body_json(resp).await;
    assert_eq!(list.address, "eng@x.com");
    assert_eq!(list.name, "Dev"); // unchanged
    let resp = call!(get("/lists/dev@x.com"));
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // address filter
    let resp = call!(get("/lists?address=eng%40x.com"));
    let body: Value = body_json(resp).await;
    assert_eq!(body["total_count"], 1);

    // delete
    let resp = call!(Request::builder()
        .method("DELETE")
        .uri("/lists/eng@x.com")
        .header(http::header::AUTHORIZATION, auth())
        .body(String::new())
        .unwrap());
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_bytes(resp).await;
    assert!(!body.is_empty());

    let resp = call!(get("/lists/eng@x.com/members"));
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let resp = call!(get("/lists"));
    let body: Value = body_json(resp).await;
    assert_eq!(body["total_count"], 0);
}
