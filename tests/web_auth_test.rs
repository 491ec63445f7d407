//! Browser account flows: signup, login and logout over cookie sessions.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::*;
use todos::ports::user_port::UserPort;

fn cookie_request(method: &str, uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn location(response: &axum::http::Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn index_renders_for_anonymous_visitor() {
    let app = spawn_app().await;
    let response = app.send(empty_request("GET", "/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Nothing to do."));
    assert!(html.contains("href=\"/login\""));
}

#[tokio::test]
async fn signup_and_login_pages_render() {
    let app = spawn_app().await;
    for path in ["/signup", "/login"] {
        let response = app.send(empty_request("GET", path, None)).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert!(body_text(response).await.contains("<form"));
    }
}

#[tokio::test]
async fn signup_creates_account_and_signs_in() {
    let app = spawn_app().await;
    let response = app
        .send(form_request(
            "POST",
            "/signup",
            None,
            "username=newcomer&password=longpassword&password2=longpassword",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(app.store.find_user_by_username("newcomer").unwrap().is_some());

    let cookie = build_cookie_header(&extract_cookies(&response));
    assert!(!cookie.is_empty());
    let response = app.send(cookie_request("GET", "/", &cookie)).await;
    let html = body_text(response).await;
    assert!(html.contains("newcomer"));
    assert!(html.contains("href=\"/logout\""));
}

#[tokio::test]
async fn signup_with_mismatched_passwords_rerenders_form() {
    let app = spawn_app().await;
    let response = app
        .send(form_request(
            "POST",
            "/signup",
            None,
            "username=newcomer&password=longpassword&password2=otherpassword",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("password must match"));
    assert_eq!(app.store.count_users().unwrap(), 0);
}

#[tokio::test]
async fn signup_with_taken_username_is_reported() {
    let app = spawn_app().await;
    app.default_user();
    let response = app
        .send(form_request(
            "POST",
            "/signup",
            None,
            "username=username&password=longpassword&password2=longpassword",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("username is taken"));
    assert_eq!(app.store.count_users().unwrap(), 1);
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let app = spawn_app().await;
    app.default_user();
    let response = app
        .send(form_request(
            "POST",
            "/login",
            None,
            "username=username&password=wrong-password",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Sign in failed."));
}

#[tokio::test]
async fn login_with_unknown_user_fails() {
    let app = spawn_app().await;
    let response = app
        .send(form_request(
            "POST",
            "/login",
            None,
            "username=nobody-here&password=whatever",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Sign in failed."));
}

#[tokio::test]
async fn login_with_empty_fields_requires_them() {
    let app = spawn_app().await;
    let response = app
        .send(form_request("POST", "/login", None, "username=&password="))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("This field is required."));
}

#[tokio::test]
async fn login_success_sets_session() {
    let app = spawn_app().await;
    app.default_user();
    let login = format!("username={TEST_USERNAME}&password={TEST_PASSWORD}");
    let response = app.send(form_request("POST", "/login", None, &login)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let cookie = build_cookie_header(&extract_cookies(&response));
    let response = app.send(cookie_request("GET", "/", &cookie)).await;
    assert!(body_text(response).await.contains(TEST_USERNAME));
}

#[tokio::test]
async fn logout_requires_a_session() {
    let app = spawn_app().await;
    let response = app.send(empty_request("GET", "/logout", None)).await;
    assert!(response.status().is_redirection());
    assert!(location(&response).starts_with("/signup"));
}

#[tokio::test]
async fn logout_ends_session() {
    let app = spawn_app().await;
    app.default_user();
    let login = format!("username={TEST_USERNAME}&password={TEST_PASSWORD}");
    let response = app.send(form_request("POST", "/login", None, &login)).await;
    let cookie = build_cookie_header(&extract_cookies(&response));

    let response = app.send(cookie_request("GET", "/logout", &cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = app.send(cookie_request("GET", "/", &cookie)).await;
    let html = body_text(response).await;
    assert!(!html.contains("href=\"/logout\""));

    let response = app.send(cookie_request("GET", "/logout", &cookie)).await;
    assert!(location(&response).starts_with("/signup"));
}

#[tokio::test]
async fn session_cookie_does_not_authenticate_api_writes() {
    let app = spawn_app().await;
    app.default_user();
    let login = format!("username={TEST_USERNAME}&password={TEST_PASSWORD}");
    let response = app.send(form_request("POST", "/login", None, &login)).await;
    let cookie = build_cookie_header(&extract_cookies(&response));

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/todos")
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("name=x&completed=True"))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_path_renders_not_found_page() {
    let app = spawn_app().await;
    let response = app.send(empty_request("GET", "/no-such-page", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("404"));
}
