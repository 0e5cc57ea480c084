use axum::{
    Router,
    body::Body,
    error_handling::HandleErrorLayer,
    http::{Request, StatusCode, header, request::Parts},
    response::Response,
    routing::{get, post},
};
use security_exception_filter::prelude::*;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::trace::TraceLayer;

struct BearerGuard;

#[async_trait]
impl Guard for BearerGuard {
    async fn can_activate(&self, request: &Parts) -> GuardResult {
        match request.headers.get(header::AUTHORIZATION) {
            Some(value) if value == "Bearer admin" => Ok(()),
            Some(_) => Err(SecurityError::forbidden("insufficient scope")),
            None => Err(SecurityError::unauthenticated("missing bearer token")),
        }
    }
}

async fn graphql() -> &'static str {
    r#"{"data":{}}"#
}

async fn profile() -> &'static str {
    "profile"
}

async fn delete_post() -> Result<&'static str, SecurityError> {
    Err(SecurityError::forbidden("only the author may delete"))
}

fn app(properties: &SecurityHandlerProperties) -> Router {
    let filter = SecurityExceptionFilterLayer::from_properties(properties).unwrap();

    Router::new()
        .route("/graphql", post(graphql))
        .route("/api/profile", get(profile))
        .route("/api/posts/delete", post(delete_post))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_unmatched))
                .layer(filter)
                .layer(GuardLayer::new(vec![Box::new(BearerGuard)])),
        )
        .layer(TraceLayer::new_for_http())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let response: Response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn graphql_endpoint_gets_graphql_envelope() {
    let app = app(&SecurityHandlerProperties::default());
    let request = Request::post("/graphql").body(Body::empty()).unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        r#"{"errors":[{"message":"Authentication required","extensions":{"errorType":"AUTHENTICATION_REQUIRED","classification":"UNAUTHENTICATED","code":"AUTHENTICATION_ERROR"}}]}"#
    );
}

#[tokio::test]
async fn rest_endpoint_gets_rest_body() {
    let app = app(&SecurityHandlerProperties::default());
    let request = Request::get("/api/profile")
        .header(header::AUTHORIZATION, "Bearer reader")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"code":"ACCESS_DENIED","message":"Access denied"}"#);
}

#[tokio::test]
async fn authorized_request_reaches_handler() {
    let app = app(&SecurityHandlerProperties::default());
    let request = Request::get("/api/profile")
        .header(header::AUTHORIZATION, "Bearer admin")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "profile");
}

#[tokio::test]
async fn handler_returned_security_error_is_rendered() {
    let app = app(&SecurityHandlerProperties::default());
    let request = Request::post("/api/posts/delete")
        .header(header::AUTHORIZATION, "Bearer admin")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"code":"ACCESS_DENIED","message":"Access denied"}"#);
}

#[tokio::test]
async fn unmatched_path_falls_back_to_bare_status() {
    let properties = SecurityHandlerProperties::from_json(
        r#"{"handlers": {"default": {"enabled": false}}}"#,
    )
    .unwrap();
    let app = app(&properties);
    let request = Request::get("/api/profile").body(Body::empty()).unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "");
}

#[test]
fn no_enabled_handlers_fails_at_startup() {
    let properties = SecurityHandlerProperties::from_json(
        r#"{"handlers": {"default": {"enabled": false}, "graphql": {"enabled": false}}}"#,
    )
    .unwrap();

    assert!(matches!(
        SecurityExceptionFilterLayer::from_properties(&properties),
        Err(Error::NoEnabledHandlers)
    ));
}
