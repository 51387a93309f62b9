//! HTTP handlers for zoo keepers and the proxied zoo service lists

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::{Method, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{Map, Value};

use super::error::KeeperError;
use super::service::KeeperService;

/// Create the keeper router. Expects an `Extension<Arc<KeeperService>>` layer.
///
/// `GET` routes also answer `HEAD` with the same status and no body.
/// Unknown paths and unsupported methods get the JSON error body as well.
pub fn router() -> Router {
    Router::new()
        .route("/zoos/", get(get_all_zoos))
        .route("/monkeys/", get(get_all_monkeys))
        .route("/zoo_keepers/", get(get_all_keepers).post(post_keeper))
        .route(
            "/zoo_keepers/{id}",
            get(get_keeper).put(put_keeper).delete(delete_keeper),
        )
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(no_route)
}

async fn no_route(method: Method, uri: Uri) -> KeeperError {
    KeeperError::NoRoute(format!("{method} {}", uri.path()))
}

async fn method_not_allowed(method: Method, uri: Uri) -> KeeperError {
    KeeperError::MethodNotAllowed(format!("{method} {}", uri.path()))
}

fn respond(result: Result<Value, KeeperError>) -> Response {
    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Path ids that are not integers cannot name a keeper.
fn parse_id(raw: &str) -> Result<i64, KeeperError> {
    raw.parse().map_err(|_| KeeperError::BadId(raw.to_string()))
}

fn json_object(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, KeeperError> {
    match body {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(Json(_)) => Err(KeeperError::BadRequest(
            "request body must be a JSON object".to_string(),
        )),
        Err(rejection) => Err(KeeperError::BadRequest(rejection.body_text())),
    }
}

async fn get_all_zoos(Extension(service): Extension<Arc<KeeperService>>) -> Response {
    respond(service.get_all_zoos().await)
}

async fn get_all_monkeys(Extension(service): Extension<Arc<KeeperService>>) -> Response {
    respond(service.get_all_monkeys().await)
}

async fn get_all_keepers(Extension(service): Extension<Arc<KeeperService>>) -> Response {
    respond(service.get_all_keepers().await)
}

async fn get_keeper(
    Extension(service): Extension<Arc<KeeperService>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    respond(service.get_keeper(id).await)
}

async fn post_keeper(
    Extension(service): Extension<Arc<KeeperService>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let payload = match json_object(body) {
        Ok(payload) => payload,
        Err(e) => return e.into_response(),
    };
    respond(service.post_keeper(&payload).await)
}

async fn put_keeper(
    Extension(service): Extension<Arc<KeeperService>>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let payload = match json_object(body) {
        Ok(payload) => payload,
        Err(e) => return e.into_response(),
    };
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    respond(service.put_keeper(id, &payload).await)
}

async fn delete_keeper(
    Extension(service): Extension<Arc<KeeperService>>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };
    respond(service.delete_keeper(id).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keepers::mock::InMemoryKeeperRepo;
    use crate::keepers::validator::DependencyPolicy;
    use crate::zoo_service::mock::MockZooService;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn test_router() -> Router {
        let service = KeeperService::new(
            Arc::new(InMemoryKeeperRepo::new()),
            Arc::new(MockZooService::with_fixtures()),
            DependencyPolicy::FailClosed,
        );
        router().layer(Extension(Arc::new(service)))
    }

    fn request(method: &str, uri: &str, body: Option<&str>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn list_starts_empty() {
        let response = test_router()
            .oneshot(request("GET", "/zoo_keepers/", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, Value::Array(vec![]));
    }

    #[tokio::test]
    async fn non_integer_id_is_bad_id() {
        let response = test_router()
            .oneshot(request("GET", "/zoo_keepers/abc", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["error_type"], "BadId");
        assert_eq!(body["text"], "zoo keeper: abc does not exist");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let response = test_router()
            .oneshot(request("POST", "/zoo_keepers/", Some("{not json")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error_type"], "BadRequest");
    }

    #[tokio::test]
    async fn non_object_json_is_bad_request() {
        let response = test_router()
            .oneshot(request("PUT", "/zoo_keepers/1", Some("[1, 2]")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error_type"], "BadRequest");
    }

    #[tokio::test]
    async fn post_unknown_key_is_bad_data() {
        let response = test_router()
            .oneshot(request("POST", "/zoo_keepers/", Some(r#"{"oops": 1}"#)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error_type"], "BadData");
    }

    #[tokio::test]
    async fn head_has_no_body() {
        let response = test_router()
            .oneshot(request("HEAD", "/zoos/", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn unmatched_requests_get_error_bodies() {
        let cases = [
            ("DELETE", "/zoo_keepers/", StatusCode::METHOD_NOT_ALLOWED, "MethodNotAllowed"),
            ("POST", "/zoos/", StatusCode::METHOD_NOT_ALLOWED, "MethodNotAllowed"),
            ("GET", "/zoo_keepers", StatusCode::NOT_FOUND, "NotFound"),
            ("GET", "/elephants/", StatusCode::NOT_FOUND, "NotFound"),
        ];

        for (method, uri, status, error_type) in cases {
            let response = test_router()
                .oneshot(request(method, uri, None))
                .await
                .unwrap();
            assert_eq!(response.status(), status, "{method} {uri}");
            let body = json_body(response).await;
            assert_eq!(body["error"], status.as_u16());
            assert_eq!(body["error_type"], error_type);
            let expected_text = format!("{method} {uri}");
            assert!(
                body["text"].as_str().is_some_and(|t| t.ends_with(&expected_text)),
                "{body}"
            );
        }
    }
}
