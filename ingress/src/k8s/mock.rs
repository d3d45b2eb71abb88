//! In-process stand-in for the Kubernetes API server.

use http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use kube::client::Body;
use serde_json::{json, Value};
use tower_test::mock::{self, Handle};

pub(crate) type ApiServer = Handle<Request<Body>, Response<Body>>;

pub(crate) fn client() -> (kube::Client, ApiServer) {
    let (service, server) = mock::pair::<Request<Body>, Response<Body>>();
    (kube::Client::new(service, "default"), server)
}

pub(crate) fn respond(status: StatusCode, body: &Value) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// `metav1.Status` failure, the way the API server reports errors.
pub(crate) fn failure(code: u16, reason: &str) -> Response<Body> {
    respond(
        StatusCode::from_u16(code).unwrap(),
        &json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": format!("request failed: {}", reason),
            "reason": reason,
            "code": code,
        }),
    )
}

pub(crate) async fn body_json(request: Request<Body>) -> Value {
    let bytes = request.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
