use axum::{routing::get, Router};

pub const RUNNING_MESSAGE: &str = "Ascent receptionist is running";

pub fn router() -> Router {
    Router::new().route("/", get(health)).route("/health", get(health))
}

pub async fn health() -> &'static str {
    RUNNING_MESSAGE
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use crate::health::{router, RUNNING_MESSAGE};

    #[tokio::test]
    async fn root_and_health_return_the_running_message() {
        for uri in ["/", "/health"] {
            let response = router()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
                .await
                .expect("response");

            assert_eq!(response.status(), StatusCode::OK);
            let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
            assert_eq!(body.as_ref(), RUNNING_MESSAGE.as_bytes());
        }
    }
}
