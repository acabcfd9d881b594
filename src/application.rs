mod server;

use axum::Router;

use tower::ServiceBuilder;

use tower_http::{
    ServiceBuilderExt,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use std::time::Duration;

use crate::{
    config, controller, service::version_service::VersionService,
    utils::request::CounterRequestId,
};

pub async fn run(config_file: String) -> anyhow::Result<()> {
    let configuration = config::read_configuration(config_file).await?;

    let server_configuration = &configuration.server_configuration;

    let version_configuration = &configuration.version_configuration;

    let version_service = VersionService::new(&version_configuration.version);

    let routes = controller::create_routes(&version_configuration.route_path, version_service)?;

    let routes = add_middleware(routes, server_configuration.request_timeout);

    server::run(routes, server_configuration).await
}

fn add_middleware(routes: Router, request_timeout: Duration) -> Router {
    routes.layer(
        ServiceBuilder::new()
            // make sure to set request ids before the request reaches `TraceLayer`
            .set_x_request_id(CounterRequestId::default())
            // log requests and responses
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().include_headers(true))
                    .on_response(DefaultOnResponse::new().include_headers(true)),
            )
            // propagate the header to the response before the response reaches `TraceLayer`
            .propagate_x_request_id()
            .layer(TimeoutLayer::new(request_timeout))
            .into_inner(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };

    use http_body_util::BodyExt;

    use tower::ServiceExt;

    fn routes() -> Router {
        let routes = controller::create_routes("/api/version", VersionService::new("v0.5")).unwrap();

        add_middleware(routes, Duration::from_secs(10))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn middleware_keeps_body_and_status() {
        let response = routes().oneshot(get_request("/api/version")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"v0.5");
    }

    #[tokio::test]
    async fn responses_carry_increasing_request_ids() {
        let routes = routes();

        let mut request_ids = Vec::new();
        for _ in 0..3 {
            let response = routes
                .clone()
                .oneshot(get_request("/api/version"))
                .await
                .unwrap();

            request_ids.push(response.headers()["x-request-id"].to_str().unwrap().to_owned());
        }

        assert_eq!(request_ids, vec!["0", "1", "2"]);
    }

    #[tokio::test]
    async fn client_request_id_is_propagated() {
        let request = Request::builder()
            .uri("/api/version")
            .header("x-request-id", "client-supplied")
            .body(Body::empty())
            .unwrap();

        let response = routes().oneshot(request).await.unwrap();

        assert_eq!(response.headers()["x-request-id"], "client-supplied");
    }

    #[tokio::test]
    async fn not_found_still_gets_request_id() {
        let response = routes().oneshot(get_request("/nonexistent")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-request-id"));
    }
}
