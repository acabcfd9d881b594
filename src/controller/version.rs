use axum::{extract::State, response::IntoResponse};

use crate::service::version_service::VersionService;

pub async fn get_version(State(version_service): State<VersionService>) -> impl IntoResponse {
    version_service.version().into_response()
}
