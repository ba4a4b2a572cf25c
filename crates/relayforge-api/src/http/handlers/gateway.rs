//! Gateway build handlers for the REST API.

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use relayforge_types::build::GatewayBuild;
use relayforge_types::error::BuildError;
use relayforge_types::id::BuildId;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/gateway-builds - List all registered gateway builds.
pub async fn list_gateway_builds(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<GatewayBuild>>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let builds = state.build_service.list_gateway_builds().await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(
        ApiResponse::success(builds, request_id, elapsed).with_link("self", "/api/v1/gateway-builds"),
    ))
}

/// GET /api/v1/gateway-builds/{buildId} - Get a gateway build by hex id.
pub async fn get_gateway_build(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<GatewayBuild>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let id: BuildId = raw_id.parse()?;
    // A direct lookup miss is a plain 404, not a broken parent reference.
    let build = state
        .build_service
        .get_gateway_build(id)
        .await
        .map_err(|e| match e {
            BuildError::MissingParent(id) => BuildError::NotFound(id),
            other => other,
        })?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(
        ApiResponse::success(build, request_id, elapsed)
            .with_link("self", &format!("/api/v1/gateway-builds/{id}")),
    ))
}

/// POST /api/v1/gateway-builds - Register a gateway build produced upstream.
pub async fn import_gateway_build(
    State(state): State<AppState>,
    body: Result<Json<GatewayBuild>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<GatewayBuild>>), AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let Json(build) = body.map_err(|e| BuildError::BadRequest(e.body_text()))?;
    let build = state.build_service.import_gateway_build(build).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    tracing::info!(build_id = %build.build_id, agent_id = %build.agent_id, "gateway build imported");

    let link = format!("/api/v1/gateway-builds/{}", build.build_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(build, request_id, elapsed).with_link("self", &link)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    use crate::http::handlers::test_support::{body_json, gateway, import_gateway, test_state};

    #[tokio::test]
    async fn test_import_then_get() {
        let (state, _dir) = test_state().await;
        import_gateway(&state, 0x3).await;

        let Json(resp) = get_gateway_build(State(state.clone()), Path("0x3".to_string()))
            .await
            .unwrap();
        let build = resp.data.unwrap();
        assert_eq!(build.agent_id.0, 42);

        let Json(resp) = list_gateway_builds(State(state)).await.unwrap();
        assert_eq!(resp.data.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_import_is_bad_request() {
        let (state, _dir) = test_state().await;
        import_gateway(&state, 0x3).await;

        let response = import_gateway_build(State(state), Ok(Json(gateway(0x3))))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_gateway_is_not_found() {
        let (state, _dir) = test_state().await;

        let response = get_gateway_build(State(state), Path("9".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["errors"][0]["code"], "NOT_FOUND");
    }
}
