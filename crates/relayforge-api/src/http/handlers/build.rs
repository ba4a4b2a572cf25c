//! Relay build handlers for the REST API.

use std::time::Instant;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::Json;

use relayforge_types::build::{BuildRequest, RelayBuild};
use relayforge_types::error::BuildError;
use relayforge_types::id::BuildId;

use crate::http::error::AppError;
use crate::http::extractors::query::PageQuery;
use crate::http::response::{ApiResponse, PaginationMeta};
use crate::state::AppState;

/// GET /api/v1/builds - List relay builds, one page at a time.
pub async fn list_builds(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let Query(query) = query.map_err(|e| BuildError::BadRequest(e.body_text()))?;
    let page = state
        .build_service
        .list_relay_builds(query.resolve(&state.config)?)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let pagination = PaginationMeta::from(&page);
    let resp = ApiResponse::success(page.items, request_id, elapsed)
        .with_pagination(pagination)
        .with_link("self", "/api/v1/builds");

    Ok((pagination.headers(), Json(resp)).into_response())
}

/// GET /api/v1/builds/{buildId} - Get a relay build by hex id.
pub async fn get_build(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<RelayBuild>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let id: BuildId = raw_id.parse()?;
    let build = state
        .build_service
        .get_relay_build(i64::from(id.value()))
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let resp = ApiResponse::success(build, request_id, elapsed)
        .with_link("self", &format!("/api/v1/builds/{id}"));

    Ok(Json(resp))
}

/// POST /api/v1/builds/customize - Create a relay build and download it.
///
/// Success is the raw artifact, not an envelope.
pub async fn customize_build(
    State(state): State<AppState>,
    body: Result<Json<BuildRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body.map_err(|e| BuildError::BadRequest(e.body_text()))?;

    let artifact = state.build_service.customize(request).await?;

    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
    let disposition = HeaderValue::from_bytes(disposition.as_bytes())
        .map_err(|e| AppError::Internal(format!("invalid artifact file name: {e}")))?;
    let build_id = HeaderValue::from_str(&artifact.build.build_id.to_string())
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(artifact.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
            (header::HeaderName::from_static("x-relay-build-id"), build_id),
        ],
        artifact.payload,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use relayforge_types::build::{Architecture, BinaryType, ShellcodeRequest};

    use crate::http::handlers::test_support::{body_json, import_gateway, test_state};

    fn request(parent: u16) -> BuildRequest {
        BuildRequest {
            architecture: Architecture::X64,
            binary_type: BinaryType::Exe,
            name: None,
            startup_commands: Vec::new(),
            parent_gateway_build_id: BuildId(parent),
            shellcode: None,
        }
    }

    async fn get_status(state: &AppState, raw: &str) -> (StatusCode, serde_json::Value) {
        let response = get_build(State(state.clone()), Path(raw.to_string()))
            .await
            .into_response();
        let status = response.status();
        (status, body_json(response).await)
    }

    #[tokio::test]
    async fn test_list_empty_has_pagination_headers() {
        let (state, _dir) = test_state().await;

        let response = list_builds(State(state), Ok(Query(PageQuery::default())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-pagination-total"], "0");
        assert_eq!(response.headers()["x-pagination-perpage"], "10");

        let body = body_json(response).await;
        assert_eq!(body["data"], serde_json::json!([]));
        assert_eq!(body["meta"]["pagination"]["pages"], 0);
    }

    #[tokio::test]
    async fn test_get_build_id_errors() {
        let (state, _dir) = test_state().await;

        let (status, body) = get_status(&state, "11170").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "OUT_OF_RANGE");

        let (status, body) = get_status(&state, "zz").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "BAD_REQUEST");

        let (status, body) = get_status(&state, "0x5").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errors"][0]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_customize_missing_parent() {
        let (state, _dir) = test_state().await;

        let response = customize_build(State(state), Ok(Json(request(3))))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["errors"][0]["code"], "MISSING_PARENT");
    }

    #[tokio::test]
    async fn test_customize_unreachable_gateway_rolls_back() {
        let (state, _dir) = test_state().await;
        import_gateway(&state, 3).await;

        let response = customize_build(State(state.clone()), Ok(Json(request(3))))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::GONE);
        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["code"], "INVALID_GATEWAY");
        assert!(
            body["errors"][0]["message"]
                .as_str()
                .unwrap()
                .ends_with("Try restarting gateway.")
        );

        let listing = list_builds(State(state), Ok(Query(PageQuery::default())))
            .await
            .unwrap();
        assert_eq!(listing.headers()["x-pagination-total"], "0");
    }

    #[tokio::test]
    async fn test_customize_unknown_shellcode_format() {
        let (state, _dir) = test_state().await;
        import_gateway(&state, 3).await;

        let mut req = request(3);
        req.binary_type = BinaryType::Shellcode;
        req.shellcode = Some(ShellcodeRequest {
            format: 99,
            ..ShellcodeRequest::default()
        });

        let response = customize_build(State(state), Ok(Json(req)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["errors"][0]["code"],
            "UNRECOGNIZED_FORMAT"
        );
    }
}
