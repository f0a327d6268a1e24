use crate::error::{AppError, Result};
use crate::model::{CreateLinkRequest, CreateLinkResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use burrow_core::ShortCode;

pub async fn create_link_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateLinkResponse>)> {
    let Json(request) = payload.map_err(|e| AppError::InvalidBody(e.body_text()))?;

    let link = state
        .shortener()
        .create_short_link(&request.original_url)
        .await?;

    let response = CreateLinkResponse {
        short_url: link.shortened.to_url(&state.base_url(&headers)),
        short_code: link.shortened.to_string(),
        original_url: link.original_url,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    // Anything outside the code alphabet cannot name a link.
    let code = ShortCode::new(code).map_err(|_| AppError::NotFound)?;

    let original_url = state.shortener().get_original_url(&code).await?;
    let location = HeaderValue::try_from(original_url).map_err(|e| {
        AppError::Internal(format!("stored url for {code} is not a valid header: {e}"))
    })?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}
