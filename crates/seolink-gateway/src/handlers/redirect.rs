use crate::error::Result;
use crate::extract::Caller;
use crate::model::{ListRedirectsResponse, PublicUrlResponse};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use seolink_core::{NewRedirect, RedirectConfig, RedirectError, RedirectId, RedirectPatch};
use tracing::info;

/// Ids that can't be stored can't be found either.
fn parse_id(raw: String) -> Result<RedirectId> {
    RedirectId::parse(raw.as_str()).map_err(|_| RedirectError::NotFound(raw).into())
}

pub async fn list_redirects_handler(
    State(state): State<AppState>,
    Caller(scope): Caller,
) -> Json<ListRedirectsResponse> {
    let listing = state.repository().list_all(&scope).await;
    Json(ListRedirectsResponse {
        redirects: listing.redirects,
        storage: listing.status,
    })
}

pub async fn create_redirect_handler(
    State(state): State<AppState>,
    Caller(scope): Caller,
    payload: std::result::Result<Json<NewRedirect>, JsonRejection>,
) -> Result<(StatusCode, Json<RedirectConfig>)> {
    let Json(fields) = payload?;
    let created = state.repository().create(fields, &scope).await?;
    info!(id = %created.id, "redirect created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_redirect_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Caller(scope): Caller,
) -> Result<Json<RedirectConfig>> {
    let id = parse_id(id)?;
    state
        .repository()
        .get_by_id(&id, &scope)
        .await
        .map(Json)
        .ok_or_else(|| RedirectError::NotFound(id.to_string()).into())
}

pub async fn update_redirect_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Caller(scope): Caller,
    payload: std::result::Result<Json<RedirectPatch>, JsonRejection>,
) -> Result<Json<RedirectConfig>> {
    let id = parse_id(id)?;
    let Json(patch) = payload?;
    let updated = state.repository().update(&id, patch, &scope).await?;
    Ok(Json(updated))
}

pub async fn delete_redirect_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Caller(scope): Caller,
) -> Result<StatusCode> {
    let id = parse_id(id)?;
    if state.repository().delete(&id, &scope).await? {
        info!(%id, "redirect deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(RedirectError::NotFound(id.to_string()).into())
    }
}

pub async fn public_url_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Caller(scope): Caller,
) -> Result<Json<PublicUrlResponse>> {
    let id = parse_id(id)?;
    state
        .repository()
        .public_url(state.base_url(), &id, &scope)
        .await
        .map(|url| Json(PublicUrlResponse { url }))
        .ok_or_else(|| RedirectError::NotFound(id.to_string()).into())
}
