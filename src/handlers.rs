use crate::{
    AppState,
    auth::Identity,
    comics::{self, ListingQuery},
    error::{ApiError, ApiResult, CREATE_FAILED, FETCH_FAILED},
    models::{ComicListResponse, ComicResponse, CreateComicRequest, ErrorResponse},
};
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
};

// --- Handlers ---

/// list_comics
///
/// [Public Route] Lists comics. Any caller may use it; what they see depends on the
/// query parameters and, when neither is given, on whether they hold the elevated role.
///
/// *Failure*: any repository error yields 500 with no partial result.
#[utoipa::path(
    get,
    path = "/api/comic",
    params(ListingQuery),
    responses(
        (status = 200, description = "Visible comics", body = ComicListResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn list_comics(
    identity: Option<Identity>,
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<ComicListResponse>> {
    let intent = comics::resolve_listing(identity.as_ref(), &query);
    tracing::debug!(?intent, "resolved comic listing");

    let Some(filter) = intent.filter() else {
        return Ok(Json(ComicListResponse::default()));
    };

    let comics = state
        .repo
        .list_comics(filter)
        .await
        .map_err(ApiError::internal(FETCH_FAILED))?;

    Ok(Json(ComicListResponse { comics }))
}

/// create_comic
///
/// [Authenticated Route] Creates a comic owned by the caller.
///
/// Checks run in a fixed order: identity (401), required fields (400), then a single
/// insert (500 on failure). The owner is always the caller.
///
/// The body is read as JSON whatever `Content-Type` says, so plain `fetch` calls with
/// a string body work. A body that is not a JSON object of the expected shape is a
/// creation failure (500), not a client error.
#[utoipa::path(
    post,
    path = "/api/comic",
    request_body = CreateComicRequest,
    responses(
        (status = 201, description = "Created", body = ComicResponse),
        (status = 400, description = "Missing required fields", body = ErrorResponse),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn create_comic(
    identity: Option<Identity>,
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ComicResponse>)> {
    let identity = identity.ok_or(ApiError::Unauthorized)?;

    let payload: CreateComicRequest =
        serde_json::from_slice(&body).map_err(ApiError::internal(CREATE_FAILED))?;

    let new_comic = comics::validate_new_comic(payload, identity.id)?;

    let comic = state
        .repo
        .create_comic(new_comic)
        .await
        .map_err(ApiError::internal(CREATE_FAILED))?;

    tracing::info!(comic_id = %comic.comic.id, owner_id = %identity.id, "comic created");

    Ok((StatusCode::CREATED, Json(ComicResponse { comic })))
}
