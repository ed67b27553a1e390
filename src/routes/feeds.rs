use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, Sse},
    routing::{get, post},
};
use axum_valid::Valid;
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{
    catalog::{
        Award, AwardFilter, CatalogRecord, Game, GameFilter, JournalEntry, JournalFilter, Review,
        ReviewFilter,
    },
    dto::feed::{DispatchResponse, FeedOpened, FeedSnapshot, OpenFeedQuery},
    error::AppError,
    services::{feed_service, sse_service},
    state::SharedState,
};

/// Feed endpoints: opening one feed per record kind, then driving it by id.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/feeds/games", post(open_game_feed))
        .route("/feeds/reviews", post(open_review_feed))
        .route("/feeds/journal", post(open_journal_feed))
        .route("/feeds/awards", post(open_award_feed))
        .route("/feeds/{id}", get(get_feed).delete(close_feed))
        .route("/feeds/{id}/events", get(feed_events))
        .route("/feeds/{id}/next", post(next_page))
        .route("/feeds/{id}/reload", post(reload))
        .route("/feeds/{id}/reset", post(reset))
}

async fn open<R: CatalogRecord>(
    state: &SharedState,
    filter: R::Filter,
    query: OpenFeedQuery,
) -> Result<(StatusCode, Json<FeedOpened>), AppError> {
    let opened = feed_service::open_feed::<R>(state, filter, query.page_size).await?;
    Ok((StatusCode::CREATED, Json(opened)))
}

/// Open a feed over the game catalog.
#[utoipa::path(
    post,
    path = "/feeds/games",
    tag = "feeds",
    params(OpenFeedQuery),
    request_body = GameFilter,
    responses(
        (status = 201, description = "Feed opened, first page requested", body = FeedOpened),
        (status = 400, description = "Invalid filter or page size"),
        (status = 503, description = "Too many open feeds")
    )
)]
pub async fn open_game_feed(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<OpenFeedQuery>>,
    Valid(Json(filter)): Valid<Json<GameFilter>>,
) -> Result<(StatusCode, Json<FeedOpened>), AppError> {
    open::<Game>(&state, filter, query).await
}

/// Open a feed over the reviews of a game or an author.
#[utoipa::path(
    post,
    path = "/feeds/reviews",
    tag = "feeds",
    params(OpenFeedQuery),
    request_body = ReviewFilter,
    responses(
        (status = 201, description = "Feed opened, first page requested", body = FeedOpened),
        (status = 400, description = "Invalid filter or page size"),
        (status = 503, description = "Too many open feeds")
    )
)]
pub async fn open_review_feed(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<OpenFeedQuery>>,
    Valid(Json(filter)): Valid<Json<ReviewFilter>>,
) -> Result<(StatusCode, Json<FeedOpened>), AppError> {
    open::<Review>(&state, filter, query).await
}

/// Open a feed over a player's journal.
#[utoipa::path(
    post,
    path = "/feeds/journal",
    tag = "feeds",
    params(OpenFeedQuery),
    request_body = JournalFilter,
    responses(
        (status = 201, description = "Feed opened, first page requested", body = FeedOpened),
        (status = 400, description = "Invalid filter or page size"),
        (status = 503, description = "Too many open feeds")
    )
)]
pub async fn open_journal_feed(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<OpenFeedQuery>>,
    Valid(Json(filter)): Valid<Json<JournalFilter>>,
) -> Result<(StatusCode, Json<FeedOpened>), AppError> {
    open::<JournalEntry>(&state, filter, query).await
}

/// Open a feed over the awards.
#[utoipa::path(
    post,
    path = "/feeds/awards",
    tag = "feeds",
    params(OpenFeedQuery),
    request_body = AwardFilter,
    responses(
        (status = 201, description = "Feed opened, first page requested", body = FeedOpened),
        (status = 400, description = "Invalid filter or page size"),
        (status = 503, description = "Too many open feeds")
    )
)]
pub async fn open_award_feed(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<OpenFeedQuery>>,
    Valid(Json(filter)): Valid<Json<AwardFilter>>,
) -> Result<(StatusCode, Json<FeedOpened>), AppError> {
    open::<Award>(&state, filter, query).await
}

/// Describe an open feed and its current status.
#[utoipa::path(
    get,
    path = "/feeds/{id}",
    tag = "feeds",
    params(("id" = Uuid, Path, description = "Feed identifier")),
    responses(
        (status = 200, description = "Feed status", body = FeedSnapshot),
        (status = 404, description = "Unknown feed")
    )
)]
pub async fn get_feed(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FeedSnapshot>, AppError> {
    Ok(Json(feed_service::snapshot(&state, id)?))
}

/// Close a feed, cancelling its running fetch.
#[utoipa::path(
    delete,
    path = "/feeds/{id}",
    tag = "feeds",
    params(("id" = Uuid, Path, description = "Feed identifier")),
    responses(
        (status = 204, description = "Feed closed"),
        (status = 404, description = "Unknown feed")
    )
)]
pub async fn close_feed(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    feed_service::close(&state, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Stream every status change of a feed, starting with the current status.
#[utoipa::path(
    get,
    path = "/feeds/{id}/events",
    tag = "feeds",
    params(("id" = Uuid, Path, description = "Feed identifier")),
    responses(
        (status = 200, description = "Feed status stream", content_type = "text/event-stream", body = String),
        (status = 404, description = "Unknown feed")
    )
)]
pub async fn feed_events(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let updates = feed_service::updates(&state, id)?;
    info!(feed_id = %id, "new feed SSE connection");
    Ok(sse_service::to_sse_stream(
        updates,
        state.config().sse_keep_alive,
        id,
    ))
}

/// Request the next page of a feed.
#[utoipa::path(
    post,
    path = "/feeds/{id}/next",
    tag = "feeds",
    params(("id" = Uuid, Path, description = "Feed identifier")),
    responses(
        (status = 202, description = "Whether a fetch was dispatched, or why it was ignored", body = DispatchResponse),
        (status = 404, description = "Unknown feed")
    )
)]
pub async fn next_page(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<DispatchResponse>), AppError> {
    let response = feed_service::next_page(&state, id).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Discard a feed's records and fetch its first page again.
#[utoipa::path(
    post,
    path = "/feeds/{id}/reload",
    tag = "feeds",
    params(("id" = Uuid, Path, description = "Feed identifier")),
    responses(
        (status = 202, description = "First page requested", body = DispatchResponse),
        (status = 404, description = "Unknown feed")
    )
)]
pub async fn reload(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<DispatchResponse>), AppError> {
    let response = feed_service::reload(&state, id).await?;
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Return a feed to idle, cancelling its running fetch.
#[utoipa::path(
    post,
    path = "/feeds/{id}/reset",
    tag = "feeds",
    params(("id" = Uuid, Path, description = "Feed identifier")),
    responses(
        (status = 200, description = "Feed reset", body = DispatchResponse),
        (status = 404, description = "Unknown feed")
    )
)]
pub async fn reset(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DispatchResponse>, AppError> {
    Ok(Json(feed_service::reset(&state, id).await?))
}
