use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Rayvue.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::feeds::open_game_feed,
        crate::routes::feeds::open_review_feed,
        crate::routes::feeds::open_journal_feed,
        crate::routes::feeds::open_award_feed,
        crate::routes::feeds::get_feed,
        crate::routes::feeds::close_feed,
        crate::routes::feeds::feed_events,
        crate::routes::feeds::next_page,
        crate::routes::feeds::reload,
        crate::routes::feeds::reset,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::feed::FeedOpened,
            crate::dto::feed::FeedPhase,
            crate::dto::feed::FeedStatusResponse,
            crate::dto::feed::FeedSnapshot,
            crate::dto::feed::IgnoredBecause,
            crate::dto::feed::DispatchResponse,
            crate::catalog::Game,
            crate::catalog::GameFilter,
            crate::catalog::GameSort,
            crate::catalog::Review,
            crate::catalog::ReviewFilter,
            crate::catalog::JournalEntry,
            crate::catalog::JournalFilter,
            crate::catalog::PlayStatus,
            crate::catalog::Award,
            crate::catalog::AwardFilter,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "feeds", description = "Paginated feeds over the catalog, with their status streams"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_feed_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/feeds/games",
            "/feeds/reviews",
            "/feeds/journal",
            "/feeds/awards",
            "/feeds/{id}",
            "/feeds/{id}/events",
            "/feeds/{id}/next",
            "/feeds/{id}/reload",
            "/feeds/{id}/reset",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} is not documented");
        }
    }
}
