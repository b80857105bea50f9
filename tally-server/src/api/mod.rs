//! API routes for tally-server

pub mod health;
pub mod profitability;
pub mod shipping_stream;
pub mod snapshots;

use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use http::{HeaderName, HeaderValue};
use tower_http::compression::CompressionLayer;
use tower_http::compression::predicate::{DefaultPredicate, NotForContentType, Predicate};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Random v4 request id
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build the router with all routes registered (no middleware)
pub fn build_router() -> Router<AppState> {
    let profitability = Router::new()
        .route("/api/profitability", get(profitability::get_profitability))
        .route("/api/profitability/daily", get(profitability::get_daily_series))
        .route(
            "/api/profitability/shipping-costs/stream",
            get(shipping_stream::stream_shipping_costs),
        );

    let history = Router::new()
        .route(
            "/api/profitability/snapshots",
            get(snapshots::list_snapshots).post(snapshots::create_snapshot),
        )
        .route("/api/profitability/snapshots/{id}", get(snapshots::get_snapshot));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(profitability)
        .merge(history)
}

/// Create the fully layered application
pub fn create_router(state: AppState) -> Router {
    // NDJSON progress must reach the client line by line
    let compress = DefaultPredicate::new().and(NotForContentType::const_new(
        shipping_stream::NDJSON_CONTENT_TYPE,
    ));

    build_router()
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new().compress_when(compress))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        // Outermost: the id exists before propagation and tracing see the request
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            XRequestId,
        ))
        .with_state(state)
}
