use axum::{http::Method, middleware::from_fn_with_state, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod change_requests;
pub mod error;
pub mod middleware;
pub mod notify;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let customer_routes = bookings::routes().route_layer(from_fn_with_state(
        state.clone(),
        middleware::auth::customer_auth_middleware,
    ));

    Router::new()
        .merge(auth::routes())
        .merge(customer_routes)
        .merge(change_requests::routes(state.clone()))
        .merge(admin::routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
