use crate::state::AppState;
use crate::{auth, challenges, habits, journal};
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/habits", get(habits::list).post(habits::create))
        .route(
            "/api/habits/:id",
            get(habits::detail).put(habits::update).delete(habits::remove),
        )
        .route("/api/habits/:id/complete", post(habits::complete))
        .route("/api/habits/:id/undo", post(habits::undo))
        .route("/api/habits/:id/move", post(habits::move_habit))
        .route(
            "/api/challenges",
            get(challenges::list).post(challenges::create),
        )
        .route(
            "/api/challenges/:id",
            put(challenges::update).delete(challenges::remove),
        )
        .route("/api/journal", get(journal::list).post(journal::create))
        .with_state(state)
}
