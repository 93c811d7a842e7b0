use crate::auth::session_user;
use crate::errors::AppError;
use crate::models::{
    Challenge, ChallengeEnvelope, ChallengeListResponse, ChallengePayload, ChallengeResponse,
    StoreData, SuccessResponse,
};
use crate::state::AppState;
use crate::storage::persist_data;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;

fn owned_challenge<'a>(
    data: &'a StoreData,
    user_id: u64,
    id: u64,
) -> Result<&'a Challenge, AppError> {
    let challenge = data
        .challenges
        .get(&id)
        .ok_or_else(|| AppError::not_found("Challenge not found"))?;
    if challenge.creator_id != user_id {
        return Err(AppError::forbidden());
    }
    Ok(challenge)
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ChallengeListResponse>, AppError> {
    let data = state.data.lock().await;
    let user_id = session_user(&data, &headers)?.id;

    let challenges = data
        .challenges
        .values()
        .filter(|challenge| challenge.creator_id == user_id)
        .map(ChallengeResponse::from)
        .collect();

    Ok(Json(ChallengeListResponse { challenges }))
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChallengePayload>,
) -> Result<impl IntoResponse, AppError> {
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::bad_request("Title is required"));
    }

    let mut data = state.data.lock().await;
    let user_id = session_user(&data, &headers)?.id;

    let id = data.allocate_challenge_id();
    let challenge = Challenge {
        id,
        creator_id: user_id,
        title,
        created_at: Utc::now(),
    };
    let response = ChallengeEnvelope {
        challenge: ChallengeResponse::from(&challenge),
    };
    data.challenges.insert(id, challenge);
    persist_data(&state.data_path, &data).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(payload): Json<ChallengePayload>,
) -> Result<Json<ChallengeEnvelope>, AppError> {
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::bad_request("Title is required"));
    }

    let mut data = state.data.lock().await;
    let user_id = session_user(&data, &headers)?.id;
    owned_challenge(&data, user_id, id)?;

    let challenge = data
        .challenges
        .get_mut(&id)
        .ok_or_else(|| AppError::not_found("Challenge not found"))?;
    challenge.title = title;
    let response = ChallengeEnvelope {
        challenge: ChallengeResponse::from(&*challenge),
    };
    persist_data(&state.data_path, &data).await?;

    Ok(Json(response))
}

/// Deleting a challenge never deletes its habits; they are detached and live
/// on unchallenged.
pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<SuccessResponse>, AppError> {
    let mut data = state.data.lock().await;
    let user_id = session_user(&data, &headers)?.id;
    owned_challenge(&data, user_id, id)?;

    for habit in data.habits.values_mut() {
        if habit.challenge_id == Some(id) {
            habit.challenge_id = None;
        }
    }
    data.challenges.remove(&id);
    persist_data(&state.data_path, &data).await?;

    Ok(Json(SuccessResponse { success: true }))
}
