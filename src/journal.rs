use crate::auth::session_user;
use crate::errors::AppError;
use crate::models::{JournalEntry, JournalEntryResponse, JournalListResponse, JournalPayload};
use crate::state::AppState;
use crate::storage::persist_data;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<JournalListResponse>, AppError> {
    let data = state.data.lock().await;
    let user_id = session_user(&data, &headers)?.id;

    // Entry ids ascend with creation time, so newest first is reverse order.
    let entries = data
        .journal_entries
        .values()
        .rev()
        .filter(|entry| entry.user_id == user_id)
        .map(JournalEntryResponse::from)
        .collect();

    Ok(Json(JournalListResponse { entries }))
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<JournalPayload>,
) -> Result<impl IntoResponse, AppError> {
    let content = payload.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::bad_request("Content is required"));
    }

    let user_id = {
        let data = state.data.lock().await;
        session_user(&data, &headers)?.id
    };

    // The analysis round trip happens outside the store lock.
    let extracted = state.analyzer.extract(&content).await;

    let mut data = state.data.lock().await;
    let id = data.allocate_entry_id();
    let entry = JournalEntry {
        id,
        user_id,
        content,
        extracted_data: extracted,
        created_at: Utc::now(),
    };
    let response = JournalEntryResponse::from(&entry);
    data.journal_entries.insert(id, entry);
    persist_data(&state.data_path, &data).await?;

    Ok((StatusCode::CREATED, Json(response)))
}
