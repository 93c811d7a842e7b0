use crate::auth::{session_user, user_today};
use crate::errors::AppError;
use crate::models::{
    ChallengeResponse, CompletionRequest, CompletionResponse, Habit, HabitDetailQuery,
    HabitDetailResponse, HabitEnvelope, HabitListItem, HabitListQuery, HabitListResponse,
    HabitPayload, HabitResponse, HabitStats, MoveRequest, StoreData, SuccessResponse, WeekView,
};
use crate::state::AppState;
use crate::stats;
use crate::storage::persist_data;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, NaiveDate, Utc};

fn parse_date_or(default: NaiveDate, raw: Option<&str>) -> NaiveDate {
    raw.and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
        .unwrap_or(default)
}

/// Looks the habit up and enforces ownership: unknown ids are 404, someone
/// else's habits are 403.
fn owned_habit<'a>(data: &'a StoreData, user_id: u64, id: u64) -> Result<&'a Habit, AppError> {
    let habit = data
        .habits
        .get(&id)
        .ok_or_else(|| AppError::not_found("Habit not found"))?;
    if habit.creator_id != user_id {
        return Err(AppError::forbidden());
    }
    Ok(habit)
}

fn ensure_known_challenge(
    data: &StoreData,
    user_id: u64,
    challenge_id: Option<u64>,
) -> Result<(), AppError> {
    let Some(id) = challenge_id else {
        return Ok(());
    };
    match data.challenges.get(&id) {
        Some(challenge) if challenge.creator_id == user_id => Ok(()),
        _ => Err(AppError::bad_request("Unknown challenge")),
    }
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HabitListQuery>,
) -> Result<Json<HabitListResponse>, AppError> {
    let data = state.data.lock().await;
    let user = session_user(&data, &headers)?;
    let user_id = user.id;
    let today = user_today(user);

    let selected_date = parse_date_or(today, query.date.as_deref());
    let challenge_filter = query
        .challenge_id
        .as_deref()
        .and_then(|value| value.parse::<u64>().ok());

    let week_start = stats::week_start(today);
    let week_end = week_start + Duration::days(6);

    let mut habits: Vec<&Habit> = data
        .habits
        .values()
        .filter(|habit| habit.creator_id == user_id)
        .filter(|habit| challenge_filter.is_none() || habit.challenge_id == challenge_filter)
        .collect();
    habits.sort_by(|a, b| b.display_order.cmp(&a.display_order));

    let items = habits
        .into_iter()
        .map(|habit| HabitListItem {
            id: habit.id,
            title: habit.title.clone(),
            body: habit.body.clone(),
            challenge_id: habit.challenge_id,
            display_order: habit.display_order,
            completed: habit.completions.contains(&selected_date),
            created_at: habit.created_at,
            week_logs: habit.completions.range(week_start..=week_end).copied().collect(),
            habit_created_date: habit.created_at.date_naive(),
        })
        .collect();

    Ok(Json(HabitListResponse {
        habits: items,
        selected_date,
        today,
    }))
}

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<HabitPayload>,
) -> Result<impl IntoResponse, AppError> {
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::bad_request("Title is required"));
    }

    let mut data = state.data.lock().await;
    let user_id = session_user(&data, &headers)?.id;
    ensure_known_challenge(&data, user_id, payload.challenge_id)?;

    // New habits go to the top of the list.
    let display_order = data
        .habits
        .values()
        .filter(|habit| habit.creator_id == user_id)
        .map(|habit| habit.display_order)
        .max()
        .unwrap_or(0)
        + 1;

    let id = data.allocate_habit_id();
    let habit = Habit {
        id,
        creator_id: user_id,
        title,
        body: payload.body.trim().to_string(),
        challenge_id: payload.challenge_id,
        display_order,
        created_at: Utc::now(),
        completions: Default::default(),
    };
    let response = HabitEnvelope {
        habit: HabitResponse::from(&habit),
    };
    data.habits.insert(id, habit);
    persist_data(&state.data_path, &data).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Query(query): Query<HabitDetailQuery>,
) -> Result<Json<HabitDetailResponse>, AppError> {
    let data = state.data.lock().await;
    let user = session_user(&data, &headers)?;
    let user_id = user.id;
    let today = user_today(user);

    let habit = owned_habit(&data, user_id, id)?;
    let created = habit.created_at.date_naive();

    let anchor = parse_date_or(today, query.week_start.as_deref());
    let week_start = stats::week_start(anchor);
    let days = stats::week_grid(week_start, &habit.completions, created, today);

    let challenge = habit
        .challenge_id
        .and_then(|challenge_id| data.challenges.get(&challenge_id))
        .map(ChallengeResponse::from);

    Ok(Json(HabitDetailResponse {
        habit: HabitResponse::from(habit),
        stats: HabitStats {
            current_streak: stats::current_streak(&habit.completions, today),
            longest_streak: stats::longest_streak(&habit.completions),
            total_completions: habit.completions.len(),
            completion_dates: habit.completions.iter().copied().collect(),
        },
        challenge,
        week: WeekView {
            start: week_start,
            days,
        },
        weekly_progress: stats::weekly_progress(&habit.completions, created, today),
    }))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(payload): Json<HabitPayload>,
) -> Result<Json<HabitEnvelope>, AppError> {
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::bad_request("Title is required"));
    }

    let mut data = state.data.lock().await;
    let user_id = session_user(&data, &headers)?.id;
    owned_habit(&data, user_id, id)?;
    ensure_known_challenge(&data, user_id, payload.challenge_id)?;

    let habit = data
        .habits
        .get_mut(&id)
        .ok_or_else(|| AppError::not_found("Habit not found"))?;
    habit.title = title;
    habit.body = payload.body.trim().to_string();
    habit.challenge_id = payload.challenge_id;
    let response = HabitEnvelope {
        habit: HabitResponse::from(&*habit),
    };
    persist_data(&state.data_path, &data).await?;

    Ok(Json(response))
}

pub async fn remove(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<SuccessResponse>, AppError> {
    let mut data = state.data.lock().await;
    let user_id = session_user(&data, &headers)?.id;
    owned_habit(&data, user_id, id)?;

    data.habits.remove(&id);

    // Keep display order contiguous after the removal.
    let mut remaining: Vec<u64> = data
        .habits
        .values()
        .filter(|habit| habit.creator_id == user_id)
        .map(|habit| habit.id)
        .collect();
    remaining.sort_by_key(|habit_id| data.habits[habit_id].display_order);
    for (position, habit_id) in remaining.into_iter().enumerate() {
        if let Some(habit) = data.habits.get_mut(&habit_id) {
            habit.display_order = position as i64 + 1;
        }
    }

    persist_data(&state.data_path, &data).await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn complete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(payload): Json<CompletionRequest>,
) -> Result<Json<CompletionResponse>, AppError> {
    toggle_completion(&state, &headers, id, payload.date.as_deref(), true).await
}

pub async fn undo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(payload): Json<CompletionRequest>,
) -> Result<Json<CompletionResponse>, AppError> {
    toggle_completion(&state, &headers, id, payload.date.as_deref(), false).await
}

/// Adds or removes one completion date. Both directions are idempotent:
/// completing an already-completed day and undoing an absent one are fine.
async fn toggle_completion(
    state: &AppState,
    headers: &HeaderMap,
    id: u64,
    raw_date: Option<&str>,
    completed: bool,
) -> Result<Json<CompletionResponse>, AppError> {
    let mut data = state.data.lock().await;
    let user = session_user(&data, headers)?;
    let user_id = user.id;
    let today = user_today(user);
    owned_habit(&data, user_id, id)?;

    let date = parse_date_or(today, raw_date);
    let habit = data
        .habits
        .get_mut(&id)
        .ok_or_else(|| AppError::not_found("Habit not found"))?;
    let changed = if completed {
        habit.completions.insert(date)
    } else {
        habit.completions.remove(&date)
    };

    if changed {
        persist_data(&state.data_path, &data).await?;
    }

    Ok(Json(CompletionResponse {
        success: true,
        date,
    }))
}

pub async fn move_habit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(payload): Json<MoveRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    if payload.direction != "up" && payload.direction != "down" {
        return Err(AppError::bad_request("direction must be 'up' or 'down'"));
    }

    let mut data = state.data.lock().await;
    let user_id = session_user(&data, &headers)?.id;
    let current_order = owned_habit(&data, user_id, id)?.display_order;

    // The list renders in descending order, so "up" swaps with the next
    // larger display_order. At either boundary there is no neighbor and the
    // move is a no-op.
    let siblings = data
        .habits
        .values()
        .filter(|habit| habit.creator_id == user_id && habit.id != id);
    let neighbor = if payload.direction == "up" {
        siblings
            .filter(|habit| habit.display_order > current_order)
            .min_by_key(|habit| habit.display_order)
    } else {
        siblings
            .filter(|habit| habit.display_order < current_order)
            .max_by_key(|habit| habit.display_order)
    }
    .map(|habit| (habit.id, habit.display_order));

    if let Some((neighbor_id, neighbor_order)) = neighbor {
        if let Some(habit) = data.habits.get_mut(&id) {
            habit.display_order = neighbor_order;
        }
        if let Some(habit) = data.habits.get_mut(&neighbor_id) {
            habit.display_order = current_order;
        }
        persist_data(&state.data_path, &data).await?;
    }

    Ok(Json(SuccessResponse { success: true }))
}
