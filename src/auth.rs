use crate::errors::AppError;
use crate::models::{
    CredentialsRequest, MeResponse, SessionResponse, StoreData, SuccessResponse, User, UserResponse,
};
use crate::state::AppState;
use crate::storage::persist_data;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const SESSION_COOKIE: &str = "session";

pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = Sha256::digest(format!("{salt}:{password}").as_bytes());
    format!("{salt}${digest:x}")
}

pub fn verify_password(record: &str, password: &str) -> bool {
    let Some((salt, expected)) = record.split_once('$') else {
        return false;
    };
    let digest = Sha256::digest(format!("{salt}:{password}").as_bytes());
    format!("{digest:x}") == expected
}

/// Calendar date "today" in the user's timezone; an unparsable timezone
/// falls back to UTC.
pub fn user_today(user: &User) -> NaiveDate {
    match user.timezone.parse::<Tz>() {
        Ok(tz) => Utc::now().with_timezone(&tz).date_naive(),
        Err(_) => Utc::now().date_naive(),
    }
}

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// Resolves the request's session cookie to a user. A missing cookie and a
/// token the store no longer knows are the same failure.
pub fn session_user<'a>(data: &'a StoreData, headers: &HeaderMap) -> Result<&'a User, AppError> {
    session_token(headers)
        .and_then(|token| data.sessions.get(&token))
        .and_then(|user_id| data.users.get(user_id))
        .ok_or_else(|| AppError::unauthorized("Authentication required"))
}

fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn validated_timezone(requested: Option<String>) -> Result<String, AppError> {
    match requested {
        Some(tz) => match tz.parse::<Tz>() {
            Ok(_) => Ok(tz),
            Err(_) => Err(AppError::bad_request(format!("Unknown timezone \"{tz}\""))),
        },
        None => Ok("UTC".to_string()),
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let username = payload.username.trim().to_lowercase();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request(
            "Both username and password are required",
        ));
    }
    let timezone = validated_timezone(payload.timezone)?;

    let mut data = state.data.lock().await;
    if data.users.values().any(|user| user.username == username) {
        return Err(AppError::conflict(format!(
            "Username \"{username}\" is already taken"
        )));
    }

    let id = data.allocate_user_id();
    let user = User {
        id,
        username,
        password: hash_password(&payload.password),
        timezone,
        created_at: Utc::now(),
    };
    let response = SessionResponse {
        success: true,
        user: UserResponse::from(&user),
    };
    data.users.insert(id, user);

    // Auto-login after registration.
    let token = Uuid::new_v4().to_string();
    data.sessions.insert(token.clone(), id);
    persist_data(&state.data_path, &data).await?;

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(header::SET_COOKIE, session_cookie(&token))]),
        Json(response),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let username = payload.username.trim().to_lowercase();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request(
            "Both username and password are required",
        ));
    }

    let mut data = state.data.lock().await;
    let user = data
        .users
        .values()
        .find(|user| user.username == username)
        .filter(|user| verify_password(&user.password, &payload.password))
        .ok_or_else(|| AppError::unauthorized("Invalid username or password"))?;

    let user_id = user.id;
    let response = SessionResponse {
        success: true,
        user: UserResponse::from(user),
    };

    // Replace whatever session the request carried.
    if let Some(old_token) = session_token(&headers) {
        data.sessions.remove(&old_token);
    }
    let token = Uuid::new_v4().to_string();
    data.sessions.insert(token.clone(), user_id);
    persist_data(&state.data_path, &data).await?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, session_cookie(&token))]),
        Json(response),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let mut data = state.data.lock().await;
    if let Some(token) = session_token(&headers) {
        if data.sessions.remove(&token).is_some() {
            persist_data(&state.data_path, &data).await?;
        }
    }

    Ok((
        AppendHeaders([(header::SET_COOKIE, expired_session_cookie())]),
        Json(SuccessResponse { success: true }),
    ))
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Json<MeResponse> {
    let data = state.data.lock().await;
    let user = session_user(&data, &headers).ok().map(UserResponse::from);
    Json(MeResponse { user })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn password_roundtrip() {
        let record = hash_password("hunter2");
        assert!(verify_password(&record, "hunter2"));
        assert!(!verify_password(&record, "hunter3"));
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn session_token_parsed_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=abc-123; other=1"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc-123"));

        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_token(&headers), None);
    }
}
