use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    /// "<salt>$<sha256 hex>", see auth::hash_password.
    pub password: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    pub id: u64,
    pub creator_id: u64,
    pub title: String,
    pub body: String,
    pub challenge_id: Option<u64>,
    pub display_order: i64,
    pub created_at: DateTime<Utc>,
    pub completions: BTreeSet<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: u64,
    pub creator_id: u64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: u64,
    pub user_id: u64,
    pub content: String,
    pub extracted_data: ExtractedData,
    pub created_at: DateTime<Utc>,
}

/// Structured insights produced by the journal analysis step. The schema is
/// owned by the analysis prompt; callers treat it as opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedData {
    #[serde(default)]
    pub emotions: Vec<String>,
    #[serde(default)]
    pub wins: Vec<String>,
    #[serde(default)]
    pub struggles: Vec<String>,
    #[serde(default = "default_energy")]
    pub energy_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn default_energy() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreData {
    #[serde(default)]
    pub users: BTreeMap<u64, User>,
    #[serde(default)]
    pub habits: BTreeMap<u64, Habit>,
    #[serde(default)]
    pub challenges: BTreeMap<u64, Challenge>,
    #[serde(default)]
    pub journal_entries: BTreeMap<u64, JournalEntry>,
    /// Session token -> user id.
    #[serde(default)]
    pub sessions: BTreeMap<String, u64>,
    #[serde(default)]
    pub next_user_id: u64,
    #[serde(default)]
    pub next_habit_id: u64,
    #[serde(default)]
    pub next_challenge_id: u64,
    #[serde(default)]
    pub next_entry_id: u64,
}

impl StoreData {
    pub fn allocate_user_id(&mut self) -> u64 {
        self.next_user_id += 1;
        self.next_user_id
    }

    pub fn allocate_habit_id(&mut self) -> u64 {
        self.next_habit_id += 1;
        self.next_habit_id
    }

    pub fn allocate_challenge_id(&mut self) -> u64 {
        self.next_challenge_id += 1;
        self.next_challenge_id
    }

    pub fn allocate_entry_id(&mut self) -> u64 {
        self.next_entry_id += 1;
        self.next_entry_id
    }
}

// ---- request payloads ----

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HabitPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub challenge_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionRequest {
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    #[serde(default = "default_direction")]
    pub direction: String,
}

fn default_direction() -> String {
    "up".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ChallengePayload {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct JournalPayload {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct HabitListQuery {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub challenge_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HabitDetailQuery {
    #[serde(default)]
    pub week_start: Option<String>,
}

// ---- response shapes ----

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: u64,
    pub username: String,
    pub timezone: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            timezone: user.timezone.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<UserResponse>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub success: bool,
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct HabitResponse {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub challenge_id: Option<u64>,
    pub display_order: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&Habit> for HabitResponse {
    fn from(habit: &Habit) -> Self {
        Self {
            id: habit.id,
            title: habit.title.clone(),
            body: habit.body.clone(),
            challenge_id: habit.challenge_id,
            display_order: habit.display_order,
            created_at: habit.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HabitEnvelope {
    pub habit: HabitResponse,
}

#[derive(Debug, Serialize)]
pub struct ChallengeEnvelope {
    pub challenge: ChallengeResponse,
}

#[derive(Debug, Serialize)]
pub struct HabitListItem {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub challenge_id: Option<u64>,
    pub display_order: i64,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub week_logs: Vec<NaiveDate>,
    pub habit_created_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct HabitListResponse {
    pub habits: Vec<HabitListItem>,
    pub selected_date: NaiveDate,
    pub today: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct HabitStats {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_completions: usize,
    pub completion_dates: Vec<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub id: u64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Challenge> for ChallengeResponse {
    fn from(challenge: &Challenge) -> Self {
        Self {
            id: challenge.id,
            title: challenge.title.clone(),
            created_at: challenge.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChallengeListResponse {
    pub challenges: Vec<ChallengeResponse>,
}

#[derive(Debug, Serialize)]
pub struct HabitDetailResponse {
    pub habit: HabitResponse,
    pub stats: HabitStats,
    pub challenge: Option<ChallengeResponse>,
    pub week: WeekView,
    pub weekly_progress: Vec<crate::stats::WeekPoint>,
}

#[derive(Debug, Serialize)]
pub struct WeekView {
    pub start: NaiveDate,
    pub days: Vec<crate::stats::DayCell>,
}

#[derive(Debug, Serialize)]
pub struct JournalEntryResponse {
    pub id: u64,
    pub content: String,
    pub extracted_data: ExtractedData,
    pub created_at: DateTime<Utc>,
}

impl From<&JournalEntry> for JournalEntryResponse {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            id: entry.id,
            content: entry.content.clone(),
            extracted_data: entry.extracted_data.clone(),
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JournalListResponse {
    pub entries: Vec<JournalEntryResponse>,
}
