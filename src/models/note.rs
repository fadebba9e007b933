// src/models/note.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Title shown for every note in the frontend list.
pub const NOTE_TITLE: &str = "Anotação";

#[derive(Debug, Deserialize, Validate)]
pub struct NoteRequest {
    pub question_id: i64,
    #[validate(length(max = 20000))]
    pub content: String,
}

/// PATCH body. A `question_id` may be sent by older clients; it is ignored.
#[derive(Debug, Deserialize, Validate)]
pub struct NoteUpdateRequest {
    #[validate(length(max = 20000))]
    pub content: String,
}

/// Note joined with its question's subject and topic.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct NoteResponse {
    pub id: i64,
    pub user_id: i64,
    pub question_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub materia: Option<String>,
    pub assunto: Option<String>,
    #[sqlx(default)]
    pub title: Option<String>,
}

impl NoteResponse {
    pub fn titled(mut self) -> Self {
        self.title = Some(NOTE_TITLE.to_string());
        self
    }
}
