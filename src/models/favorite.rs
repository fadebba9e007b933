// src/models/favorite.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::question::QuestionResponse;

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub question_id: i64,
    pub notebook_id: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct FavoriteRow {
    pub id: i64,
    pub user_id: i64,
    pub question_id: i64,
    pub notebook_id: i64,
    pub favorited_at: DateTime<Utc>,
    pub notebook_name: String,
}

/// Favorite with the question and notebook name attached.
/// Also used for the "wrong questions" list, where `id` is 0.
#[derive(Debug, Serialize)]
pub struct FavoriteResponse {
    pub id: i64,
    pub user_id: i64,
    pub question_id: i64,
    pub notebook_id: i64,
    pub favorited_at: DateTime<Utc>,
    pub notebook_name: Option<String>,
    pub question: Option<QuestionResponse>,
}

impl FavoriteResponse {
    pub fn from_row(row: FavoriteRow, question: Option<QuestionResponse>) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            question_id: row.question_id,
            notebook_id: row.notebook_id,
            favorited_at: row.favorited_at,
            notebook_name: Some(row.notebook_name),
            question,
        }
    }
}
