// src/models/comment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// DTO for creating or editing a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(
        min = 1,
        max = 5000,
        message = "Comment must be between 1 and 5000 characters."
    ))]
    pub content: String,
}

/// Comment with author info, as listed under a question.
#[derive(Debug, Serialize, FromRow)]
pub struct CommentResponse {
    pub id: i64,
    pub question_id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    pub points: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// 'upvote' / 'downvote' when the current user voted.
    pub voted_by_me: Option<String>,
}

/// Comment joined with the question it belongs to (profile pages).
#[derive(Debug, Serialize, FromRow)]
pub struct UserCommentResponse {
    pub id: i64,
    pub question_id: i64,
    pub content: String,
    pub points: i32,
    pub created_at: DateTime<Utc>,
    pub materia: String,
    pub assunto: String,
}

/// Comment the current user upvoted, with its author.
#[derive(Debug, Serialize, FromRow)]
pub struct LikedCommentResponse {
    pub comment_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub question_id: i64,
    pub materia: String,
    pub assunto: String,
    pub autor: String,
    pub autor_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteAction {
    Upvote,
    Downvote,
    Remove,
}

#[derive(Debug, Deserialize)]
pub struct VoteParams {
    #[serde(rename = "type")]
    pub vote_type: Option<String>,
}

impl VoteAction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "upvote" => Some(Self::Upvote),
            "downvote" => Some(Self::Downvote),
            "remove" => Some(Self::Remove),
            _ => None,
        }
    }
}

/// A stored vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Upvote,
    Downvote,
}

impl VoteType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "upvote" => Some(Self::Upvote),
            "downvote" => Some(Self::Downvote),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upvote => "upvote",
            Self::Downvote => "downvote",
        }
    }

    fn weight(&self) -> i32 {
        match self {
            Self::Upvote => 1,
            Self::Downvote => -1,
        }
    }
}

/// Vote state machine. Returns the vote to store (None = no row) and the points delta.
///
/// Repeating the current vote toggles it off. Points are not clamped.
pub fn transition(existing: Option<VoteType>, action: VoteAction) -> (Option<VoteType>, i32) {
    let requested = match action {
        VoteAction::Upvote => Some(VoteType::Upvote),
        VoteAction::Downvote => Some(VoteType::Downvote),
        VoteAction::Remove => None,
    };

    let next = match (existing, requested) {
        (Some(current), Some(wanted)) if current == wanted => None,
        (_, wanted) => wanted,
    };

    let before = existing.map_or(0, |v| v.weight());
    let after = next.map_or(0, |v| v.weight());
    (next, after - before)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_votes_move_points_by_one() {
        assert_eq!(transition(None, VoteAction::Upvote), (Some(VoteType::Upvote), 1));
        assert_eq!(transition(None, VoteAction::Downvote), (Some(VoteType::Downvote), -1));
    }

    #[test]
    fn repeating_a_vote_toggles_it_off() {
        assert_eq!(transition(Some(VoteType::Upvote), VoteAction::Upvote), (None, -1));
        assert_eq!(transition(Some(VoteType::Downvote), VoteAction::Downvote), (None, 1));
    }

    #[test]
    fn switching_sides_moves_points_by_two() {
        assert_eq!(
            transition(Some(VoteType::Upvote), VoteAction::Downvote),
            (Some(VoteType::Downvote), -2)
        );
        assert_eq!(
            transition(Some(VoteType::Downvote), VoteAction::Upvote),
            (Some(VoteType::Upvote), 2)
        );
    }

    #[test]
    fn remove_reverts_or_does_nothing() {
        assert_eq!(transition(Some(VoteType::Upvote), VoteAction::Remove), (None, -1));
        assert_eq!(transition(Some(VoteType::Downvote), VoteAction::Remove), (None, 1));
        assert_eq!(transition(None, VoteAction::Remove), (None, 0));
    }

    #[test]
    fn action_parse_rejects_unknown_types() {
        assert_eq!(VoteAction::parse("UPVOTE"), Some(VoteAction::Upvote));
        assert_eq!(VoteAction::parse("like"), None);
    }
}
