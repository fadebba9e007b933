//! Pure scoring and aggregation helpers. Nothing in here touches the database.

pub mod alternatives;
pub mod answer_key;
pub mod history;
pub mod progress;
pub mod study_hours;
pub mod tally;

pub use alternatives::{Alternative, format_alternatives};
pub use answer_key::{AnswerKey, QuestionKind};
pub use tally::{QuestionKey, Tally, tally};
