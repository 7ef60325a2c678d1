// src/completion.rs
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{Discipline, WorkoutTemplate};
use crate::session::ExerciseLog;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Performance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>, // 1-5 stars
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// One finished workout as kept in history. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedWorkout {
    /// Stable identifier. Empty only for records written before ids existed;
    /// those get one assigned when history is loaded.
    #[serde(default)]
    pub id: String,
    pub workout_id: String,
    pub workout_title: String,
    pub workout_type: Discipline,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<Performance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise_logs: Option<Vec<ExerciseLog>>,
}

/// Subjective data the user adds when saving a finished session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionInput {
    pub rating: Option<u8>,
    pub duration: Option<String>,
    pub notes: Option<String>,
}

pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

// Blank text is treated as "not given".
fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Merges finished logs with the user's input into a history record.
/// Fields are copied as given; a rating of 0 counts as no rating.
pub fn finalize(
    template: &WorkoutTemplate,
    discipline: Discipline,
    exercise_logs: Vec<ExerciseLog>,
    input: CompletionInput,
    now: DateTime<Utc>,
) -> CompletedWorkout {
    CompletedWorkout {
        id: new_record_id(),
        workout_id: template.id.clone(),
        workout_title: template.title.clone(),
        workout_type: discipline,
        completed_at: now,
        notes: non_empty(input.notes),
        performance: Some(Performance {
            rating: input.rating.filter(|&r| r > 0),
            duration: non_empty(input.duration),
        }),
        exercise_logs: Some(exercise_logs),
    }
}

/// Elapsed time since the session started, as duration text ("42 min").
pub fn suggested_duration(started_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - started_at).num_minutes().max(1);
    format!("{minutes} min")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryAdvice {
    pub rest_days: i64,
    pub message: &'static str,
    pub tip: &'static str,
    pub next_session: NaiveDate,
}

/// Suggested rest before the next session of the same kind. Informational only.
pub fn recovery_advice(discipline: Discipline, today: NaiveDate) -> RecoveryAdvice {
    let (rest_days, message, tip) = match discipline {
        Discipline::Strength => (
            2,
            "Rest for 2 days before training the same muscle groups again.",
            "Light cardio or stretching is fine during recovery.",
        ),
        Discipline::Running => (
            1,
            "Rest for 1 day before your next running session.",
            "Consider cross-training with cycling or strength work.",
        ),
        Discipline::Cycling => (
            1,
            "Rest for 1 day before your next cycling session.",
            "Running or strength training can complement your recovery.",
        ),
    };
    RecoveryAdvice {
        rest_days,
        message,
        tip,
        next_session: today + Duration::days(rest_days),
    }
}
