// src/session.rs
//! Guided workout sessions.
//!
//! A session is created from a template, holds one exercise log per template
//! exercise and walks through them in order. Only the current exercise is
//! editable. Advancing past the last exercise completes the session and hands
//! the logs to the completion step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{Discipline, ExerciseTemplate, WorkoutTemplate};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("No workout session is active. Start one with 'start <workout-id>'.")]
    NoActiveSession,
    #[error("A workout session is already active ({0}). Finish or cancel it first.")]
    SessionAlreadyActive(String),
    #[error("Workout '{0}' has no exercises.")]
    EmptyTemplate(String),
    #[error("The session is not in progress.")]
    NotInProgress,
    #[error("The session has not been completed yet. Go through every exercise with 'next'.")]
    NotCompleted,
    #[error("Set {index} does not exist (exercise has {count} set(s)).")]
    SetOutOfRange { index: usize, count: usize },
    #[error("Cancelling needs to be requested before it can be confirmed.")]
    CancelNotRequested,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLog {
    pub set_number: u32, // 1-based, always equal to position + 1
    #[serde(default, deserialize_with = "null_as_zero")]
    pub reps: u32,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub weight: u32,
    pub completed: bool,
    pub failed: bool,
}

// Records saved with unparseable reps carry `null` here.
fn null_as_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(0))
}

impl SetLog {
    fn new(set_number: usize, reps: u32, weight: u32) -> Self {
        Self {
            set_number: u32::try_from(set_number).unwrap_or(u32::MAX),
            reps,
            weight,
            completed: false,
            failed: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseLog {
    pub name: String,
    pub sets: Vec<SetLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ExerciseLog {
    fn from_template(exercise: &ExerciseTemplate) -> Self {
        let reps = exercise.reps_text().map_or(0, initial_reps);
        let sets = (1..=exercise.set_count())
            .map(|n| SetLog::new(n, reps, 0))
            .collect();
        Self {
            name: exercise.name.clone(),
            sets,
            notes: None,
        }
    }

    pub fn completed_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.completed).count()
    }

    pub fn failed_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.failed).count()
    }

    /// Fraction of sets marked completed.
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        if self.sets.is_empty() {
            return 0.0;
        }
        self.completed_sets() as f64 / self.sets.len() as f64
    }
}

/// A single field change on a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetUpdate {
    Reps(u32),
    Weight(u32),
    Completed(bool),
    Failed(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    InProgress,
    Completed,
    Aborted,
}

/// Result of moving forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved { index: usize },
    Finished(Vec<ExerciseLog>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    template: WorkoutTemplate,
    discipline: Discipline,
    logs: Vec<ExerciseLog>,
    current_exercise_index: usize,
    is_minimized: bool,
    phase: SessionPhase,
    #[serde(default)]
    cancel_requested: bool,
    started_at: DateTime<Utc>,
}

impl Session {
    /// Builds a fresh session with one log per template exercise.
    /// # Errors
    /// `SessionError::EmptyTemplate` if the template lists no exercises.
    pub fn start(
        template: WorkoutTemplate,
        discipline: Discipline,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if template.exercises.is_empty() {
            return Err(SessionError::EmptyTemplate(template.id));
        }
        let logs = template
            .exercises
            .iter()
            .map(ExerciseLog::from_template)
            .collect();

        info!(workout_id = %template.id, %discipline, "Session started");
        Ok(Self {
            template,
            discipline,
            logs,
            current_exercise_index: 0,
            is_minimized: false,
            phase: SessionPhase::InProgress,
            cancel_requested: false,
            started_at: now,
        })
    }

    pub const fn template(&self) -> &WorkoutTemplate {
        &self.template
    }

    pub const fn discipline(&self) -> Discipline {
        self.discipline
    }

    pub fn logs(&self) -> &[ExerciseLog] {
        &self.logs
    }

    pub const fn current_index(&self) -> usize {
        self.current_exercise_index
    }

    pub fn exercise_count(&self) -> usize {
        self.logs.len()
    }

    pub fn is_last_exercise(&self) -> bool {
        self.current_exercise_index + 1 == self.logs.len()
    }

    /// The log being edited. `None` only after an abort cleared the logs.
    pub fn current_exercise(&self) -> Option<&ExerciseLog> {
        self.logs.get(self.current_exercise_index)
    }

    /// Template entry for the current exercise, for showing targets.
    pub fn current_template_exercise(&self) -> Option<&ExerciseTemplate> {
        self.template.exercises.get(self.current_exercise_index)
    }

    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub const fn is_minimized(&self) -> bool {
        self.is_minimized
    }

    pub const fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// True when the state could have come out of `start` and the transitions below.
    /// Used to reject tampered or truncated stored sessions.
    pub fn is_consistent(&self) -> bool {
        match self.phase {
            SessionPhase::Aborted => false,
            SessionPhase::InProgress | SessionPhase::Completed => {
                self.logs.len() == self.template.exercises.len()
                    && self.current_exercise_index < self.logs.len()
                    && self.logs.iter().all(|log| {
                        !log.sets.is_empty()
                            && log.sets.iter().enumerate().all(|(i, s)| {
                                s.set_number as usize == i + 1 && !(s.completed && s.failed)
                            })
                    })
            }
        }
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        if self.phase == SessionPhase::InProgress {
            Ok(())
        } else {
            Err(SessionError::NotInProgress)
        }
    }

    // Any edit drops a pending cancel request.
    fn current_log_mut(&mut self) -> Result<&mut ExerciseLog, SessionError> {
        self.ensure_in_progress()?;
        self.cancel_requested = false;
        self.logs
            .get_mut(self.current_exercise_index)
            .ok_or(SessionError::NotInProgress)
    }

    /// Changes one field of a set in the current exercise (0-based `set_index`).
    /// Completed and failed exclude each other: setting one clears the other.
    /// # Errors
    /// `NotInProgress` or `SetOutOfRange`.
    pub fn update_set(&mut self, set_index: usize, update: SetUpdate) -> Result<(), SessionError> {
        let log = self.current_log_mut()?;
        let count = log.sets.len();
        let set = log
            .sets
            .get_mut(set_index)
            .ok_or(SessionError::SetOutOfRange {
                index: set_index + 1,
                count,
            })?;

        match update {
            SetUpdate::Reps(reps) => set.reps = reps,
            SetUpdate::Weight(weight) => set.weight = weight,
            SetUpdate::Completed(value) => {
                if value {
                    set.failed = false;
                }
                set.completed = value;
            }
            SetUpdate::Failed(value) => {
                if value {
                    set.completed = false;
                }
                set.failed = value;
            }
        }
        Ok(())
    }

    /// Appends a set, pre-filled with the reps and weight of the last one.
    /// # Errors
    /// `NotInProgress`.
    pub fn add_set(&mut self) -> Result<&SetLog, SessionError> {
        let log = self.current_log_mut()?;
        let (reps, weight) = log.sets.last().map_or((0, 0), |s| (s.reps, s.weight));
        let set_number = log.sets.len() + 1;
        log.sets.push(SetLog::new(set_number, reps, weight));
        Ok(&log.sets[set_number - 1])
    }

    /// Drops the last set. Returns `false` (and changes nothing) when only one set is left.
    /// # Errors
    /// `NotInProgress`.
    pub fn remove_set(&mut self) -> Result<bool, SessionError> {
        let log = self.current_log_mut()?;
        if log.sets.len() <= 1 {
            debug!(exercise = %log.name, "Refusing to remove the only set");
            return Ok(false);
        }
        log.sets.pop();
        Ok(true)
    }

    /// Attaches free text to the current exercise. Blank text clears it.
    /// # Errors
    /// `NotInProgress`.
    pub fn set_exercise_notes(&mut self, text: &str) -> Result<(), SessionError> {
        let log = self.current_log_mut()?;
        let trimmed = text.trim();
        log.notes = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        Ok(())
    }

    /// Moves to the next exercise, or completes the session from the last one.
    /// # Errors
    /// `NotInProgress`.
    pub fn advance(&mut self) -> Result<Advance, SessionError> {
        self.ensure_in_progress()?;
        self.cancel_requested = false;
        if self.is_last_exercise() {
            self.phase = SessionPhase::Completed;
            info!(workout_id = %self.template.id, "Session completed");
            return Ok(Advance::Finished(self.logs.clone()));
        }
        self.current_exercise_index += 1;
        Ok(Advance::Moved {
            index: self.current_exercise_index,
        })
    }

    /// Moves back one exercise. Stays put on the first one.
    /// # Errors
    /// `NotInProgress`.
    pub fn retreat(&mut self) -> Result<usize, SessionError> {
        self.ensure_in_progress()?;
        self.cancel_requested = false;
        self.current_exercise_index = self.current_exercise_index.saturating_sub(1);
        Ok(self.current_exercise_index)
    }

    /// Presentation flag only; logs and position are untouched.
    pub fn set_minimized(&mut self, minimized: bool) {
        self.is_minimized = minimized;
    }

    /// First half of cancelling.
    /// # Errors
    /// `NotInProgress`.
    pub fn request_cancel(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.cancel_requested = true;
        Ok(())
    }

    pub fn dismiss_cancel(&mut self) {
        self.cancel_requested = false;
    }

    /// Second half of cancelling: discards every log.
    /// # Errors
    /// `CancelNotRequested` unless `request_cancel` came first; `NotInProgress`.
    pub fn confirm_cancel(&mut self) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        if !self.cancel_requested {
            return Err(SessionError::CancelNotRequested);
        }
        self.logs.clear();
        self.current_exercise_index = 0;
        self.cancel_requested = false;
        self.phase = SessionPhase::Aborted;
        info!(workout_id = %self.template.id, "Session cancelled");
        Ok(())
    }

    /// Logs handed over once the last exercise has been passed.
    /// # Errors
    /// `NotCompleted` while the session is still running.
    pub fn finished_logs(&self) -> Result<&[ExerciseLog], SessionError> {
        match self.phase {
            SessionPhase::Completed => Ok(&self.logs),
            SessionPhase::InProgress => Err(SessionError::NotCompleted),
            SessionPhase::Aborted => Err(SessionError::NotInProgress),
        }
    }

    /// Completed/total sets of the current exercise.
    pub fn exercise_progress(&self) -> f64 {
        self.current_exercise().map_or(0.0, ExerciseLog::progress)
    }

    /// `(index + exercise progress) / exercise count`. Display only.
    #[allow(clippy::cast_precision_loss)]
    pub fn overall_progress(&self) -> f64 {
        match self.phase {
            SessionPhase::Completed => 1.0,
            SessionPhase::Aborted => 0.0,
            SessionPhase::InProgress => {
                if self.logs.is_empty() {
                    return 0.0;
                }
                (self.current_exercise_index as f64 + self.exercise_progress())
                    / self.logs.len() as f64
            }
        }
    }
}

// Leading run of ASCII digits after optional whitespace.
fn leading_integer(text: &str) -> Option<u32> {
    let trimmed = text.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

/// Starting reps for a range like "8-12" (its lower bound). Unparseable text gives 0.
pub fn initial_reps(range: &str) -> u32 {
    range
        .split('-')
        .next()
        .and_then(leading_integer)
        .unwrap_or(0)
}

/// Coerces user-typed numbers; anything that does not start with digits becomes 0.
pub fn parse_count(input: &str) -> u32 {
    leading_integer(input).unwrap_or(0)
}
