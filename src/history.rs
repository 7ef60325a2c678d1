// src/history.rs
use chrono::{NaiveDate, TimeZone};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::Discipline;
use crate::completion::{new_record_id, CompletedWorkout};

/// Shortest id prefix accepted when resolving a record.
pub const MIN_ID_PREFIX_LEN: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Workout record not found: {0}")]
    NotFound(String),
    #[error("Identifier '{0}' matches more than one workout record; use more characters.")]
    AmbiguousIdentifier(String),
    #[error("No workout record at position {position} (history has {len}).")]
    PositionOutOfRange { position: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisciplineFilter {
    #[default]
    All,
    Only(Discipline),
}

impl DisciplineFilter {
    pub fn matches(self, discipline: Discipline) -> bool {
        match self {
            Self::All => true,
            Self::Only(d) => d == discipline,
        }
    }
}

impl TryFrom<&str> for DisciplineFilter {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            Discipline::try_from(value).map(Self::Only)
        }
    }
}

impl fmt::Display for DisciplineFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Only(d) => write!(f, "{d}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryFilter {
    pub discipline: DisciplineFilter,
    pub on_date: Option<NaiveDate>, // Calendar day in the caller's time zone
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistorySummary {
    pub total: usize,
    pub strength: usize,
    pub running: usize,
    pub cycling: usize,
}

/// Append-only list of completed workouts, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    records: Vec<CompletedWorkout>,
}

impl History {
    /// Wraps loaded records, giving an id to any record that has none.
    /// Returns the history and whether ids were assigned (so the caller can re-save).
    pub fn from_records(mut records: Vec<CompletedWorkout>) -> (Self, bool) {
        let mut migrated = 0usize;
        for record in records.iter_mut().filter(|r| r.id.trim().is_empty()) {
            record.id = new_record_id();
            migrated += 1;
        }
        if migrated > 0 {
            warn!(count = migrated, "Assigned ids to workout records stored without one");
        }
        (Self { records }, migrated > 0)
    }

    pub fn records(&self) -> &[CompletedWorkout] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn append(&mut self, record: CompletedWorkout) {
        info!(id = %record.id, workout_id = %record.workout_id, "Workout recorded");
        self.records.push(record);
    }

    /// Position of a record in the unfiltered sequence, matched by value.
    pub fn position_of(&self, record: &CompletedWorkout) -> Option<usize> {
        self.records.iter().position(|r| r == record)
    }

    /// Removes the record at `position` of the unfiltered sequence.
    /// # Errors
    /// `HistoryError::PositionOutOfRange`.
    pub fn delete_at(&mut self, position: usize) -> Result<CompletedWorkout, HistoryError> {
        if position >= self.records.len() {
            return Err(HistoryError::PositionOutOfRange {
                position,
                len: self.records.len(),
            });
        }
        let removed = self.records.remove(position);
        info!(id = %removed.id, position, "Workout record deleted");
        Ok(removed)
    }

    /// Finds a record by full id or by a unique id prefix.
    /// # Errors
    /// `NotFound` when nothing matches, `AmbiguousIdentifier` when a prefix matches several.
    pub fn resolve(&self, identifier: &str) -> Result<&CompletedWorkout, HistoryError> {
        let ident = identifier.trim();
        if let Some(exact) = self.records.iter().find(|r| r.id == ident) {
            return Ok(exact);
        }
        if ident.len() < MIN_ID_PREFIX_LEN {
            return Err(HistoryError::NotFound(ident.to_string()));
        }
        let mut matches = self.records.iter().filter(|r| r.id.starts_with(ident));
        match (matches.next(), matches.next()) {
            (Some(record), None) => Ok(record),
            (Some(_), Some(_)) => Err(HistoryError::AmbiguousIdentifier(ident.to_string())),
            (None, _) => Err(HistoryError::NotFound(ident.to_string())),
        }
    }

    /// Removes the record with the given id (or unique id prefix).
    /// # Errors
    /// See `resolve`.
    pub fn delete(&mut self, identifier: &str) -> Result<CompletedWorkout, HistoryError> {
        let id = self.resolve(identifier)?.id.clone();
        let position = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| HistoryError::NotFound(id.clone()))?;
        self.delete_at(position)
    }

    /// Records matching the discipline and, if given, the local calendar day.
    pub fn filter<Tz: TimeZone>(&self, filter: &HistoryFilter, tz: &Tz) -> Vec<&CompletedWorkout> {
        self.records
            .iter()
            .filter(|r| filter.discipline.matches(r.workout_type))
            .filter(|r| {
                filter
                    .on_date
                    .map_or(true, |day| local_date(r, tz) == day)
            })
            .collect()
    }

    /// Counts over the whole history, regardless of any view filter.
    pub fn count_by_discipline(&self, discipline: Discipline) -> usize {
        self.records
            .iter()
            .filter(|r| r.workout_type == discipline)
            .count()
    }

    pub fn summary(&self) -> HistorySummary {
        HistorySummary {
            total: self.records.len(),
            strength: self.count_by_discipline(Discipline::Strength),
            running: self.count_by_discipline(Discipline::Running),
            cycling: self.count_by_discipline(Discipline::Cycling),
        }
    }
}

fn local_date<Tz: TimeZone>(record: &CompletedWorkout, tz: &Tz) -> NaiveDate {
    record.completed_at.with_timezone(tz).date_naive()
}

/// Newest first. Records with equal timestamps keep their relative order.
pub fn sorted_by_recency<'a>(records: &[&'a CompletedWorkout]) -> Vec<&'a CompletedWorkout> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    sorted
}

/// Calendar days with at least one workout, for marking a date picker.
pub fn distinct_calendar_dates<'a, Tz, I>(records: I, tz: &Tz) -> BTreeSet<NaiveDate>
where
    Tz: TimeZone,
    I: IntoIterator<Item = &'a CompletedWorkout>,
{
    records.into_iter().map(|r| local_date(r, tz)).collect()
}
