// src/catalog.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use thiserror::Error;

/// Number of sets a session starts with when a template does not say.
pub const DEFAULT_SET_COUNT: usize = 3;

const CUSTOM_ID_PREFIX: &str = "custom-";
const DEFAULT_CUSTOM_DESCRIPTION: &str = "Custom workout";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum Discipline {
    Strength,
    Running,
    Cycling,
}

impl Discipline {
    /// Human readable label ("Strength", "Running", "Cycling").
    pub const fn label(self) -> &'static str {
        match self {
            Self::Strength => "Strength",
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }
}

// Convert string (CLI args, stored tags) to Discipline
impl TryFrom<&str> for Discipline {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "strength" => Ok(Self::Strength),
            "running" => Ok(Self::Running),
            "cycling" => Ok(Self::Cycling),
            _ => anyhow::bail!("Invalid discipline: {}", value),
        }
    }
}

// Lowercase tag, same as the stored `workoutType`
impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strength => write!(f, "strength"),
            Self::Running => write!(f, "running"),
            Self::Cycling => write!(f, "cycling"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumIter)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl TryFrom<&str> for Difficulty {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::iter()
            .find(|d| d.to_string().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| anyhow::anyhow!("Invalid difficulty: {}", value))
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Beginner => write!(f, "Beginner"),
            Self::Intermediate => write!(f, "Intermediate"),
            Self::Advanced => write!(f, "Advanced"),
        }
    }
}

/// What a single exercise asks for: counted reps or a block of time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExerciseKind {
    RepBased { sets: u32, reps: String },
    /// `sets` is only present for interval blocks ("8 x 30 sec").
    TimeBased { duration: String, sets: Option<u32> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawExercise", into = "RawExercise")]
pub struct ExerciseTemplate {
    pub name: String,
    pub kind: ExerciseKind,
    pub rest: Option<String>,
}

impl ExerciseTemplate {
    pub fn rep_based(name: &str, sets: u32, reps: &str, rest: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            kind: ExerciseKind::RepBased {
                sets,
                reps: reps.to_string(),
            },
            rest: rest.map(str::to_string),
        }
    }

    pub fn time_based(name: &str, duration: &str, sets: Option<u32>, rest: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            kind: ExerciseKind::TimeBased {
                duration: duration.to_string(),
                sets,
            },
            rest: rest.map(str::to_string),
        }
    }

    /// Sets a session should open with. Missing or zero counts fall back to the default.
    pub fn set_count(&self) -> usize {
        let sets = match &self.kind {
            ExerciseKind::RepBased { sets, .. } => Some(*sets),
            ExerciseKind::TimeBased { sets, .. } => *sets,
        };
        match sets {
            Some(n) if n > 0 => n as usize,
            _ => DEFAULT_SET_COUNT,
        }
    }

    pub fn reps_text(&self) -> Option<&str> {
        match &self.kind {
            ExerciseKind::RepBased { reps, .. } => Some(reps),
            ExerciseKind::TimeBased { .. } => None,
        }
    }

    pub fn duration_text(&self) -> Option<&str> {
        match &self.kind {
            ExerciseKind::TimeBased { duration, .. } => Some(duration),
            ExerciseKind::RepBased { .. } => None,
        }
    }

    /// Short prescription for display, e.g. "4 x 6-8" or "8 x 30 sec".
    pub fn prescription(&self) -> String {
        match &self.kind {
            ExerciseKind::RepBased { sets, reps } => format!("{sets} x {reps}"),
            ExerciseKind::TimeBased {
                duration,
                sets: Some(sets),
            } => format!("{sets} x {duration}"),
            ExerciseKind::TimeBased { duration, sets: None } => duration.clone(),
        }
    }
}

// Flat wire shape shared with the stored `customWorkouts` blob.
#[derive(Serialize, Deserialize)]
struct RawExercise {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rest: Option<String>,
}

impl From<RawExercise> for ExerciseTemplate {
    fn from(raw: RawExercise) -> Self {
        // Reps win over duration when both are present.
        let kind = match raw.reps {
            Some(reps) => ExerciseKind::RepBased {
                sets: raw
                    .sets
                    .filter(|&s| s > 0)
                    .unwrap_or(DEFAULT_SET_COUNT as u32),
                reps,
            },
            None => ExerciseKind::TimeBased {
                duration: raw.duration.unwrap_or_default(),
                sets: raw.sets,
            },
        };
        Self {
            name: raw.name,
            kind,
            rest: raw.rest,
        }
    }
}

impl From<ExerciseTemplate> for RawExercise {
    fn from(ex: ExerciseTemplate) -> Self {
        let (sets, reps, duration) = match ex.kind {
            ExerciseKind::RepBased { sets, reps } => (Some(sets), Some(reps), None),
            ExerciseKind::TimeBased { duration, sets } => (sets, None, Some(duration)),
        };
        Self {
            name: ex.name,
            sets,
            reps,
            duration,
            rest: ex.rest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutTemplate {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration: String, // Free text estimate, never parsed
    pub difficulty: Difficulty,
    pub exercises: Vec<ExerciseTemplate>,
}

impl WorkoutTemplate {
    pub fn is_custom(&self) -> bool {
        self.id.starts_with(CUSTOM_ID_PREFIX)
    }
}

/// Templates grouped by discipline. Serialized as the `customWorkouts` blob.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomWorkouts {
    pub strength: Vec<WorkoutTemplate>,
    pub running: Vec<WorkoutTemplate>,
    pub cycling: Vec<WorkoutTemplate>,
}

impl CustomWorkouts {
    pub fn list(&self, discipline: Discipline) -> &[WorkoutTemplate] {
        match discipline {
            Discipline::Strength => &self.strength,
            Discipline::Running => &self.running,
            Discipline::Cycling => &self.cycling,
        }
    }

    fn list_mut(&mut self, discipline: Discipline) -> &mut Vec<WorkoutTemplate> {
        match discipline {
            Discipline::Strength => &mut self.strength,
            Discipline::Running => &mut self.running,
            Discipline::Cycling => &mut self.cycling,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.strength.is_empty() && self.running.is_empty() && self.cycling.is_empty()
    }
}

/// User input for a custom workout, before validation.
#[derive(Debug, Clone, Default)]
pub struct NewWorkout {
    pub discipline: Option<Discipline>,
    pub title: String,
    pub description: String,
    pub duration: String,
    pub difficulty: Difficulty,
    pub exercises: Vec<ExerciseTemplate>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all required fields: choose a workout type.")]
    MissingDiscipline,
    #[error("Please fill in all required fields: title is empty.")]
    MissingTitle,
    #[error("Please fill in all required fields: duration is empty.")]
    MissingDuration,
    #[error("Please fill in all required fields: add at least one exercise.")]
    NoExercises,
    #[error("Please fill in all required fields: exercise {0} has no name.")]
    MissingExerciseName(usize), // 1-based position
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Workout template not found: {0}")]
    TemplateNotFound(String),
    #[error("Workout '{0}' is part of the built-in catalog and cannot be deleted.")]
    NotCustom(String),
}

/// Built-in templates plus the user's custom ones.
#[derive(Debug, Clone)]
pub struct Catalog {
    builtin: CustomWorkouts,
    custom: CustomWorkouts,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(CustomWorkouts::default())
    }
}

impl Catalog {
    pub fn new(custom: CustomWorkouts) -> Self {
        Self {
            builtin: builtin_catalog(),
            custom,
        }
    }

    pub fn custom(&self) -> &CustomWorkouts {
        &self.custom
    }

    /// Built-in templates of a discipline followed by the custom ones.
    pub fn templates(&self, discipline: Discipline) -> impl Iterator<Item = &WorkoutTemplate> {
        self.builtin
            .list(discipline)
            .iter()
            .chain(self.custom.list(discipline))
    }

    /// Looks a template up by id, built-ins first.
    pub fn find(&self, id: &str) -> Option<(Discipline, &WorkoutTemplate)> {
        let id = id.trim();
        [&self.builtin, &self.custom].into_iter().find_map(|shelf| {
            Discipline::iter().find_map(|d| {
                shelf
                    .list(d)
                    .iter()
                    .find(|t| t.id == id)
                    .map(|t| (d, t))
            })
        })
    }

    /// Validates and stores a custom workout.
    /// # Errors
    /// Returns a `ValidationError` when a required field is missing; nothing is stored then.
    pub fn add_custom(
        &mut self,
        new: NewWorkout,
        now: DateTime<Utc>,
    ) -> Result<(Discipline, WorkoutTemplate), ValidationError> {
        let discipline = new.discipline.ok_or(ValidationError::MissingDiscipline)?;
        let title = new.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if new.duration.trim().is_empty() {
            return Err(ValidationError::MissingDuration);
        }
        if new.exercises.is_empty() {
            return Err(ValidationError::NoExercises);
        }
        if let Some(pos) = new.exercises.iter().position(|ex| ex.name.trim().is_empty()) {
            return Err(ValidationError::MissingExerciseName(pos + 1));
        }

        let description = match new.description.trim() {
            "" => DEFAULT_CUSTOM_DESCRIPTION.to_string(),
            d => d.to_string(),
        };
        let exercises = new
            .exercises
            .into_iter()
            .map(|ex| ExerciseTemplate {
                name: ex.name.trim().to_string(),
                ..ex
            })
            .collect();

        let template = WorkoutTemplate {
            id: self.next_custom_id(now),
            title: title.to_string(),
            description,
            duration: new.duration,
            difficulty: new.difficulty,
            exercises,
        };
        self.custom.list_mut(discipline).push(template.clone());
        Ok((discipline, template))
    }

    /// Removes a custom template.
    /// # Errors
    /// `CatalogError::NotCustom` for built-ins, `TemplateNotFound` for unknown ids.
    pub fn remove_custom(&mut self, id: &str) -> Result<(Discipline, WorkoutTemplate), CatalogError> {
        let id = id.trim();
        for d in Discipline::iter() {
            if self.builtin.list(d).iter().any(|t| t.id == id) {
                return Err(CatalogError::NotCustom(id.to_string()));
            }
            let list = self.custom.list_mut(d);
            if let Some(pos) = list.iter().position(|t| t.id == id) {
                return Ok((d, list.remove(pos)));
            }
        }
        Err(CatalogError::TemplateNotFound(id.to_string()))
    }

    fn next_custom_id(&self, now: DateTime<Utc>) -> String {
        let mut millis = now.timestamp_millis();
        loop {
            let id = format!("{CUSTOM_ID_PREFIX}{millis}");
            if self.find(&id).is_none() {
                return id;
            }
            millis += 1;
        }
    }
}

fn template(
    id: &str,
    title: &str,
    duration: &str,
    difficulty: Difficulty,
    description: &str,
    exercises: Vec<ExerciseTemplate>,
) -> WorkoutTemplate {
    WorkoutTemplate {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        duration: duration.to_string(),
        difficulty,
        exercises,
    }
}

fn lift(name: &str, sets: u32, reps: &str, rest: &str) -> ExerciseTemplate {
    ExerciseTemplate::rep_based(name, sets, reps, Some(rest))
}

fn timed(name: &str, duration: &str) -> ExerciseTemplate {
    ExerciseTemplate::time_based(name, duration, None, None)
}

fn intervals(name: &str, sets: u32, duration: &str, rest: &str) -> ExerciseTemplate {
    ExerciseTemplate::time_based(name, duration, Some(sets), Some(rest))
}

/// Compiled-in catalog.
pub fn builtin_catalog() -> CustomWorkouts {
    use Difficulty::{Advanced, Beginner, Intermediate};

    let strength = vec![
        template(
            "strength-1",
            "Full Body Compound",
            "45-60 min",
            Intermediate,
            "Build overall strength with the big 4 compound lifts",
            vec![
                lift("Barbell Squats", 4, "6-8", "2-3 min"),
                lift("Bench Press", 4, "6-8", "2-3 min"),
                lift("Deadlifts", 3, "5-6", "3 min"),
                lift("Barbell Rows", 4, "8-10", "2 min"),
            ],
        ),
        template(
            "strength-2",
            "Upper Body Power",
            "40-50 min",
            Advanced,
            "Heavy pressing and pulling movements",
            vec![
                lift("Overhead Press", 4, "5-6", "2-3 min"),
                lift("Weighted Pull-ups", 4, "5-8", "2-3 min"),
                lift("Incline Barbell Press", 3, "6-8", "2 min"),
                lift("Weighted Dips", 3, "6-10", "2 min"),
            ],
        ),
        template(
            "strength-3",
            "Lower Body Focus",
            "45-55 min",
            Intermediate,
            "Leg-focused compound movements",
            vec![
                lift("Front Squats", 4, "6-8", "2-3 min"),
                lift("Romanian Deadlifts", 4, "8-10", "2 min"),
                lift("Bulgarian Split Squats", 3, "8-10", "90 sec"),
                lift("Hip Thrusts", 3, "10-12", "90 sec"),
            ],
        ),
        template(
            "strength-4",
            "Beginner Essentials",
            "30-40 min",
            Beginner,
            "Master the fundamental compound movements",
            vec![
                lift("Goblet Squats", 3, "10-12", "90 sec"),
                lift("Dumbbell Bench Press", 3, "10-12", "90 sec"),
                lift("Inverted Rows", 3, "8-12", "90 sec"),
                lift("Dumbbell Romanian Deadlifts", 3, "10-12", "90 sec"),
            ],
        ),
        template(
            "strength-5",
            "Push Emphasis",
            "40-50 min",
            Intermediate,
            "Heavy pressing compound movements",
            vec![
                lift("Barbell Bench Press", 5, "5-6", "3 min"),
                lift("Overhead Press", 4, "6-8", "2-3 min"),
                lift("Close-Grip Bench Press", 3, "8-10", "2 min"),
                lift("Dips", 3, "8-12", "90 sec"),
            ],
        ),
        template(
            "strength-6",
            "Pull Emphasis",
            "40-50 min",
            Intermediate,
            "Heavy pulling compound movements",
            vec![
                lift("Conventional Deadlifts", 5, "3-5", "3-4 min"),
                lift("Weighted Pull-ups", 4, "5-8", "2-3 min"),
                lift("Barbell Rows", 4, "6-8", "2 min"),
                lift("T-Bar Rows", 3, "8-10", "90 sec"),
            ],
        ),
    ];

    let running = vec![
        template(
            "running-1",
            "5K Training Run",
            "30-40 min",
            Intermediate,
            "Build endurance with steady-paced running",
            vec![
                timed("Dynamic Warm-up", "5 min"),
                timed("Easy Run", "5 min"),
                timed("Steady Run (70-75% effort)", "20-25 min"),
                timed("Cool-down Jog", "5 min"),
                timed("Static Stretching", "5 min"),
            ],
        ),
        template(
            "running-2",
            "Sprint Intervals",
            "25-30 min",
            Advanced,
            "High-intensity sprint training for speed",
            vec![
                timed("Warm-up Jog", "10 min"),
                intervals("Sprint", 8, "30 sec", "90 sec walk"),
                timed("Cool-down Walk", "5 min"),
                timed("Stretching", "5 min"),
            ],
        ),
        template(
            "running-3",
            "Easy Recovery Run",
            "20-30 min",
            Beginner,
            "Light run for active recovery",
            vec![
                timed("Warm-up Walk", "5 min"),
                timed("Easy Run (60-65% effort)", "15-20 min"),
                timed("Cool-down Walk", "5 min"),
            ],
        ),
        template(
            "running-4",
            "Tempo Run",
            "35-45 min",
            Advanced,
            "Sustained effort at race pace",
            vec![
                timed("Warm-up Jog", "10 min"),
                timed("Tempo Run (80-85% effort)", "20-25 min"),
                timed("Cool-down Jog", "5 min"),
                timed("Stretching", "5 min"),
            ],
        ),
        template(
            "running-5",
            "Fartlek Run",
            "30-40 min",
            Intermediate,
            "Unstructured speed play workout",
            vec![
                timed("Warm-up Jog", "10 min"),
                timed("Fartlek (alternate easy/hard efforts)", "20-25 min"),
                timed("Cool-down Jog", "5 min"),
            ],
        ),
        template(
            "running-6",
            "Long Slow Distance",
            "60-90 min",
            Intermediate,
            "Build aerobic base with long steady run",
            vec![
                timed("Warm-up Jog", "10 min"),
                timed("Steady Easy Run (65-70% effort)", "45-75 min"),
                timed("Cool-down Walk", "5 min"),
            ],
        ),
    ];

    let cycling = vec![
        template(
            "cycling-1",
            "Long Distance Ride",
            "60-90 min",
            Intermediate,
            "Endurance cycling at moderate pace",
            vec![
                timed("Easy Spin Warm-up", "10 min"),
                timed("Steady Ride (65-75% effort)", "45-70 min"),
                timed("Cool-down Easy Pace", "5-10 min"),
            ],
        ),
        template(
            "cycling-2",
            "Hill Intervals",
            "40-50 min",
            Advanced,
            "Build power with hill climbing",
            vec![
                timed("Flat Road Warm-up", "10 min"),
                intervals("Hill Climb (80-90% effort)", 6, "3 min", "3 min easy ride"),
                timed("Cool-down Flat Ride", "10 min"),
            ],
        ),
        template(
            "cycling-3",
            "Tempo Ride",
            "45-60 min",
            Intermediate,
            "Sustained moderate-hard cycling effort",
            vec![
                timed("Warm-up Spin", "10 min"),
                timed("Tempo Pace (75-80% effort)", "30-40 min"),
                timed("Cool-down Easy Spin", "5-10 min"),
            ],
        ),
        template(
            "cycling-4",
            "Sprint Intervals",
            "30-40 min",
            Advanced,
            "High-intensity sprint training on bike",
            vec![
                timed("Easy Warm-up", "10 min"),
                intervals("All-out Sprint", 8, "30 sec", "2 min easy"),
                timed("Cool-down", "10 min"),
            ],
        ),
        template(
            "cycling-5",
            "Recovery Ride",
            "30-45 min",
            Beginner,
            "Easy spin for active recovery",
            vec![timed("Easy Spin (50-60% effort)", "30-45 min")],
        ),
        template(
            "cycling-6",
            "Sweet Spot Training",
            "50-60 min",
            Advanced,
            "High-intensity endurance building",
            vec![
                timed("Warm-up", "15 min"),
                intervals("Sweet Spot (85-90% FTP)", 3, "10 min", "5 min easy"),
                timed("Cool-down", "10 min"),
            ],
        ),
    ];

    CustomWorkouts {
        strength,
        running,
        cycling,
    }
}
