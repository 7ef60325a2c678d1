// src/cli.rs
use chrono::{Duration, Local, NaiveDate};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;
use workout_hub_lib::{Difficulty, Discipline, ExerciseTemplate, Theme, MAX_RATING, MIN_RATING};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run guided strength, running and cycling workouts and keep their history", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisciplineCli {
    Strength,
    Running,
    Cycling,
}

impl From<DisciplineCli> for Discipline {
    fn from(value: DisciplineCli) -> Self {
        match value {
            DisciplineCli::Strength => Self::Strength,
            DisciplineCli::Running => Self::Running,
            DisciplineCli::Cycling => Self::Cycling,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryDisciplineCli {
    All,
    Strength,
    Running,
    Cycling,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DifficultyCli {
    Beginner,
    Intermediate,
    Advanced,
}

impl From<DifficultyCli> for Difficulty {
    fn from(value: DifficultyCli) -> Self {
        match value {
            DifficultyCli::Beginner => Self::Beginner,
            DifficultyCli::Intermediate => Self::Intermediate,
            DifficultyCli::Advanced => Self::Advanced,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeCli {
    Light,
    Dark,
}

impl From<ThemeCli> for Theme {
    fn from(value: ThemeCli) -> Self {
        match value {
            ThemeCli::Light => Self::Light,
            ThemeCli::Dark => Self::Dark,
        }
    }
}

// Custom parser for date strings and shorthands (local calendar days)
pub fn parse_date_shorthand(s: &str) -> Result<NaiveDate, String> {
    let today = Local::now().date_naive();
    match s.to_lowercase().as_str() {
        "today" => Ok(today),
        "yesterday" => Ok(today - Duration::days(1)),
        _ => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%d.%m.%Y"))
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
            .map_err(|_| {
                format!(
                    "Invalid date format: '{s}'. Use 'today', 'yesterday', YYYY-MM-DD, DD.MM.YYYY, or YYYY/MM/DD."
                )
            }),
    }
}

fn optional_field(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|f| !f.is_empty())
}

/// Parses one `--exercise` value.
///
/// `name|sets|reps[|rest]` gives a rep-based exercise when `sets` is a whole number,
/// otherwise `name|duration[|rest]` gives a time-based one. Empty names are left
/// for workout validation to report.
pub fn parse_exercise(s: &str) -> Result<ExerciseTemplate, String> {
    let parts: Vec<&str> = s.split('|').map(str::trim).collect();
    let name = parts[0];
    match parts.as_slice() {
        [_, sets, reps] | [_, sets, reps, _] if sets.parse::<u32>().is_ok() => {
            let sets = sets.parse::<u32>().map_err(|e| e.to_string())?;
            if reps.is_empty() {
                return Err(format!("Exercise '{name}' needs a reps target after the set count."));
            }
            Ok(ExerciseTemplate::rep_based(
                name,
                sets,
                reps,
                optional_field(parts.get(3).copied()),
            ))
        }
        [_, duration] | [_, duration, _] if !duration.is_empty() => Ok(ExerciseTemplate::time_based(
            name,
            duration,
            None,
            optional_field(parts.get(2).copied()),
        )),
        _ => Err(format!(
            "Invalid exercise '{s}'. Use 'name|sets|reps|rest' or 'name|duration|rest'."
        )),
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List workout templates (built-in and custom)
    Workouts {
        /// Only show one discipline
        #[arg(short, long, value_enum)]
        discipline: Option<DisciplineCli>,
    },
    /// Show the exercises of a workout template
    Show {
        /// Template id (e.g. strength-1)
        id: String,
    },
    /// Create a custom workout template
    CreateWorkout {
        #[arg(short, long, value_enum)]
        discipline: DisciplineCli,
        #[arg(short, long)]
        title: String,
        /// Estimated duration, free text (e.g. "45 min")
        #[arg(long)]
        duration: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, value_enum, default_value_t = DifficultyCli::Beginner)]
        difficulty: DifficultyCli,
        /// Repeatable: "name|sets|reps|rest" or "name|duration|rest"
        #[arg(short, long = "exercise", value_parser = parse_exercise)]
        exercises: Vec<ExerciseTemplate>,
    },
    /// Delete a custom workout template
    DeleteWorkout { id: String },
    /// Start a guided session from a template
    Start { id: String },
    /// Show the active session
    Session,
    /// Edit a set of the current exercise (1-based)
    Set {
        number: usize,
        /// Reps performed; non-numeric input counts as 0
        #[arg(short, long)]
        reps: Option<String>,
        /// Weight used; non-numeric input counts as 0
        #[arg(short, long)]
        weight: Option<String>,
        #[arg(long, conflicts_with_all = ["failed", "clear"])]
        done: bool,
        #[arg(long, conflicts_with = "clear")]
        failed: bool,
        /// Clear the done/failed marks
        #[arg(long)]
        clear: bool,
    },
    /// Add a set to the current exercise
    AddSet,
    /// Remove the last set of the current exercise
    RemoveSet,
    /// Attach notes to the current exercise (empty text clears them)
    Notes { text: String },
    /// Go to the next exercise (completes the session after the last one)
    Next,
    /// Go back one exercise
    Prev,
    /// Hide the session view (the session keeps running)
    Minimize,
    /// Show the session view again
    Restore,
    /// Cancel the active session, discarding its logs
    Cancel {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Record the completed session
    Finish {
        /// Rating from 1 to 5
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(i64::from(MIN_RATING)..=i64::from(MAX_RATING)))]
        rating: Option<u8>,
        /// Actual duration, free text (defaults to elapsed time)
        #[arg(short, long)]
        duration: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
        /// Drop the completed session instead of recording it
        #[arg(long, conflicts_with_all = ["rating", "duration", "notes"])]
        discard: bool,
    },
    /// List recorded workouts, newest first
    History {
        #[arg(short, long, value_enum, default_value_t = HistoryDisciplineCli::All)]
        discipline: HistoryDisciplineCli,
        /// Only workouts on this day ('today', 'yesterday', YYYY-MM-DD, DD.MM.YYYY, YYYY/MM/DD)
        #[arg(long, value_parser = parse_date_shorthand)]
        date: Option<NaiveDate>,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Totals per discipline
    Stats,
    /// Days with at least one recorded workout
    Dates,
    /// Delete a recorded workout by id (or unique id prefix)
    Delete { id: String },
    /// Export history as CSV
    ExportCsv {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show or change theme and language
    Settings {
        #[arg(long, value_enum)]
        theme: Option<ThemeCli>,
        /// Language code (en, es, fr, de, pt)
        #[arg(long)]
        language: Option<String>,
    },
    /// Show the path to the store file
    StorePath,
    /// Show the path to the config file
    ConfigPath,
    /// Generate shell completion scripts
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
