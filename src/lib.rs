use anyhow::{bail, Context, Result};
// Use anyhow::Result as standard Result for service layer
use chrono::{Local, NaiveDate, Utc};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// --- Declare modules ---
pub mod catalog;
pub mod completion;
mod config;
pub mod history;
pub mod preferences;
pub mod session;
pub mod store;

// --- Expose public types ---
pub use config::{
    get_config_path as get_config_path_util, load_config as load_config_util, parse_color,
    save_config as save_config_util, Config, ConfigError, StandardColor, TableStyle, WeightUnit,
};

pub use catalog::{
    Catalog, CatalogError, CustomWorkouts, Difficulty, Discipline, ExerciseKind,
    ExerciseTemplate, NewWorkout, ValidationError, WorkoutTemplate,
};
pub use completion::{
    recovery_advice, suggested_duration, CompletedWorkout, CompletionInput, Performance,
    RecoveryAdvice, MAX_RATING, MIN_RATING,
};
pub use history::{
    DisciplineFilter, History, HistoryError, HistoryFilter, HistorySummary,
};
pub use preferences::{Preferences, PreferencesError, Theme, LANGUAGES};
pub use session::{
    parse_count, Advance, ExerciseLog, Session, SessionError, SessionPhase, SetLog, SetUpdate,
};
pub use store::{get_store_path as get_store_path_util, KeyValueStore, SqliteStore, StoreError};

/// What `finish_session` hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedWorkout {
    pub record: CompletedWorkout,
    pub advice: RecoveryAdvice,
}

/// Application state: catalog, history, preferences and the session in progress,
/// loaded from the store once and written back after every change.
pub struct AppService {
    pub config: Config,
    pub store: SqliteStore,
    pub store_path: PathBuf,
    pub config_path: PathBuf,
    catalog: Catalog,
    history: History,
    preferences: Preferences,
    session: Option<Session>,
}

impl AppService {
    /// Initializes the application service.
    /// # Errors
    /// Returns `anyhow::Error` if config/store path determination, loading, or initialization fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load_config(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"))?;

        let store_path = store::get_store_path().context("Failed to determine store path")?;
        let store = SqliteStore::open(&store_path)
            .with_context(|| format!("Failed to open store at {store_path:?}"))?;

        Self::with_store(config, store, store_path, config_path)
    }

    /// Builds the service over an already opened store, reading every persisted entry.
    /// Entries that are missing or unreadable start from their defaults.
    /// # Errors
    /// Only when re-saving migrated history fails.
    pub fn with_store(
        config: Config,
        store: SqliteStore,
        store_path: PathBuf,
        config_path: PathBuf,
    ) -> Result<Self> {
        let custom: CustomWorkouts =
            store::load_json(&store, store::CUSTOM_WORKOUTS_KEY).unwrap_or_default();
        let records: Vec<CompletedWorkout> =
            store::load_json(&store, store::COMPLETED_WORKOUTS_KEY).unwrap_or_default();
        let (history, migrated) = History::from_records(records);
        let preferences = Preferences::from_stored(
            store::load_raw(&store, store::THEME_KEY).as_deref(),
            store::load_raw(&store, store::LANGUAGE_KEY).as_deref(),
        );
        let session = store::load_json::<Session>(&store, store::ACTIVE_SESSION_KEY).filter(|s| {
            let ok = s.is_consistent();
            if !ok {
                debug!("Ignoring stored session with inconsistent state");
            }
            ok
        });

        let service = Self {
            config,
            store,
            store_path,
            config_path,
            catalog: Catalog::new(custom),
            history,
            preferences,
            session,
        };
        if migrated {
            service.save_history()?;
        }
        Ok(service)
    }

    /// Gives the store back, e.g. to reopen a service over the same data.
    pub fn into_store(self) -> SqliteStore {
        self.store
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_store_path(&self) -> &Path {
        &self.store_path
    }

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save_config(&self.config_path, &self.config)
    }

    // --- Persistence helpers ---

    fn save_history(&self) -> Result<()> {
        store::save_json(&self.store, store::COMPLETED_WORKOUTS_KEY, self.history.records())
            .context("Failed to save workout history")
    }

    fn save_custom_workouts(&self) -> Result<()> {
        store::save_json(&self.store, store::CUSTOM_WORKOUTS_KEY, self.catalog.custom())
            .context("Failed to save custom workouts")
    }

    fn save_session(&self) -> Result<()> {
        match &self.session {
            Some(session) => store::save_json(&self.store, store::ACTIVE_SESSION_KEY, session)
                .context("Failed to save active session"),
            None => self
                .store
                .remove(store::ACTIVE_SESSION_KEY)
                .context("Failed to clear active session"),
        }
    }

    // --- Catalog ---

    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Built-in then custom templates for a discipline.
    pub fn list_templates(&self, discipline: Discipline) -> Vec<&WorkoutTemplate> {
        self.catalog.templates(discipline).collect()
    }

    /// # Errors
    /// `CatalogError::TemplateNotFound`.
    pub fn find_template(&self, id: &str) -> Result<(Discipline, &WorkoutTemplate), CatalogError> {
        self.catalog
            .find(id)
            .ok_or_else(|| CatalogError::TemplateNotFound(id.trim().to_string()))
    }

    /// Validates, stores and persists a custom workout.
    /// # Errors
    /// - `ValidationError` if a required field is missing (nothing is stored).
    /// - Store failures.
    pub fn create_custom_workout(&mut self, new: NewWorkout) -> Result<(Discipline, WorkoutTemplate)> {
        let (discipline, template) = self.catalog.add_custom(new, Utc::now())?;
        info!(id = %template.id, %discipline, "Custom workout created");
        self.save_custom_workouts()?;
        Ok((discipline, template))
    }

    /// # Errors
    /// - `CatalogError` for built-in or unknown ids.
    /// - Store failures.
    pub fn delete_custom_workout(&mut self, id: &str) -> Result<WorkoutTemplate> {
        let (discipline, removed) = self.catalog.remove_custom(id)?;
        info!(id = %removed.id, %discipline, "Custom workout deleted");
        self.save_custom_workouts()?;
        Ok(removed)
    }

    // --- Session ---

    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The running session.
    /// # Errors
    /// `SessionError::NoActiveSession`.
    pub fn active_session(&self) -> Result<&Session, SessionError> {
        self.session.as_ref().ok_or(SessionError::NoActiveSession)
    }

    /// Starts a session from a template.
    /// # Errors
    /// - `SessionError::SessionAlreadyActive` while another session exists.
    /// - `CatalogError::TemplateNotFound`, `SessionError::EmptyTemplate`.
    /// - Store failures.
    pub fn start_session(&mut self, template_id: &str) -> Result<&Session> {
        if let Some(existing) = &self.session {
            bail!(SessionError::SessionAlreadyActive(
                existing.template().id.clone()
            ));
        }
        let (discipline, template) = self.find_template(template_id)?;
        let session = Session::start(template.clone(), discipline, Utc::now())?;
        self.session = Some(session);
        self.save_session()?;
        self.active_session().map_err(Into::into)
    }

    // Runs one mutation on the active session and persists the result.
    fn with_session<T>(
        &mut self,
        op: impl FnOnce(&mut Session) -> Result<T, SessionError>,
    ) -> Result<T> {
        let session = self.session.as_mut().ok_or(SessionError::NoActiveSession)?;
        let value = op(session)?;
        self.save_session()?;
        Ok(value)
    }

    /// Edits a set of the current exercise. `set_index` is 0-based.
    /// # Errors
    /// `SessionError` variants or store failures.
    pub fn update_set(&mut self, set_index: usize, update: SetUpdate) -> Result<()> {
        self.with_session(|s| s.update_set(set_index, update))
    }

    /// # Errors
    /// `SessionError` variants or store failures.
    pub fn add_set(&mut self) -> Result<SetLog> {
        self.with_session(|s| s.add_set().cloned())
    }

    /// Returns `false` when the exercise is down to its last set.
    /// # Errors
    /// `SessionError` variants or store failures.
    pub fn remove_set(&mut self) -> Result<bool> {
        self.with_session(Session::remove_set)
    }

    /// # Errors
    /// `SessionError` variants or store failures.
    pub fn set_exercise_notes(&mut self, text: &str) -> Result<()> {
        self.with_session(|s| s.set_exercise_notes(text))
    }

    /// # Errors
    /// `SessionError` variants or store failures.
    pub fn advance(&mut self) -> Result<Advance> {
        self.with_session(Session::advance)
    }

    /// # Errors
    /// `SessionError` variants or store failures.
    pub fn retreat(&mut self) -> Result<usize> {
        self.with_session(Session::retreat)
    }

    /// # Errors
    /// `SessionError::NoActiveSession` or store failures.
    pub fn set_minimized(&mut self, minimized: bool) -> Result<()> {
        self.with_session(|s| {
            s.set_minimized(minimized);
            Ok(())
        })
    }

    /// # Errors
    /// `SessionError` variants or store failures.
    pub fn request_cancel(&mut self) -> Result<()> {
        self.with_session(Session::request_cancel)
    }

    /// # Errors
    /// `SessionError::NoActiveSession` or store failures.
    pub fn dismiss_cancel(&mut self) -> Result<()> {
        self.with_session(|s| {
            s.dismiss_cancel();
            Ok(())
        })
    }

    /// Discards the session after a prior `request_cancel`. Nothing is recorded.
    /// # Errors
    /// `SessionError::CancelNotRequested` (the session is kept), other `SessionError`
    /// variants, or store failures.
    pub fn confirm_cancel(&mut self) -> Result<()> {
        let session = self.session.as_mut().ok_or(SessionError::NoActiveSession)?;
        session.confirm_cancel()?;
        self.session = None;
        self.save_session()
    }

    /// Drops a completed session without recording it.
    /// # Errors
    /// `SessionError::NotCompleted` while it is still in progress, or store failures.
    pub fn discard_completed_session(&mut self) -> Result<()> {
        let session = self.active_session()?;
        session.finished_logs()?;
        info!(workout_id = %session.template().id, "Completed session discarded");
        self.session = None;
        self.save_session()
    }

    /// Records the completed session in history and clears it.
    /// # Errors
    /// - `SessionError::NoActiveSession` / `NotCompleted`.
    /// - Store failures. History is already updated in memory when that happens.
    pub fn finish_session(&mut self, input: CompletionInput) -> Result<FinishedWorkout> {
        let session = self.active_session()?;
        let logs = session.finished_logs()?.to_vec();
        let now = Utc::now();
        let record = completion::finalize(
            session.template(),
            session.discipline(),
            logs,
            input,
            now,
        );
        let advice = recovery_advice(session.discipline(), now.with_timezone(&Local).date_naive());

        self.history.append(record.clone());
        self.session = None;
        self.save_history()?;
        self.save_session()?;
        Ok(FinishedWorkout { record, advice })
    }

    /// Default duration text for the completion form.
    /// # Errors
    /// `SessionError::NoActiveSession`.
    pub fn suggested_duration(&self) -> Result<String, SessionError> {
        let session = self.active_session()?;
        Ok(suggested_duration(session.started_at(), Utc::now()))
    }

    // --- History ---

    pub const fn history(&self) -> &History {
        &self.history
    }

    /// Filtered history, newest first. Dates are local calendar days.
    pub fn list_history(&self, filter: &HistoryFilter) -> Vec<&CompletedWorkout> {
        history::sorted_by_recency(&self.history.filter(filter, &Local))
    }

    pub fn history_summary(&self) -> HistorySummary {
        self.history.summary()
    }

    /// Local calendar days with at least one recorded workout.
    pub fn activity_dates(&self) -> BTreeSet<NaiveDate> {
        history::distinct_calendar_dates(self.history.records(), &Local)
    }

    /// Deletes a record by id or unique id prefix.
    /// # Errors
    /// `HistoryError` variants or store failures.
    pub fn delete_history_record(&mut self, identifier: &str) -> Result<CompletedWorkout> {
        let removed = self.history.delete(identifier)?;
        self.save_history()?;
        Ok(removed)
    }

    /// Deletes by position in the unfiltered history.
    /// # Errors
    /// `HistoryError::PositionOutOfRange` or store failures.
    pub fn delete_history_at(&mut self, position: usize) -> Result<CompletedWorkout> {
        let removed = self.history.delete_at(position)?;
        self.save_history()?;
        Ok(removed)
    }

    // --- Preferences ---

    pub const fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// # Errors
    /// Store failures; the theme is already changed in memory then.
    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.preferences.theme = theme;
        self.store
            .set(store::THEME_KEY, theme.as_str())
            .context("Failed to save theme")
    }

    /// # Errors
    /// `PreferencesError::EmptyLanguage` or store failures.
    pub fn set_language(&mut self, code: &str) -> Result<()> {
        self.preferences.language = preferences::validate_language(code)?;
        self.store
            .set(store::LANGUAGE_KEY, &self.preferences.language)
            .context("Failed to save language")
    }
}
