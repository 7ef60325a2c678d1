use anyhow::Result;
use assert_matches::assert_matches;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use workout_hub_lib::completion::finalize;
use workout_hub_lib::history::{distinct_calendar_dates, sorted_by_recency};
use workout_hub_lib::{
    recovery_advice, suggested_duration, Catalog, CompletedWorkout, CompletionInput,
    CustomWorkouts, Discipline, DisciplineFilter, ExerciseKind, ExerciseLog, ExerciseTemplate,
    History, HistoryError, HistoryFilter, Performance, Preferences, PreferencesError, SetLog,
    Theme,
};

fn at(timestamp: &str) -> DateTime<Utc> {
    timestamp.parse().expect("valid RFC 3339 timestamp")
}

fn record(id: &str, discipline: Discipline, completed_at: &str) -> CompletedWorkout {
    CompletedWorkout {
        id: id.to_string(),
        workout_id: format!("{discipline}-1"),
        workout_title: format!("{} workout", discipline.label()),
        workout_type: discipline,
        completed_at: at(completed_at),
        notes: None,
        performance: None,
        exercise_logs: None,
    }
}

fn history_of(records: Vec<CompletedWorkout>) -> History {
    let (history, migrated) = History::from_records(records);
    assert!(!migrated);
    history
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn test_filter_by_discipline() {
    let history = history_of(vec![
        record("aaaa-1", Discipline::Strength, "2024-03-01T10:00:00Z"),
        record("bbbb-1", Discipline::Running, "2024-03-02T10:00:00Z"),
        record("cccc-1", Discipline::Strength, "2024-03-03T10:00:00Z"),
    ]);

    let strength = history.filter(
        &HistoryFilter {
            discipline: DisciplineFilter::Only(Discipline::Strength),
            on_date: None,
        },
        &Utc,
    );
    assert_eq!(strength.len(), 2);
    assert!(strength.iter().all(|r| r.workout_type == Discipline::Strength));

    let all = history.filter(&HistoryFilter::default(), &Utc);
    assert_eq!(all.len(), 3);

    let cycling = history.filter(
        &HistoryFilter {
            discipline: DisciplineFilter::try_from("cycling").expect("known discipline"),
            on_date: None,
        },
        &Utc,
    );
    assert!(cycling.is_empty());
}

#[test]
fn test_filter_by_calendar_date() {
    let history = history_of(vec![
        record("aaaa-1", Discipline::Strength, "2024-03-01T10:00:00Z"),
        record("bbbb-1", Discipline::Running, "2024-03-02T10:00:00Z"),
    ]);

    let on_first = history.filter(
        &HistoryFilter {
            discipline: DisciplineFilter::All,
            on_date: Some(date(2024, 3, 1)),
        },
        &Utc,
    );
    assert_eq!(on_first.len(), 1);
    assert_eq!(on_first[0].id, "aaaa-1");

    let running_on_first = history.filter(
        &HistoryFilter {
            discipline: DisciplineFilter::Only(Discipline::Running),
            on_date: Some(date(2024, 3, 1)),
        },
        &Utc,
    );
    assert!(running_on_first.is_empty());
}

#[test]
fn test_delete_first_position_keeps_order() -> Result<()> {
    let mut history = history_of(vec![
        record("aaaa-1", Discipline::Strength, "2024-03-01T10:00:00Z"),
        record("bbbb-1", Discipline::Running, "2024-03-02T10:00:00Z"),
        record("cccc-1", Discipline::Cycling, "2024-03-03T10:00:00Z"),
    ]);

    let removed = history.delete_at(0)?;
    assert_eq!(removed.id, "aaaa-1");
    let ids: Vec<&str> = history.records().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["bbbb-1", "cccc-1"]);

    assert_matches!(
        history.delete_at(2),
        Err(HistoryError::PositionOutOfRange { position: 2, len: 2 })
    );
    Ok(())
}

#[test]
fn test_position_of_resolves_filtered_record() {
    let history = history_of(vec![
        record("aaaa-1", Discipline::Strength, "2024-03-01T10:00:00Z"),
        record("bbbb-1", Discipline::Running, "2024-03-02T10:00:00Z"),
        record("cccc-1", Discipline::Running, "2024-03-03T10:00:00Z"),
    ]);
    let running = history.filter(
        &HistoryFilter {
            discipline: DisciplineFilter::Only(Discipline::Running),
            on_date: None,
        },
        &Utc,
    );
    assert_eq!(history.position_of(running[1]), Some(2));
    assert_eq!(
        history.position_of(&record("zzzz-1", Discipline::Running, "2024-03-03T10:00:00Z")),
        None
    );
}

#[test]
fn test_resolve_and_delete_by_id() -> Result<()> {
    let mut history = history_of(vec![
        record("abcd-1111", Discipline::Strength, "2024-03-01T10:00:00Z"),
        record("abcd-2222", Discipline::Running, "2024-03-02T10:00:00Z"),
        record("ef01-3333", Discipline::Cycling, "2024-03-03T10:00:00Z"),
    ]);

    assert_eq!(history.resolve("abcd-2222")?.workout_type, Discipline::Running);
    assert_eq!(history.resolve("ef01")?.id, "ef01-3333");
    assert_matches!(history.resolve("abcd"), Err(HistoryError::AmbiguousIdentifier(_)));
    assert_matches!(history.resolve("ef"), Err(HistoryError::NotFound(_)));
    assert_matches!(history.resolve("9999"), Err(HistoryError::NotFound(_)));

    let removed = history.delete("abcd-1")?;
    assert_eq!(removed.id, "abcd-1111");
    // Now unique
    assert_eq!(history.resolve("abcd")?.id, "abcd-2222");
    assert_eq!(history.len(), 2);
    Ok(())
}

#[test]
fn test_sorted_by_recency_is_stable() {
    let history = history_of(vec![
        record("aaaa-1", Discipline::Strength, "2024-03-01T10:00:00Z"),
        record("bbbb-1", Discipline::Running, "2024-03-05T10:00:00Z"),
        record("cccc-1", Discipline::Cycling, "2024-03-01T10:00:00Z"),
        record("dddd-1", Discipline::Running, "2024-03-03T10:00:00Z"),
    ]);
    let all = history.filter(&HistoryFilter::default(), &Utc);
    let sorted = sorted_by_recency(&all);
    let ids: Vec<&str> = sorted.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["bbbb-1", "dddd-1", "aaaa-1", "cccc-1"]);
}

#[test]
fn test_counts_ignore_filters() {
    let history = history_of(vec![
        record("aaaa-1", Discipline::Strength, "2024-03-01T10:00:00Z"),
        record("bbbb-1", Discipline::Running, "2024-03-02T10:00:00Z"),
        record("cccc-1", Discipline::Strength, "2024-03-03T10:00:00Z"),
    ]);
    assert_eq!(history.count_by_discipline(Discipline::Strength), 2);
    assert_eq!(history.count_by_discipline(Discipline::Cycling), 0);

    let summary = history.summary();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.strength, 2);
    assert_eq!(summary.running, 1);
    assert_eq!(summary.cycling, 0);
}

#[test]
fn test_distinct_calendar_dates() {
    let history = history_of(vec![
        record("aaaa-1", Discipline::Strength, "2024-03-02T08:00:00Z"),
        record("bbbb-1", Discipline::Running, "2024-03-01T10:00:00Z"),
        record("cccc-1", Discipline::Cycling, "2024-03-02T19:00:00Z"),
    ]);
    let dates: Vec<NaiveDate> = distinct_calendar_dates(history.records(), &Utc)
        .into_iter()
        .collect();
    assert_eq!(dates, [date(2024, 3, 1), date(2024, 3, 2)]);
}

#[test]
fn test_records_round_trip_through_json() -> Result<()> {
    let mut detailed = record("aaaa-1", Discipline::Strength, "2024-03-01T10:00:00.123Z");
    detailed.notes = Some("new PR".to_string());
    detailed.performance = Some(Performance {
        rating: Some(5),
        duration: Some("48 min".to_string()),
    });
    detailed.exercise_logs = Some(vec![ExerciseLog {
        name: "Bench Press".to_string(),
        sets: vec![SetLog {
            set_number: 1,
            reps: 8,
            weight: 185,
            completed: true,
            failed: false,
        }],
        notes: Some("paused reps".to_string()),
    }]);
    let records = vec![
        detailed,
        record("bbbb-1", Discipline::Running, "2024-03-02T10:00:00Z"),
    ];

    let json = serde_json::to_string(&records)?;
    assert!(json.contains("\"workoutType\":\"strength\""));
    assert!(json.contains("\"setNumber\":1"));
    let reloaded: Vec<CompletedWorkout> = serde_json::from_str(&json)?;
    assert_eq!(reloaded, records);
    Ok(())
}

#[test]
fn test_legacy_records_get_ids() {
    let mut legacy = record("", Discipline::Cycling, "2024-03-01T10:00:00Z");
    legacy.notes = Some("windy".to_string());
    let (history, migrated) = History::from_records(vec![
        legacy.clone(),
        record("keep-me", Discipline::Running, "2024-03-02T10:00:00Z"),
    ]);
    assert!(migrated);
    let first = &history.records()[0];
    assert!(!first.id.is_empty());
    assert_eq!(
        CompletedWorkout {
            id: String::new(),
            ..first.clone()
        },
        legacy
    );
    assert_eq!(history.records()[1].id, "keep-me");
}

#[test]
fn test_finalize_normalizes_input() -> Result<()> {
    let catalog = Catalog::default();
    let (discipline, template) = catalog
        .find("running-3")
        .ok_or_else(|| anyhow::anyhow!("missing template"))?;
    let now = at("2024-03-01T18:30:00Z");

    let blank = finalize(
        template,
        discipline,
        vec![],
        CompletionInput {
            rating: Some(0),
            duration: Some("  ".to_string()),
            notes: Some(String::new()),
        },
        now,
    );
    assert_eq!(blank.workout_id, "running-3");
    assert_eq!(blank.workout_type, Discipline::Running);
    assert_eq!(blank.completed_at, now);
    assert_eq!(blank.notes, None);
    assert_eq!(blank.performance, Some(Performance::default()));
    assert_eq!(blank.exercise_logs, Some(vec![]));

    let rated = finalize(
        template,
        discipline,
        vec![],
        CompletionInput {
            rating: Some(3),
            duration: Some("25 min".to_string()),
            notes: Some("legs heavy".to_string()),
        },
        now,
    );
    assert_ne!(rated.id, blank.id);
    assert_eq!(rated.notes.as_deref(), Some("legs heavy"));
    assert_eq!(rated.performance.as_ref().and_then(|p| p.rating), Some(3));
    Ok(())
}

#[test]
fn test_recovery_advice_per_discipline() {
    let today = date(2024, 3, 1);
    let strength = recovery_advice(Discipline::Strength, today);
    assert_eq!(strength.rest_days, 2);
    assert_eq!(strength.next_session, date(2024, 3, 3));

    for discipline in [Discipline::Running, Discipline::Cycling] {
        let advice = recovery_advice(discipline, today);
        assert_eq!(advice.rest_days, 1);
        assert_eq!(advice.next_session, today + Duration::days(1));
        assert!(!advice.message.is_empty() && !advice.tip.is_empty());
    }
}

#[test]
fn test_suggested_duration() {
    let start = at("2024-03-01T10:00:00Z");
    assert_eq!(suggested_duration(start, start + Duration::minutes(42)), "42 min");
    assert_eq!(suggested_duration(start, start + Duration::seconds(20)), "1 min");
}

#[test]
fn test_exercise_shape_from_stored_json() -> Result<()> {
    let json = r#"{
        "strength": [{"id":"custom-1","title":"Mine","description":"Custom workout",
            "duration":"20 min","difficulty":"Beginner","exercises":[
                {"name":"Squats","reps":"8-10","rest":"90 sec"},
                {"name":"Rows","sets":4,"reps":"10"}]}],
        "running": [{"id":"custom-2","title":"Run","description":"x","duration":"30 min",
            "difficulty":"Advanced","exercises":[
                {"name":"Intervals","sets":6,"duration":"1 min"},
                {"name":"Jog","duration":"10 min"}]}]
    }"#;
    let custom: CustomWorkouts = serde_json::from_str(json)?;
    assert!(custom.cycling.is_empty());

    let squats = &custom.strength[0].exercises[0];
    assert_eq!(
        squats.kind,
        ExerciseKind::RepBased {
            sets: 3,
            reps: "8-10".to_string()
        }
    );
    assert_eq!(squats.rest.as_deref(), Some("90 sec"));
    assert_eq!(custom.strength[0].exercises[1].set_count(), 4);

    let intervals = &custom.running[0].exercises[0];
    assert_eq!(intervals.prescription(), "6 x 1 min");
    assert_eq!(intervals.set_count(), 6);
    assert_eq!(custom.running[0].exercises[1].duration_text(), Some("10 min"));

    // Written back in the same flat shape
    let rewritten = serde_json::to_value(&custom)?;
    assert_eq!(rewritten["running"][0]["exercises"][1]["duration"], "10 min");
    assert!(rewritten["running"][0]["exercises"][1].get("reps").is_none());
    assert_eq!(rewritten["strength"][0]["exercises"][0]["sets"], 3);

    let catalog = Catalog::new(custom);
    assert_eq!(catalog.templates(Discipline::Strength).count(), 7);
    assert_eq!(catalog.find("custom-2").map(|(d, _)| d), Some(Discipline::Running));
    Ok(())
}

#[test]
fn test_exercise_prescriptions() {
    assert_eq!(
        ExerciseTemplate::rep_based("Squats", 4, "6-8", None).prescription(),
        "4 x 6-8"
    );
    assert_eq!(
        ExerciseTemplate::time_based("Jog", "5 min", None, None).prescription(),
        "5 min"
    );
}

#[test]
fn test_theme_parsing_and_preferences_defaults() {
    assert_eq!(Theme::try_from("dark"), Ok(Theme::Dark));
    assert_eq!(Theme::try_from("light"), Ok(Theme::Light));
    assert_matches!(Theme::try_from("Dark"), Err(PreferencesError::InvalidTheme(_)));

    assert_eq!(Preferences::from_stored(None, None), Preferences::default());
    let stored = Preferences::from_stored(Some("dark"), Some("de"));
    assert_eq!(stored.theme, Theme::Dark);
    assert_eq!(stored.language_name(), Some("Deutsch"));
    assert!(!stored.is_translated());

    let bogus = Preferences::from_stored(Some("sepia"), Some(""));
    assert_eq!(bogus, Preferences::default());
    assert!(bogus.is_translated());
}
