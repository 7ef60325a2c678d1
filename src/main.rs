//src/main.rs
mod cli; // Keep cli module for parsing args

use anyhow::{bail, Context, Result};
use chrono::Local;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use std::fs::File;
use std::io::{self, stdin, stdout, Write};
use tracing_subscriber::EnvFilter;

use workout_hub_lib::{
    parse_count, Advance, AppService, CompletedWorkout, CompletionInput, Discipline,
    DisciplineFilter, HistoryFilter, NewWorkout, Session, SetUpdate, WeightUnit, WorkoutTemplate,
    LANGUAGES, MAX_RATING,
};

const LOG_ENV_VAR: &str = "WORKOUT_HUB_LOG";
const SHORT_ID_LEN: usize = 8;

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli_args = cli::parse_args();

    // Completion scripts need no service
    if let cli::Commands::Completions { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();
        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    // Loads config and every stored entry
    let mut service =
        AppService::initialize().context("Failed to initialize application service")?;
    let header_color = service.config.table.header_color();
    let unit = service.config.weight_unit;

    match cli_args.command {
        cli::Commands::Completions { .. } => {
            unreachable!("Completion generation should have exited already");
        }

        // --- Catalog Commands ---
        cli::Commands::Workouts { discipline } => {
            let disciplines: Vec<Discipline> = match discipline {
                Some(d) => vec![d.into()],
                None => vec![Discipline::Strength, Discipline::Running, Discipline::Cycling],
            };
            for d in disciplines {
                println!("{} workouts:", d.label());
                print_template_table(&service.list_templates(d), header_color);
            }
        }
        cli::Commands::Show { id } => {
            let (discipline, template) = service.find_template(&id)?;
            print_template_detail(template, discipline, header_color);
        }
        cli::Commands::CreateWorkout {
            discipline,
            title,
            duration,
            description,
            difficulty,
            exercises,
        } => {
            let new = NewWorkout {
                discipline: Some(discipline.into()),
                title,
                description,
                duration,
                difficulty: difficulty.into(),
                exercises,
            };
            match service.create_custom_workout(new) {
                Ok((d, template)) => println!(
                    "Created {} workout '{}' with {} exercise(s). ID: {}",
                    d,
                    template.title,
                    template.exercises.len(),
                    template.id
                ),
                Err(e) => bail!("Error creating workout: {}", e),
            }
        }
        cli::Commands::DeleteWorkout { id } => match service.delete_custom_workout(&id) {
            Ok(removed) => println!("Deleted custom workout '{}' ({}).", removed.title, removed.id),
            Err(e) => bail!("Error deleting workout '{}': {}", id, e),
        },

        // --- Session Commands ---
        cli::Commands::Start { id } => {
            let session = service.start_session(&id)?;
            println!("Started '{}'.", session.template().title);
            print_session(session, header_color, unit);
        }
        cli::Commands::Session => {
            let session = service.active_session()?;
            if session.is_minimized() {
                print_session_banner(session);
            } else {
                print_session(session, header_color, unit);
            }
        }
        cli::Commands::Set {
            number,
            reps,
            weight,
            done,
            failed,
            clear,
        } => {
            if number == 0 {
                bail!("Set numbers start at 1.");
            }
            let index = number - 1;
            let mut updates = Vec::new();
            if let Some(r) = reps {
                updates.push(SetUpdate::Reps(parse_count(&r)));
            }
            if let Some(w) = weight {
                updates.push(SetUpdate::Weight(parse_count(&w)));
            }
            if done {
                updates.push(SetUpdate::Completed(true));
            }
            if failed {
                updates.push(SetUpdate::Failed(true));
            }
            if clear {
                updates.push(SetUpdate::Completed(false));
                updates.push(SetUpdate::Failed(false));
            }
            if updates.is_empty() {
                bail!("Nothing to change. Use --reps, --weight, --done, --failed or --clear.");
            }
            for update in updates {
                service.update_set(index, update)?;
            }
            print_session(service.active_session()?, header_color, unit);
        }
        cli::Commands::AddSet => {
            let set = service.add_set()?;
            println!("Added set {}.", set.set_number);
            print_session(service.active_session()?, header_color, unit);
        }
        cli::Commands::RemoveSet => {
            if service.remove_set()? {
                print_session(service.active_session()?, header_color, unit);
            } else {
                println!("An exercise keeps at least one set.");
            }
        }
        cli::Commands::Notes { text } => {
            service.set_exercise_notes(&text)?;
            if text.trim().is_empty() {
                println!("Exercise notes cleared.");
            } else {
                println!("Exercise notes saved.");
            }
        }
        cli::Commands::Next => match service.advance()? {
            Advance::Moved { .. } => print_session(service.active_session()?, header_color, unit),
            Advance::Finished(logs) => {
                let completed: usize = logs.iter().map(|l| l.completed_sets()).sum();
                let failed: usize = logs.iter().map(|l| l.failed_sets()).sum();
                let total: usize = logs.iter().map(|l| l.sets.len()).sum();
                println!("Workout complete! {completed}/{total} sets done, {failed} failed.");
                println!(
                    "Record it with 'finish' (suggested duration: {}), or drop it with 'finish --discard'.",
                    service.suggested_duration()?
                );
            }
        },
        cli::Commands::Prev => {
            service.retreat()?;
            print_session(service.active_session()?, header_color, unit);
        }
        cli::Commands::Minimize => {
            service.set_minimized(true)?;
            print_session_banner(service.active_session()?);
        }
        cli::Commands::Restore => {
            service.set_minimized(false)?;
            print_session(service.active_session()?, header_color, unit);
        }
        cli::Commands::Cancel { yes } => {
            service.request_cancel()?;
            if yes || prompt_yes_no("Cancel this workout? All logged sets will be lost.")? {
                service.confirm_cancel()?;
                println!("Workout cancelled.");
            } else {
                service.dismiss_cancel()?;
                println!("Keeping the workout.");
            }
        }
        cli::Commands::Finish {
            rating,
            duration,
            notes,
            discard,
        } => {
            if discard {
                service.discard_completed_session()?;
                println!("Completed workout discarded.");
                return Ok(());
            }
            let duration = match duration {
                Some(d) => Some(d),
                None => Some(service.suggested_duration()?),
            };
            let finished = service.finish_session(CompletionInput {
                rating,
                duration,
                notes,
            })?;
            println!(
                "Saved '{}' ({}).",
                finished.record.workout_title,
                short_id(&finished.record.id)
            );
            if service.config.show_recovery_advice {
                let advice = finished.advice;
                println!("Recovery: {}", advice.message);
                println!("Tip: {}", advice.tip);
                println!("Next session: {}", advice.next_session.format("%A, %Y-%m-%d"));
            }
        }

        // --- History Commands ---
        cli::Commands::History {
            discipline,
            date,
            limit,
        } => {
            let filter = HistoryFilter {
                discipline: history_filter(discipline),
                on_date: date,
            };
            let mut records = service.list_history(&filter);
            if let Some(n) = limit {
                records.truncate(n);
            }
            if records.is_empty() {
                println!("No workouts recorded for this filter.");
            } else {
                print_history_table(&records, header_color);
            }
        }
        cli::Commands::Stats => {
            let summary = service.history_summary();
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec![
                    Cell::new("Total").fg(header_color),
                    Cell::new("Strength").fg(header_color),
                    Cell::new("Running").fg(header_color),
                    Cell::new("Cycling").fg(header_color),
                ])
                .add_row(vec![
                    summary.total.to_string(),
                    summary.strength.to_string(),
                    summary.running.to_string(),
                    summary.cycling.to_string(),
                ]);
            println!("{table}");
        }
        cli::Commands::Dates => {
            let dates = service.activity_dates();
            if dates.is_empty() {
                println!("No workouts recorded yet.");
            }
            for date in dates {
                println!("{}", date.format("%Y-%m-%d"));
            }
        }
        cli::Commands::Delete { id } => match service.delete_history_record(&id) {
            Ok(removed) => println!(
                "Deleted '{}' from {}.",
                removed.workout_title,
                removed
                    .completed_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
            ),
            Err(e) => bail!("Error deleting workout record '{}': {}", id, e),
        },
        cli::Commands::ExportCsv { output } => {
            let records = service.list_history(&HistoryFilter::default());
            let sink: Box<dyn Write> = match &output {
                Some(path) => Box::new(
                    File::create(path)
                        .with_context(|| format!("Failed to create {}", path.display()))?,
                ),
                None => Box::new(stdout()),
            };
            write_history_csv(sink, &records)?;
            if let Some(path) = output {
                eprintln!("Exported {} workout(s) to {}", records.len(), path.display());
            }
        }

        // --- Settings ---
        cli::Commands::Settings { theme, language } => {
            if let Some(t) = theme {
                service.set_theme(t.into())?;
            }
            if let Some(code) = language {
                service.set_language(&code)?;
            }
            let prefs = service.preferences();
            println!("Theme: {}", prefs.theme);
            match prefs.language_name() {
                Some(name) => println!("Language: {} ({})", name, prefs.language),
                None => println!("Language: {}", prefs.language),
            }
            if !prefs.is_translated() {
                println!("Note: output is only available in English for now.");
            }
            let known: Vec<&str> = LANGUAGES.iter().map(|(code, _)| *code).collect();
            println!("Available languages: {}", known.join(", "));
        }
        cli::Commands::StorePath => {
            println!("Store file is located at: {:?}", service.get_store_path());
        }
        cli::Commands::ConfigPath => {
            println!("Config file is located at: {:?}", service.get_config_path());
        }
    }

    Ok(())
}

fn history_filter(choice: cli::HistoryDisciplineCli) -> DisciplineFilter {
    match choice {
        cli::HistoryDisciplineCli::All => DisciplineFilter::All,
        cli::HistoryDisciplineCli::Strength => DisciplineFilter::Only(Discipline::Strength),
        cli::HistoryDisciplineCli::Running => DisciplineFilter::Only(Discipline::Running),
        cli::HistoryDisciplineCli::Cycling => DisciplineFilter::Only(Discipline::Cycling),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

/// Asks a yes/no question on stdin; anything but y/yes is a no.
fn prompt_yes_no(question: &str) -> Result<bool> {
    print!("{question} [y/N]: ");
    stdout().flush()?;
    let mut input = String::new();
    stdin().read_line(&mut input)?;
    let answer = input.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

// --- Table Printing Functions ---

fn print_template_table(templates: &[&WorkoutTemplate], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Title").fg(header_color),
            Cell::new("Duration").fg(header_color),
            Cell::new("Difficulty").fg(header_color),
            Cell::new("Exercises").fg(header_color),
            Cell::new("Description").fg(header_color),
        ]);
    for template in templates {
        let title = if template.is_custom() {
            format!("{} (custom)", template.title)
        } else {
            template.title.clone()
        };
        table.add_row(vec![
            Cell::new(&template.id),
            Cell::new(title),
            Cell::new(&template.duration),
            Cell::new(template.difficulty.to_string()),
            Cell::new(template.exercises.len().to_string()),
            Cell::new(&template.description),
        ]);
    }
    println!("{table}");
}

fn print_template_detail(template: &WorkoutTemplate, discipline: Discipline, header_color: Color) {
    println!(
        "{} [{}] - {} - {} - {}",
        template.title,
        template.id,
        discipline.label(),
        template.duration,
        template.difficulty
    );
    println!("{}", template.description);
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("#").fg(header_color),
            Cell::new("Exercise").fg(header_color),
            Cell::new("Target").fg(header_color),
            Cell::new("Rest").fg(header_color),
        ]);
    for (i, exercise) in template.exercises.iter().enumerate() {
        table.add_row(vec![
            Cell::new((i + 1).to_string()),
            Cell::new(&exercise.name),
            Cell::new(exercise.prescription()),
            Cell::new(exercise.rest.as_deref().unwrap_or("-")),
        ]);
    }
    println!("{table}");
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(fraction: f64) -> u32 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u32
}

fn print_session_banner(session: &Session) {
    println!(
        "{} (minimized): exercise {}/{}, {}% done. Use 'restore' to continue.",
        session.template().title,
        session.current_index() + 1,
        session.exercise_count(),
        percent(session.overall_progress())
    );
}

fn print_session(session: &Session, header_color: Color, unit: WeightUnit) {
    let Some(log) = session.current_exercise() else {
        println!("The session has no exercises left.");
        return;
    };
    println!(
        "{} - exercise {}/{} - overall {}%",
        session.template().title,
        session.current_index() + 1,
        session.exercise_count(),
        percent(session.overall_progress())
    );
    print!("{}", log.name);
    if let Some(target) = session.current_template_exercise() {
        print!(" - target {}", target.prescription());
        if let Some(rest) = &target.rest {
            print!(", rest {rest}");
        }
    }
    println!(" ({}% of sets done)", percent(session.exercise_progress()));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec![
            Cell::new("Set").fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new(format!("Weight ({unit})")).fg(header_color),
            Cell::new("Status").fg(header_color),
        ]);
    for set in &log.sets {
        let status = if set.completed {
            Cell::new("done").fg(Color::Green)
        } else if set.failed {
            Cell::new("failed").fg(Color::Red)
        } else {
            Cell::new("-")
        };
        table.add_row(vec![
            Cell::new(set.set_number.to_string()),
            Cell::new(set.reps.to_string()),
            Cell::new(set.weight.to_string()),
            status,
        ]);
    }
    println!("{table}");
    if let Some(notes) = &log.notes {
        println!("Notes: {notes}");
    }
    if session.is_last_exercise() {
        println!("Last exercise. 'next' completes the workout.");
    }
}

fn rating_stars(rating: Option<u8>) -> String {
    rating.map_or_else(
        || "-".to_string(),
        |r| {
            let filled = usize::from(r.min(MAX_RATING));
            format!(
                "{}{}",
                "★".repeat(filled),
                "☆".repeat(usize::from(MAX_RATING) - filled)
            )
        },
    )
}

fn print_history_table(records: &[&CompletedWorkout], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Completed").fg(header_color),
            Cell::new("Workout").fg(header_color),
            Cell::new("Type").fg(header_color),
            Cell::new("Rating").fg(header_color),
            Cell::new("Duration").fg(header_color),
            Cell::new("Notes").fg(header_color),
        ]);
    for record in records {
        let performance = record.performance.as_ref();
        table.add_row(vec![
            Cell::new(short_id(&record.id)).add_attribute(Attribute::Dim),
            Cell::new(
                record
                    .completed_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
            ),
            Cell::new(&record.workout_title),
            Cell::new(record.workout_type.label()),
            Cell::new(rating_stars(performance.and_then(|p| p.rating))),
            Cell::new(
                performance
                    .and_then(|p| p.duration.as_deref())
                    .unwrap_or("-"),
            ),
            Cell::new(record.notes.as_deref().unwrap_or("-")),
        ]);
    }
    println!("{table}");
}

fn write_history_csv<W: Write>(sink: W, records: &[&CompletedWorkout]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record([
        "id",
        "completed_at",
        "workout_id",
        "workout_title",
        "workout_type",
        "rating",
        "duration",
        "notes",
        "exercises",
        "completed_sets",
        "failed_sets",
        "total_sets",
    ])?;
    for record in records {
        let performance = record.performance.as_ref();
        let logs = record.exercise_logs.as_deref().unwrap_or_default();
        let completed: usize = logs.iter().map(|l| l.completed_sets()).sum();
        let failed: usize = logs.iter().map(|l| l.failed_sets()).sum();
        let total: usize = logs.iter().map(|l| l.sets.len()).sum();
        writer.write_record([
            record.id.clone(),
            record.completed_at.to_rfc3339(),
            record.workout_id.clone(),
            record.workout_title.clone(),
            record.workout_type.to_string(),
            performance
                .and_then(|p| p.rating)
                .map_or_else(String::new, |r| r.to_string()),
            performance
                .and_then(|p| p.duration.clone())
                .unwrap_or_default(),
            record.notes.clone().unwrap_or_default(),
            logs.len().to_string(),
            completed.to_string(),
            failed.to_string(),
            total.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
