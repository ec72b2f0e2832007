use clap::Parser;
use english_practice::app::{build_catalog, report_storage, DynCatalog};
use english_practice::config::cli::{ActivityArgs, ExerciseArgs};
use english_practice::config::{AppConfig, CliConfig, Command};
use english_practice::core::grading::{AnswerSheet, GradingPolicy, ItemStatus};
use english_practice::core::normalize::{exercise_title, ExerciseContent};
use english_practice::utils::error::ErrorSeverity;
use english_practice::utils::validation::{validate_report_path, Validate};
use english_practice::utils::logger;
use english_practice::{AttemptRecord, ExerciseSession, LevelSelector, LevelType, PracticeError};
use serde_json::json;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 載入配置
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Pass --dump <dir|zip> or create {}", cli.config);
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logging() {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting english-practice CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if let Err(e) = run(&cli, &config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

/// `--dump` replaces the configured store; without a config file it is enough on its own.
fn load_config(cli: &CliConfig) -> english_practice::Result<AppConfig> {
    match &cli.dump {
        Some(dump) if Path::new(&cli.config).exists() => {
            let mut config = AppConfig::from_file(&cli.config)?;
            config.store = AppConfig::for_dump(dump).store;
            Ok(config)
        }
        Some(dump) => Ok(AppConfig::for_dump(dump)),
        None => AppConfig::from_file(&cli.config),
    }
}

fn resolve_level(
    selector: &LevelSelector,
    requested: Option<LevelType>,
) -> english_practice::Result<LevelType> {
    let mut selector = selector.clone();
    match requested {
        Some(level) if selector.set_level(level) => Ok(level),
        Some(level) => Err(PracticeError::UnknownLevel(format!("{} is not enabled", level))),
        None => Ok(selector.current_level()),
    }
}

async fn run(cli: &CliConfig, config: &AppConfig) -> english_practice::Result<()> {
    let catalog = build_catalog(config).await?;
    let selector = config.level_selector();

    match &cli.command {
        Command::Courses => {
            for course in catalog.available_courses() {
                println!("{:<16} {}", course.as_str(), catalog.course_name(course));
            }
        }
        Command::Levels { course } => {
            let levels = catalog.list_levels(*course).await;
            let enabled = selector.available_levels();
            for level in levels.into_iter().filter(|l| enabled.contains(l)) {
                println!("{}", level.as_upper());
            }
        }
        Command::Activities { course, level } => {
            let level = resolve_level(&selector, *level)?;
            let list = catalog.list_activities(*course, level).await?;
            println!(
                "📚 {} {} ({} activities)",
                catalog.course_name(*course),
                level.as_upper(),
                list.total
            );
            for activity in &list.items {
                println!(
                    "  {:<32} {:>4}  {}",
                    activity.name,
                    activity.count.unwrap_or_default(),
                    activity.slug.as_deref().unwrap_or_default()
                );
            }
        }
        Command::Exercises { target, limit } => {
            let level = resolve_level(&selector, target.level)?;
            let list = catalog
                .list_exercises(target.course, level, &target.activity, *limit)
                .await?;
            for (index, exercise) in list.items.iter().enumerate() {
                println!("  {:<8} {}", exercise.id, exercise_title(exercise, index));
            }
            if list.has_more {
                println!("… more exercises available, raise --limit to see them");
            }
        }
        Command::Show { exercise, answers } => {
            let session =
                open_session(&catalog, &selector, exercise, config.grading_policy()).await?;
            let content = session.content();
            let output = if *answers {
                json!({
                    "activity": session.activity_display_name(),
                    "content": content,
                    "items": session.items(),
                })
            } else {
                json!({
                    "activity": session.activity_display_name(),
                    "content": content,
                })
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            if matches!(content, ExerciseContent::Unstructured { .. }) {
                tracing::warn!(
                    "⚠️ Exercise {} has no recognised layout",
                    session.exercise().relpath
                );
            }
        }
        Command::Check {
            exercise,
            answers_file,
            strict,
            report,
        } => {
            if let Some(report_path) = report {
                validate_report_path("report", report_path)?;
            }

            let policy = if *strict {
                GradingPolicy::strict()
            } else {
                config.grading_policy()
            };
            let mut session = open_session(&catalog, &selector, exercise, policy).await?;
            if !session.is_gradable() {
                return Err(PracticeError::InvalidAnswerSheet {
                    message: format!("exercise {} has no answer key", session.exercise().relpath),
                });
            }

            let content = tokio::fs::read_to_string(answers_file).await?;
            session.load_answers(AnswerSheet::from_json_str(&content)?);
            let graded = session.check_answers();

            for outcome in &graded.outcomes {
                let mark = match outcome.status {
                    ItemStatus::Correct => "✅",
                    ItemStatus::Incorrect => "❌",
                    ItemStatus::Unanswered => "⬜",
                };
                println!(
                    "{} {:<6} {:<24} expected: {}",
                    mark,
                    outcome.key,
                    outcome.given.as_deref().unwrap_or("-"),
                    outcome.expected
                );
            }
            println!(
                "📊 {}/{} correct ({}%)",
                graded.correct,
                graded.total,
                graded.percent()
            );

            if let Some(report_path) = report {
                let record = AttemptRecord::new(session.exercise(), graded);
                let storage = report_storage(config);
                record.save(&storage, report_path).await?;
                tracing::info!("📁 Report saved to: {}", report_path);
            }
        }
    }

    Ok(())
}

async fn open_session(
    catalog: &DynCatalog,
    selector: &LevelSelector,
    exercise: &ExerciseArgs,
    policy: GradingPolicy,
) -> english_practice::Result<ExerciseSession> {
    let ActivityArgs {
        course,
        level,
        activity,
    } = &exercise.target;
    let level = resolve_level(selector, *level)?;
    let found = catalog
        .get_exercise(*course, level, activity, &exercise.id)
        .await?;
    Ok(ExerciseSession::new(found, policy))
}
