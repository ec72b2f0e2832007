use crate::domain::model::{CourseType, LevelType};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "english-practice")]
#[command(about = "Browse English practice exercises and check answers")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "practice.toml")]
    pub config: String,

    /// Content dump directory or .zip archive, overrides [store] from the config
    #[arg(long)]
    pub dump: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the available courses
    Courses,
    /// List the levels that have content for a course
    Levels {
        #[arg(long)]
        course: CourseType,
    },
    /// List the activities of a course at a level
    Activities {
        #[arg(long)]
        course: CourseType,
        /// Defaults to the configured learner level
        #[arg(long)]
        level: Option<LevelType>,
    },
    /// List the exercises of an activity
    Exercises {
        #[command(flatten)]
        target: ActivityArgs,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print one exercise
    Show {
        #[command(flatten)]
        exercise: ExerciseArgs,
        /// Reveal the expected answers
        #[arg(long)]
        answers: bool,
    },
    /// Grade an answer sheet (JSON object of question key to answer)
    Check {
        #[command(flatten)]
        exercise: ExerciseArgs,
        #[arg(long = "answers")]
        answers_file: String,
        /// Exact matching, as typed
        #[arg(long)]
        strict: bool,
        /// Write the graded attempt as .csv or .json
        #[arg(long)]
        report: Option<String>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ActivityArgs {
    #[arg(long)]
    pub course: CourseType,
    #[arg(long)]
    pub level: Option<LevelType>,
    /// Activity name or slug
    #[arg(long)]
    pub activity: String,
}

#[derive(Debug, Clone, Args)]
pub struct ExerciseArgs {
    #[command(flatten)]
    pub target: ActivityArgs,
    #[arg(long)]
    pub id: String,
}
