use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

mod aggregate;
mod api;
mod config;
mod db;
mod enrollment;
mod logging;
mod models;
mod report;
mod source;
mod standing;

use config::Config;
use models::Enrollment;
use source::Source;

#[derive(Parser)]
#[command(name = "attendance-standing")]
#[command(about = "Per-course attendance standing against the absence policy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import attendance records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Print a student's standing in each enrolled course
    Standing {
        #[command(flatten)]
        scope: Scope,
        /// Print the full summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        scope: Scope,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[derive(Args)]
struct Scope {
    #[arg(long)]
    student: String,
    #[arg(long)]
    department_id: String,
    #[arg(long)]
    level: String,
    #[arg(long)]
    section: Option<String>,
    #[arg(long, value_enum, default_value_t = SourceKind::Api)]
    source: SourceKind,
    /// Use this limit instead of the backend setting
    #[arg(long, value_parser = clap::value_parser!(i32).range(0..=100))]
    max_absence_percent: Option<i32>,
}

impl Scope {
    fn enrollment(&self) -> Enrollment {
        Enrollment {
            department_id: self.department_id.clone(),
            level: self.level.clone(),
            section: self.section.clone(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceKind {
    Api,
    Db,
}

async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(config.database_url()?)
        .await
        .context("failed to connect to Postgres")
}

async fn open_source(config: &Config, kind: SourceKind) -> anyhow::Result<Source> {
    match kind {
        SourceKind::Api => Ok(Source::Api(api::ApiClient::new(config)?)),
        SourceKind::Db => Ok(Source::Postgres(connect(config).await?)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    logging::init();

    match cli.command {
        Commands::InitDb => {
            let pool = connect(&config).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = connect(&config).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let pool = connect(&config).await?;
            let inserted = db::import_csv(&pool, &csv).await?;
            info!(inserted, path = %csv.display(), "import finished");
            println!("Inserted {inserted} attendance records from {}.", csv.display());
        }
        Commands::Standing { scope, json } => {
            let source = open_source(&config, scope.source).await?;
            let snapshot = source::load_snapshot(
                &source,
                &scope.student,
                &scope.enrollment(),
                scope.max_absence_percent,
            )
            .await;
            let summary = snapshot.summarize();

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            if summary.courses.is_empty() {
                println!("No enrolled courses found for this student.");
                return Ok(());
            }

            println!(
                "Standing for {} (absence limit {}%):",
                scope.student, summary.max_absence_percent
            );
            for course in summary.courses.iter() {
                println!(
                    "- {}: {}% attendance, {}% absent over {} lectures [{}]",
                    report::course_label(course),
                    course.attendance_rate,
                    course.absence_rate,
                    course.total_lectures,
                    course.status_text
                );
            }
            println!(
                "Overall: {}% across {} lectures ({} attended, {} absent)",
                summary.overall.overall_rate,
                summary.overall.total_lectures,
                summary.overall.total_present,
                summary.overall.total_absent
            );
        }
        Commands::Report { scope, out } => {
            let source = open_source(&config, scope.source).await?;
            let enrollment = scope.enrollment();
            let snapshot = source::load_snapshot(
                &source,
                &scope.student,
                &enrollment,
                scope.max_absence_percent,
            )
            .await;
            let summary = snapshot.summarize();
            let report =
                report::build_report(&scope.student, &enrollment, &summary, &snapshot.records);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
