use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

mod error;
mod filter;
mod models;
mod notify;
mod report;
mod risk;
mod store;
mod trend;

use filter::StudentQuery;
use models::NotificationKind;
use notify::{FeedQuery, ReadStatus};
use report::{ExportFormat, ReportFilters, ReportRequest};
use store::Store;

#[derive(Parser)]
#[command(name = "dropout-early-warning")]
#[command(about = "Dropout risk assessment and notification engine", long_about = None)]
struct Cli {
    /// Path to the JSON data file.
    #[arg(long, global = true, default_value = "early-warning.json")]
    data: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Document,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a data file with realistic seed data
    Init,
    /// Import student risk factors from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List students, filtered and optionally ranked by risk score
    Students {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        branch: Option<String>,
        /// Low-risk students are hidden unless this is set
        #[arg(long)]
        include_low_risk: bool,
        #[arg(long)]
        sort_score: bool,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show one student's full assessment and trend
    Assess {
        #[arg(long)]
        roll_no: String,
    },
    /// Cohort risk-level distribution per trend period
    Trends {
        #[arg(long)]
        period: Option<String>,
    },
    /// List notifications, filtered by type and read status
    Notifications {
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long, default_value = "all")]
        status: String,
    },
    /// Mark one notification as read
    MarkRead {
        #[arg(long)]
        id: Uuid,
    },
    /// Mark every current notification as read
    MarkAllRead,
    /// Permanently delete a notification
    DeleteNotification {
        #[arg(long)]
        id: Uuid,
    },
    /// Export the filtered roster as a downloadable report
    Export {
        #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
        format: FormatArg,
        #[arg(long)]
        branch: Option<String>,
        #[arg(long)]
        include_low_risk: bool,
        /// Defaults to a name derived from report type and date
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let store = Store::seed()?;
            store.save(&cli.data)?;
            println!("Seed data written to {}.", cli.data.display());
        }
        Commands::Import { csv } => {
            let mut store = Store::load(&cli.data)?;
            let merged = store.import_csv(&csv)?;
            store.save(&cli.data)?;
            println!("Merged {merged} students from {}.", csv.display());
        }
        Commands::Students {
            search,
            branch,
            include_low_risk,
            sort_score,
            limit,
        } => {
            let store = Store::load(&cli.data)?;
            let query = StudentQuery {
                search,
                branch,
                at_risk_only: !include_low_risk,
            };
            let mut students = filter::filter(&store.students, &query);
            if sort_score {
                students = filter::rank_by_score(&students);
            }

            if students.is_empty() {
                println!("No students matched.");
                return Ok(());
            }
            for student in students.iter().take(limit) {
                println!(
                    "- {} ({}, {}) score {:.1} {} risk, last session: {}",
                    student.name,
                    student.roll_no,
                    student.branch,
                    student.assessment.score,
                    student.assessment.level.label(),
                    student.last_session
                );
            }
        }
        Commands::Assess { roll_no } => {
            let store = Store::load(&cli.data)?;
            let Some(student) = store.student_by_roll(&roll_no) else {
                println!("No student with roll number {roll_no}.");
                return Ok(());
            };

            println!(
                "{} ({}, {}) - score {:.1}, {} risk",
                student.name,
                student.roll_no,
                student.branch,
                student.assessment.score,
                student.assessment.level.label()
            );
            println!("Risk factors:");
            for reason in &student.assessment.reasons {
                println!("  - {reason}");
            }
            println!("Recommended actions:");
            for suggestion in &student.assessment.suggestions {
                println!("  - {suggestion}");
            }
            let series = store.trends.series(student.id);
            if !series.is_empty() {
                println!("Trend:");
                for point in series {
                    println!("  {}: {:.1}", point.period, point.value);
                }
            }
        }
        Commands::Trends { period } => {
            let store = Store::load(&cli.data)?;
            let ids = store.student_ids();
            let periods: Vec<String> = match period {
                Some(p) => vec![p],
                None => store.trends.axis().to_vec(),
            };
            for period in periods {
                let counts = store.trends.aggregate(&ids, &period);
                println!(
                    "{period}: high {} medium {} low {} ({} tracked)",
                    counts.high,
                    counts.medium,
                    counts.low,
                    counts.total()
                );
            }
        }
        Commands::Notifications { kind, status } => {
            let store = Store::load(&cli.data)?;
            let query = FeedQuery {
                kind: parse_kind(kind.as_deref())?,
                status: parse_status(&status)?,
            };
            let now = Utc::now();
            let matched = store.feed.filter(&query);

            println!(
                "{} notifications ({} unread overall)",
                matched.len(),
                store.feed.unread_count()
            );
            for n in matched {
                let marker = if n.is_read { " " } else { "*" };
                let student = n
                    .student_id
                    .and_then(|id| store.student_name(id))
                    .map(|name| format!(" [{name}]"))
                    .unwrap_or_default();
                let action = if n.action_required {
                    " action required"
                } else {
                    ""
                };
                println!(
                    "{marker} {} {} ({} priority, {}){student}{action}",
                    n.kind.glyph(),
                    n.title,
                    n.priority.label(),
                    notify::relative_time(n.timestamp, now),
                );
                println!("    {} (id {})", n.message, n.id);
            }
        }
        Commands::MarkRead { id } => {
            let mut store = Store::load(&cli.data)?;
            store.feed.mark_read(id);
            store.save(&cli.data)?;
            println!("Done. {} unread remaining.", store.feed.unread_count());
        }
        Commands::MarkAllRead => {
            let mut store = Store::load(&cli.data)?;
            store.feed.mark_all_read();
            store.save(&cli.data)?;
            println!("All notifications marked as read.");
        }
        Commands::DeleteNotification { id } => {
            let mut store = Store::load(&cli.data)?;
            store.feed.delete(id);
            store.save(&cli.data)?;
            println!("Done. {} notifications remain.", store.feed.all().len());
        }
        Commands::Export {
            format,
            branch,
            include_low_risk,
            out,
        } => {
            let store = Store::load(&cli.data)?;
            let query = StudentQuery {
                search: None,
                branch: branch.clone(),
                at_risk_only: !include_low_risk,
            };
            let students = filter::filter(&store.students, &query);
            let request = ReportRequest::snapshot(
                "Student Risk Prediction Report",
                "risk-analysis",
                ReportFilters {
                    branch: branch.unwrap_or_default(),
                    at_risk_only: !include_low_risk,
                },
                &students,
            );

            let format = match format {
                FormatArg::Csv => ExportFormat::Csv,
                FormatArg::Document => ExportFormat::Document,
            };
            let artifact = report::export(&request, format)
                .await
                .context("report export failed")?;

            let out = out.unwrap_or_else(|| PathBuf::from(&artifact.file_name));
            std::fs::write(&out, &artifact.bytes)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!(
                "Report with {} rows written to {}.",
                request.rows.len(),
                out.display()
            );
        }
    }

    Ok(())
}

fn parse_kind(kind: Option<&str>) -> anyhow::Result<Option<NotificationKind>> {
    let Some(kind) = kind else {
        return Ok(None);
    };
    let parsed = match kind {
        "all" => return Ok(None),
        "deadline" => NotificationKind::Deadline,
        "scheduling" => NotificationKind::Scheduling,
        "at-risk" => NotificationKind::AtRisk,
        "missed-counseling" => NotificationKind::MissedCounseling,
        "system" => NotificationKind::System,
        "achievement" => NotificationKind::Achievement,
        other => bail!("unknown notification type `{other}`"),
    };
    Ok(Some(parsed))
}

fn parse_status(status: &str) -> anyhow::Result<ReadStatus> {
    match status {
        "all" => Ok(ReadStatus::All),
        "read" => Ok(ReadStatus::Read),
        "unread" => Ok(ReadStatus::Unread),
        other => bail!("unknown status `{other}` (expected all, read, unread)"),
    }
}
