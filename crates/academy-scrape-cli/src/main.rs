//! academy-scrape: terminal front end for the academy portal extractors.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::Serialize;

use academy_scrape::{ErrorEnvelope, PortalConfig, ScrapeError};
use academy_scrape_cli::commands::{self, SessionPlan};
use academy_scrape_cli::config::{resolve_credentials, resolve_portal_config, ConfigOverrides};
use academy_scrape_cli::display;

#[derive(Parser)]
#[command(
    name = "academy-scrape",
    about = "Fetch attendance, timetable, and calendar data from the academy portal",
    version,
    after_help = "Credentials are read from ACADEMY_USERNAME and ACADEMY_PASSWORD unless\n--username-env / --password-env name other variables."
)]
struct Cli {
    /// Portal base URL (also ACADEMY_BASE_URL).
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Per-request timeout in milliseconds (also ACADEMY_TIMEOUT_MS).
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// User-Agent sent with every request (also ACADEMY_USER_AGENT).
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Variable holding the username.
    #[arg(long, global = true)]
    username_env: Option<String>,

    /// Variable holding the password.
    #[arg(long, global = true)]
    password_env: Option<String>,

    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log line format on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Portal(PortalCommand),

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   academy-scrape completions bash > ~/.local/share/bash-completion/completions/academy-scrape
    ///   academy-scrape completions zsh > ~/.zfunc/_academy-scrape
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

/// Commands that log in to the portal.
#[derive(Subcommand)]
enum PortalCommand {
    /// Log in and fetch everything the dashboard shows (default).
    Fetch,
    /// Check the credentials and show the student name and semesters.
    Login,
    /// List the semesters available to the student.
    Semesters,
    /// Show attendance for one semester.
    Attendance {
        /// Semester (batch) id; defaults to the first one listed.
        #[arg(long)]
        batch_id: Option<String>,

        /// Project each course after attending this many more sessions.
        #[arg(long)]
        attend: Option<u32>,

        /// Project each course after missing this many more sessions.
        #[arg(long)]
        skip: Option<u32>,
    },
    /// Dump the academic calendar as JSON.
    Calendar {
        /// Only accept the `JSON.parse(...)` assignment, never the bracket fallback.
        #[arg(long)]
        strict: bool,
    },
    /// Show the weekly timetable per subject.
    Timetable,
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn print_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "academy-scrape", &mut std::io::stdout());
}

/// A projection is requested when either count is given; the other defaults to 0.
fn session_plan(attend: Option<u32>, skip: Option<u32>) -> Option<SessionPlan> {
    if attend.is_none() && skip.is_none() {
        return None;
    }
    Some(SessionPlan {
        attend: attend.unwrap_or(0),
        skip: skip.unwrap_or(0),
    })
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fail(err: &ScrapeError, json: bool) -> ! {
    tracing::debug!("Command failed ({:?}): {err}", err.kind());
    if json {
        let envelope = ErrorEnvelope::from(err);
        match serde_json::to_string_pretty(&envelope) {
            Ok(body) => println!("{body}"),
            Err(_) => eprintln!("Error: {err}"),
        }
    } else {
        eprintln!("Error: {err}");
    }
    std::process::exit(1);
}

async fn run(command: PortalCommand, config: &PortalConfig, cli: &Cli) -> anyhow::Result<()> {
    let provider = resolve_credentials(cli.username_env.as_deref(), cli.password_env.as_deref());
    let json = cli.json;

    match command {
        PortalCommand::Fetch => {
            let snapshot = academy_scrape::fetch_all(config, &provider)
                .await
                .unwrap_or_else(|e| fail(&e, json));
            if json {
                let body = snapshot.to_response_json().unwrap_or_else(|e| fail(&e, json));
                print_json(&body)?;
            } else {
                print!("{}", display::render_snapshot(&snapshot));
            }
        }

        PortalCommand::Login => {
            let report = commands::login(config, &provider)
                .await
                .unwrap_or_else(|e| fail(&e, json));
            if json {
                print_json(&report)?;
            } else {
                println!("Logged in as {}", report.student_name);
                print!("{}", display::render_semesters(&report.semesters));
            }
        }

        PortalCommand::Semesters => {
            let semesters = commands::list_semesters(config, &provider)
                .await
                .unwrap_or_else(|e| fail(&e, json));
            if json {
                print_json(&semesters)?;
            } else {
                print!("{}", display::render_semesters(&semesters));
            }
        }

        PortalCommand::Attendance {
            batch_id,
            attend,
            skip,
        } => {
            let plan = session_plan(attend, skip);
            let report = commands::attendance(config, &provider, batch_id, plan)
                .await
                .unwrap_or_else(|e| fail(&e, json));
            if json {
                print_json(&report)?;
            } else {
                if let Some(id) = &report.batch_id {
                    println!("Semester {id}");
                }
                print!("{}", display::render_attendance(&report.attendance));
                if let Some(plan) = plan {
                    print!("{}", display::render_projections(&report.projections, plan));
                }
            }
        }

        PortalCommand::Calendar { strict } => {
            let calendar = commands::calendar(config, &provider, strict)
                .await
                .unwrap_or_else(|e| fail(&e, json));
            print_json(&calendar)?;
        }

        PortalCommand::Timetable => {
            let timetable = commands::timetable(config, &provider)
                .await
                .unwrap_or_else(|e| fail(&e, json));
            if json {
                print_json(&timetable)?;
            } else {
                print!("{}", display::render_timetable(&timetable));
            }
        }

    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();

    let command = match cli.command.take().unwrap_or(Commands::Portal(PortalCommand::Fetch)) {
        Commands::Portal(command) => command,
        Commands::Completions { shell } => {
            print_completions(shell);
            return Ok(());
        }
    };

    init_logging(&cli.log_level, cli.log_format);

    let overrides = ConfigOverrides {
        base_url: cli.base_url.clone(),
        timeout_ms: cli.timeout_ms,
        user_agent: cli.user_agent.clone(),
    };
    let config = resolve_portal_config(&overrides).unwrap_or_else(|e| fail(&e, cli.json));

    run(command, &config, &cli).await
}
