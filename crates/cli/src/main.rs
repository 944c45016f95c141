//! MediQueue CLI - ticket kiosk and staff console
//!
//! Composition root: settings, SQLite state store, speech announcer and the
//! queue service are wired here. Every command runs against one
//! `QueueService`, either once (`mediqueue call-next`) or repeatedly from
//! the interactive `kiosk` loop.

mod kiosk;
mod logging;
mod render;
mod settings;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, TimeZone};
use clap::{Parser, Subcommand};
use colored::Colorize;
use mediqueue_core::application::QueueService;
use mediqueue_core::port::announcer::SilentAnnouncer;
use mediqueue_core::port::time_provider::SystemTimeProvider;
use mediqueue_core::port::{Announcer, StateStore, TimeProvider};
use mediqueue_infra_sqlite::{create_pool, run_migrations, SqliteStateStore};
use mediqueue_infra_system::SpeechAnnouncer;
use settings::Settings;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "mediqueue")]
#[command(about = "Queue ticket kiosk and staff console", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(long, env = "MEDIQUEUE_CONFIG")]
    config: Option<PathBuf>,

    /// Database file, overrides the configured one
    #[arg(long, global = true)]
    db_path: Option<String>,

    /// Show announcements on screen only
    #[arg(long, global = true)]
    no_speech: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Issue a new ticket
    Ticket,

    /// Call the next waiting ticket
    CallNext {
        /// Counter name (default: configured default counter)
        #[arg(short, long)]
        counter: Option<String>,
    },

    /// Call or re-call a specific ticket
    Call {
        /// Ticket number, e.g. A007 (case-insensitive)
        number: String,

        #[arg(short, long)]
        counter: Option<String>,
    },

    /// List all tickets
    Queue,

    /// Show the "Now Serving" display
    Display,

    /// Make a free-text announcement
    Announce {
        /// Announcement text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Clear the queue and restart numbering
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Daily report
    Report {
        /// Day to report on (YYYY-MM-DD, default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Counter, hourly and peak-hour analytics
    Analytics {
        #[arg(short, long)]
        date: Option<NaiveDate>,

        #[arg(long)]
        json: bool,
    },

    /// Print the stored queue record as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the stored queue with an exported JSON record
    Import {
        file: PathBuf,
    },

    /// Interactive session (one command per line, `exit` to quit)
    Kiosk,
}

/// Live state shared by one-shot commands and the kiosk loop
pub(crate) struct Session {
    service: QueueService,
    sqlite: Arc<SqliteStateStore>,
    announcer: Arc<dyn Announcer>,
    time_provider: Arc<dyn TimeProvider>,
    default_counter: String,
    input: Lines<BufReader<Stdin>>,
}

impl Session {
    async fn open(settings: &Settings, no_speech: bool) -> Result<Self> {
        let database_url = settings.database_url()?;
        info!(database_url = %database_url, "Opening queue database");

        let pool = create_pool(&database_url)
            .await
            .context("Failed to open database")?;
        run_migrations(&pool)
            .await
            .context("Failed to run migrations")?;

        let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
        let sqlite = Arc::new(SqliteStateStore::new(pool, time_provider.clone()));

        let announcer: Arc<dyn Announcer> = if no_speech || !settings.speech.enabled {
            debug!("Speech disabled, announcements are visual only");
            Arc::new(SilentAnnouncer)
        } else {
            Arc::new(SpeechAnnouncer::new(settings.speech_config()))
        };

        let state_store: Arc<dyn StateStore> = sqlite.clone();
        let service = QueueService::load(state_store, announcer.clone(), time_provider.clone())
            .await
            .context("Failed to load queue state")?;

        Ok(Self {
            service,
            sqlite,
            announcer,
            time_provider,
            default_counter: settings.default_counter.clone(),
            input: BufReader::new(tokio::io::stdin()).lines(),
        })
    }

    fn counter(&self, counter: Option<String>) -> String {
        counter.unwrap_or_else(|| self.default_counter.clone())
    }

    fn today(&self) -> NaiveDate {
        Local
            .timestamp_millis_opt(self.time_provider.now_millis())
            .single()
            .map(|dt| dt.date_naive())
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Print `prompt` and read the next input line
    pub(crate) async fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;
        Ok(self.input.next_line().await?)
    }

    async fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.read_line(&format!("{} [y/N] ", question)).await?;
        Ok(matches!(
            answer.as_deref().map(str::trim),
            Some("y") | Some("Y") | Some("yes") | Some("YES")
        ))
    }

    /// Run one command against the live queue
    pub(crate) async fn execute(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Ticket => {
                let issued = self.service.create_ticket().await?;
                render::ticket_issued(&issued);
            }

            Commands::CallNext { counter } => {
                let counter = self.counter(counter);
                let outcome = self.service.call_next(&counter).await?;
                render::call(&outcome);
            }

            Commands::Call { number, counter } => {
                let counter = self.counter(counter);
                let outcome = self.service.call_by_number(&number, &counter).await?;
                render::call(&outcome);
            }

            Commands::Queue => render::queue(self.service.store()),

            Commands::Display => render::display(self.service.store()),

            Commands::Announce { text } => {
                let text = self.service.announce(&text.join(" ")).await?;
                render::announcement(&text);
            }

            Commands::Reset { yes } => {
                if !yes
                    && !self
                        .confirm("Are you sure you want to reset the queue? This cannot be undone.")
                        .await?
                {
                    println!("{}", "Reset cancelled".yellow());
                    return Ok(());
                }
                self.service.reset().await?;
                println!("{}", "✓ Queue has been reset".green().bold());
            }

            Commands::Report { date, json } => {
                let date = date.unwrap_or_else(|| self.today());
                let report = self.service.daily_report(date, &Local);
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    render::daily_report(&report);
                }
            }

            Commands::Analytics { date, json } => {
                let date = date.unwrap_or_else(|| self.today());
                let analytics = self.service.analytics(date, &Local);
                if json {
                    println!("{}", serde_json::to_string_pretty(&analytics)?);
                } else {
                    render::analytics(&analytics);
                }
            }

            Commands::Export { output } => {
                let raw = self
                    .sqlite
                    .export_raw()
                    .await?
                    .unwrap_or_else(|| r#"{"queue":[],"currentTicketNumber":0}"#.to_string());
                match output {
                    Some(path) => {
                        tokio::fs::write(&path, raw)
                            .await
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        println!(
                            "{}",
                            format!("✓ Queue exported to {}", path.display()).green().bold()
                        );
                    }
                    None => println!("{}", raw),
                }
            }

            Commands::Import { file } => {
                let raw = tokio::fs::read_to_string(&file)
                    .await
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let snapshot = self.sqlite.import_raw(&raw).await?;

                // Reload so the live store goes through the same restore path
                let state_store: Arc<dyn StateStore> = self.sqlite.clone();
                self.service = QueueService::load(
                    state_store,
                    self.announcer.clone(),
                    self.time_provider.clone(),
                )
                .await?;
                println!(
                    "{}",
                    format!("✓ Imported {} tickets", snapshot.tickets.len())
                        .green()
                        .bold()
                );
            }

            Commands::Kiosk => println!("{}", "Already in kiosk mode".yellow()),
        }

        Ok(())
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(db_path) = cli.db_path {
        settings.db_path = shellexpand::tilde(&db_path).into_owned();
    }
    debug!(?settings, "Configuration loaded");

    let mut session = Session::open(&settings, cli.no_speech).await?;
    match cli.command {
        Commands::Kiosk => kiosk::run(&mut session).await,
        command => session.execute(command).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{} {:#}", "Warning:".yellow(), e);
    }

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}
