use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Text};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use interview_engine::config::{self, Config};
use interview_engine::interview::{GenerationError, GeneratedQuestion, QuestionGenerationController};
use interview_engine::providers::GenericOpenAiProvider;
use interview_engine::session::SessionTracker;
use interview_engine::store::TtlKeySetStore;

#[derive(Parser)]
#[command(name = "interview-engine")]
#[command(about = "interview-engine - AI mock interview session engine")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the model used for question generation
    #[arg(short = 'M', long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Display version information
    Version,

    /// Create or update the configuration file interactively
    Onboard {
        /// Accept defaults without prompting
        #[arg(short, long)]
        yes: bool,
    },

    /// Run a mock interview in the terminal
    Run {
        /// File containing the candidate profile (CV, role, seniority)
        #[arg(short, long, value_name = "FILE")]
        profile: PathBuf,

        /// Session identifier; generated when omitted
        #[arg(short, long)]
        session: Option<String>,

        /// Stop after this many questions
        #[arg(long, value_name = "N")]
        max_turns: Option<u32>,
    },

    /// Print the effective configuration with secrets masked
    Config,
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Version) => {
            print_version();
            Ok(())
        }
        Some(Commands::Onboard { yes }) => config::run_onboarding(cli.verbose, cli.config, yes),
        Some(Commands::Run {
            profile,
            session,
            max_turns,
        }) => {
            let config = config::load_config(cli.model, cli.config)?;
            run_interview(config, profile, session, max_turns).await
        }
        Some(Commands::Config) => {
            let config = config::load_config(cli.model, cli.config)?;
            print_config(&config)
        }
        None => {
            print_help();
            Ok(())
        }
    }
}

async fn run_interview(
    config: Config,
    profile_path: PathBuf,
    session_id: Option<String>,
    max_turns: Option<u32>,
) -> Result<()> {
    let provider_config = config.provider.clone().context(
        "No model provider configured. Run 'interview-engine onboard' or set INTERVIEW_API_KEY.",
    )?;
    let provider = GenericOpenAiProvider::try_from_config(&provider_config)
        .context("Failed to create model provider")?;

    let profile = std::fs::read_to_string(&profile_path)
        .with_context(|| format!("Failed to read candidate profile: {:?}", profile_path))?;

    let store = TtlKeySetStore::with_config(config.store.to_store_config());
    let reaper = store.start_reaper();
    let tracker = SessionTracker::new(store);
    let controller =
        QuestionGenerationController::new(Arc::new(provider), config.generation.clone());

    let session_id = session_id.unwrap_or_else(generate_session_id);
    tracing::info!(
        session_id = %session_id,
        model = %controller.model(),
        "Starting interview session"
    );

    let outcome = interview_loop(&controller, &tracker, &session_id, &profile, max_turns).await;

    tracker.end_session(&session_id);
    reaper.shutdown().await;
    outcome
}

async fn interview_loop(
    controller: &QuestionGenerationController,
    tracker: &SessionTracker,
    session_id: &str,
    profile: &str,
    max_turns: Option<u32>,
) -> Result<()> {
    let mut questions: Vec<String> = Vec::new();
    let mut answers: Vec<String> = Vec::new();

    loop {
        let ctx = tracker.context_for(session_id, questions.clone(), answers.clone(), profile);

        let question = match controller.generate_interview_question(&ctx).await {
            Ok(question) => question,
            Err(e) => {
                eprintln!("{}", describe_failure(&e));
                if prompt_confirm("Try again?").await? {
                    continue;
                }
                return Ok(());
            }
        };

        let (turn, last) = match plan_turn(tracker, session_id, &question, max_turns) {
            TurnPlan::Finish => {
                println!();
                println!("The interviewer ran out of new questions.");
                print_summary(tracker, session_id);
                return Ok(());
            }
            TurnPlan::Ask { turn, last } => (turn, last),
        };

        print_question(turn, &question);
        questions.push(question.question.clone());

        let Some(answer) = prompt_answer().await? else {
            println!("Interview stopped.");
            return Ok(());
        };
        answers.push(answer);

        if last {
            print_summary(tracker, session_id);
            return Ok(());
        }
    }
}

/// What the run loop does with a generated question
#[derive(Debug, PartialEq, Eq)]
enum TurnPlan {
    /// Forced termination: the repeated question is neither recorded nor asked
    Finish,
    /// Ask the recorded question; `last` ends the interview after the answer
    Ask { turn: i64, last: bool },
}

fn plan_turn(
    tracker: &SessionTracker,
    session_id: &str,
    question: &GeneratedQuestion,
    max_turns: Option<u32>,
) -> TurnPlan {
    if question.is_forced_termination() {
        return TurnPlan::Finish;
    }

    let turn = tracker.record_accepted(session_id, question);
    let turn_limit_hit = max_turns.is_some_and(|limit| turn >= i64::from(limit));
    TurnPlan::Ask {
        turn,
        last: question.is_last || turn_limit_hit,
    }
}

fn print_summary(tracker: &SessionTracker, session_id: &str) {
    println!();
    println!(
        "Interview complete: {} questions, topics covered: {}",
        tracker.turn_index(session_id),
        tracker.visited_topics(session_id).join(", ")
    );
}

fn describe_failure(err: &GenerationError) -> String {
    match err {
        GenerationError::Transport(e) => match e.retry_after_secs() {
            Some(secs) => format!("Error: {} (retry in {} s)", e, secs),
            None => format!("Error: {}", e),
        },
        GenerationError::Validation { .. } => format!("Error: {}", err),
    }
}

fn print_question(turn: i64, question: &GeneratedQuestion) {
    println!();
    println!("Question {}: {}", turn, question.question);
    if !question.tags.is_empty() {
        println!("  topics: {}", question.tags.join(", "));
    }
}

/// Reads one answer off the runtime threads; `None` means the user quit
async fn prompt_answer() -> Result<Option<String>> {
    let answer = tokio::task::spawn_blocking(|| {
        Text::new("Your answer:")
            .with_help_message("Type 'quit' or leave empty to stop the interview")
            .prompt()
    })
    .await??;

    let answer = answer.trim().to_string();
    if answer.is_empty() || answer.eq_ignore_ascii_case("quit") {
        return Ok(None);
    }
    Ok(Some(answer))
}

async fn prompt_confirm(message: &'static str) -> Result<bool> {
    let confirmed = tokio::task::spawn_blocking(move || {
        Confirm::new(message).with_default(false).prompt()
    })
    .await??;
    Ok(confirmed)
}

fn generate_session_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("session-{}-{}", std::process::id(), millis)
}

fn print_config(config: &Config) -> Result<()> {
    let json = serde_json::to_string_pretty(&config.redacted())?;
    println!("{}", json);
    Ok(())
}

pub fn extract_command_from_error(error_msg: &str) -> String {
    // "error: unrecognized subcommand 'invalid_command'"
    if let Some(start) = error_msg.find('\'') {
        if let Some(end) = error_msg[start + 1..].find('\'') {
            return error_msg[start + 1..start + 1 + end].to_string();
        }
    }
    "unknown".to_string()
}

fn print_version() {
    println!("interview-engine {}", env!("CARGO_PKG_VERSION"));
}

fn print_help() {
    println!("interview-engine - AI mock interview session engine");
    println!();
    println!("Usage: interview-engine [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  version  Display version information");
    println!("  onboard  Create or update the configuration file interactively");
    println!("  run      Run a mock interview in the terminal");
    println!("  config   Print the effective configuration with secrets masked");
    println!("  help     Print this message or the help of the given subcommand(s)");
    println!();
    println!("Options:");
    println!("  -v, --verbose        Enable debug logging");
    println!("  -c, --config <FILE>  Path to the configuration file");
    println!("  -M, --model <MODEL>  Override the model used for question generation");
    println!("  -V, --version        Print version");
    println!("  -h, --help           Print help");
}

#[cfg(test)]
mod tests {
    use super::*;
    use interview_engine::interview::QuestionOutcome;
    use interview_engine::providers::ProviderError;

    fn generated(question: &str, tags: &[&str], outcome: QuestionOutcome) -> GeneratedQuestion {
        GeneratedQuestion {
            question: question.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            is_last: outcome == QuestionOutcome::ForcedTermination,
            outcome,
            attempts: 1,
        }
    }

    #[test]
    fn test_forced_termination_is_not_recorded() {
        let tracker = SessionTracker::new(TtlKeySetStore::new());
        let first = generated("What is DI?", &["di"], QuestionOutcome::Accepted);
        assert_eq!(
            plan_turn(&tracker, "s1", &first, None),
            TurnPlan::Ask { turn: 1, last: false }
        );

        // The controller hands back the repeated question with new tags
        let repeat = generated("What is DI?", &["containers"], QuestionOutcome::ForcedTermination);
        assert_eq!(plan_turn(&tracker, "s1", &repeat, None), TurnPlan::Finish);
        assert_eq!(tracker.turn_index("s1"), 1);
        assert_eq!(tracker.visited_topics("s1"), vec!["di"]);
    }

    #[test]
    fn test_turn_limit_marks_last_question() {
        let tracker = SessionTracker::new(TtlKeySetStore::new());
        let q = generated("q", &["a"], QuestionOutcome::Accepted);
        assert_eq!(
            plan_turn(&tracker, "s1", &q, Some(2)),
            TurnPlan::Ask { turn: 1, last: false }
        );
        assert_eq!(
            plan_turn(&tracker, "s1", &q, Some(2)),
            TurnPlan::Ask { turn: 2, last: true }
        );
    }

    #[test]
    fn test_describe_failure_shows_retry_hint() {
        let limited = GenerationError::from(ProviderError::rate_limit("quota", Some(30)));
        assert_eq!(
            describe_failure(&limited),
            "Error: Rate limit exceeded: quota (retry in 30 s)"
        );

        let denied = GenerationError::from(ProviderError::auth("bad key"));
        assert_eq!(describe_failure(&denied), "Error: Authentication error: bad key");
    }

    #[test]
    fn test_version_string_format() {
        let version = env!("CARGO_PKG_VERSION");
        let parts: Vec<&str> = version.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.parse::<u32>().is_ok()));
    }

    #[test]
    fn test_extract_command_from_error() {
        let msg = "error: unrecognized subcommand 'foo_bar'";
        assert_eq!(extract_command_from_error(msg), "foo_bar");
        assert_eq!(extract_command_from_error("no quotes here"), "unknown");
    }

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from([
            "interview-engine",
            "--verbose",
            "run",
            "--profile",
            "cv.txt",
            "--max-turns",
            "5",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Run {
                profile,
                session,
                max_turns,
            }) => {
                assert_eq!(profile, PathBuf::from("cv.txt"));
                assert!(session.is_none());
                assert_eq!(max_turns, Some(5));
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "interview-engine",
            "config",
            "--model",
            "gpt-4o",
            "--config",
            "/tmp/c.json",
        ])
        .unwrap();

        assert_eq!(cli.model.as_deref(), Some("gpt-4o"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
        assert!(matches!(cli.command, Some(Commands::Config)));
    }

    #[test]
    fn test_run_requires_profile() {
        assert!(Cli::try_parse_from(["interview-engine", "run"]).is_err());
    }

    #[test]
    fn test_generated_session_ids_are_prefixed() {
        assert!(generate_session_id().starts_with("session-"));
    }
}
