//! Parley application binary - composition root.
//!
//! 1. Load configuration from TOML
//! 2. Build the generation client (or run offline)
//! 3. Run one interview over stdin/stdout
//! 4. Draft resume bullets from the finished transcript

mod cli;

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use parley_core::config::ParleyConfig;
use parley_generation::{DynGenerationService, OpenAiCompatService};
use parley_interview::{
    BulletDrafter, FinalizeResult, FollowUpComposer, InterviewSession, SessionError,
    SubmitOutcome,
};

use cli::CliArgs;

/// Build the generation client, or `None` when running offline.
fn build_generation(
    args: &CliArgs,
    config: &ParleyConfig,
) -> Option<Arc<dyn DynGenerationService>> {
    if args.offline || !config.generation.enabled {
        tracing::info!("Generation disabled, using built-in follow-up questions");
        return None;
    }
    match OpenAiCompatService::from_config(&config.generation) {
        Ok(service) => {
            tracing::info!(
                model = %config.generation.model,
                base_url = %config.generation.base_url,
                "Generation service configured"
            );
            Some(Arc::new(service))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Generation service unavailable, running offline");
            None
        }
    }
}

fn read_prior_context(args: &CliArgs) -> Option<String> {
    let path = args.prior_context.as_ref()?;
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Could not read prior context, using generic opener"
            );
            None
        }
    }
}

fn say(text: &str) {
    println!("\nInterviewer: {}", text);
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Run the interview loop until it finalizes or stdin closes.
async fn run_interview(
    session: &mut InterviewSession,
) -> Result<Option<FinalizeResult>, Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match session.submit_response(line.as_str()).await {
            Ok(SubmitOutcome::Continue { message, source }) => {
                tracing::debug!(session_id = %session.id(), source = ?source, "Follow-up composed");
                say(&message.text);
            }
            Ok(SubmitOutcome::Finalize(result)) => {
                if let Some(closing) = result.transcript.last() {
                    println!("\nInterviewer: {}", closing.text);
                }
                return Ok(Some(result));
            }
            Err(SessionError::InvalidInput(_)) => {
                print!("(Take your time, type your answer and press Enter)\n> ");
                let _ = std::io::stdout().flush();
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(session_id = %session.id(), "Input closed before the interview finished");
    Ok(None)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let mut config = ParleyConfig::load_or_default(&config_file);
    config.session.budget_secs = args.resolve_budget(config.session.budget_secs);

    // Tracing. RUST_LOG wins over everything else.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let generation = build_generation(&args, &config);
    let (composer, drafter) = match generation {
        Some(service) => (
            FollowUpComposer::new(Arc::clone(&service), &config.generation),
            BulletDrafter::new(service, &config.generation, &config.bullets),
        ),
        None => (
            FollowUpComposer::offline(&config.generation),
            BulletDrafter::offline(&config.generation, &config.bullets),
        ),
    };

    let prior_context = read_prior_context(&args);
    let mut session = InterviewSession::new(&config, composer);
    let opener = session.start(prior_context.as_deref())?;
    say(&opener.text);

    let Some(result) = run_interview(&mut session).await? else {
        return Ok(());
    };

    let bullets = drafter.draft(&result).await;

    if args.json {
        let out = serde_json::json!({
            "interview": result,
            "bullets": bullets,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("\nDraft resume bullets:");
        for bullet in &bullets {
            println!("  - {}", bullet);
        }
    }

    tracing::info!(
        session_id = %result.session_id,
        reason = %result.reason,
        bullets = bullets.len(),
        "Session complete"
    );

    Ok(())
}
