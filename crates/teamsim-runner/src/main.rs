//! Terminal entry point for the team management simulation.
//!
//! Loads configuration from the environment, makes sure a credential is
//! available, then plays games on stdin/stdout until the player quits.
//! Logs go to stderr; set `RUST_LOG` to adjust verbosity.

use std::sync::Arc;

use anyhow::Context;
use teamsim_core::{EngineConfig, Outcome};
use teamsim_runner::prompt::PromptEngine;
use teamsim_runner::terminal::{
    parse_choice, render_end, render_feedback, render_scenario, thinking,
};
use teamsim_runner::{CredentialStore, NarrativeService, RunnerConfig, RunnerError, Session};
use teamsim_types::{Difficulty, GameStatus, Language};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type Input = Lines<BufReader<Stdin>>;

/// What the player picked on the end screen.
enum Next {
    PlayAgain,
    ChangeKey,
    Quit,
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, credential storage, or stdin fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("teamsim starting");

    let config = RunnerConfig::from_env()?;
    let engine_config = match &config.engine_config_path {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading engine config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    info!(
        backend = ?config.backend.backend_type,
        model = config.backend.model,
        max_turns = engine_config.max_turns,
        provider_timeout_ms = engine_config.provider_timeout_ms,
        "configuration loaded"
    );

    let prompts = PromptEngine::load(config.templates_dir.as_deref())?;
    let credentials = match config.credentials_path.clone() {
        Some(path) => CredentialStore::new(path),
        None => CredentialStore::default_location(),
    };
    info!(path = %credentials.path().display(), "credential store ready");

    let service = Arc::new(NarrativeService::new(config.backend.clone(), prompts));
    let session = Session::new(service, credentials, engine_config);
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut seed = config.seed_api_key;

    loop {
        if !ensure_credential(&session, &mut seed, &mut input).await? {
            break;
        }
        match play(&session, &mut input).await? {
            Next::PlayAgain => session.engine().restart().await,
            Next::ChangeKey => session.clear_credential().await?,
            Next::Quit => break,
        }
    }

    info!("teamsim exiting");
    Ok(())
}

/// Make sure the service has a credential the backend accepts.
///
/// Tries the stored credential, then `TEAMSIM_API_KEY`, then asks on stdin.
/// Returns `false` if stdin closes first.
async fn ensure_credential(
    session: &Session,
    seed: &mut Option<String>,
    input: &mut Input,
) -> anyhow::Result<bool> {
    if session.is_ready().await {
        return Ok(true);
    }
    if session.resume().await? && accepted(session).await? {
        return Ok(true);
    }
    if let Some(key) = seed.take() {
        match session.submit_credential(&key).await {
            Ok(()) => {
                if accepted(session).await? {
                    return Ok(true);
                }
            }
            Err(RunnerError::Credential(reason)) => {
                warn!(%reason, "TEAMSIM_API_KEY rejected");
            }
            Err(e) => return Err(e.into()),
        }
    }

    loop {
        println!("Enter your API key (at least 10 characters):");
        let Some(line) = input.next_line().await? else {
            return Ok(false);
        };
        match session.submit_credential(&line).await {
            Ok(()) => {
                if accepted(session).await? {
                    return Ok(true);
                }
            }
            Err(RunnerError::Credential(reason)) => println!("Invalid API key: {reason}"),
            Err(e) => return Err(e.into()),
        }
    }
}

/// Verify the credential upstream; a rejection has already cleared it.
async fn accepted(session: &Session) -> anyhow::Result<bool> {
    match session.verify_credential().await {
        Ok(()) => Ok(true),
        Err(RunnerError::Credential(reason)) => {
            println!("The API key was rejected: {reason}");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Play one game from the start screen to the end screen.
async fn play(session: &Session, input: &mut Input) -> anyhow::Result<Next> {
    let engine = session.engine();

    println!("Language [en/ko] (default en):");
    let Some(line) = input.next_line().await? else {
        return Ok(Next::Quit);
    };
    let language = parse_or_default::<Language>(&line);

    println!("Difficulty [easy/normal/hard] (default normal):");
    let Some(line) = input.next_line().await? else {
        return Ok(Next::Quit);
    };
    let difficulty = parse_or_default::<Difficulty>(&line);

    println!("{}", thinking(language));
    engine.start(language, difficulty).await;
    let mut views = engine.subscribe();

    loop {
        let state = engine.state();
        match state.status {
            GameStatus::InProgress => {
                let Some(scenario) = state.current_scenario.clone() else {
                    views.changed().await?;
                    continue;
                };
                println!("{}", render_scenario(&state, &scenario, engine.config().max_turns));
                let choice = loop {
                    let Some(line) = input.next_line().await? else {
                        return Ok(Next::Quit);
                    };
                    if let Some(choice) = parse_choice(&line, &scenario) {
                        break choice;
                    }
                    println!("Pick one of the numbered choices.");
                };
                println!("{}", thinking(language));
                engine.submit_choice(&choice).await;
            }
            GameStatus::ShowFeedback => {
                if let Some(feedback) = &state.feedback {
                    println!("{}\n", render_feedback(feedback, language));
                }
                views
                    .wait_for(|v| v.state.status != GameStatus::ShowFeedback)
                    .await?;
            }
            GameStatus::EndScreen => {
                println!("{}", render_end(&state));
                info!(
                    outcome = ?Outcome::evaluate(&state.stats),
                    turn = state.turn,
                    "game finished"
                );
                break;
            }
            GameStatus::StartScreen => return Ok(Next::PlayAgain),
        }
    }

    loop {
        println!("[p] Play again  [c] Change API key  [q] Quit");
        let Some(line) = input.next_line().await? else {
            return Ok(Next::Quit);
        };
        match line.trim().to_lowercase().as_str() {
            "p" | "" => return Ok(Next::PlayAgain),
            "c" => return Ok(Next::ChangeKey),
            "q" => return Ok(Next::Quit),
            _ => {}
        }
    }
}

fn parse_or_default<T>(line: &str) -> T
where
    T: std::str::FromStr + Default,
{
    if line.trim().is_empty() {
        return T::default();
    }
    line.parse().unwrap_or_else(|_| {
        println!("Unrecognized option, using the default.");
        T::default()
    })
}
