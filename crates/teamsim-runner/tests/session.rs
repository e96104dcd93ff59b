//! Integration tests for the credential lifecycle and the LLM-backed engine.
//!
//! No test reaches a real LLM: the service is either uninitialized or points
//! at a local port nothing listens on, so every game runs on fallbacks.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use teamsim_core::engine::start_screen_state;
use teamsim_core::{EngineConfig, StartOutcome, SubmitOutcome};
use teamsim_runner::config::{BackendSettings, BackendType};
use teamsim_runner::prompt::PromptEngine;
use teamsim_runner::{CredentialStore, NarrativeService, RunnerError, Session};
use teamsim_types::{Difficulty, GameStatus, Language};

fn temp_path(label: &str) -> PathBuf {
    let unique = format!(
        "teamsim_session_{label}_{}_{:?}",
        std::process::id(),
        std::thread::current().id(),
    );
    std::env::temp_dir().join(unique).join("credentials.json")
}

fn session_with(label: &str, settings: BackendSettings, config: EngineConfig) -> Session {
    let prompts = PromptEngine::builtin().unwrap();
    let service = Arc::new(NarrativeService::new(settings, prompts));
    Session::new(service, CredentialStore::new(temp_path(label)), config)
}

fn session(label: &str) -> Session {
    session_with(label, BackendSettings::default(), EngineConfig::default())
}

fn cleanup(session: &Session) {
    if let Some(dir) = session.credentials().path().parent() {
        std::fs::remove_dir_all(dir).ok();
    }
}

#[tokio::test]
async fn resume_without_stored_credential_is_not_ready() {
    let session = session("resume_empty");
    assert!(!session.resume().await.unwrap());
    assert!(!session.is_ready().await);
    cleanup(&session);
}

#[tokio::test]
async fn submitted_credential_survives_into_a_new_session() {
    let first = session("persist");
    first.submit_credential("  AIzaSy-valid-credential  ").await.unwrap();
    assert!(first.is_ready().await);
    assert_eq!(
        first.credentials().load().unwrap().as_deref(),
        Some("AIzaSy-valid-credential")
    );

    let second = session("persist");
    assert!(second.resume().await.unwrap());
    assert!(second.is_ready().await);
    cleanup(&second);
}

#[tokio::test]
async fn short_credential_is_neither_used_nor_stored() {
    let session = session("short");
    let result = session.submit_credential("abc").await;
    assert!(matches!(result, Err(RunnerError::Credential(_))));
    assert!(!session.is_ready().await);
    assert_eq!(session.credentials().load().unwrap(), None);
    cleanup(&session);
}

#[tokio::test]
async fn invalid_stored_credential_is_cleared_on_resume() {
    let session = session("bad_stored");
    session.credentials().save("tiny").unwrap();

    assert!(!session.resume().await.unwrap());
    assert!(!session.is_ready().await);
    assert_eq!(session.credentials().load().unwrap(), None);
    cleanup(&session);
}

#[tokio::test]
async fn corrupt_credential_file_is_recoverable() {
    let session = session("corrupt");
    let path = session.credentials().path().to_path_buf();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();

    std::fs::write(&path, r#"{"gemini-api-key": "#).unwrap();
    assert!(!session.resume().await.unwrap());
    session.clear_credential().await.unwrap();
    assert!(!path.exists());

    std::fs::write(&path, r#"{"gemini-api-key": "#).unwrap();
    session.submit_credential("AIzaSy-valid-credential").await.unwrap();
    assert!(session.is_ready().await);
    assert_eq!(
        session.credentials().load().unwrap().as_deref(),
        Some("AIzaSy-valid-credential")
    );
    cleanup(&session);
}

#[tokio::test]
async fn failed_save_leaves_service_uninitialized() {
    let blocker = temp_path("save_fails").parent().unwrap().to_path_buf();
    std::fs::write(&blocker, "not a directory").unwrap();
    let prompts = PromptEngine::builtin().unwrap();
    let service = Arc::new(NarrativeService::new(BackendSettings::default(), prompts));
    let store = CredentialStore::new(blocker.join("nested").join("credentials.json"));
    let session = Session::new(service, store, EngineConfig::default());

    let result = session.submit_credential("AIzaSy-valid-credential").await;
    assert!(matches!(result, Err(RunnerError::Io(_))));
    assert!(!session.is_ready().await);
    std::fs::remove_file(&blocker).ok();
}

#[tokio::test(start_paused = true)]
async fn clearing_credential_resets_service_and_engine() {
    let session = session("clear");
    session.submit_credential("AIzaSy-valid-credential").await.unwrap();

    session.clear_credential().await.unwrap();

    assert!(!session.is_ready().await);
    assert_eq!(session.credentials().load().unwrap(), None);
    assert_eq!(session.engine().state(), start_screen_state());
    cleanup(&session);
}

#[tokio::test(start_paused = true)]
async fn uninitialized_service_plays_a_fallback_game() {
    let session = session("fallback_game");
    let engine = session.engine();

    let outcome = engine.start(Language::En, Difficulty::Normal).await;
    assert_eq!(outcome, StartOutcome::Ready { fallback: true });

    let scenario = engine.state().current_scenario.unwrap();
    let choice = scenario.choices.first().cloned().unwrap();
    let outcome = engine.submit_choice(&choice).await;
    assert_eq!(
        outcome,
        SubmitOutcome::Resolved {
            fallback: true,
            ends_game: true
        }
    );

    tokio::time::sleep(Duration::from_millis(4001)).await;
    let state = engine.state();
    assert_eq!(state.status, GameStatus::EndScreen);
    assert_eq!(state.stats.morale, 65);
    cleanup(&session);
}

#[tokio::test]
async fn unreachable_backend_falls_back() {
    let settings = BackendSettings {
        backend_type: BackendType::OpenAi,
        api_url: "http://127.0.0.1:9".to_owned(),
        model: "offline".to_owned(),
    };
    let config = EngineConfig {
        provider_timeout_ms: 5_000,
        ..EngineConfig::default()
    };
    let session = session_with("unreachable", settings, config);
    session.submit_credential("sk-test-credential").await.unwrap();

    let outcome = session.engine().start(Language::Ko, Difficulty::Easy).await;
    assert_eq!(outcome, StartOutcome::Ready { fallback: true });
    assert_eq!(
        session.engine().state().current_scenario.map(|s| s.title),
        Some("예상치 못한 다운타임".to_owned())
    );
    cleanup(&session);
}
