//! Persistent storage for the LLM credential.
//!
//! The credential lives in a small JSON object on disk, under a single
//! fixed key, so it survives between runs. The default location is
//! `<config dir>/teamsim/credentials.json`.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::RunnerError;

/// Key the credential is stored under.
pub const CREDENTIAL_KEY: &str = "gemini-api-key";

/// Shortest credential accepted, counted after trimming.
pub const MIN_CREDENTIAL_LEN: usize = 10;

/// Check a credential locally and return it trimmed.
///
/// # Errors
///
/// Returns [`RunnerError::Credential`] if the trimmed credential is shorter
/// than [`MIN_CREDENTIAL_LEN`] characters.
pub fn validate_credential(raw: &str) -> Result<&str, RunnerError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() < MIN_CREDENTIAL_LEN {
        return Err(RunnerError::Credential(format!(
            "credential must be at least {MIN_CREDENTIAL_LEN} characters"
        )));
    }
    Ok(trimmed)
}

/// File-backed credential store.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// A store backed by the given file.
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// A store at the platform's default location, or under the working
    /// directory when the platform has no config directory.
    pub fn default_location() -> Self {
        let dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir.join("teamsim").join("credentials.json"))
    }

    /// The file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored credential, if any.
    ///
    /// A file that does not decode counts as holding no credential.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Io`] if the file exists but cannot be read.
    pub fn load(&self) -> Result<Option<String>, RunnerError> {
        Ok(self.read_entries()?.values.remove(CREDENTIAL_KEY))
    }

    /// Store a credential, replacing any previous one.
    ///
    /// Other entries in the file are preserved. An undecodable file is
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Io`] or [`RunnerError::Serde`] on failure.
    pub fn save(&self, credential: &str) -> Result<(), RunnerError> {
        let mut entries = self.read_entries()?.values;
        entries.insert(CREDENTIAL_KEY.to_owned(), credential.to_owned());
        self.write_entries(&entries)?;
        info!(path = %self.path.display(), "credential saved");
        Ok(())
    }

    /// Remove the stored credential. A no-op if nothing is stored; an
    /// undecodable file is removed.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Io`] or [`RunnerError::Serde`] on failure.
    pub fn clear(&self) -> Result<(), RunnerError> {
        let StoredEntries {
            values: mut entries,
            corrupt,
        } = self.read_entries()?;
        if corrupt {
            std::fs::remove_file(&self.path)?;
            info!(path = %self.path.display(), "corrupt credential file removed");
            return Ok(());
        }
        if entries.remove(CREDENTIAL_KEY).is_none() {
            debug!(path = %self.path.display(), "no credential to clear");
            return Ok(());
        }
        if entries.is_empty() {
            std::fs::remove_file(&self.path)?;
        } else {
            self.write_entries(&entries)?;
        }
        info!(path = %self.path.display(), "credential cleared");
        Ok(())
    }

    fn read_entries(&self) -> Result<StoredEntries, RunnerError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoredEntries::default()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(StoredEntries::default());
        }
        match serde_json::from_str(&contents) {
            Ok(values) => Ok(StoredEntries {
                values,
                corrupt: false,
            }),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "credential file does not decode, ignoring it");
                Ok(StoredEntries {
                    values: BTreeMap::new(),
                    corrupt: true,
                })
            }
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), RunnerError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        restrict_permissions(&self.path)?;
        Ok(())
    }
}

/// Decoded contents of the credential file.
#[derive(Default)]
struct StoredEntries {
    values: BTreeMap<String, String>,
    corrupt: bool,
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), RunnerError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), RunnerError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(label: &str) -> CredentialStore {
        let unique = format!(
            "teamsim_{label}_{}_{:?}",
            std::process::id(),
            std::thread::current().id(),
        );
        CredentialStore::new(std::env::temp_dir().join(unique).join("credentials.json"))
    }

    fn cleanup(store: &CredentialStore) {
        if let Some(dir) = store.path().parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn validation_trims_and_counts_characters() {
        assert!(matches!(validate_credential("123456789"), Err(RunnerError::Credential(_))));
        assert!(matches!(validate_credential("   12345   "), Err(RunnerError::Credential(_))));
        assert_eq!(validate_credential("  1234567890  ").ok(), Some("1234567890"));
    }

    #[test]
    fn load_from_missing_file_is_none() {
        let store = temp_store("cred_missing");
        assert_eq!(store.load().ok(), Some(None));
    }

    #[test]
    fn save_load_clear_cycle() {
        let store = temp_store("cred_cycle");
        assert!(store.save("AIzaSy-first-key").is_ok());
        assert_eq!(store.load().ok().flatten().as_deref(), Some("AIzaSy-first-key"));

        assert!(store.save("AIzaSy-second-key").is_ok());
        assert_eq!(store.load().ok().flatten().as_deref(), Some("AIzaSy-second-key"));

        assert!(store.clear().is_ok());
        assert_eq!(store.load().ok(), Some(None));
        assert!(!store.path().exists());
        assert!(store.clear().is_ok());

        cleanup(&store);
    }

    #[test]
    fn clear_preserves_unrelated_entries() {
        let store = temp_store("cred_other");
        if let Some(dir) = store.path().parent() {
            std::fs::create_dir_all(dir).ok();
        }
        std::fs::write(
            store.path(),
            r#"{"gemini-api-key": "AIzaSy-stored-key", "theme": "dark"}"#,
        )
        .ok();

        assert!(store.clear().is_ok());
        let contents = std::fs::read_to_string(store.path()).unwrap_or_default();
        assert!(contents.contains("theme"));
        assert!(!contents.contains(CREDENTIAL_KEY));

        cleanup(&store);
    }

    fn write_corrupt(store: &CredentialStore) {
        if let Some(dir) = store.path().parent() {
            std::fs::create_dir_all(dir).ok();
        }
        std::fs::write(store.path(), r#"{"gemini-api-key": "#).ok();
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let store = temp_store("cred_corrupt_load");
        write_corrupt(&store);
        assert_eq!(store.load().ok(), Some(None));
        cleanup(&store);
    }

    #[test]
    fn save_overwrites_corrupt_file() {
        let store = temp_store("cred_corrupt_save");
        write_corrupt(&store);
        assert!(store.save("AIzaSy-fresh-key").is_ok());
        assert_eq!(store.load().ok().flatten().as_deref(), Some("AIzaSy-fresh-key"));
        cleanup(&store);
    }

    #[test]
    fn clear_removes_corrupt_file() {
        let store = temp_store("cred_corrupt_clear");
        write_corrupt(&store);
        assert!(store.clear().is_ok());
        assert!(!store.path().exists());
        cleanup(&store);
    }

    #[test]
    fn default_location_ends_in_teamsim_credentials() {
        let store = CredentialStore::default_location();
        assert!(store.path().ends_with("teamsim/credentials.json"));
    }
}
