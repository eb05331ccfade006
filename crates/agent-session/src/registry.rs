//! Working-directory keyed registry of persistent shells.
//!
//! The host process owns one `SessionRegistry`; every tool that needs a
//! shell for a directory asks it instead of reaching for a global.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::session::{PersistentShell, SessionError};
use crate::shell::{default_shell, ShellInfo};

pub struct SessionRegistry {
    shell: ShellInfo,
    sessions: Mutex<HashMap<PathBuf, Arc<PersistentShell>>>,
}

impl SessionRegistry {
    /// Create a registry whose sessions run `shell`.
    pub fn new(shell: ShellInfo) -> Self {
        Self {
            shell,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Create a registry using the detected default shell.
    pub fn with_default_shell() -> Result<Self, SessionError> {
        default_shell().map(Self::new).ok_or(SessionError::NoShell)
    }

    pub fn shell(&self) -> &ShellInfo {
        &self.shell
    }

    /// Return the session for `dir`, starting one if none exists yet.
    pub fn get_or_create(&self, dir: &Path) -> Arc<PersistentShell> {
        let key = registry_key(dir);
        let mut sessions = self.sessions.lock().unwrap();
        sessions
            .entry(key.clone())
            .or_insert_with(|| {
                tracing::debug!(dir = %key.display(), shell = %self.shell.id, "Starting persistent shell");
                Arc::new(PersistentShell::new(self.shell.clone(), key))
            })
            .clone()
    }

    /// Look up an existing session without creating one.
    pub fn get(&self, dir: &Path) -> Option<Arc<PersistentShell>> {
        self.sessions.lock().unwrap().get(&registry_key(dir)).cloned()
    }

    /// Forget the session for `dir`. In-flight commands keep their handle.
    pub fn remove(&self, dir: &Path) -> Option<Arc<PersistentShell>> {
        self.sessions.lock().unwrap().remove(&registry_key(dir))
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().unwrap().is_empty()
    }
}

fn registry_key(dir: &Path) -> PathBuf {
    dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ShellSession;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(ShellInfo::new("sh", "Shell", "/bin/sh"))
    }

    #[test]
    fn test_same_directory_shares_session() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry();

        let a = registry.get_or_create(dir.path());
        let b = registry.get_or_create(&dir.path().join("."));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_directories_get_distinct_sessions() {
        let one = tempfile::tempdir().unwrap();
        let two = tempfile::tempdir().unwrap();
        let registry = registry();

        let a = registry.get_or_create(one.path());
        let b = registry.get_or_create(two.path());
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_get_returns_canonical_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry();

        registry
            .get_or_create(dir.path())
            .set_blocked_commands(vec!["curl".into()]);
        let again = registry.get(dir.path()).unwrap();
        assert_eq!(
            again.working_directory(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry();

        registry.get_or_create(dir.path());
        assert!(registry.remove(dir.path()).is_some());
        assert!(registry.is_empty());
        assert!(registry.get(dir.path()).is_none());
    }
}
