//! Mutable interpreter state handed to every command.

use crate::registry::ClassRegistry;
use crate::storage::FileStorage;

/// State shared by all commands of one console session.
///
/// Contains:
/// - `storage`: the live object store and its backing file.
/// - `registry`: the known entity classes.
/// - `should_exit`: a flag the REPL loop checks to know when to terminate.
pub struct Session {
    /// The record store mutated by commands.
    pub storage: FileStorage,
    /// Class table used for validation and instantiation.
    pub registry: ClassRegistry,
    /// When set to true, the interactive loop exits after the current line.
    pub should_exit: bool,
}

impl Session {
    /// Wrap a storage handle with a freshly populated class registry.
    pub fn new(storage: FileStorage) -> Self {
        Self {
            storage,
            registry: ClassRegistry::new(),
            should_exit: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Session;
    use crate::storage::FileStorage;
    use tempfile::TempDir;

    #[test]
    fn test_new_session_starts_running() {
        let dir = TempDir::new().expect("temp dir");
        let session = Session::new(FileStorage::new(dir.path().join("file.json")));
        assert!(!session.should_exit);
        assert!(session.registry.is_known("BaseModel"));
        assert!(session.storage.all().is_empty());
    }
}
