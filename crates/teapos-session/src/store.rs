//! Session persistence
//!
//! The session is kept as three string entries. `SessionManager` is the
//! only writer; everything else goes through it.

use parking_lot::RwLock;
use std::collections::HashMap;

use teapos_storage::{Database, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    AccessToken,
    RefreshToken,
    User,
}

impl SessionKey {
    pub const ALL: [SessionKey; 3] = [
        SessionKey::AccessToken,
        SessionKey::RefreshToken,
        SessionKey::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::AccessToken => "accessToken",
            SessionKey::RefreshToken => "refreshToken",
            SessionKey::User => "user",
        }
    }
}

pub trait SessionStore: Send + Sync {
    fn get(&self, key: SessionKey) -> Result<Option<String>>;

    fn set(&self, key: SessionKey, value: &str) -> Result<()>;

    /// Write several entries together. Implementations backed by a
    /// transactional store should make this atomic.
    fn replace(&self, entries: &[(SessionKey, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.set(*key, value)?;
        }
        Ok(())
    }

    /// Remove all session entries
    fn clear(&self) -> Result<()>;
}

/// Volatile store, lost when the process exits
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<SessionKey, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>> {
        Ok(self.entries.read().get(&key).cloned())
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<()> {
        self.entries.write().insert(key, value.to_string());
        Ok(())
    }

    fn replace(&self, entries: &[(SessionKey, &str)]) -> Result<()> {
        let mut map = self.entries.write();
        for (key, value) in entries {
            map.insert(*key, value.to_string());
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries.write().clear();
        Ok(())
    }
}

/// Store backed by the client's SQLite database
pub struct SqliteSessionStore {
    db: Database,
}

impl SqliteSessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self, key: SessionKey) -> Result<Option<String>> {
        self.db.get_value(key.as_str())
    }

    fn set(&self, key: SessionKey, value: &str) -> Result<()> {
        self.db.set_value(key.as_str(), value)
    }

    fn replace(&self, entries: &[(SessionKey, &str)]) -> Result<()> {
        let entries: Vec<(&str, &str)> = entries
            .iter()
            .map(|(key, value)| (key.as_str(), *value))
            .collect();
        self.db.set_values(&entries)
    }

    fn clear(&self) -> Result<()> {
        let keys = SessionKey::ALL.map(|key| key.as_str());
        self.db.remove_values(&keys)
    }
}

impl Clone for SqliteSessionStore {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}
