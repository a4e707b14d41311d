pub mod token;

use tracing::{debug, warn};

use crate::errors::ClientError;
use crate::models::Session;
use crate::storage::KeyValueStorage;

/// Storage key holding the serialized session.
pub const SESSION_STORAGE_KEY: &str = "resume_bestie_user";

/// Reads and writes the one persisted session through an injected storage.
pub struct SessionStore<S> {
    storage: S,
}

impl<S: KeyValueStorage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Loads the persisted session, if any.
    ///
    /// Never fails: an unreadable or invalid entry is removed and treated as
    /// "no prior session".
    pub fn restore(&self) -> Option<Session> {
        let raw = match self.storage.get(SESSION_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read saved session, discarding: {e}");
                self.discard();
                return None;
            }
        };

        let parsed = serde_json::from_str::<Session>(&raw)
            .map_err(ClientError::from)
            .and_then(Session::validate);

        match parsed {
            Ok(session) => {
                debug!(user_id = %session.user.id, "restored saved session");
                Some(session)
            }
            Err(e) => {
                warn!("Failed to parse saved session, discarding: {e}");
                self.discard();
                None
            }
        }
    }

    /// Writes `session` to storage. Unverified sessions are skipped.
    pub fn persist(&self, session: &Session) -> Result<bool, ClientError> {
        if !session.verified {
            debug!("not persisting unverified session");
            return Ok(false);
        }
        let raw = serde_json::to_string(session)?;
        self.storage.set(SESSION_STORAGE_KEY, &raw)?;
        Ok(true)
    }

    pub fn clear(&self) -> Result<(), ClientError> {
        self.storage.remove(SESSION_STORAGE_KEY)
    }

    fn discard(&self) {
        if let Err(e) = self.clear() {
            warn!("Failed to remove corrupted session entry: {e}");
        }
    }
}
