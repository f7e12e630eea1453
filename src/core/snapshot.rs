//! Saved copies of the whole state, with an undo stack
//!
//! Layout in the backing [`KvStore`]:
//! - `"stack"` holds a JSON array of tokens, oldest first
//! - `"snapshot/<token>"` holds the JSON of one saved [`State`]
//!
//! Other keys in the store belong to whoever shares it and are never read
//! as snapshots.

use rand::distr::Alphanumeric;
use rand::Rng;
use tracing::{debug, info};

use crate::core::error::{ModelError, ModelResult};
use crate::core::state::State;
use crate::core::store::KvStore;

/// Key holding the token stack
pub const STACK_KEY: &str = "stack";

/// Prefix of the keys saved states live under
pub const SNAPSHOT_PREFIX: &str = "snapshot/";

/// Length of generated tokens
pub const TOKEN_LEN: usize = 8;

fn snapshot_key(token: &str) -> String {
    format!("{}{}", SNAPSHOT_PREFIX, token)
}

/// A snapshot chosen for restoring, not yet committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRestore {
    pub token: String,
    /// Whether the token came off the top of the stack
    pub popped: bool,
}

/// Save/restore of whole states in a key-value store
#[derive(Debug)]
pub struct Snapshots<S> {
    store: S,
}

impl<S: KvStore> Snapshots<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Saved tokens, oldest first
    pub fn tokens(&self) -> ModelResult<Vec<String>> {
        match self.store.get(STACK_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_tokens(&mut self, tokens: &[String]) -> ModelResult<()> {
        let raw = serde_json::to_string(tokens)?;
        self.store.set(STACK_KEY, &raw)
    }

    /// Store `state` under a fresh token and push the token on the stack
    pub fn save(&mut self, state: &State) -> ModelResult<String> {
        let token = self.fresh_token()?;
        self.store.set(&snapshot_key(&token), &state.to_json()?)?;

        let mut tokens = self.tokens()?;
        tokens.push(token.clone());
        self.write_tokens(&tokens)?;

        info!(token = %token, depth = tokens.len(), "snapshot saved");
        Ok(token)
    }

    /// Pick the snapshot a restore would use, without changing the stack
    ///
    /// With no token, this is the most recently pushed one.
    pub fn select(&self, token: Option<&str>) -> ModelResult<PendingRestore> {
        match token {
            Some(token) => Ok(PendingRestore {
                token: token.to_string(),
                popped: false,
            }),
            None => {
                let tokens = self.tokens()?;
                let token = tokens.last().cloned().ok_or(ModelError::EmptyStack)?;
                Ok(PendingRestore {
                    token,
                    popped: true,
                })
            }
        }
    }

    /// Read the state saved under `token`
    pub fn load(&self, token: &str) -> ModelResult<State> {
        let raw = self
            .store
            .get(&snapshot_key(token))?
            .ok_or_else(|| ModelError::SnapshotNotFound(token.to_string()))?;
        Ok(State::from_json(&raw)?)
    }

    /// Finish a restore: drop the token from the stack if it was popped
    pub fn commit(&mut self, pending: &PendingRestore) -> ModelResult<()> {
        if !pending.popped {
            return Ok(());
        }
        let mut tokens = self.tokens()?;
        if tokens.last() == Some(&pending.token) {
            tokens.pop();
            self.write_tokens(&tokens)?;
        }
        debug!(token = %pending.token, remaining = tokens.len(), "snapshot popped");
        Ok(())
    }

    fn fresh_token(&self) -> ModelResult<String> {
        let mut rng = rand::rng();
        loop {
            let token: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(TOKEN_LEN)
                .map(char::from)
                .collect();
            if self.store.get(&snapshot_key(&token))?.is_none() {
                return Ok(token);
            }
        }
    }
}
