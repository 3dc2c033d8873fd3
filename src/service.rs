use crate::errors::{AppError, AppResult};
use crate::models::{CommandRecord, PatchMode, DEFAULT_COMMAND_KEY};
use crate::patch::{merge_record, with_value_at_path};
use crate::record::prune_empty_session_data;
use crate::store::{json_kind, CommandMap, CommandStore};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Command operations over a [`CommandStore`].
///
/// Every call loads the whole mapping, changes it, and saves it back; no
/// state is kept between calls. With `serialize_writes` the mutating calls
/// run one at a time, so two concurrent writers cannot drop each other's
/// change. Without it the last `save` wins.
#[derive(Clone)]
pub struct CommandService {
    store: Arc<dyn CommandStore>,
    write_gate: Option<Arc<Mutex<()>>>,
}

impl CommandService {
    pub fn new(store: Arc<dyn CommandStore>, serialize_writes: bool) -> Self {
        Self {
            store,
            write_gate: serialize_writes.then(|| Arc::new(Mutex::new(()))),
        }
    }

    pub fn store_description(&self) -> String {
        self.store.describe()
    }

    pub fn list_all(&self) -> AppResult<CommandMap> {
        self.store.load()
    }

    pub fn get_one(&self, key: &str) -> AppResult<Value> {
        let commands = self.store.load()?;
        commands.get(key).cloned().ok_or_else(|| not_found(key))
    }

    /// Adds the placeholder record under [`DEFAULT_COMMAND_KEY`].
    pub fn add_default(&self) -> AppResult<Value> {
        let record = serde_json::to_value(CommandRecord::placeholder())?;
        self.add(DEFAULT_COMMAND_KEY, record)
    }

    pub fn add(&self, key: &str, mut record: Value) -> AppResult<Value> {
        validate_key(key)?;
        validate_record_shape(&record)?;
        prune_empty_session_data(&mut record);
        self.with_write_gate(|| {
            let mut commands = self.store.load()?;
            if commands.contains_key(key) {
                return Err(AppError::Conflict(format!("Command with id {} already exists", key)));
            }
            commands.insert(key, record.clone());
            self.store.save(&commands)?;
            tracing::info!(key = %key, "command added");
            Ok(record)
        })
    }

    /// Renames `old_key` to `new_key` in place and applies `patch` to its
    /// value, then drops any session-data block left empty.
    pub fn rename_and_patch(&self, old_key: &str, new_key: &str, patch: Value, mode: PatchMode) -> AppResult<Value> {
        validate_key(new_key)?;
        validate_record_shape(&patch)?;
        self.with_write_gate(|| {
            let commands = self.store.load()?;
            let existing = commands.get(old_key).ok_or_else(|| not_found(old_key))?;
            if new_key != old_key && commands.contains_key(new_key) {
                return Err(AppError::Conflict(format!(
                    "cannot rename {} to {}: a command with that id already exists",
                    old_key, new_key
                )));
            }

            let mut updated = merge_record(existing, patch, mode);
            prune_empty_session_data(&mut updated);

            let next = commands
                .renamed(old_key, new_key, updated.clone())
                .ok_or_else(|| not_found(old_key))?;
            self.store.save(&next)?;
            tracing::info!(old_key = %old_key, new_key = %new_key, "command updated");
            Ok(updated)
        })
    }

    /// Sets one dotted-path field on a record, e.g. `set_session_data.name`.
    pub fn patch_field(&self, key: &str, path: &str, value: Value) -> AppResult<Value> {
        self.with_write_gate(|| {
            let mut commands = self.store.load()?;
            let existing = commands.get(key).cloned().ok_or_else(|| not_found(key))?;

            let mut updated = with_value_at_path(existing, path, value)?;
            validate_record_shape(&updated)?;
            prune_empty_session_data(&mut updated);

            commands.insert(key, updated.clone());
            self.store.save(&commands)?;
            tracing::info!(key = %key, path = %path, "command field updated");
            Ok(updated)
        })
    }

    pub fn replace_all(&self, commands: CommandMap) -> AppResult<()> {
        self.with_write_gate(|| {
            self.store.save(&commands)?;
            tracing::info!(count = commands.len(), "command store replaced");
            Ok(())
        })
    }

    pub fn delete_one(&self, key: &str) -> AppResult<()> {
        self.with_write_gate(|| {
            let commands = self.store.load()?;
            let remaining = commands.without(key);
            if remaining.len() == commands.len() {
                return Err(not_found(key));
            }
            self.store.save(&remaining)?;
            tracing::info!(key = %key, "command deleted");
            Ok(())
        })
    }

    fn with_write_gate<T>(&self, f: impl FnOnce() -> AppResult<T>) -> AppResult<T> {
        let _guard = match &self.write_gate {
            Some(gate) => Some(
                gate.lock()
                    .map_err(|_| AppError::Internal("command store write lock poisoned".to_string()))?,
            ),
            None => None,
        };
        f()
    }
}

fn not_found(key: &str) -> AppError {
    AppError::NotFound(format!("Command with id {} not found", key))
}

fn validate_key(key: &str) -> AppResult<()> {
    if key.trim().is_empty() {
        return Err(AppError::Validation("command id must not be blank".to_string()));
    }
    Ok(())
}

fn validate_record_shape(record: &Value) -> AppResult<()> {
    if !record.is_object() {
        return Err(AppError::Validation(format!(
            "command data must be an object, got {}",
            json_kind(record)
        )));
    }
    CommandRecord::from_json(record)
        .map(|_| ())
        .map_err(|error| AppError::Validation(format!("invalid command data: {}", error)))
}
