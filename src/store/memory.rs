use super::{CommandMap, CommandStore};
use crate::errors::{AppError, AppResult};
use std::sync::Mutex;

/// Store kept entirely in memory, for tests and throwaway servers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    commands: Mutex<CommandMap>,
}

impl MemoryStore {
    pub fn new(commands: CommandMap) -> Self {
        Self {
            commands: Mutex::new(commands),
        }
    }

    pub fn snapshot(&self) -> AppResult<CommandMap> {
        self.load()
    }
}

impl CommandStore for MemoryStore {
    fn load(&self) -> AppResult<CommandMap> {
        self.commands
            .lock()
            .map(|commands| commands.clone())
            .map_err(|_| AppError::StoreRead("memory store lock poisoned".to_string()))
    }

    fn save(&self, commands: &CommandMap) -> AppResult<()> {
        let mut guard = self
            .commands
            .lock()
            .map_err(|_| AppError::StoreWrite("memory store lock poisoned".to_string()))?;
        *guard = commands.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
