mod file;
mod map;
mod memory;

pub use file::JsonFileStore;
pub use map::CommandMap;
pub(crate) use map::json_kind;
pub use memory::MemoryStore;

use crate::errors::AppResult;

/// Whole-document persistence for the command mapping.
///
/// There is no partial I/O: `load` returns every record and `save`
/// overwrites every record. The last successful `save` wins.
pub trait CommandStore: Send + Sync {
    fn load(&self) -> AppResult<CommandMap>;

    fn save(&self, commands: &CommandMap) -> AppResult<()>;

    fn describe(&self) -> String;
}
