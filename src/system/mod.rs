//! System interface abstractions for testing and development

pub mod commands;
pub mod filesystem;

// Re-export commonly used traits
pub use commands::{CommandExecutor, DemoCommandExecutor, RealCommandExecutor};
pub use filesystem::{DemoFilesystemReader, FilesystemReader, RealFilesystemReader};

use crate::error::{DiagError, DiagResult};
use crate::kstat::KstatTable;

/// Read and parse one kstat file through the given reader
pub fn read_kstat<F: FilesystemReader + ?Sized>(reader: &F, path: &str) -> DiagResult<KstatTable> {
    let content = reader
        .read_to_string(path)
        .map_err(|e| DiagError::filesystem_error(path, "read", e))?;
    KstatTable::parse(path, &content)
}
