//! Display module for terminal output, fixed-width tables and line protocol

pub mod formatter;
pub mod line_protocol;
pub mod progress;
pub mod table;
pub mod terminal;

// Re-export commonly used items
pub use formatter::{format_bytes, format_bytes_ratio, format_count, format_percent};
pub use line_protocol::{FieldValue, Line};
pub use progress::ProgressBar;
pub use table::{Column, RowFormat};
pub use terminal::Terminal;
