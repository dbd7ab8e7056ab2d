// Utilities for storage module
pub mod error;
pub mod path;

/// Output format for commands that can render machine-readable results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human friendly table with per-file status
    #[default]
    Human,
    /// Single-line JSON output
    Json,
}
