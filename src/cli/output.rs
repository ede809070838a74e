//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::QueueError;

/// Map service errors to a string for CLI output.
pub fn map_error(e: &QueueError) -> String {
    match e {
        QueueError::UnknownCategory(name) => format!(
            "Unknown job category: {} (expected one of: {})",
            name,
            crate::category::Category::ALL
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ),
        other => other.to_string(),
    }
}
