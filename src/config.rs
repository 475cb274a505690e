//! Merge configuration

/// Maximum number of input slots offered to the user
pub const MAX_SLOTS: usize = 10;

/// Filename used when the user leaves the output name blank
pub const DEFAULT_FILENAME: &str = "merged.pdf";

/// Settings shared by the slot manager, the sequencer and the document library
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    /// Upper bound on active slots (never below 1)
    pub max_slots: usize,
    /// Output filename when none is given
    pub default_filename: String,
    /// PDF version written into the output header
    pub pdf_version: String,
    /// Compress streams of the output document
    pub compress: bool,
    /// Producer written into the output Info dictionary
    pub producer: Option<String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            max_slots: MAX_SLOTS,
            default_filename: DEFAULT_FILENAME.to_string(),
            pdf_version: "1.5".to_string(),
            compress: true,
            producer: Some(format!("pdf-range-merge {}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

impl MergeConfig {
    /// Slot limit with the floor of one applied
    pub fn slot_limit(&self) -> usize {
        self.max_slots.max(1)
    }

    /// Pick the output filename: the trimmed user value, or the default when blank
    pub fn output_filename(&self, requested: &str) -> String {
        let trimmed = requested.trim();
        if trimmed.is_empty() {
            self.default_filename.clone()
        } else {
            trimmed.to_string()
        }
    }
}
