//! Storage usage summaries.

use crate::fs::FileEntry;

/// Default storage allocation: 10 GiB.
pub const DEFAULT_ALLOCATION: u64 = 10 * 1024 * 1024 * 1024;

/// Format a byte count as a human-readable string (`1.5 MB` style).
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);
    // Two decimals, trailing zeros trimmed.
    let formatted = format!("{value:.2}");
    let formatted = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", formatted, UNITS[exponent])
}

/// Aggregate usage computed from a file listing.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageStats {
    /// Number of files counted.
    pub total_files: usize,
    /// Bytes used across all files.
    pub used_bytes: u64,
    /// Allocation the usage is measured against.
    pub allocated_bytes: u64,
}

impl StorageStats {
    /// Compute stats over a set of file entries against the default allocation.
    pub fn from_files(files: &[FileEntry]) -> Self {
        Self::with_allocation(files, DEFAULT_ALLOCATION)
    }

    /// Compute stats against an explicit allocation.
    pub fn with_allocation(files: &[FileEntry], allocated_bytes: u64) -> Self {
        let used_bytes = files.iter().map(|file| file.size).sum();
        Self {
            total_files: files.len(),
            used_bytes,
            allocated_bytes,
        }
    }

    /// Usage as a percentage of the allocation.
    pub fn usage_percent(&self) -> f64 {
        if self.allocated_bytes == 0 {
            return 0.0;
        }
        (self.used_bytes as f64 / self.allocated_bytes as f64) * 100.0
    }

    /// Human-readable used amount.
    pub fn used_display(&self) -> String {
        format_bytes(self.used_bytes)
    }

    /// Human-readable allocation.
    pub fn allocated_display(&self) -> String {
        format_bytes(self.allocated_bytes)
    }
}
