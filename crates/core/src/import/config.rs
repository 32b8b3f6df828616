//! Import pipeline configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the MangaDex import pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Records requested per listing call. MangaDex caps this at 100.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Pause between listing calls (milliseconds).
    /// MangaDex throttles aggressively; keep this above 200.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// Attempts per page before the run gives up on the listing.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base retry delay (milliseconds). Attempt n waits n times this.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// The remote rejects any request where offset + limit exceeds this.
    #[serde(default = "default_offset_ceiling")]
    pub offset_ceiling: u32,

    /// Offset at which the cursor window rolls over, before the ceiling
    /// is ever reached.
    #[serde(default = "default_rollover_threshold")]
    pub rollover_threshold: u32,

    /// Maximum author ids per resolution call.
    #[serde(default = "default_author_batch_limit")]
    pub author_batch_limit: usize,

    /// Default record cap for a full import run.
    #[serde(default = "default_max_records")]
    pub max_records: u64,
}

fn default_batch_size() -> u32 {
    100
}

fn default_rate_limit_ms() -> u64 {
    250
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_offset_ceiling() -> u32 {
    10_000
}

fn default_rollover_threshold() -> u32 {
    9_900
}

fn default_author_batch_limit() -> usize {
    100
}

fn default_max_records() -> u64 {
    100_000
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            rate_limit_ms: default_rate_limit_ms(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            offset_ceiling: default_offset_ceiling(),
            rollover_threshold: default_rollover_threshold(),
            author_batch_limit: default_author_batch_limit(),
            max_records: default_max_records(),
        }
    }
}
