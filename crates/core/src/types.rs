/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Reproducibility seed understood by the image synthesis capability.
pub type Seed = u64;
