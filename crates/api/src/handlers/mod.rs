pub mod identities;
pub mod jobs;
