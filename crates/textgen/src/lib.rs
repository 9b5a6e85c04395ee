//! Client for the structured text generation capability.
//!
//! The capability is a black box: given instructions, a user prompt, and
//! a target JSON schema, it returns a conforming JSON value or fails.
//! [`StructuredGenerator`] is the seam the pipeline programs against;
//! [`HttpStructuredGenerator`] is the production implementation.

pub mod client;

pub use client::{HttpStructuredGenerator, StructuredGenerator, TextGenError};
