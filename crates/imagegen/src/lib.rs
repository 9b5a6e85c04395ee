//! Client for the image synthesis capability.
//!
//! The capability accepts a structured scene description, an aspect
//! ratio, and an optional reproducibility seed, and returns rendered
//! image URLs, the seed actually used, and the description actually
//! used. [`ImageGenerator`] is the seam the synthesizer programs
//! against; [`HttpImageGenerator`] is the production implementation.

pub mod client;

pub use client::{
    HttpImageGenerator, ImageGenError, ImageGenerator, ImageResult, SynthesisRequest,
    SynthesisResponse,
};
