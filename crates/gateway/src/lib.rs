//! Upstream provider adapters for the glaze gateway.
//!
//! Three structurally different upstream APIs are served through one seam:
//! the vendor API ([`direct`], used for both the service-credential and
//! bring-your-own-key routes) and an OpenAI-compatible aggregator
//! ([`aggregator`]). Each adapter translates the canonical
//! [`GenerationRequest`](glaze_core::request::GenerationRequest) into its
//! wire format and parses the provider response back into a canonical
//! [`GenerationResult`]. [`client::GatewayClient`] issues the single
//! upstream call and classifies the outcome; billing and logging are the
//! caller's concern.

pub mod aggregator;
pub mod client;
pub mod direct;
pub mod error;
pub mod result;

pub use client::{GatewayClient, GatewayEndpoints};
pub use error::GatewayError;
pub use result::GenerationResult;
