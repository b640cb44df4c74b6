//! Domain logic for the glaze image-generation backend.
//!
//! This crate is pure: no I/O, no database, no HTTP. It holds the error
//! taxonomy, request validation, gateway routing tables, usage/billing math,
//! and webhook signature verification that the other crates build on.

pub mod error;
pub mod request;
pub mod routing;
pub mod types;
pub mod usage;
pub mod webhook;
