//! Covera Core — domain models, error taxonomy, and repository contracts
//! for the warranty coverage platform.
//!
//! This crate holds everything the decision logic needs and nothing it
//! doesn't: the entity models, the pure classification functions that hang
//! off them (warranty lifecycle, request transition legality), the error
//! types every caller matches on, and the repository traits the storage
//! crate implements.

pub mod error;
pub mod models;
pub mod repository;
