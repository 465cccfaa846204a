#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Store client boundary for the occload load generator.
//!
//! The load generator only ever talks to a relational store through the
//! [`StoreClient`] trait: one synchronous-looking call that submits a batch
//! of rows and succeeds or fails as a unit. Everything behind that call
//! (connection pooling, credentials, statement construction) is a
//! collaborator's concern.
//!
//! What this crate does own is the failure surface:
//!
//! - **Structured errors**: [`StoreError`] carries an explicit code per
//!   failure class instead of free-form message text.
//! - **Classification**: [`classify`] maps every code to an
//!   [`ErrorClassification`] (retryable conflict, known-fatal, or unknown),
//!   with unknown treated as non-retryable by policy.
//! - **A harness collaborator**: [`SimulatedStore`] injects conflicts and
//!   fatal errors deterministically from a seed, standing in for a real
//!   backend in the load harness and the test suites.

pub mod classify;
pub mod client;
pub mod error;
pub mod sim;

// Re-export commonly used types
pub use classify::{ErrorClassification, TransientCode, classify};
pub use client::{Row, SqlValue, StoreClient};
pub use error::{Result, StoreError};
pub use sim::{FaultProfile, SimulatedStore};
