// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Core types for the s3test conformance harness.
//!
//! This crate holds everything that can be decided without talking to a server:
//! - The closed registry of known server quirks
//! - Target resolution from URIs and named profiles
//! - The skip policy that gates cases on quirks
//! - Include/exclude filtering over case names
//! - Configuration and the error type

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod filter;
pub mod quirk;
pub mod skip;
pub mod target;

pub use config::{Config, DiagnosticsConfig, LogFormat, LoggingConfig, Profile};
pub use error::{Error, Result};
pub use filter::{Rejection, RunFilter};
pub use quirk::{Quirk, QuirkSet};
pub use skip::{should_skip, SkipReason};
pub use target::{Credentials, Target};
