// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Quirk-based skip policy.

use std::fmt;

use crate::quirk::Quirk;
use crate::target::Target;

/// Why a case was not executed against a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipReason {
    /// The first declared quirk the target exhibits.
    pub quirk: Quirk,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ignored due to quirk {}", self.quirk)
    }
}

/// Decides whether a case that is incompatible with `skip_for_quirks` may run on `target`.
///
/// Quirks are checked in declaration order and the first one the target
/// exhibits becomes the reason. Returns `None` when the case must run.
#[must_use]
pub fn should_skip(skip_for_quirks: &[Quirk], target: &Target) -> Option<SkipReason> {
    skip_for_quirks
        .iter()
        .copied()
        .find(|quirk| target.has_quirk(*quirk))
        .map(|quirk| SkipReason { quirk })
}
