// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Include/exclude selection of cases by name.

use std::fmt;

use regex::Regex;

use crate::error::{Error, Result};

/// Why the filter rejected a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The case matched an exclude pattern.
    Excluded,
    /// Include patterns exist and the case matched none of them.
    NotIncluded,
}

impl Rejection {
    /// Returns the label printed next to the case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Excluded => "excluded",
            Self::NotIncluded => "not included",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full-match regex filter over case names. Exclusion takes precedence over inclusion.
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    exclude: Vec<Regex>,
    include: Vec<Regex>,
}

impl RunFilter {
    /// Compiles the exclude and include patterns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for the first pattern that does not compile.
    pub fn new<E, I>(exclude: E, include: I) -> Result<Self>
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Ok(Self { exclude: compile_all(exclude)?, include: compile_all(include)? })
    }

    /// A filter that accepts every case.
    #[must_use]
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Checks a case name against the filter.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] when the case must not run.
    pub fn evaluate(&self, name: &str) -> std::result::Result<(), Rejection> {
        if self.exclude.iter().any(|re| re.is_match(name)) {
            return Err(Rejection::Excluded);
        }
        if !self.include.is_empty() && !self.include.iter().any(|re| re.is_match(name)) {
            return Err(Rejection::NotIncluded);
        }
        Ok(())
    }

    /// Returns true if the case may run.
    #[must_use]
    pub fn accepts(&self, name: &str) -> bool {
        self.evaluate(name).is_ok()
    }
}

fn compile_all<P>(patterns: P) -> Result<Vec<Regex>>
where
    P: IntoIterator,
    P::Item: AsRef<str>,
{
    patterns.into_iter().map(|p| compile_full_match(p.as_ref())).collect()
}

fn compile_full_match(pattern: &str) -> Result<Regex> {
    // Wrapping can balance a broken pattern such as ")|(", so it is checked alone first.
    Regex::new(pattern)
        .map_err(|source| Error::InvalidPattern { pattern: pattern.to_string(), source })?;
    Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|source| Error::InvalidPattern { pattern: pattern.to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_accepts_everything() {
        let filter = RunFilter::accept_all();
        assert!(filter.accepts("anything"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let filter = RunFilter::new([".*Multipart.*"], ["Get.*"]).unwrap();
        assert_eq!(filter.evaluate("GetObjectBasic"), Ok(()));
        assert_eq!(filter.evaluate("GetObjectMultipartCopy"), Err(Rejection::Excluded));
        assert_eq!(filter.evaluate("PutObjectBasic"), Err(Rejection::NotIncluded));
    }

    #[test]
    fn test_patterns_must_match_whole_name() {
        let filter = RunFilter::new(Vec::<String>::new(), ["Object"]).unwrap();
        assert!(!filter.accepts("GetObject"));
        assert!(filter.accepts("Object"));

        let filter = RunFilter::new(["get"], Vec::<String>::new()).unwrap();
        assert!(filter.accepts("get_object"));
        assert!(!filter.accepts("get"));
    }

    #[test]
    fn test_alternation_is_anchored_as_a_group() {
        let filter = RunFilter::new(Vec::<String>::new(), ["a|b"]).unwrap();
        assert!(filter.accepts("a"));
        assert!(filter.accepts("b"));
        assert!(!filter.accepts("ab"));
        assert!(!filter.accepts("xa"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RunFilter::new(["("], Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { ref pattern, .. } if pattern == "("));
        assert!(err.is_configuration());

        assert!(RunFilter::new(Vec::<String>::new(), [")|("]).is_err());
    }

    #[test]
    fn test_rejection_labels() {
        assert_eq!(Rejection::Excluded.to_string(), "excluded");
        assert_eq!(Rejection::NotIncluded.to_string(), "not included");
    }
}
