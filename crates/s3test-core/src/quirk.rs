// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Registry of known deviations from canonical S3 behavior.
//!
//! The set is closed: adding a quirk means adding a variant here and
//! referencing it from the cases it affects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A known deviation of an S3-compatible server from AWS S3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Quirk {
    /// The server does not support checksum based data integrity checks.
    ChecksumsNotSupported,
    /// The server drops user specified Content-Type values when the key ends with '/'.
    ContentTypeNotSetForKeysWithTrailingSlash,
    /// After copying an object, an empty ETag is returned.
    EtagEmptyAfterCopyObject,
    /// The server does not support downloading individual parts.
    GetObjectPartNotSupported,
    /// The server does not return `x-amz-mp-parts-count`.
    GetObjectPartcountNotSupported,
    /// The server returns keys in UTF-16 lexicographical order instead of UTF-8.
    KeysAreSortedInUtf16BinaryOrder,
    /// The server rejects U+0001 in keys.
    KeysWithCodepointMinRejected,
    /// The server rejects keys containing code points above U+FFFF.
    KeysWithCodepointsOutsideBmpRejected,
    /// The server does not perform strict UTF-8 validation of keys.
    KeysWithInvalidUtf8NotRejected,
    /// The server does not reject keys containing null bytes.
    KeysWithNullNotRejected,
    /// The server truncates keys at the first null byte.
    KeysWithNullAreTruncated,
    /// Keys containing '/' create implicit directory objects, like S3 Express directory buckets.
    KeysWithSlashesCreateImplicitObjects,
    /// Part sizes and counts of a completed multipart upload are not preserved.
    MultipartSizesNotKept,
    /// `If-Match: <etag>` is not supported on PutObject.
    PutObjectIfMatchEtagNotSupported,
    /// `If-None-Match: <etag>` is not supported on PutObject.
    PutObjectIfNoneMatchEtagNotSupported,
    /// `If-None-Match: *` is not supported on PutObject.
    PutObjectIfNoneMatchStarNotSupported,
    /// The storage class given by the client is not retained or returned.
    StorageClassNotKept,
}

impl Quirk {
    /// Every quirk, in declaration order.
    pub const ALL: [Quirk; 17] = [
        Self::ChecksumsNotSupported,
        Self::ContentTypeNotSetForKeysWithTrailingSlash,
        Self::EtagEmptyAfterCopyObject,
        Self::GetObjectPartNotSupported,
        Self::GetObjectPartcountNotSupported,
        Self::KeysAreSortedInUtf16BinaryOrder,
        Self::KeysWithCodepointMinRejected,
        Self::KeysWithCodepointsOutsideBmpRejected,
        Self::KeysWithInvalidUtf8NotRejected,
        Self::KeysWithNullNotRejected,
        Self::KeysWithNullAreTruncated,
        Self::KeysWithSlashesCreateImplicitObjects,
        Self::MultipartSizesNotKept,
        Self::PutObjectIfMatchEtagNotSupported,
        Self::PutObjectIfNoneMatchEtagNotSupported,
        Self::PutObjectIfNoneMatchStarNotSupported,
        Self::StorageClassNotKept,
    ];

    /// Returns the canonical quirk name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ChecksumsNotSupported => "CHECKSUMS_NOT_SUPPORTED",
            Self::ContentTypeNotSetForKeysWithTrailingSlash => {
                "CONTENT_TYPE_NOT_SET_FOR_KEYS_WITH_TRAILING_SLASH"
            }
            Self::EtagEmptyAfterCopyObject => "ETAG_EMPTY_AFTER_COPY_OBJECT",
            Self::GetObjectPartNotSupported => "GET_OBJECT_PART_NOT_SUPPORTED",
            Self::GetObjectPartcountNotSupported => "GET_OBJECT_PARTCOUNT_NOT_SUPPORTED",
            Self::KeysAreSortedInUtf16BinaryOrder => "KEYS_ARE_SORTED_IN_UTF16_BINARY_ORDER",
            Self::KeysWithCodepointMinRejected => "KEYS_WITH_CODEPOINT_MIN_REJECTED",
            Self::KeysWithCodepointsOutsideBmpRejected => {
                "KEYS_WITH_CODEPOINTS_OUTSIDE_BMP_REJECTED"
            }
            Self::KeysWithInvalidUtf8NotRejected => "KEYS_WITH_INVALID_UTF8_NOT_REJECTED",
            Self::KeysWithNullNotRejected => "KEYS_WITH_NULL_NOT_REJECTED",
            Self::KeysWithNullAreTruncated => "KEYS_WITH_NULL_ARE_TRUNCATED",
            Self::KeysWithSlashesCreateImplicitObjects => {
                "KEYS_WITH_SLASHES_CREATE_IMPLICIT_OBJECTS"
            }
            Self::MultipartSizesNotKept => "MULTIPART_SIZES_NOT_KEPT",
            Self::PutObjectIfMatchEtagNotSupported => "PUT_OBJECT_IF_MATCH_ETAG_NOT_SUPPORTED",
            Self::PutObjectIfNoneMatchEtagNotSupported => {
                "PUT_OBJECT_IF_NONE_MATCH_ETAG_NOT_SUPPORTED"
            }
            Self::PutObjectIfNoneMatchStarNotSupported => {
                "PUT_OBJECT_IF_NONE_MATCH_STAR_NOT_SUPPORTED"
            }
            Self::StorageClassNotKept => "STORAGE_CLASS_NOT_KEPT",
        }
    }

    /// Returns a one-line description of the deviation.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::ChecksumsNotSupported => "checksum based integrity checks are not supported",
            Self::ContentTypeNotSetForKeysWithTrailingSlash => {
                "Content-Type is dropped for keys ending in '/'"
            }
            Self::EtagEmptyAfterCopyObject => "CopyObject returns an empty ETag",
            Self::GetObjectPartNotSupported => "GetObject with partNumber is not supported",
            Self::GetObjectPartcountNotSupported => "x-amz-mp-parts-count is not returned",
            Self::KeysAreSortedInUtf16BinaryOrder => "keys are listed in UTF-16 binary order",
            Self::KeysWithCodepointMinRejected => "keys containing U+0001 are rejected",
            Self::KeysWithCodepointsOutsideBmpRejected => {
                "keys containing code points above U+FFFF are rejected"
            }
            Self::KeysWithInvalidUtf8NotRejected => "keys with invalid UTF-8 are accepted",
            Self::KeysWithNullNotRejected => "keys containing NUL are accepted",
            Self::KeysWithNullAreTruncated => "keys are truncated at the first NUL",
            Self::KeysWithSlashesCreateImplicitObjects => {
                "keys containing '/' create implicit directory objects"
            }
            Self::MultipartSizesNotKept => "multipart part sizes and counts are not preserved",
            Self::PutObjectIfMatchEtagNotSupported => "PutObject If-Match: <etag> is unsupported",
            Self::PutObjectIfNoneMatchEtagNotSupported => {
                "PutObject If-None-Match: <etag> is unsupported"
            }
            Self::PutObjectIfNoneMatchStarNotSupported => {
                "PutObject If-None-Match: * is unsupported"
            }
            Self::StorageClassNotKept => "the requested storage class is not retained",
        }
    }

    const fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

impl fmt::Display for Quirk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quirk {
    type Err = Error;

    /// Parses a quirk name. Matching ignores ASCII case and accepts '-' for '_'.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|q| q.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| Error::UnknownQuirk(s.to_string()))
    }
}

impl TryFrom<String> for Quirk {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Quirk> for String {
    fn from(quirk: Quirk) -> Self {
        quirk.as_str().to_string()
    }
}

/// An immutable set of quirks with constant-time membership.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct QuirkSet(u32);

impl QuirkSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Returns true if `quirk` is in the set.
    #[must_use]
    pub const fn contains(&self, quirk: Quirk) -> bool {
        self.0 & quirk.bit() != 0
    }

    /// Returns a copy of the set with `quirk` added.
    #[must_use]
    pub const fn with(self, quirk: Quirk) -> Self {
        Self(self.0 | quirk.bit())
    }

    /// Returns true if no quirk is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of quirks in the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates the contained quirks in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Quirk> + '_ {
        Quirk::ALL.into_iter().filter(|q| self.contains(*q))
    }
}

impl FromIterator<Quirk> for QuirkSet {
    fn from_iter<I: IntoIterator<Item = Quirk>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Debug for QuirkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for QuirkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|q| q.as_str()).collect();
        f.write_str(&names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_from_str() {
        for quirk in Quirk::ALL {
            assert_eq!(quirk.as_str().parse::<Quirk>().unwrap(), quirk);
        }
    }

    #[test]
    fn test_parse_is_lenient_about_case_and_dashes() {
        assert_eq!(
            "checksums-not-supported".parse::<Quirk>().unwrap(),
            Quirk::ChecksumsNotSupported
        );
        assert_eq!(
            " storage_class_not_kept ".parse::<Quirk>().unwrap(),
            Quirk::StorageClassNotKept
        );
    }

    #[test]
    fn test_parse_unknown_quirk() {
        let err = "NOT_A_QUIRK".parse::<Quirk>().unwrap_err();
        assert!(matches!(err, Error::UnknownQuirk(ref name) if name == "NOT_A_QUIRK"));
    }

    #[test]
    fn test_all_quirks_fit_in_set() {
        let all: QuirkSet = Quirk::ALL.into_iter().collect();
        assert_eq!(all.len(), Quirk::ALL.len());
        for quirk in Quirk::ALL {
            assert!(all.contains(quirk));
        }
    }

    #[test]
    fn test_set_membership() {
        let set = QuirkSet::EMPTY.with(Quirk::ChecksumsNotSupported);
        assert!(set.contains(Quirk::ChecksumsNotSupported));
        assert!(!set.contains(Quirk::StorageClassNotKept));
        assert!(!set.is_empty());
        assert!(QuirkSet::default().is_empty());
    }

    #[test]
    fn test_set_display() {
        let set: QuirkSet =
            [Quirk::StorageClassNotKept, Quirk::ChecksumsNotSupported].into_iter().collect();
        assert_eq!(set.to_string(), "CHECKSUMS_NOT_SUPPORTED,STORAGE_CLASS_NOT_KEPT");
        assert_eq!(QuirkSet::EMPTY.to_string(), "");
    }
}
