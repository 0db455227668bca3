// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Request/response tracing for the S3 client.
//!
//! [`WireLogger`] is installed on every fixture client and emits `trace!`
//! events on [`WIRE_TARGET`]. They only reach a file while a
//! [`WireCapture`](crate::diagnostics::WireCapture) is active.

use aws_sdk_s3::config::interceptors::{
    BeforeDeserializationInterceptorContextRef, BeforeTransmitInterceptorContextRef,
};
use aws_sdk_s3::config::{ConfigBag, Intercept, RuntimeComponents};
use aws_sdk_s3::error::BoxError;
use tracing::trace;

/// Tracing target of wire events.
pub const WIRE_TARGET: &str = "s3test::wire";

/// Request bodies up to this size are logged when they are valid UTF-8.
const MAX_LOGGED_BODY: usize = 16 * 1024;

/// Logs each request just before transmission and each response before parsing.
#[derive(Debug, Default, Clone, Copy)]
pub struct WireLogger;

impl Intercept for WireLogger {
    fn name(&self) -> &'static str {
        "WireLogger"
    }

    fn read_before_transmit(
        &self,
        context: &BeforeTransmitInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        _cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        let request = context.request();
        trace!(target: WIRE_TARGET, ">> {} {}", request.method(), request.uri());
        for (name, value) in request.headers().iter() {
            trace!(target: WIRE_TARGET, ">> {}: {}", name, redact(name, value));
        }
        if let Some(body) = request.body().bytes().and_then(printable) {
            trace!(target: WIRE_TARGET, ">> \n{}", body);
        }
        Ok(())
    }

    fn read_before_deserialization(
        &self,
        context: &BeforeDeserializationInterceptorContextRef<'_>,
        _runtime_components: &RuntimeComponents,
        _cfg: &mut ConfigBag,
    ) -> Result<(), BoxError> {
        let response = context.response();
        trace!(target: WIRE_TARGET, "<< {}", response.status().as_u16());
        for (name, value) in response.headers().iter() {
            trace!(target: WIRE_TARGET, "<< {}: {}", name, value);
        }
        if let Some(body) = response.body().bytes().and_then(printable) {
            trace!(target: WIRE_TARGET, "<< \n{}", body);
        }
        Ok(())
    }
}

fn printable(bytes: &[u8]) -> Option<&str> {
    if bytes.is_empty() || bytes.len() > MAX_LOGGED_BODY {
        return None;
    }
    std::str::from_utf8(bytes).ok()
}

fn redact<'a>(name: &str, value: &'a str) -> &'a str {
    const SECRET_HEADERS: [&str; 2] = ["authorization", "x-amz-security-token"];
    if SECRET_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h)) {
        "<redacted>"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_bodies() {
        assert_eq!(printable(b"<Delete/>"), Some("<Delete/>"));
        assert_eq!(printable(b""), None);
        assert_eq!(printable(&[0xff, 0xfe]), None);
        assert_eq!(printable(&vec![b'a'; MAX_LOGGED_BODY + 1]), None);
    }

    #[test]
    fn test_credentials_are_redacted() {
        assert_eq!(redact("Authorization", "AWS4-HMAC-SHA256 ..."), "<redacted>");
        assert_eq!(redact("x-amz-security-token", "token"), "<redacted>");
        assert_eq!(redact("content-type", "text/plain"), "text/plain");
    }
}
