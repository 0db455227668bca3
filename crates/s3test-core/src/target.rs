// Copyright 2025 The s3test Authors
// SPDX-License-Identifier: Apache-2.0

//! Description of the service under test.
//!
//! A [`Target`] is resolved once at startup from either a URI
//!
//! ```text
//! http[s]://[ACCESS_KEY:SECRET_KEY@]HOST[:PORT]/BUCKET[?PARAMS]
//! ```
//!
//! or the name of a profile in the configuration file. Resolution is a pure
//! parse; nothing is sent over the network until the first case runs.

use std::fmt;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::config::{Config, Profile};
use crate::error::{Error, Result};
use crate::quirk::{Quirk, QuirkSet};

/// Region used when the target does not name one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Static credentials for signing requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key ID.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
    /// Session token for temporary credentials.
    pub session_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &mask_secret(&self.secret_key))
            .field("session_token", &self.session_token.as_ref().map(|_| "****"))
            .finish()
    }
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if visible.len() == secret.len() {
        "*".repeat(secret.chars().count())
    } else {
        format!("{visible}****")
    }
}

/// The resolved, read-only description of the service under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    endpoint: String,
    host: String,
    region: String,
    bucket: String,
    credentials: Credentials,
    create_bucket: bool,
    path_style: bool,
    quirks: QuirkSet,
}

impl Target {
    /// Resolves a target spec: a URI if it contains `://`, otherwise a profile name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed URIs, missing fields,
    /// unknown quirks or unknown profiles.
    pub fn resolve(spec: &str, config: &Config) -> Result<Self> {
        let spec = spec.trim();
        if spec.contains("://") {
            Self::from_uri(spec, config)
        } else {
            let profile = config
                .profile(spec)
                .ok_or_else(|| Error::config(format!("profile {spec:?} does not exist")))?;
            Self::from_profile(spec, profile)
        }
    }

    /// Builds a target from a named profile.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the endpoint or bucket is missing or malformed.
    pub fn from_profile(name: &str, profile: &Profile) -> Result<Self> {
        if profile.endpoint.is_empty() {
            return Err(Error::config(format!("profile {name:?} has no endpoint")));
        }
        if profile.bucket.is_empty() {
            return Err(Error::config(format!("profile {name:?} has no bucket")));
        }
        let url = Url::parse(&profile.endpoint)
            .map_err(|e| Error::config(format!("profile {name:?}: invalid endpoint: {e}")))?;
        let (endpoint, host) = endpoint_of(&url)?;

        Ok(Self {
            endpoint,
            host,
            region: profile.region.clone(),
            bucket: profile.bucket.clone(),
            credentials: profile_credentials(name, profile)?,
            create_bucket: profile.create_bucket,
            path_style: profile.path_style,
            quirks: profile.quirks.iter().copied().collect(),
        })
    }

    fn from_uri(spec: &str, config: &Config) -> Result<Self> {
        let url = Url::parse(spec).map_err(|e| Error::config(format!("invalid target URI: {e}")))?;
        let (endpoint, host) = endpoint_of(&url)?;

        let mut segments = url.path_segments().into_iter().flatten().filter(|s| !s.is_empty());
        let bucket = match (segments.next(), segments.next()) {
            (Some(bucket), None) => decode(bucket)?,
            (None, _) => return Err(Error::config("target URI has no bucket in its path")),
            (Some(_), Some(_)) => {
                return Err(Error::config("target URI path must contain only the bucket name"))
            }
        };

        let mut region = DEFAULT_REGION.to_string();
        let mut quirks = QuirkSet::EMPTY;
        let mut create_bucket = false;
        let mut path_style = true;
        let mut profile = None;
        let mut session_token = None;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "region" => region = value.into_owned(),
                "quirks" | "quirk" => {
                    for name in value.split(',').filter(|s| !s.trim().is_empty()) {
                        quirks = quirks.with(name.parse::<Quirk>()?);
                    }
                }
                "create_bucket" | "create-bucket" => create_bucket = parse_flag(&key, &value)?,
                "path_style" | "path-style" => path_style = parse_flag(&key, &value)?,
                "profile" => profile = Some(value.into_owned()),
                "session_token" => session_token = Some(value.into_owned()),
                other => {
                    return Err(Error::config(format!("unknown target URI parameter {other:?}")))
                }
            }
        }

        let credentials = if !url.username().is_empty() {
            let secret = url
                .password()
                .ok_or_else(|| Error::config("target URI has an access key but no secret key"))?;
            Credentials {
                access_key: decode(url.username())?,
                secret_key: decode(secret)?,
                session_token,
            }
        } else if let Some(name) = profile {
            let referenced = config.profile(&name).ok_or_else(|| {
                Error::config(format!("credentials profile {name:?} does not exist"))
            })?;
            let mut credentials = profile_credentials(&name, referenced)?;
            if session_token.is_some() {
                credentials.session_token = session_token;
            }
            credentials
        } else {
            return Err(Error::config(
                "target URI has no credentials; embed ACCESS_KEY:SECRET_KEY@ or use ?profile=NAME",
            ));
        };

        Ok(Self { endpoint, host, region, bucket, credentials, create_bucket, path_style, quirks })
    }

    /// Endpoint URL without path, e.g. `http://localhost:9000`.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Host (and port, if given) of the endpoint.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Signing region.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Bucket the cases run against.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Credentials used to sign requests.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Whether the harness creates and deletes the bucket around every case.
    #[must_use]
    pub fn create_bucket(&self) -> bool {
        self.create_bucket
    }

    /// Whether requests use path-style bucket addressing.
    #[must_use]
    pub fn path_style(&self) -> bool {
        self.path_style
    }

    /// Quirks this target exhibits.
    #[must_use]
    pub fn quirks(&self) -> QuirkSet {
        self.quirks
    }

    /// Returns true if the target exhibits `quirk`.
    #[must_use]
    pub fn has_quirk(&self, quirk: Quirk) -> bool {
        self.quirks.contains(quirk)
    }
}

fn endpoint_of(url: &Url) -> Result<(String, String)> {
    let scheme = match url.scheme() {
        "http" => "http",
        "https" | "s3" => "https",
        other => return Err(Error::config(format!("unsupported target scheme {other:?}"))),
    };
    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host,
        _ => return Err(Error::config("target has no host")),
    };
    let host = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    Ok((format!("{scheme}://{host}"), host))
}

fn profile_credentials(name: &str, profile: &Profile) -> Result<Credentials> {
    if profile.access_key.is_empty() || profile.secret_key.is_empty() {
        return Err(Error::config(format!("profile {name:?} has no credentials")));
    }
    Ok(Credentials {
        access_key: profile.access_key.clone(),
        secret_key: profile.secret_key.clone(),
        session_token: profile.session_token.clone(),
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "" | "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(Error::config(format!("invalid value {value:?} for {key}"))),
    }
}

fn decode(component: &str) -> Result<String> {
    percent_decode_str(component)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| Error::config(format!("invalid percent-encoding in target URI: {e}")))
}
