// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request/response body helpers.
//!
//! Framework-neutral: callers pass the raw body reader and the header
//! values they received, and get a decoded [`Node`] back. Nothing here
//! knows about routing, query strings or callbacks.

use std::io::Read;

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::node::Node;

/// Media type of JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

// ---------------------------------------------------------------------------
// ContentType
// ---------------------------------------------------------------------------

/// Parsed `Content-Type` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Lower-cased `type/subtype`.
    pub media_type: String,
    /// Parameters in header order; names are lower-cased.
    pub params: Vec<(String, String)>,
}

impl ContentType {
    pub fn parse(header: &str) -> Self {
        let mut parts = header.split(';');
        let media_type = parts.next().unwrap_or("").trim().to_ascii_lowercase();
        let params = parts
            .filter_map(|param| {
                let (name, value) = param.split_once('=')?;
                let value = value.trim().trim_matches('"');
                Some((name.trim().to_ascii_lowercase(), value.to_string()))
            })
            .collect();
        ContentType { media_type, params }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn charset(&self) -> Option<&str> {
        self.param("charset")
    }

    /// `application/json` or a `+json` structured suffix.
    pub fn is_json(&self) -> bool {
        self.media_type == JSON_CONTENT_TYPE
            || (self.media_type.starts_with("application/") && self.media_type.ends_with("+json"))
    }
}

// ---------------------------------------------------------------------------
// Ingress
// ---------------------------------------------------------------------------

/// Limits applied before a body is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyLimits {
    pub max_body_size: u64,
    pub default_charset: String,
}

impl Default for BodyLimits {
    fn default() -> Self {
        crate::config::BodyConfig::default().into()
    }
}

impl From<crate::config::BodyConfig> for BodyLimits {
    fn from(body: crate::config::BodyConfig) -> Self {
        BodyLimits {
            max_body_size: body.max_body_size,
            default_charset: body.default_charset,
        }
    }
}

pub(crate) fn is_supported_charset(name: &str) -> bool {
    is_utf8(name) || is_ascii(name)
}

fn is_utf8(name: &str) -> bool {
    name.eq_ignore_ascii_case("utf-8") || name.eq_ignore_ascii_case("utf8")
}

fn is_ascii(name: &str) -> bool {
    name.eq_ignore_ascii_case("us-ascii") || name.eq_ignore_ascii_case("ascii")
}

/// Read and decode a JSON request body.
///
/// A missing content type is taken to be JSON. With a declared
/// `content_length` exactly that many bytes are read; without one the
/// reader is drained up to the size limit.
pub fn read_json_body<R: Read>(
    reader: R,
    content_type: Option<&str>,
    content_length: Option<u64>,
    limits: &BodyLimits,
    codec: &Codec<'_>,
) -> Result<Node> {
    let content_type = ContentType::parse(content_type.unwrap_or(JSON_CONTENT_TYPE));
    if !content_type.is_json() {
        log::warn!("[ingress] rejected content type {}", content_type.media_type);
        return Err(Error::UnsupportedContentType(content_type.media_type));
    }

    let charset = content_type
        .charset()
        .unwrap_or(&limits.default_charset)
        .to_string();
    if !is_supported_charset(&charset) {
        log::warn!("[ingress] rejected charset {}", charset);
        return Err(Error::UnsupportedCharset(charset));
    }

    let limit = limits.max_body_size;
    let mut body = Vec::new();
    match content_length {
        Some(size) if size > limit => {
            log::warn!("[ingress] declared length {} exceeds {}", size, limit);
            return Err(Error::PayloadTooLarge { size, limit });
        }
        Some(size) => {
            reader.take(size).read_to_end(&mut body)?;
        }
        None => {
            reader.take(limit.saturating_add(1)).read_to_end(&mut body)?;
            if body.len() as u64 > limit {
                log::warn!("[ingress] undeclared body exceeds {}", limit);
                return Err(Error::PayloadTooLarge {
                    size: body.len() as u64,
                    limit,
                });
            }
        }
    }

    if is_ascii(&charset) && !body.is_ascii() {
        log::warn!("[ingress] non-ASCII byte in {} body", charset);
        return Err(Error::CharsetMismatch(charset));
    }

    log::trace!("[ingress] decoding {} byte body", body.len());
    codec.from_slice(&body)
}

// ---------------------------------------------------------------------------
// Egress
// ---------------------------------------------------------------------------

/// Serialize a response body, returning its content type and text.
pub fn render_json(node: &Node, codec: &Codec<'_>) -> Result<(&'static str, String)> {
    Ok((JSON_CONTENT_TYPE, codec.dumps(node)?))
}
