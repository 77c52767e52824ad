// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types shared by the registry, codec and body helpers.

use thiserror::Error;

/// Result alias for codec operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Codec-level errors.
///
/// Every variant is a deterministic function of the input; nothing here is
/// worth retrying.
#[derive(Debug, Error)]
pub enum Error {
    /// A dumper returned something other than a string-keyed mapping.
    #[error("adapter {adapter} returned {found}, expected a mapping")]
    ContractViolation {
        adapter: String,
        found: &'static str,
    },

    /// An envelope tag names an adapter or class that is not registered.
    #[error("unresolvable reference {name}: {reason}")]
    UnresolvableReference { name: String, reason: &'static str },

    /// The reserved key holds something that is not a valid tag.
    #[error("malformed envelope tag {0:?}")]
    MalformedTag(String),

    /// The encoder met an object with no registered dumper.
    #[error("object of type {0} is not JSON serializable")]
    NotSerializable(&'static str),

    /// A loader rejected the mapping it was handed.
    #[error("adapter {adapter} could not load {class}: {source}")]
    Adapter {
        adapter: String,
        class: String,
        #[source]
        source: ShapeError,
    },

    /// Declared or actual body size exceeds the configured ceiling.
    #[error("payload of {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: u64, limit: u64 },

    /// Body media type is not JSON.
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// Body charset cannot be decoded.
    #[error("unsupported charset: {0}")]
    UnsupportedCharset(String),

    /// Body bytes do not fit the charset it declared.
    #[error("body is not valid {0}")]
    CharsetMismatch(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("invalid qualified name {0:?}")]
    InvalidName(String),

    #[error("class {0} already registered")]
    DuplicateClass(String),

    #[error("type {0} already registered as a class")]
    DuplicateType(&'static str),

    #[error("adapter {0} already registered")]
    DuplicateAdapter(String),

    #[error("a dumper for {target} is already provided by adapter {existing}")]
    DuplicateDumper {
        target: &'static str,
        existing: String,
    },

    #[error("adapter {0} declares neither a dumper nor a loader")]
    EmptyAdapter(String),

    /// An exact-type dumper names a type with no registered class.
    #[error("adapter {adapter} dumps {target}, which is not a registered class")]
    UnregisteredType {
        adapter: String,
        target: &'static str,
    },
}

/// Shape mismatch signalled by a loader or a record setter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("missing field `{0}`")]
    Missing(String),

    #[error("field `{field}` expected {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("unknown field `{0}`")]
    Unknown(String),

    #[error("{0}")]
    Custom(String),
}

impl ShapeError {
    pub fn custom(msg: impl Into<String>) -> Self {
        ShapeError::Custom(msg.into())
    }
}
