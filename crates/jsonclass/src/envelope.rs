// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Envelope tag format.
//!
//! A dumped object is a plain JSON mapping carrying one reserved key:
//!
//! ```text
//! {"x": 1, "y": 2, "__json_class__": "geo.PointAdapter:geo.Point"}
//!                                     ^ adapter         ^ value class
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, RegistryError};

/// Reserved mapping key holding the envelope tag.
pub const JSON_CLASS_KEY: &str = "__json_class__";

const TAG_DELIMITER: char = ':';

// ---------------------------------------------------------------------------
// QualifiedName
// ---------------------------------------------------------------------------

/// Dotted `<module>.<type>` name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName(String);

impl QualifiedName {
    pub fn parse(name: &str) -> Result<Self, RegistryError> {
        let valid = name.contains('.')
            && name.split('.').all(|segment| {
                !segment.is_empty()
                    && !segment
                        .chars()
                        .any(|c| c == TAG_DELIMITER || c.is_whitespace())
            });
        if !valid {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        Ok(QualifiedName(name.to_string()))
    }

    /// Everything before the last dot.
    pub fn module(&self) -> &str {
        self.0.rsplit_once('.').map_or("", |(m, _)| m)
    }

    /// Last dotted segment.
    pub fn name(&self) -> &str {
        self.0.rsplit_once('.').map_or(&self.0, |(_, n)| n)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for QualifiedName {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QualifiedName::parse(s)
    }
}

impl AsRef<str> for QualifiedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// EnvelopeTag
// ---------------------------------------------------------------------------

/// Adapter and value class recorded in a dumped mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeTag {
    pub adapter: QualifiedName,
    pub class: QualifiedName,
}

impl EnvelopeTag {
    pub fn new(adapter: QualifiedName, class: QualifiedName) -> Self {
        EnvelopeTag { adapter, class }
    }
}

impl fmt::Display for EnvelopeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.adapter, TAG_DELIMITER, self.class)
    }
}

impl FromStr for EnvelopeTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::MalformedTag(s.to_string());
        let (adapter, class) = s.split_once(TAG_DELIMITER).ok_or_else(malformed)?;
        Ok(EnvelopeTag {
            adapter: QualifiedName::parse(adapter).map_err(|_| malformed())?,
            class: QualifiedName::parse(class).map_err(|_| malformed())?,
        })
    }
}
