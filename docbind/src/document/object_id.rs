use crate::common::{OBJECT_ID_HEX_LENGTH, OBJECT_ID_LENGTH};
use crate::errors::{DocBindError, DocBindResult, ErrorKind};
use crate::ID_GENERATOR;
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

static HEX_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^[0-9a-fA-F]{{{}}}$", OBJECT_ID_HEX_LENGTH))
        .expect("object id pattern is a valid regex")
});

static INVALID_HEX_ERROR: Lazy<DocBindError> = Lazy::new(|| {
    DocBindError::new(
        &format!(
            "ObjectId validation error: id must be exactly {} hexadecimal characters",
            OBJECT_ID_HEX_LENGTH
        ),
        ErrorKind::InvalidId,
    )
});

/// The identity value of a stored document.
///
/// Twelve bytes: a 4-byte big-endian creation time in seconds, 5 bytes unique
/// to the generating process and a 3-byte big-endian counter. The canonical
/// text form is 24 lowercase hex characters.
///
/// ```rust,ignore
/// use docbind::document::ObjectId;
///
/// let id = ObjectId::new();
/// let parsed = ObjectId::parse(&id.to_hex())?;
/// assert_eq!(id, parsed);
/// ```
///
/// Inside a query an `ObjectId` parameter is written as `{$oid: "<hex>"}`.
#[derive(PartialEq, Eq, Ord, PartialOrd, Hash, Clone, Copy, serde::Deserialize, serde::Serialize)]
pub struct ObjectId {
    bytes: [u8; OBJECT_ID_LENGTH],
}

impl ObjectId {
    /// Generates a new, process-unique `ObjectId`.
    pub fn new() -> Self {
        ObjectId {
            bytes: ID_GENERATOR.next_bytes(),
        }
    }

    pub fn from_bytes(bytes: [u8; OBJECT_ID_LENGTH]) -> Self {
        ObjectId { bytes }
    }

    /// Parses the 24-character hex form. Upper and lower case are accepted.
    pub fn parse(hex: &str) -> DocBindResult<ObjectId> {
        if !ObjectId::is_valid(hex) {
            log::error!("Invalid object id {:?}", hex);
            return Err(INVALID_HEX_ERROR.clone());
        }

        let mut bytes = [0u8; OBJECT_ID_LENGTH];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)?;
        }
        Ok(ObjectId { bytes })
    }

    pub fn is_valid(hex: &str) -> bool {
        HEX_PATTERN.is_match(hex)
    }

    pub fn bytes(&self) -> &[u8; OBJECT_ID_LENGTH] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Creation time, to second precision.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let seconds = u32::from_be_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]]);
        Utc.timestamp_opt(seconds as i64, 0)
            .single()
            .unwrap_or_default()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        ObjectId::new()
    }
}

impl FromStr for ObjectId {
    type Err = DocBindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse(s)
    }
}

impl Debug for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId(\"{}\")", self.to_hex())
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
