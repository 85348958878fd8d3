//! core type-safe identifiers and names for the storage layer.
//!
//! Content identifiers wrap a `git2::Oid`: blobs and commits are addressed by
//! the SHA-1 object hash of their bytes, so two blobs with the same content
//! always share an id.

use std::fmt;
use std::str::FromStr;

use git2::{ObjectType, Oid};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::storage::error::{StorageError, StorageResult};

/// Length of a full hex-encoded content identifier.
pub const ID_HEX_LEN: usize = 40;

fn parse_full_hex(hex: &str) -> Option<Oid> {
    if hex.len() != ID_HEX_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Oid::from_str(&hex.to_ascii_lowercase()).ok()
}

/// This makes sure we don't accidentally pass a blob ID where a commit ID
/// is expected. The inner Oid is only accessible within the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommitId(pub(crate) Oid);

impl CommitId {
    /// digest of a canonical commit encoding
    pub(crate) fn for_encoding(bytes: &[u8]) -> StorageResult<Self> {
        Ok(Self(Oid::hash_object(ObjectType::Commit, bytes)?))
    }

    /// parse a full 40-character hex id
    pub fn from_hex(hex: &str) -> StorageResult<Self> {
        parse_full_hex(hex)
            .map(Self)
            .ok_or_else(|| StorageError::AmbiguousOrNotFound(hex.to_string()))
    }

    /// short form of the commit ID (first 7 hex characters)
    pub fn short(&self) -> String {
        self.0.to_string()[..7].to_string()
    }

    pub fn to_hex(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CommitId {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Blob (file content) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlobId(pub(crate) Oid);

impl BlobId {
    /// digest of raw file content
    pub fn for_content(content: &[u8]) -> StorageResult<Self> {
        Ok(Self(Oid::hash_object(ObjectType::Blob, content)?))
    }

    pub fn from_hex(hex: &str) -> StorageResult<Self> {
        parse_full_hex(hex).map(Self).ok_or_else(|| StorageError::CorruptedData {
            path: hex.into(),
            reason: "not a blob id".to_string(),
        })
    }

    pub fn to_hex(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Ids travel through JSON as plain hex strings.

impl Serialize for CommitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CommitId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        parse_full_hex(&hex)
            .map(Self)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid commit id '{}'", hex)))
    }
}

impl Serialize for BlobId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for BlobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        parse_full_hex(&hex)
            .map(Self)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid blob id '{}'", hex)))
    }
}

/// A validated working-directory file name.
///
/// Tracked files live at the top level of the working directory, so a name
/// is a single path component:
/// - not empty, not `.` or `..`
/// - no `/`, `\` or control characters
/// - not the metadata directory (`.gitlet`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileName(String);

impl FileName {
    /// names that can never be tracked
    const RESERVED: &'static [&'static str] = &[".", "..", ".gitlet"];

    pub fn new(name: impl Into<String>) -> Result<Self, InvalidNameError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), InvalidNameError> {
        if name.is_empty() {
            return Err(InvalidNameError::Empty);
        }
        if name.len() > 255 {
            return Err(InvalidNameError::TooLong(name.len()));
        }
        for (i, c) in name.chars().enumerate() {
            if c == '/' || c == '\\' || c.is_control() {
                return Err(InvalidNameError::InvalidCharacter { char: c, position: i });
            }
        }
        if Self::RESERVED.contains(&name) {
            return Err(InvalidNameError::Reserved(name.to_string()));
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for FileName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FileName {
    type Error = InvalidNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FileName> for String {
    fn from(name: FileName) -> Self {
        name.0
    }
}

/// a branch name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// the default branch name
    pub const MAIN: &'static str = "main";

    pub fn new(name: impl Into<String>) -> Result<Self, InvalidNameError> {
        let name = name.into();
        if name.is_empty() {
            return Err(InvalidNameError::Empty);
        }
        if let Some((i, c)) = name.chars().enumerate().find(|(_, c)| c.is_whitespace()) {
            return Err(InvalidNameError::InvalidCharacter { char: c, position: i });
        }
        if name.contains("..") || name.ends_with('/') || name.starts_with('/') {
            return Err(InvalidNameError::InvalidPath(name));
        }
        Ok(Self(name))
    }

    /// create the main branch reference
    pub fn main() -> Self {
        Self(Self::MAIN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = InvalidNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

/// error type for invalid names (files, branches)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidNameError {
    Empty,
    TooLong(usize),
    InvalidCharacter { char: char, position: usize },
    Reserved(String),
    InvalidPath(String),
}

impl fmt::Display for InvalidNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "name cannot be empty"),
            Self::TooLong(len) => write!(f, "name too long: {} characters", len),
            Self::InvalidCharacter { char, position } => {
                write!(f, "invalid character {:?} at position {}", char, position)
            }
            Self::Reserved(name) => write!(f, "'{}' is a reserved name", name),
            Self::InvalidPath(path) => write!(f, "invalid path: '{}'", path),
        }
    }
}

impl std::error::Error for InvalidNameError {}

/// the kind of change a file went through relative to a base snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Added,
    Modified,
    Removed,
}

/// represents a change in a diff between two snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub name: FileName,
    pub status: ChangeStatus,
    /// resulting blob on the changed side, `None` when removed
    pub blob: Option<BlobId>,
}
