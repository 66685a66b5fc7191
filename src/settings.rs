//! Read/write policy value types and the settings snapshot that flows
//! session -> database -> collection.
//!
//! Every handle owns its own `Settings`; children receive a clone when they are
//! minted, never a shared reference.

use crate::errors::DbError;
use bson::{Bson, Document, doc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smallest max-staleness a server accepts.
pub const MIN_MAX_STALENESS: Duration = Duration::from_secs(90);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadMode {
    #[default]
    Primary,
    PrimaryPreferred,
    Secondary,
    SecondaryPreferred,
    Nearest,
}

impl ReadMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::PrimaryPreferred => "primaryPreferred",
            Self::Secondary => "secondary",
            Self::SecondaryPreferred => "secondaryPreferred",
            Self::Nearest => "nearest",
        }
    }
}

/// Which replica set members may serve a read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadPreference {
    mode: ReadMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tag_sets: Vec<Document>,
    #[serde(default, rename = "maxStalenessSeconds", skip_serializing_if = "Option::is_none")]
    max_staleness_secs: Option<u64>,
}

impl ReadPreference {
    #[must_use]
    pub fn new(mode: ReadMode) -> Self {
        Self { mode, tag_sets: Vec::new(), max_staleness_secs: None }
    }

    #[must_use]
    pub fn primary() -> Self {
        Self::new(ReadMode::Primary)
    }

    #[must_use]
    pub fn primary_preferred() -> Self {
        Self::new(ReadMode::PrimaryPreferred)
    }

    #[must_use]
    pub fn secondary() -> Self {
        Self::new(ReadMode::Secondary)
    }

    #[must_use]
    pub fn secondary_preferred() -> Self {
        Self::new(ReadMode::SecondaryPreferred)
    }

    #[must_use]
    pub fn nearest() -> Self {
        Self::new(ReadMode::Nearest)
    }

    #[must_use]
    pub fn with_tag_sets(mut self, tag_sets: Vec<Document>) -> Self {
        self.tag_sets = tag_sets;
        self
    }

    #[must_use]
    pub fn with_max_staleness(mut self, staleness: Duration) -> Self {
        self.max_staleness_secs = Some(staleness.as_secs());
        self
    }

    #[must_use]
    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    #[must_use]
    pub fn tag_sets(&self) -> &[Document] {
        &self.tag_sets
    }

    #[must_use]
    pub fn max_staleness(&self) -> Option<Duration> {
        self.max_staleness_secs.map(Duration::from_secs)
    }

    /// Structural checks only; whether the topology can satisfy it is decided remotely.
    ///
    /// # Errors
    /// `InvalidArgument` when primary mode carries tags or staleness, or the
    /// staleness bound is below [`MIN_MAX_STALENESS`].
    pub fn validate(&self) -> Result<(), DbError> {
        if self.mode == ReadMode::Primary {
            if !self.tag_sets.is_empty() {
                return Err(DbError::InvalidArgument(
                    "read preference mode 'primary' cannot be combined with tag sets".into(),
                ));
            }
            if self.max_staleness_secs.is_some() {
                return Err(DbError::InvalidArgument(
                    "read preference mode 'primary' cannot be combined with maxStalenessSeconds"
                        .into(),
                ));
            }
        }
        if let Some(secs) = self.max_staleness_secs
            && secs < MIN_MAX_STALENESS.as_secs()
        {
            return Err(DbError::InvalidArgument(format!(
                "maxStalenessSeconds must be at least {}, got {secs}",
                MIN_MAX_STALENESS.as_secs()
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut d = doc! { "mode": self.mode.as_str() };
        if !self.tag_sets.is_empty() {
            d.insert("tags", self.tag_sets.clone());
        }
        if let Some(secs) = self.max_staleness_secs {
            d.insert("maxStalenessSeconds", i64::try_from(secs).unwrap_or(i64::MAX));
        }
        d
    }
}

/// The `w` component of a write concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Bson", into = "Bson")]
pub enum Acknowledgment {
    Nodes(u32),
    Majority,
    Tag(String),
}

impl From<Acknowledgment> for Bson {
    fn from(w: Acknowledgment) -> Self {
        match w {
            Acknowledgment::Nodes(n) => Self::Int64(i64::from(n)),
            Acknowledgment::Majority => Self::String("majority".into()),
            Acknowledgment::Tag(t) => Self::String(t),
        }
    }
}

impl TryFrom<Bson> for Acknowledgment {
    type Error = DbError;

    fn try_from(value: Bson) -> Result<Self, Self::Error> {
        let nodes = |n: i64| {
            u32::try_from(n)
                .map(Self::Nodes)
                .map_err(|_| DbError::InvalidArgument(format!("w must be a non-negative node count, got {n}")))
        };
        match value {
            Bson::Int32(n) => nodes(i64::from(n)),
            Bson::Int64(n) => nodes(n),
            Bson::String(s) if s == "majority" => Ok(Self::Majority),
            Bson::String(s) if s.is_empty() => {
                Err(DbError::InvalidArgument("w tag must not be empty".into()))
            }
            Bson::String(s) => Ok(Self::Tag(s)),
            other => Err(DbError::InvalidArgument(format!("unsupported w value: {other}"))),
        }
    }
}

/// Acknowledgment required before a write counts as successful.
///
/// All fields unset means "server default"; such a write concern is never
/// sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WriteConcern {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    w: Option<Acknowledgment>,
    #[serde(default, rename = "j", skip_serializing_if = "Option::is_none")]
    journal: Option<bool>,
    #[serde(default, rename = "wtimeout", skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,
}

impl WriteConcern {
    #[must_use]
    pub fn majority() -> Self {
        Self { w: Some(Acknowledgment::Majority), ..Self::default() }
    }

    #[must_use]
    pub fn nodes(n: u32) -> Self {
        Self { w: Some(Acknowledgment::Nodes(n)), ..Self::default() }
    }

    #[must_use]
    pub fn unacknowledged() -> Self {
        Self::nodes(0)
    }

    /// A custom write-concern tag. `"majority"` is the reserved mode, not a tag.
    #[must_use]
    pub fn tagged(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let w = if tag == "majority" { Acknowledgment::Majority } else { Acknowledgment::Tag(tag) };
        Self { w: Some(w), ..Self::default() }
    }

    #[must_use]
    pub fn with_journal(mut self, journal: bool) -> Self {
        self.journal = Some(journal);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn acknowledgment(&self) -> Option<&Acknowledgment> {
        self.w.as_ref()
    }

    #[must_use]
    pub fn journal(&self) -> Option<bool> {
        self.journal
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    #[must_use]
    pub fn is_server_default(&self) -> bool {
        self.w.is_none() && self.journal.is_none() && self.timeout_ms.is_none()
    }

    #[must_use]
    pub fn is_acknowledged(&self) -> bool {
        !matches!(self.w, Some(Acknowledgment::Nodes(0))) || self.journal == Some(true)
    }

    /// # Errors
    /// `InvalidArgument` for `w: 0` combined with `j: true`.
    pub fn validate(&self) -> Result<(), DbError> {
        if matches!(self.w, Some(Acknowledgment::Nodes(0))) && self.journal == Some(true) {
            return Err(DbError::InvalidArgument(
                "an unacknowledged write concern cannot request journaling".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut d = Document::new();
        if let Some(w) = &self.w {
            d.insert("w", Bson::from(w.clone()));
        }
        if let Some(j) = self.journal {
            d.insert("j", j);
        }
        if let Some(ms) = self.timeout_ms {
            d.insert("wtimeout", i64::try_from(ms).unwrap_or(i64::MAX));
        }
        d
    }
}

/// Point-in-time copy of the read/write policy a handle operates under.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub read_preference: ReadPreference,
    pub write_concern: WriteConcern,
}

impl Settings {
    #[must_use]
    pub fn new(read_preference: ReadPreference, write_concern: WriteConcern) -> Self {
        Self { read_preference, write_concern }
    }

    /// # Errors
    /// Propagates the structural check of either component.
    pub fn validate(&self) -> Result<(), DbError> {
        self.read_preference.validate()?;
        self.write_concern.validate()
    }
}
