//! Data models for Dialer.
//!
//! This module defines the core entities: Contact and CallRecord.
//! Both serialize as flat JSON objects so a collection is a plain JSON array.
//! Field names match the stored documents (`type`, `aiPrompt`), and unknown
//! fields are ignored on load.

use serde::{Deserialize, Serialize};

/// Identifier of a contact. Clock-derived milliseconds, unique within the store.
pub type ContactId = i64;

/// Identifier of a call record. Clock-derived milliseconds, unique within the store.
pub type CallId = i64;

/// A contact in the address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    /// Display name (never empty)
    pub name: String,
    /// Phone number, canonical `xxx-xxx-xxxx` when ten digits were supplied
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Avatar image reference (URI), if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Contact {
    /// Build a stored contact from user-supplied fields and an assigned id.
    pub fn from_new(id: ContactId, fields: NewContact) -> Self {
        Self {
            id,
            name: fields.name,
            number: fields.number,
            email: fields.email,
            occupation: fields.occupation,
            notes: fields.notes,
            avatar: fields.avatar,
        }
    }

    /// Lowercased name used for ordering and matching.
    pub fn sort_key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Fields for a contact that has not been saved yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub number: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl NewContact {
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number: number.into(),
            ..Default::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_occupation(mut self, occupation: impl Into<String>) -> Self {
        self.occupation = Some(occupation.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Direction/outcome of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Outgoing,
    Incoming,
    Missed,
}

impl CallType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallType::Outgoing => "outgoing",
            CallType::Incoming => "incoming",
            CallType::Missed => "missed",
        }
    }
}

impl std::fmt::Display for CallType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry in the call history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRecord {
    pub id: CallId,
    /// Contact name if known, else the dialed number
    pub name: String,
    pub number: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub call_type: CallType,
    /// Call length in seconds, set once the call ends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_prompt: Option<String>,
}

/// Fields for a call about to be appended to the history.
///
/// Identity and timestamp are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCallRecord {
    pub name: String,
    pub number: String,
    pub call_type: CallType,
    pub ai_prompt: Option<String>,
}

impl NewCallRecord {
    pub fn new(name: impl Into<String>, number: impl Into<String>, call_type: CallType) -> Self {
        Self {
            name: name.into(),
            number: number.into(),
            call_type,
            ai_prompt: None,
        }
    }

    pub fn outgoing(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self::new(name, number, CallType::Outgoing)
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.ai_prompt = Some(prompt.into());
        self
    }
}

/// Re-appending an existing record keeps its content; id, timestamp and
/// duration are dropped.
impl From<CallRecord> for NewCallRecord {
    fn from(record: CallRecord) -> Self {
        Self {
            name: record.name,
            number: record.number,
            call_type: record.call_type,
            ai_prompt: record.ai_prompt,
        }
    }
}
