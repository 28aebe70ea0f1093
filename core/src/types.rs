//! Domain DTOs for the mailing-list API.
//!
//! # Design
//! Records returned by the server (`MailingList`, `Subscriber`) decode
//! leniently: missing fields take their zero value and unknown fields are
//! ignored. Create/update inputs are separate prototype types whose fields
//! are all optional, so "leave unchanged" is `None` instead of an empty
//! string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Arbitrary JSON metadata attached to a subscriber.
pub type Vars = serde_json::Map<String, serde_json::Value>;

/// No filter on subscription status: both subscribed and unsubscribed members.
pub const ALL: Option<bool> = None;
/// Only members currently subscribed.
pub const SUBSCRIBED: Option<bool> = Some(true);
/// Only members who unsubscribed.
pub const UNSUBSCRIBED: Option<bool> = Some(false);

/// Who may post to a mailing list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Only list administrators may post.
    ReadOnly,
    /// Only subscribers may post.
    Members,
    /// Anyone may post.
    #[default]
    Everyone,
    /// Empty or unrecognized value reported by the server. Never sent.
    #[serde(other)]
    Unknown,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::ReadOnly => "readonly",
            AccessLevel::Members => "members",
            AccessLevel::Everyone => "everyone",
            AccessLevel::Unknown => "",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "readonly" => Ok(AccessLevel::ReadOnly),
            "members" => Ok(AccessLevel::Members),
            "everyone" => Ok(AccessLevel::Everyone),
            other => Err(format!("unknown access level: {other}")),
        }
    }
}

/// A mailing list as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailingList {
    pub address: String,
    pub name: String,
    pub description: String,
    pub access_level: AccessLevel,
    pub created_at: String,
    pub members_count: u64,
}

/// Fields to set when creating or updating a list. `None` and empty strings
/// are left out of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPrototype {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_level: Option<AccessLevel>,
}

impl ListPrototype {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn access_level(mut self, access_level: AccessLevel) -> Self {
        self.access_level = Some(access_level);
        self
    }
}

/// A member of a mailing list as reported by the server.
///
/// `subscribed` is tri-state: `None` when the server did not say.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subscriber {
    pub address: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribed: Option<bool>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub vars: Vars,
}

/// Fields to set when creating or updating a subscriber.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriberPrototype {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vars: Option<Vars>,
}

impl SubscriberPrototype {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn subscribed(mut self, subscribed: bool) -> Self {
        self.subscribed = Some(subscribed);
        self
    }

    pub fn vars(mut self, vars: Vars) -> Self {
        self.vars = Some(vars);
        self
    }
}

/// One page of a listing endpoint: `{"total_count": n, "items": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage<T> {
    #[serde(default)]
    pub total_count: u64,
    pub items: Vec<T>,
}

impl<T> Default for ListPage<T> {
    fn default() -> Self {
        Self {
            total_count: 0,
            items: Vec::new(),
        }
    }
}
