// Core data models for vulnpair
// Subjects, resources, actions and the scenario taxonomy

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed role set for callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "USER"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(Error::InvalidInput(format!("unknown role '{}'", other))),
        }
    }
}

/// The caller, as resolved from session state by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: u64,
    pub role: Role,
    pub session_valid: bool,
}

impl Subject {
    pub fn new(id: u64, role: Role) -> Self {
        Self {
            id,
            role,
            session_valid: true,
        }
    }

    /// Same identity with an expired or forged session
    pub fn with_invalid_session(mut self) -> Self {
        self.session_valid = false;
        self
    }
}

/// Sensitivity tag carried by every protected resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    Public,
    Private,
    Restricted,
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sensitivity::Public => write!(f, "PUBLIC"),
            Sensitivity::Private => write!(f, "PRIVATE"),
            Sensitivity::Restricted => write!(f, "RESTRICTED"),
        }
    }
}

impl FromStr for Sensitivity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(Sensitivity::Public),
            "private" => Ok(Sensitivity::Private),
            "restricted" => Ok(Sensitivity::Restricted),
            other => Err(Error::InvalidInput(format!("unknown sensitivity '{}'", other))),
        }
    }
}

/// A protected entity. Read-only to the access engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub owner_id: u64,
    pub sensitivity: Sensitivity,
}

impl Resource {
    pub fn new(id: impl Into<String>, owner_id: u64, sensitivity: Sensitivity) -> Self {
        Self {
            id: id.into(),
            owner_id,
            sensitivity,
        }
    }
}

/// Operations a subject can attempt on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Update,
    Delete,
    RoleChange,
    SystemLogRead,
}

impl Action {
    /// Highest-privilege actions that the admin override never covers
    /// on restricted resources.
    pub fn is_restricted(&self) -> bool {
        matches!(self, Action::RoleChange | Action::SystemLogRead)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::View => write!(f, "view"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
            Action::RoleChange => write!(f, "role_change"),
            Action::SystemLogRead => write!(f, "system_log_read"),
        }
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "view" => Ok(Action::View),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "role_change" => Ok(Action::RoleChange),
            "system_log_read" => Ok(Action::SystemLogRead),
            other => Err(Error::InvalidInput(format!("unknown action '{}'", other))),
        }
    }
}

/// Vulnerability family a scenario belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Injection,
    AccessControl,
    Crypto,
    Deserialization,
    Header,
    Ssrf,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Injection,
        Category::AccessControl,
        Category::Crypto,
        Category::Deserialization,
        Category::Header,
        Category::Ssrf,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Injection => write!(f, "Injection"),
            Category::AccessControl => write!(f, "AccessControl"),
            Category::Crypto => write!(f, "Crypto"),
            Category::Deserialization => write!(f, "Deserialization"),
            Category::Header => write!(f, "Header"),
            Category::Ssrf => write!(f, "SSRF"),
        }
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "injection" => Ok(Category::Injection),
            "accesscontrol" | "idor" => Ok(Category::AccessControl),
            "crypto" => Ok(Category::Crypto),
            "deserialization" => Ok(Category::Deserialization),
            "header" | "headers" => Ok(Category::Header),
            "ssrf" => Ok(Category::Ssrf),
            other => Err(Error::InvalidInput(format!("unknown category '{}'", other))),
        }
    }
}

/// Which half of a scenario pair to invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    Unsafe,
    Safe,
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantKind::Unsafe => write!(f, "unsafe"),
            VariantKind::Safe => write!(f, "safe"),
        }
    }
}

impl FromStr for VariantKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unsafe" | "vulnerable" => Ok(VariantKind::Unsafe),
            "safe" | "hardened" => Ok(VariantKind::Safe),
            other => Err(Error::InvalidInput(format!("unknown variant '{}'", other))),
        }
    }
}
