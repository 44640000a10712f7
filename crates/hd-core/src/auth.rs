//! Identities, roles, and the role to capability mapping.
//!
//! The mapping in [`Role::capabilities`] is the single source of truth for
//! role-based access: the authorization gate and the navigation model both
//! consult it, so what the UI offers and what the gate admits cannot drift
//! apart.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Identifier the remote API uses for users and agents.
pub type UserId = i64;

/// Role assigned to an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Full access, including agent administration.
    Admin,
    /// End user: browses tickets and opens new ones.
    User,
    /// Support agent: works the tickets assigned to them.
    Agent,
}

impl Role {
    /// Returns the role name in its wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
            Role::Agent => "AGENT",
        }
    }

    /// Returns the capabilities granted to this role.
    pub fn capabilities(&self) -> HashSet<Capability> {
        match self {
            Role::Admin => Capability::all(),
            Role::User => HashSet::from([Capability::ViewTickets, Capability::CreateTicket]),
            Role::Agent => HashSet::from([Capability::ViewTickets]),
        }
    }

    /// Returns true if this role grants the given capability.
    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            "AGENT" => Ok(Role::Agent),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

/// A named permission derived from a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Browse the ticket list and open ticket details.
    ViewTickets,
    /// Open new tickets.
    CreateTicket,
    /// List and provision support agents.
    ManageAgents,
}

impl Capability {
    /// Returns every defined capability.
    pub fn all() -> HashSet<Capability> {
        HashSet::from([
            Capability::ViewTickets,
            Capability::CreateTicket,
            Capability::ManageAgents,
        ])
    }

    /// Returns the capability name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewTickets => "view_tickets",
            Capability::CreateTicket => "create_ticket",
            Capability::ManageAgents => "manage_agents",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The authenticated user's profile as the API reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Identity {
    /// Returns true if this identity's role grants the capability.
    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }

    /// Returns true if this identity is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
