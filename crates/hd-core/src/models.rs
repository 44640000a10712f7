//! Wire-level data model for the helpdesk API.
//!
//! Field names and enum spellings follow the server's JSON exactly:
//! camelCase keys, SCREAMING_SNAKE_CASE enum values, integer ids, and
//! zone-less ISO-8601 timestamps.

use crate::auth::{Identity, Role, UserId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier the remote API uses for tickets.
pub type TicketId = i64;
/// Identifier the remote API uses for problem types.
pub type ProblemTypeId = i64;
/// Identifier the remote API uses for replies.
pub type ReplyId = i64;

/// Lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Open,
    InProgress,
    Closed,
}

impl TicketStatus {
    /// Returns the status in its wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "OPEN",
            TicketStatus::InProgress => "IN_PROGRESS",
            TicketStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace('-', "_").as_str() {
            "OPEN" => Ok(TicketStatus::Open),
            "IN_PROGRESS" => Ok(TicketStatus::InProgress),
            "CLOSED" => Ok(TicketStatus::Closed),
            _ => Err(format!("unknown ticket status: {}", s)),
        }
    }
}

/// Urgency of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Returns the priority in its wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            _ => Err(format!("unknown priority: {}", s)),
        }
    }
}

/// Reference data describing what a ticket is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemType {
    pub id: ProblemTypeId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A single reply on a ticket, append-only and ordered by creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: ReplyId,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub user: Identity,
}

/// A support ticket as the API renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: Priority,
    pub created_at: NaiveDateTime,
    pub created_by: Identity,
    #[serde(default)]
    pub assigned_to: Option<Identity>,
    #[serde(default)]
    pub problem_type: Option<ProblemType>,
    pub is_public: bool,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

/// Credentials presented at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login response. Carries no user id; the full identity is
/// resolved through the current-user endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Self-service account registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Payload for opening a new ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub problem_type_id: ProblemTypeId,
    pub is_public: bool,
}

/// Partial update of a ticket's workflow fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

/// Assigns a ticket to an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTicketRequest {
    pub agent_id: UserId,
}

/// A new reply to a ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    pub content: String,
}

/// Payload for provisioning a support agent account.
///
/// Specializations are write-only: the API accepts problem-type ids here
/// but never includes them when listing agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub specialization_ids: Vec<ProblemTypeId>,
}

/// Server-side filter parameters for the ticket listing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    pub problem_type_id: Option<ProblemTypeId>,
    pub is_public: Option<bool>,
}

impl TicketFilter {
    /// Returns true when no filter dimension is set.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.problem_type_id.is_none()
            && self.is_public.is_none()
    }

    /// Returns true if the ticket satisfies every set dimension.
    pub fn matches(&self, ticket: &Ticket) -> bool {
        if let Some(status) = self.status {
            if ticket.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if ticket.priority != priority {
                return false;
            }
        }
        if let Some(problem_type_id) = self.problem_type_id {
            if ticket.problem_type.as_ref().map(|p| p.id) != Some(problem_type_id) {
                return false;
            }
        }
        if let Some(is_public) = self.is_public {
            if ticket.is_public != is_public {
                return false;
            }
        }
        true
    }
}
