//! Destination routes and the authorization gate.

use crate::auth::{Capability, Identity};
use crate::models::TicketId;
use std::fmt;

/// A navigable destination within the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The sign-in view; the only destination an anonymous session may enter.
    Login,
    /// The ticket list, also the default landing destination.
    Tickets,
    /// The new-ticket form.
    TicketCreate,
    /// A single ticket with its replies.
    TicketDetail(TicketId),
    /// Agent administration.
    Agents,
}

impl Route {
    /// The capability a session must hold to enter this destination.
    pub fn required_capability(&self) -> Option<Capability> {
        match self {
            Route::Login => None,
            Route::Tickets | Route::TicketDetail(_) => Some(Capability::ViewTickets),
            Route::TicketCreate => Some(Capability::CreateTicket),
            Route::Agents => Some(Capability::ManageAgents),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Login => write!(f, "login"),
            Route::Tickets => write!(f, "tickets"),
            Route::TicketCreate => write!(f, "tickets/create"),
            Route::TicketDetail(id) => write!(f, "tickets/{}", id),
            Route::Agents => write!(f, "agents"),
        }
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Navigation proceeds to the requested destination.
    Allow,
    /// Navigation is diverted to the given destination instead.
    Redirect(Route),
}

/// Decides whether the given identity may enter a destination.
///
/// Anonymous sessions are sent to the login view for anything but the
/// login view itself; authenticated sessions lacking the destination's
/// capability are sent to the ticket list. Enforced here, once, so an
/// individual view cannot forget the check. The decision is pure: no
/// side effects, same inputs, same answer.
pub fn admit(destination: Route, identity: Option<&Identity>) -> Admission {
    let Some(identity) = identity else {
        return if destination == Route::Login {
            Admission::Allow
        } else {
            Admission::Redirect(Route::Login)
        };
    };

    match destination.required_capability() {
        Some(required) if !identity.can(required) => Admission::Redirect(Route::Tickets),
        _ => Admission::Allow,
    }
}
