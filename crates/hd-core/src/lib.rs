//! # hd-core
//!
//! Domain model and session core for the Helpdeck client: identities and
//! the role to capability mapping, the authorization gate, the
//! role-conditioned navigation model, and the session store with its
//! durable token vault.

pub mod auth;
pub mod models;
pub mod navigation;
pub mod routes;
pub mod session;

pub use auth::{Capability, Identity, Role, UserId};
pub use models::{
    AssignTicketRequest, AuthResponse, CreateAgentRequest, CreateTicketRequest, LoginRequest,
    Priority, ProblemType, ProblemTypeId, RegisterRequest, Reply, ReplyId, ReplyRequest, Ticket,
    TicketFilter, TicketId, TicketStatus, UpdateTicketRequest,
};
pub use navigation::{visible_routes, NavigationModel};
pub use routes::{admit, Admission, Route};
pub use session::{SessionState, SessionStore, SessionToken, TokenVault};
