//! The transport trait every backend implements.
//!
//! One method per remote operation, each taking the session token
//! explicitly. [`crate::HttpApi`] speaks to a real server;
//! [`crate::MockApi`] backs tests with an in-memory fixture.

use crate::error::ApiResult;
use async_trait::async_trait;
use hd_core::models::{
    AssignTicketRequest, AuthResponse, CreateAgentRequest, CreateTicketRequest, LoginRequest,
    ProblemType, ProblemTypeId, RegisterRequest, Reply, ReplyRequest, Ticket, TicketFilter,
    TicketId, UpdateTicketRequest,
};
use hd_core::session::SessionToken;
use hd_core::{Identity, UserId};

/// Remote operations exposed by the helpdesk API.
#[async_trait]
pub trait HelpdeskApi: Send + Sync {
    /// Exchanges credentials for a session token.
    async fn login(&self, credentials: &LoginRequest) -> ApiResult<AuthResponse>;

    /// Registers a new end-user account.
    async fn register(&self, request: &RegisterRequest) -> ApiResult<Identity>;

    /// Resolves the identity behind a session token.
    async fn current_user(&self, token: &SessionToken) -> ApiResult<Identity>;

    /// Lists the problem-type reference data.
    async fn list_problem_types(&self, token: Option<&SessionToken>)
        -> ApiResult<Vec<ProblemType>>;

    /// Fetches a single problem type.
    async fn get_problem_type(
        &self,
        token: Option<&SessionToken>,
        id: ProblemTypeId,
    ) -> ApiResult<ProblemType>;

    /// Lists tickets matching the filter. Always re-fetches; nothing is cached.
    async fn list_tickets(
        &self,
        token: Option<&SessionToken>,
        filter: &TicketFilter,
    ) -> ApiResult<Vec<Ticket>>;

    /// Fetches a single ticket with its replies.
    async fn get_ticket(&self, token: Option<&SessionToken>, id: TicketId) -> ApiResult<Ticket>;

    /// Opens a new ticket.
    async fn create_ticket(
        &self,
        token: Option<&SessionToken>,
        request: &CreateTicketRequest,
    ) -> ApiResult<Ticket>;

    /// Updates a ticket's workflow fields.
    async fn update_ticket(
        &self,
        token: Option<&SessionToken>,
        id: TicketId,
        request: &UpdateTicketRequest,
    ) -> ApiResult<Ticket>;

    /// Deletes a ticket.
    async fn delete_ticket(&self, token: Option<&SessionToken>, id: TicketId) -> ApiResult<()>;

    /// Assigns a ticket to an agent.
    async fn assign_ticket(
        &self,
        token: Option<&SessionToken>,
        id: TicketId,
        request: &AssignTicketRequest,
    ) -> ApiResult<Ticket>;

    /// Appends a reply to a ticket.
    async fn post_reply(
        &self,
        token: Option<&SessionToken>,
        id: TicketId,
        request: &ReplyRequest,
    ) -> ApiResult<Reply>;

    /// Lists a ticket's replies in creation order.
    async fn list_replies(&self, token: Option<&SessionToken>, id: TicketId)
        -> ApiResult<Vec<Reply>>;

    /// Lists all agent accounts.
    async fn list_agents(&self, token: Option<&SessionToken>) -> ApiResult<Vec<Identity>>;

    /// Fetches a single agent account.
    async fn get_agent(&self, token: Option<&SessionToken>, id: UserId) -> ApiResult<Identity>;

    /// Provisions a new agent account.
    async fn create_agent(
        &self,
        token: Option<&SessionToken>,
        request: &CreateAgentRequest,
    ) -> ApiResult<Identity>;
}
