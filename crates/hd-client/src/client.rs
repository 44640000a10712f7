//! The resource client: session-aware wrapper over any backend.
//!
//! Attaches the current session token to every call and applies the
//! session-expiry policy in exactly one place: any authenticated call the
//! server rejects with a credential failure clears the session store and
//! surfaces [`ApiError::SessionExpired`]. Individual views never handle
//! 401s themselves.

use crate::error::{ApiError, ApiResult};
use crate::transport::HelpdeskApi;
use hd_core::auth::Role;
use hd_core::models::{
    AssignTicketRequest, CreateAgentRequest, CreateTicketRequest, LoginRequest, ProblemType,
    ProblemTypeId, RegisterRequest, Reply, ReplyRequest, Ticket, TicketFilter, TicketId,
    UpdateTicketRequest,
};
use hd_core::session::{SessionStore, SessionToken};
use hd_core::{Identity, UserId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Session-aware client for the helpdesk API.
pub struct ResourceClient {
    api: Arc<dyn HelpdeskApi>,
    session: Arc<SessionStore>,
}

impl ResourceClient {
    /// Wraps a backend and the session store it authenticates from.
    pub fn new(api: Arc<dyn HelpdeskApi>, session: Arc<SessionStore>) -> Self {
        Self { api, session }
    }

    /// The session store this client reads from and clears.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Applies the cross-cutting expiry policy to an authenticated call.
    fn guard<T>(&self, result: ApiResult<T>) -> ApiResult<T> {
        match result {
            Err(ApiError::Unauthorized) => {
                warn!("credential rejected mid-session, signing out");
                self.session.clear();
                Err(ApiError::SessionExpired)
            }
            other => other,
        }
    }

    /// Exchanges credentials for an authenticated session.
    ///
    /// The login response carries no user id, so the full identity is
    /// resolved through the current-user endpoint before the session is
    /// established. A rejected login leaves any prior session untouched.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Identity> {
        let credentials = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let auth = match self.api.login(&credentials).await {
            Err(ApiError::Unauthorized) => {
                return Err(ApiError::AuthenticationFailed(
                    "invalid email or password".to_string(),
                ));
            }
            other => other?,
        };

        let token = SessionToken::from(auth.token);
        let identity = match self.api.current_user(&token).await {
            Err(ApiError::Unauthorized) => {
                return Err(ApiError::AuthenticationFailed(
                    "freshly issued token was rejected".to_string(),
                ));
            }
            other => other?,
        };

        self.session
            .establish(token, identity.clone())
            .map_err(|e| ApiError::Storage(e.to_string()))?;
        Ok(identity)
    }

    /// Signs out locally. The API keeps no server-side session to end.
    pub fn logout(&self) {
        self.session.clear();
    }

    /// Resolves the identity behind a rehydrated token at startup.
    ///
    /// Returns `Ok(None)` when signed out, and also when the server
    /// rejects the persisted token (which clears it). A network failure
    /// leaves the token in place for the next attempt.
    pub async fn rehydrate(&self) -> ApiResult<Option<Identity>> {
        if let Some(identity) = self.session.current_identity() {
            return Ok(Some(identity));
        }
        let Some(token) = self.session.token() else {
            return Ok(None);
        };

        match self.api.current_user(&token).await {
            Ok(identity) => {
                debug!(user = %identity.email, "rehydrated session");
                self.session.resolve_identity(identity.clone());
                Ok(Some(identity))
            }
            Err(ApiError::Unauthorized) => {
                info!("persisted session token rejected by the server");
                self.session.clear();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Registers a new end-user account. Does not sign in.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<Identity> {
        self.api.register(request).await
    }

    /// Lists the problem-type reference data.
    pub async fn list_problem_types(&self) -> ApiResult<Vec<ProblemType>> {
        let token = self.session.token();
        self.guard(self.api.list_problem_types(token.as_ref()).await)
    }

    /// Fetches a single problem type.
    pub async fn get_problem_type(&self, id: ProblemTypeId) -> ApiResult<ProblemType> {
        let token = self.session.token();
        self.guard(self.api.get_problem_type(token.as_ref(), id).await)
    }

    /// Lists tickets matching the filter.
    pub async fn list_tickets(&self, filter: &TicketFilter) -> ApiResult<Vec<Ticket>> {
        let token = self.session.token();
        self.guard(self.api.list_tickets(token.as_ref(), filter).await)
    }

    /// Fetches a single ticket with its replies.
    pub async fn get_ticket(&self, id: TicketId) -> ApiResult<Ticket> {
        let token = self.session.token();
        self.guard(self.api.get_ticket(token.as_ref(), id).await)
    }

    /// Opens a new ticket.
    pub async fn create_ticket(&self, request: &CreateTicketRequest) -> ApiResult<Ticket> {
        let token = self.session.token();
        self.guard(self.api.create_ticket(token.as_ref(), request).await)
    }

    /// Updates a ticket's workflow fields.
    pub async fn update_ticket(
        &self,
        id: TicketId,
        request: &UpdateTicketRequest,
    ) -> ApiResult<Ticket> {
        let token = self.session.token();
        self.guard(self.api.update_ticket(token.as_ref(), id, request).await)
    }

    /// Deletes a ticket.
    pub async fn delete_ticket(&self, id: TicketId) -> ApiResult<()> {
        let token = self.session.token();
        self.guard(self.api.delete_ticket(token.as_ref(), id).await)
    }

    /// Assigns a ticket to an agent.
    ///
    /// The agent id is resolved against the agent endpoint first, so a
    /// mistyped id fails cleanly before anything mutates.
    pub async fn assign_ticket(&self, id: TicketId, agent_id: UserId) -> ApiResult<Ticket> {
        let token = self.session.token();

        let agent = match self.api.get_agent(token.as_ref(), agent_id).await {
            Err(ApiError::NotFound(_)) => {
                return Err(ApiError::ValidationFailed(format!(
                    "no agent with id {}",
                    agent_id
                )));
            }
            other => self.guard(other)?,
        };
        if agent.role != Role::Agent {
            return Err(ApiError::ValidationFailed(format!(
                "user {} is not an agent",
                agent_id
            )));
        }

        let request = AssignTicketRequest { agent_id };
        self.guard(self.api.assign_ticket(token.as_ref(), id, &request).await)
    }

    /// Appends a reply to a ticket.
    ///
    /// Empty or whitespace-only content is rejected here, before any
    /// request is sent.
    pub async fn post_reply(&self, id: TicketId, content: &str) -> ApiResult<Reply> {
        if content.trim().is_empty() {
            return Err(ApiError::ValidationFailed(
                "reply content cannot be empty".to_string(),
            ));
        }
        let token = self.session.token();
        let request = ReplyRequest {
            content: content.to_string(),
        };
        self.guard(self.api.post_reply(token.as_ref(), id, &request).await)
    }

    /// Lists a ticket's replies in creation order.
    pub async fn list_replies(&self, id: TicketId) -> ApiResult<Vec<Reply>> {
        let token = self.session.token();
        self.guard(self.api.list_replies(token.as_ref(), id).await)
    }

    /// Lists all agent accounts.
    pub async fn list_agents(&self) -> ApiResult<Vec<Identity>> {
        let token = self.session.token();
        self.guard(self.api.list_agents(token.as_ref()).await)
    }

    /// Provisions a new agent account.
    pub async fn create_agent(&self, request: &CreateAgentRequest) -> ApiResult<Identity> {
        let token = self.session.token();
        self.guard(self.api.create_agent(token.as_ref(), request).await)
    }
}
