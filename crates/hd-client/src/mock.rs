//! In-memory backend for tests.
//!
//! Mirrors the remote API's observable behavior: bearer-token sessions,
//! OPEN status on creation, append-only replies, and `{message}` style
//! failures mapped onto the error taxonomy. Sessions can be revoked to
//! simulate server-side token expiry.

use crate::error::{ApiError, ApiResult};
use crate::transport::HelpdeskApi;
use async_trait::async_trait;
use chrono::Utc;
use hd_core::auth::Role;
use hd_core::models::{
    AssignTicketRequest, AuthResponse, CreateAgentRequest, CreateTicketRequest, LoginRequest,
    ProblemType, ProblemTypeId, RegisterRequest, Reply, ReplyRequest, Ticket, TicketFilter,
    TicketId, UpdateTicketRequest,
};
use hd_core::session::SessionToken;
use hd_core::{Identity, UserId};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use tokio::sync::RwLock;

struct MockUser {
    identity: Identity,
    password: String,
}

/// In-memory implementation of [`HelpdeskApi`].
pub struct MockApi {
    users: RwLock<Vec<MockUser>>,
    sessions: RwLock<HashMap<String, UserId>>,
    tickets: RwLock<BTreeMap<TicketId, Ticket>>,
    problem_types: RwLock<Vec<ProblemType>>,
    user_seq: AtomicI64,
    ticket_seq: AtomicI64,
    reply_seq: AtomicI64,
    token_seq: AtomicI64,
    requests: AtomicU64,
}

impl MockApi {
    /// Creates an empty fixture.
    pub fn new() -> Self {
        Self {
            users: RwLock::new(Vec::new()),
            sessions: RwLock::new(HashMap::new()),
            tickets: RwLock::new(BTreeMap::new()),
            problem_types: RwLock::new(Vec::new()),
            user_seq: AtomicI64::new(1),
            ticket_seq: AtomicI64::new(1),
            reply_seq: AtomicI64::new(1),
            token_seq: AtomicI64::new(1),
            requests: AtomicU64::new(0),
        }
    }

    /// Adds a user account the fixture will accept at login.
    pub async fn seed_user(&self, name: &str, email: &str, password: &str, role: Role) -> Identity {
        let identity = Identity {
            id: self.user_seq.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
            email: email.to_string(),
            role,
        };
        self.users.write().await.push(MockUser {
            identity: identity.clone(),
            password: password.to_string(),
        });
        identity
    }

    /// Adds a problem type to the reference data.
    pub async fn seed_problem_type(&self, id: ProblemTypeId, name: &str) -> ProblemType {
        let problem_type = ProblemType {
            id,
            name: name.to_string(),
            description: None,
        };
        self.problem_types.write().await.push(problem_type.clone());
        problem_type
    }

    /// Invalidates every issued token, as a server-side expiry would.
    pub async fn revoke_sessions(&self) {
        self.sessions.write().await.clear();
    }

    /// Number of calls that reached this backend.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }

    async fn authed(&self, token: Option<&SessionToken>) -> ApiResult<Identity> {
        let Some(token) = token else {
            return Err(ApiError::Unauthorized);
        };
        let sessions = self.sessions.read().await;
        let Some(user_id) = sessions.get(token.expose()).copied() else {
            return Err(ApiError::Unauthorized);
        };
        let users = self.users.read().await;
        users
            .iter()
            .find(|u| u.identity.id == user_id)
            .map(|u| u.identity.clone())
            .ok_or(ApiError::Unauthorized)
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HelpdeskApi for MockApi {
    async fn login(&self, credentials: &LoginRequest) -> ApiResult<AuthResponse> {
        self.touch();
        let users = self.users.read().await;
        let user = users
            .iter()
            .find(|u| u.identity.email == credentials.email && u.password == credentials.password)
            .ok_or(ApiError::Unauthorized)?;

        let token = format!("mock-token-{}", self.token_seq.fetch_add(1, Ordering::SeqCst));
        self.sessions
            .write()
            .await
            .insert(token.clone(), user.identity.id);

        Ok(AuthResponse {
            token,
            email: user.identity.email.clone(),
            name: user.identity.name.clone(),
            role: user.identity.role,
        })
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<Identity> {
        self.touch();
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.identity.email == request.email) {
            return Err(ApiError::ValidationFailed("Email already exists".to_string()));
        }
        let identity = Identity {
            id: self.user_seq.fetch_add(1, Ordering::SeqCst),
            name: request.name.clone(),
            email: request.email.clone(),
            role: Role::User,
        };
        users.push(MockUser {
            identity: identity.clone(),
            password: request.password.clone(),
        });
        Ok(identity)
    }

    async fn current_user(&self, token: &SessionToken) -> ApiResult<Identity> {
        self.touch();
        self.authed(Some(token)).await
    }

    async fn list_problem_types(
        &self,
        token: Option<&SessionToken>,
    ) -> ApiResult<Vec<ProblemType>> {
        self.touch();
        self.authed(token).await?;
        Ok(self.problem_types.read().await.clone())
    }

    async fn get_problem_type(
        &self,
        token: Option<&SessionToken>,
        id: ProblemTypeId,
    ) -> ApiResult<ProblemType> {
        self.touch();
        self.authed(token).await?;
        self.problem_types
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Problem type not found with id: {}", id)))
    }

    async fn list_tickets(
        &self,
        token: Option<&SessionToken>,
        filter: &TicketFilter,
    ) -> ApiResult<Vec<Ticket>> {
        self.touch();
        self.authed(token).await?;
        let tickets = self.tickets.read().await;
        Ok(tickets
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn get_ticket(&self, token: Option<&SessionToken>, id: TicketId) -> ApiResult<Ticket> {
        self.touch();
        self.authed(token).await?;
        self.tickets
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Ticket not found with id: {}", id)))
    }

    async fn create_ticket(
        &self,
        token: Option<&SessionToken>,
        request: &CreateTicketRequest,
    ) -> ApiResult<Ticket> {
        self.touch();
        let creator = self.authed(token).await?;
        let problem_type = self
            .problem_types
            .read()
            .await
            .iter()
            .find(|p| p.id == request.problem_type_id)
            .cloned()
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "Problem type not found with id: {}",
                    request.problem_type_id
                ))
            })?;

        let ticket = Ticket {
            id: self.ticket_seq.fetch_add(1, Ordering::SeqCst),
            title: request.title.clone(),
            description: request.description.clone(),
            status: hd_core::models::TicketStatus::Open,
            priority: request.priority,
            created_at: Utc::now().naive_utc(),
            created_by: creator,
            assigned_to: None,
            problem_type: Some(problem_type),
            is_public: request.is_public,
            replies: Vec::new(),
        };

        self.tickets.write().await.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn update_ticket(
        &self,
        token: Option<&SessionToken>,
        id: TicketId,
        request: &UpdateTicketRequest,
    ) -> ApiResult<Ticket> {
        self.touch();
        self.authed(token).await?;
        let mut tickets = self.tickets.write().await;
        let ticket = tickets
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("Ticket not found with id: {}", id)))?;

        if let Some(status) = request.status {
            ticket.status = status;
        }
        if let Some(priority) = request.priority {
            ticket.priority = priority;
        }
        Ok(ticket.clone())
    }

    async fn delete_ticket(&self, token: Option<&SessionToken>, id: TicketId) -> ApiResult<()> {
        self.touch();
        self.authed(token).await?;
        self.tickets
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound(format!("Ticket not found with id: {}", id)))
    }

    async fn assign_ticket(
        &self,
        token: Option<&SessionToken>,
        id: TicketId,
        request: &AssignTicketRequest,
    ) -> ApiResult<Ticket> {
        self.touch();
        self.authed(token).await?;
        let agent = {
            let users = self.users.read().await;
            users
                .iter()
                .find(|u| u.identity.id == request.agent_id)
                .map(|u| u.identity.clone())
                .ok_or_else(|| {
                    ApiError::NotFound(format!("Agent not found with id: {}", request.agent_id))
                })?
        };
        if agent.role != Role::Agent {
            return Err(ApiError::ValidationFailed(format!(
                "user {} is not an agent",
                request.agent_id
            )));
        }

        let mut tickets = self.tickets.write().await;
        let ticket = tickets
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("Ticket not found with id: {}", id)))?;
        ticket.assigned_to = Some(agent);
        Ok(ticket.clone())
    }

    async fn post_reply(
        &self,
        token: Option<&SessionToken>,
        id: TicketId,
        request: &ReplyRequest,
    ) -> ApiResult<Reply> {
        self.touch();
        let user = self.authed(token).await?;
        if request.content.trim().is_empty() {
            return Err(ApiError::ValidationFailed("Content is required".to_string()));
        }

        let mut tickets = self.tickets.write().await;
        let ticket = tickets
            .get_mut(&id)
            .ok_or_else(|| ApiError::NotFound(format!("Ticket not found with id: {}", id)))?;

        let reply = Reply {
            id: self.reply_seq.fetch_add(1, Ordering::SeqCst),
            content: request.content.clone(),
            created_at: Utc::now().naive_utc(),
            user,
        };
        ticket.replies.push(reply.clone());
        Ok(reply)
    }

    async fn list_replies(
        &self,
        token: Option<&SessionToken>,
        id: TicketId,
    ) -> ApiResult<Vec<Reply>> {
        self.touch();
        self.authed(token).await?;
        self.tickets
            .read()
            .await
            .get(&id)
            .map(|t| t.replies.clone())
            .ok_or_else(|| ApiError::NotFound(format!("Ticket not found with id: {}", id)))
    }

    async fn list_agents(&self, token: Option<&SessionToken>) -> ApiResult<Vec<Identity>> {
        self.touch();
        self.authed(token).await?;
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|u| u.identity.role == Role::Agent)
            .map(|u| u.identity.clone())
            .collect())
    }

    async fn get_agent(&self, token: Option<&SessionToken>, id: UserId) -> ApiResult<Identity> {
        self.touch();
        self.authed(token).await?;
        let users = self.users.read().await;
        users
            .iter()
            .find(|u| u.identity.id == id)
            .map(|u| u.identity.clone())
            .ok_or_else(|| ApiError::NotFound(format!("Agent not found with id: {}", id)))
    }

    async fn create_agent(
        &self,
        token: Option<&SessionToken>,
        request: &CreateAgentRequest,
    ) -> ApiResult<Identity> {
        self.touch();
        self.authed(token).await?;
        {
            let problem_types = self.problem_types.read().await;
            for id in &request.specialization_ids {
                if !problem_types.iter().any(|p| p.id == *id) {
                    return Err(ApiError::NotFound(format!(
                        "Problem type not found with id: {}",
                        id
                    )));
                }
            }
        }

        let mut users = self.users.write().await;
        if users.iter().any(|u| u.identity.email == request.email) {
            return Err(ApiError::ValidationFailed("Email already exists".to_string()));
        }
        let identity = Identity {
            id: self.user_seq.fetch_add(1, Ordering::SeqCst),
            name: request.name.clone(),
            email: request.email.clone(),
            role: Role::Agent,
        };
        users.push(MockUser {
            identity: identity.clone(),
            password: request.password.clone(),
        });
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hd_core::models::Priority;
    use hd_core::models::TicketStatus;

    async fn logged_in(api: &MockApi) -> SessionToken {
        api.seed_user("Ada", "ada@example.com", "pw", Role::Admin)
            .await;
        let auth = api
            .login(&LoginRequest {
                email: "ada@example.com".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();
        SessionToken::from(auth.token)
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let api = MockApi::new();
        api.seed_user("Ada", "ada@example.com", "pw", Role::Admin)
            .await;
        let err = api
            .login(&LoginRequest {
                email: "ada@example.com".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn calls_without_a_session_are_unauthorized() {
        let api = MockApi::new();
        let err = api
            .list_tickets(None, &TicketFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn created_tickets_start_open() {
        let api = MockApi::new();
        let token = logged_in(&api).await;
        api.seed_problem_type(1, "Hardware").await;

        let ticket = api
            .create_ticket(
                Some(&token),
                &CreateTicketRequest {
                    title: "T".to_string(),
                    description: "D".to_string(),
                    priority: Priority::High,
                    problem_type_id: 1,
                    is_public: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(ticket.status, TicketStatus::Open);
        assert!(ticket.replies.is_empty());
        let fetched = api.get_ticket(Some(&token), ticket.id).await.unwrap();
        assert_eq!(fetched, ticket);
    }

    #[tokio::test]
    async fn replies_keep_creation_order() {
        let api = MockApi::new();
        let token = logged_in(&api).await;
        api.seed_problem_type(1, "Hardware").await;
        let ticket = api
            .create_ticket(
                Some(&token),
                &CreateTicketRequest {
                    title: "T".to_string(),
                    description: "D".to_string(),
                    priority: Priority::Low,
                    problem_type_id: 1,
                    is_public: true,
                },
            )
            .await
            .unwrap();

        for content in ["first", "second", "third"] {
            api.post_reply(
                Some(&token),
                ticket.id,
                &ReplyRequest {
                    content: content.to_string(),
                },
            )
            .await
            .unwrap();
        }

        let replies = api.list_replies(Some(&token), ticket.id).await.unwrap();
        let contents: Vec<&str> = replies.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert!(replies.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn revoked_sessions_stop_authenticating() {
        let api = MockApi::new();
        let token = logged_in(&api).await;
        api.revoke_sessions().await;
        let err = api.current_user(&token).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn duplicate_agent_email_is_rejected() {
        let api = MockApi::new();
        let token = logged_in(&api).await;
        let request = CreateAgentRequest {
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            password: "pw".to_string(),
            specialization_ids: vec![],
        };
        api.create_agent(Some(&token), &request).await.unwrap();
        let err = api.create_agent(Some(&token), &request).await.unwrap_err();
        assert!(matches!(err, ApiError::ValidationFailed(m) if m == "Email already exists"));
    }
}
