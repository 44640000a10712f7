//! HTTP backend speaking JSON to a remote helpdesk server.

use crate::error::{ApiError, ApiResult};
use crate::transport::HelpdeskApi;
use async_trait::async_trait;
use hd_core::models::{
    AssignTicketRequest, AuthResponse, CreateAgentRequest, CreateTicketRequest, LoginRequest,
    ProblemType, ProblemTypeId, RegisterRequest, Reply, ReplyRequest, Ticket, TicketFilter,
    TicketId, UpdateTicketRequest,
};
use hd_core::session::SessionToken;
use hd_core::{Identity, UserId};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Error body the server attaches to failed requests.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Maps a non-success status and optional server message onto the error
/// taxonomy. Client errors are never retried; 401 stays transport-level
/// so the resource client can apply the session-expiry policy.
fn classify_status(status: StatusCode, message: Option<String>) -> ApiError {
    let detail = |fallback: &str| message.clone().unwrap_or_else(|| fallback.to_string());
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::FORBIDDEN => ApiError::Forbidden(detail("access denied")),
        StatusCode::NOT_FOUND => ApiError::NotFound(detail("resource not found")),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::ValidationFailed(detail("invalid request"))
        }
        _ => ApiError::Server(format!("{}: {}", status, detail("unexpected failure"))),
    }
}

/// HTTP implementation of [`HelpdeskApi`] backed by reqwest.
///
/// Plain request/response: no retries, no caching, one bearer header per
/// authenticated call.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    /// Creates a client for the given base URL (the `/api` prefix included).
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds a full URL from a path.
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Attaches the bearer credential when one is present.
    fn authorize(request: RequestBuilder, token: Option<&SessionToken>) -> RequestBuilder {
        match token {
            Some(token) => {
                request.header("Authorization", format!("Bearer {}", token.expose()))
            }
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout(e.to_string())
            } else if e.is_connect() {
                ApiError::ConnectionFailed(e.to_string())
            } else {
                ApiError::Server(e.to_string())
            }
        })
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> ApiResult<T> {
        let status = response.status();
        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))
        } else {
            Err(self.error_from(status, response).await)
        }
    }

    async fn handle_empty_response(&self, response: Response) -> ApiResult<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(self.error_from(status, response).await)
    }

    async fn error_from(&self, status: StatusCode, response: Response) -> ApiError {
        let body: ErrorBody = response.json().await.unwrap_or_default();
        debug!(%status, message = ?body.message, "request rejected");
        classify_status(status, body.message)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: Option<&SessionToken>,
        path: &str,
    ) -> ApiResult<T> {
        let request = Self::authorize(self.client.get(self.url(path)), token);
        let response = self.send(request).await?;
        self.handle_response(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        token: Option<&SessionToken>,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let request = Self::authorize(self.client.post(self.url(path)).json(body), token);
        let response = self.send(request).await?;
        self.handle_response(response).await
    }

    async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        token: Option<&SessionToken>,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let request = Self::authorize(self.client.put(self.url(path)).json(body), token);
        let response = self.send(request).await?;
        self.handle_response(response).await
    }

    async fn delete_empty(&self, token: Option<&SessionToken>, path: &str) -> ApiResult<()> {
        let request = Self::authorize(self.client.delete(self.url(path)), token);
        let response = self.send(request).await?;
        self.handle_empty_response(response).await
    }

    /// Builds the ticket-list path with its query string.
    fn tickets_path(filter: &TicketFilter) -> String {
        let mut query = Vec::new();
        if let Some(status) = filter.status {
            query.push(format!("status={}", status));
        }
        if let Some(priority) = filter.priority {
            query.push(format!("priority={}", priority));
        }
        if let Some(problem_type_id) = filter.problem_type_id {
            query.push(format!("problemTypeId={}", problem_type_id));
        }
        if let Some(is_public) = filter.is_public {
            query.push(format!("isPublic={}", is_public));
        }

        if query.is_empty() {
            "/tickets".to_string()
        } else {
            format!("/tickets?{}", query.join("&"))
        }
    }
}

#[async_trait]
impl HelpdeskApi for HttpApi {
    async fn login(&self, credentials: &LoginRequest) -> ApiResult<AuthResponse> {
        self.post_json(None, "/auth/login", credentials).await
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<Identity> {
        self.post_json(None, "/auth/register", request).await
    }

    async fn current_user(&self, token: &SessionToken) -> ApiResult<Identity> {
        self.get_json(Some(token), "/auth/me").await
    }

    async fn list_problem_types(
        &self,
        token: Option<&SessionToken>,
    ) -> ApiResult<Vec<ProblemType>> {
        self.get_json(token, "/problem-types").await
    }

    async fn get_problem_type(
        &self,
        token: Option<&SessionToken>,
        id: ProblemTypeId,
    ) -> ApiResult<ProblemType> {
        self.get_json(token, &format!("/problem-types/{}", id)).await
    }

    async fn list_tickets(
        &self,
        token: Option<&SessionToken>,
        filter: &TicketFilter,
    ) -> ApiResult<Vec<Ticket>> {
        self.get_json(token, &Self::tickets_path(filter)).await
    }

    async fn get_ticket(&self, token: Option<&SessionToken>, id: TicketId) -> ApiResult<Ticket> {
        self.get_json(token, &format!("/tickets/{}", id)).await
    }

    async fn create_ticket(
        &self,
        token: Option<&SessionToken>,
        request: &CreateTicketRequest,
    ) -> ApiResult<Ticket> {
        self.post_json(token, "/tickets", request).await
    }

    async fn update_ticket(
        &self,
        token: Option<&SessionToken>,
        id: TicketId,
        request: &UpdateTicketRequest,
    ) -> ApiResult<Ticket> {
        self.put_json(token, &format!("/tickets/{}", id), request).await
    }

    async fn delete_ticket(&self, token: Option<&SessionToken>, id: TicketId) -> ApiResult<()> {
        self.delete_empty(token, &format!("/tickets/{}", id)).await
    }

    async fn assign_ticket(
        &self,
        token: Option<&SessionToken>,
        id: TicketId,
        request: &AssignTicketRequest,
    ) -> ApiResult<Ticket> {
        self.put_json(token, &format!("/tickets/{}/assign", id), request)
            .await
    }

    async fn post_reply(
        &self,
        token: Option<&SessionToken>,
        id: TicketId,
        request: &ReplyRequest,
    ) -> ApiResult<Reply> {
        self.post_json(token, &format!("/tickets/{}/replies", id), request)
            .await
    }

    async fn list_replies(
        &self,
        token: Option<&SessionToken>,
        id: TicketId,
    ) -> ApiResult<Vec<Reply>> {
        self.get_json(token, &format!("/tickets/{}/replies", id)).await
    }

    async fn list_agents(&self, token: Option<&SessionToken>) -> ApiResult<Vec<Identity>> {
        self.get_json(token, "/agents").await
    }

    async fn get_agent(&self, token: Option<&SessionToken>, id: UserId) -> ApiResult<Identity> {
        self.get_json(token, &format!("/agents/{}", id)).await
    }

    async fn create_agent(
        &self,
        token: Option<&SessionToken>,
        request: &CreateAgentRequest,
    ) -> ApiResult<Identity> {
        self.post_json(token, "/agents", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hd_core::models::{Priority, TicketStatus};

    #[test]
    fn url_joins_base_and_path() {
        let api = HttpApi::new("http://localhost:8085/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(api.url("/tickets"), "http://localhost:8085/api/tickets");
        assert_eq!(api.url("tickets"), "http://localhost:8085/api/tickets");
    }

    #[test]
    fn tickets_path_without_filters_has_no_query() {
        assert_eq!(HttpApi::tickets_path(&TicketFilter::default()), "/tickets");
    }

    #[test]
    fn tickets_path_encodes_every_set_dimension() {
        let filter = TicketFilter {
            status: Some(TicketStatus::InProgress),
            priority: Some(Priority::High),
            problem_type_id: Some(4),
            is_public: Some(false),
        };
        assert_eq!(
            HttpApi::tickets_path(&filter),
            "/tickets?status=IN_PROGRESS&priority=HIGH&problemTypeId=4&isPublic=false"
        );
    }

    #[test]
    fn status_classification_matches_the_taxonomy() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, None),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, Some("nope".into())),
            ApiError::Forbidden(m) if m == "nope"
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND, None),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, Some("Title is required".into())),
            ApiError::ValidationFailed(m) if m == "Title is required"
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, None),
            ApiError::Server(_)
        ));
    }
}
