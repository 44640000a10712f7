//! End-to-end behavior of the resource client against the in-memory
//! backend: session lifecycle, the centralized expiry policy, and the
//! ticket flows.

use hd_client::{ApiError, HelpdeskApi, MockApi, ResourceClient};
use hd_core::auth::Role;
use hd_core::models::{
    CreateAgentRequest, CreateTicketRequest, Priority, TicketFilter, TicketStatus,
    UpdateTicketRequest,
};
use hd_core::session::{SessionStore, TokenVault};
use std::sync::Arc;
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    api: Arc<MockApi>,
    client: ResourceClient,
}

impl Fixture {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let vault = TokenVault::new(dir.path().join("session-token"));
        let session = Arc::new(SessionStore::restore(vault).unwrap());
        let api = Arc::new(MockApi::new());
        api.seed_user("Ada", "ada@example.com", "secret", Role::Admin)
            .await;
        api.seed_problem_type(1, "Hardware").await;
        api.seed_problem_type(2, "Software").await;
        let client = ResourceClient::new(api.clone(), session);
        Self {
            _dir: dir,
            api,
            client,
        }
    }

    async fn sign_in(&self) {
        self.client
            .login("ada@example.com", "secret")
            .await
            .unwrap();
    }

    fn create_request(title: &str) -> CreateTicketRequest {
        CreateTicketRequest {
            title: title.to_string(),
            description: "D".to_string(),
            priority: Priority::High,
            problem_type_id: 1,
            is_public: true,
        }
    }
}

#[tokio::test]
async fn login_establishes_an_observable_session() {
    let fx = Fixture::new().await;
    let identity = fx.client.login("ada@example.com", "secret").await.unwrap();

    assert_eq!(identity.role, Role::Admin);
    assert_eq!(
        fx.client.session().current_identity().unwrap().email,
        "ada@example.com"
    );
    assert!(fx.client.session().token().is_some());
}

#[tokio::test]
async fn failed_login_reports_authentication_failed_and_keeps_prior_session() {
    let fx = Fixture::new().await;
    fx.sign_in().await;
    let before = fx.client.session().current_identity();

    let err = fx
        .client
        .login("ada@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::AuthenticationFailed(_)));
    assert_eq!(fx.client.session().current_identity(), before);
}

#[tokio::test]
async fn logout_clears_identity_and_is_idempotent() {
    let fx = Fixture::new().await;
    fx.sign_in().await;

    fx.client.logout();
    assert!(fx.client.session().current_identity().is_none());
    fx.client.logout();
    assert!(fx.client.session().current_identity().is_none());
}

#[tokio::test]
async fn rejected_credential_clears_the_session_exactly_once() {
    let fx = Fixture::new().await;
    fx.sign_in().await;
    fx.api.revoke_sessions().await;

    let mut rx = fx.client.session().subscribe();
    rx.borrow_and_update();

    let err = fx
        .client
        .list_tickets(&TicketFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::SessionExpired));
    assert!(fx.client.session().current_identity().is_none());
    assert!(fx.client.session().token().is_none());

    // One sign-out notification, not one per failing call site.
    assert!(rx.has_changed().unwrap());
    rx.borrow_and_update();
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn expiry_policy_applies_regardless_of_the_triggering_view() {
    let fx = Fixture::new().await;
    fx.sign_in().await;
    fx.api.revoke_sessions().await;

    let err = fx.client.list_agents().await.unwrap_err();
    assert!(matches!(err, ApiError::SessionExpired));
    assert!(fx.client.session().current_identity().is_none());
}

#[tokio::test]
async fn created_ticket_round_trips_with_status_open() {
    let fx = Fixture::new().await;
    fx.sign_in().await;

    let created = fx
        .client
        .create_ticket(&Fixture::create_request("T"))
        .await
        .unwrap();
    let fetched = fx.client.get_ticket(created.id).await.unwrap();

    assert_eq!(fetched.title, "T");
    assert_eq!(fetched.description, "D");
    assert_eq!(fetched.priority, Priority::High);
    assert_eq!(fetched.problem_type.as_ref().unwrap().id, 1);
    assert!(fetched.is_public);
    assert_eq!(fetched.status, TicketStatus::Open);
}

#[tokio::test]
async fn status_filter_returns_only_matching_tickets() {
    let fx = Fixture::new().await;
    fx.sign_in().await;

    let a = fx
        .client
        .create_ticket(&Fixture::create_request("a"))
        .await
        .unwrap();
    let b = fx
        .client
        .create_ticket(&Fixture::create_request("b"))
        .await
        .unwrap();
    let c = fx
        .client
        .create_ticket(&Fixture::create_request("c"))
        .await
        .unwrap();

    for id in [a.id, c.id] {
        fx.client
            .update_ticket(
                id,
                &UpdateTicketRequest {
                    status: Some(TicketStatus::Closed),
                    priority: None,
                },
            )
            .await
            .unwrap();
    }

    let filter = TicketFilter {
        status: Some(TicketStatus::Closed),
        ..TicketFilter::default()
    };
    let closed = fx.client.list_tickets(&filter).await.unwrap();
    let ids: Vec<_> = closed.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![a.id, c.id]);
    assert!(closed.iter().all(|t| t.status == TicketStatus::Closed));
    assert!(!ids.contains(&b.id));
}

#[tokio::test]
async fn whitespace_reply_is_rejected_before_any_request() {
    let fx = Fixture::new().await;
    fx.sign_in().await;
    let ticket = fx
        .client
        .create_ticket(&Fixture::create_request("T"))
        .await
        .unwrap();

    let before = fx.api.requests();
    let err = fx.client.post_reply(ticket.id, "   \n\t").await.unwrap_err();
    assert!(matches!(err, ApiError::ValidationFailed(_)));
    assert_eq!(fx.api.requests(), before);
}

#[tokio::test]
async fn replies_come_back_in_creation_order() {
    let fx = Fixture::new().await;
    fx.sign_in().await;
    let ticket = fx
        .client
        .create_ticket(&Fixture::create_request("T"))
        .await
        .unwrap();

    fx.client.post_reply(ticket.id, "first").await.unwrap();
    fx.client.post_reply(ticket.id, "second").await.unwrap();

    let replies = fx.client.list_replies(ticket.id).await.unwrap();
    let contents: Vec<&str> = replies.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second"]);
}

#[tokio::test]
async fn assignment_validates_the_agent_id_first() {
    let fx = Fixture::new().await;
    fx.sign_in().await;
    let ticket = fx
        .client
        .create_ticket(&Fixture::create_request("T"))
        .await
        .unwrap();

    // Unknown id fails before the assignment request is sent.
    let err = fx.client.assign_ticket(ticket.id, 999).await.unwrap_err();
    assert!(matches!(err, ApiError::ValidationFailed(m) if m.contains("999")));

    // A non-agent account is rejected too.
    let user = fx
        .api
        .seed_user("Uri", "uri@example.com", "pw", Role::User)
        .await;
    let err = fx.client.assign_ticket(ticket.id, user.id).await.unwrap_err();
    assert!(matches!(err, ApiError::ValidationFailed(_)));

    // A real agent goes through.
    let agent = fx
        .api
        .create_agent(
            fx.client.session().token().as_ref(),
            &CreateAgentRequest {
                name: "Greta".to_string(),
                email: "greta@example.com".to_string(),
                password: "pw".to_string(),
                specialization_ids: vec![1],
            },
        )
        .await
        .unwrap();
    let assigned = fx.client.assign_ticket(ticket.id, agent.id).await.unwrap();
    assert_eq!(assigned.assigned_to.unwrap().id, agent.id);
}

#[tokio::test]
async fn not_found_passes_through_to_the_caller() {
    let fx = Fixture::new().await;
    fx.sign_in().await;
    let err = fx.client.get_ticket(424242).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    // Local failures never touch the session.
    assert!(fx.client.session().current_identity().is_some());
}

#[tokio::test]
async fn rehydrate_resolves_identity_from_a_persisted_token() {
    let dir = tempfile::tempdir().unwrap();
    let vault_path = dir.path().join("session-token");
    let api = Arc::new(MockApi::new());
    api.seed_user("Ada", "ada@example.com", "secret", Role::Admin)
        .await;

    // First process: sign in, persisting the token.
    {
        let session =
            Arc::new(SessionStore::restore(TokenVault::new(&vault_path)).unwrap());
        let client = ResourceClient::new(api.clone(), session);
        client.login("ada@example.com", "secret").await.unwrap();
    }

    // Second process: token-only until rehydration resolves the identity.
    let session = Arc::new(SessionStore::restore(TokenVault::new(&vault_path)).unwrap());
    assert!(session.is_authenticated());
    assert!(session.current_identity().is_none());

    let client = ResourceClient::new(api.clone(), session);
    let identity = client.rehydrate().await.unwrap().unwrap();
    assert_eq!(identity.email, "ada@example.com");
    assert!(client.session().current_identity().is_some());
}

#[tokio::test]
async fn rehydrate_discards_a_server_rejected_token() {
    let dir = tempfile::tempdir().unwrap();
    let vault_path = dir.path().join("session-token");
    let api = Arc::new(MockApi::new());
    api.seed_user("Ada", "ada@example.com", "secret", Role::Admin)
        .await;

    {
        let session =
            Arc::new(SessionStore::restore(TokenVault::new(&vault_path)).unwrap());
        let client = ResourceClient::new(api.clone(), session);
        client.login("ada@example.com", "secret").await.unwrap();
    }
    api.revoke_sessions().await;

    let session = Arc::new(SessionStore::restore(TokenVault::new(&vault_path)).unwrap());
    let client = ResourceClient::new(api.clone(), session);
    assert!(client.rehydrate().await.unwrap().is_none());
    assert!(!client.session().is_authenticated());
    assert!(TokenVault::new(&vault_path).load().unwrap().is_none());
}
