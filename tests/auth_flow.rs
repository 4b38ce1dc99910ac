//! End-to-end flows over the in-memory store backends: registration, login,
//! refresh rotation, logout, and per-request authentication.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use notes_auth::error::AuthError;
use notes_auth::keys::Keypair;
use notes_auth::refresh::hash_refresh_secret;
use notes_auth::service::{AuthService, RegisterRequest, TokenPair};
use notes_auth::store::memory::{
    MemoryCredentialStore, MemoryRefreshTokenLedger, MemoryRevocationStore,
};
use notes_auth::store::{CredentialStore, RefreshTokenRecord};
use notes_auth::token::TokenCodec;
use notes_auth::{Principal, RequestAuthenticator};

const PRIVATE_PEM: &[u8] = include_bytes!("keys/private.pem");
const PUBLIC_PEM: &[u8] = include_bytes!("keys/public.pem");

struct TestAuth {
    users: Arc<MemoryCredentialStore>,
    ledger: Arc<MemoryRefreshTokenLedger>,
    service: AuthService,
    authenticator: RequestAuthenticator,
}

fn spawn_auth() -> TestAuth {
    let keys = Arc::new(Keypair::from_pem(PRIVATE_PEM, PUBLIC_PEM).expect("Failed to load keys"));
    let codec = TokenCodec::new(keys);

    let users = Arc::new(MemoryCredentialStore::new());
    let ledger = Arc::new(MemoryRefreshTokenLedger::new());
    let revocations = Arc::new(MemoryRevocationStore::new());

    let service = AuthService::new(
        users.clone(),
        ledger.clone(),
        revocations.clone(),
        codec.clone(),
        Duration::minutes(15),
        Duration::days(30),
    );
    let authenticator = RequestAuthenticator::new(codec, users.clone(), revocations);

    TestAuth {
        users,
        ledger,
        service,
        authenticator,
    }
}

fn register_request(username: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: Some(format!("{}@example.com", username)),
        profile: json!({ "display_name": username }),
        password: "Secret123!".to_string(),
    }
}

async fn register_and_login(auth: &TestAuth, username: &str) -> TokenPair {
    auth.service
        .register(register_request(username), None)
        .await
        .expect("Failed to register user");
    auth.service
        .authenticate(username, "Secret123!")
        .await
        .expect("Failed to authenticate user")
}

async fn principal_for(auth: &TestAuth, pair: &TokenPair) -> Principal {
    auth.authenticator
        .authenticate_request(&pair.access_token)
        .await
        .expect("Failed to resolve principal")
}

async fn user_id_of(auth: &TestAuth, username: &str) -> Uuid {
    auth.users
        .user_by_username(username)
        .await
        .unwrap()
        .expect("user missing")
        .id
}

// --- Registration and login ---

#[tokio::test]
async fn register_then_login_yields_a_working_pair() {
    let auth = spawn_auth();

    let created = auth
        .service
        .register(register_request("alice"), None)
        .await
        .unwrap();
    assert_eq!(created.username, "alice");
    assert_eq!(created.role, "user");

    let pair = auth.service.authenticate("alice", "Secret123!").await.unwrap();
    assert!(pair.access_expires_at > Utc::now());

    let principal = principal_for(&auth, &pair).await;
    assert_eq!(principal.username, "alice");
    assert_eq!(principal.role, "user");
    assert_eq!(principal.user_id, user_id_of(&auth, "alice").await);
    assert_eq!(principal.expires_at, pair.access_expires_at);
}

#[tokio::test]
async fn login_fails_for_unknown_user() {
    let auth = spawn_auth();
    let result = auth.service.authenticate("nobody", "Secret123!").await;
    assert!(matches!(result, Err(AuthError::UserNotFound)));
}

#[tokio::test]
async fn login_fails_for_wrong_password() {
    let auth = spawn_auth();
    auth.service
        .register(register_request("alice"), None)
        .await
        .unwrap();

    let result = auth.service.authenticate("alice", "Wrong456!").await;
    assert!(matches!(result, Err(AuthError::InvalidPassword)));
}

#[tokio::test]
async fn login_fails_for_inactive_user() {
    let auth = spawn_auth();
    auth.service
        .register(register_request("alice"), None)
        .await
        .unwrap();
    auth.users.set_active(user_id_of(&auth, "alice").await, false);

    let result = auth.service.authenticate("alice", "Secret123!").await;
    assert!(matches!(result, Err(AuthError::UserInactive)));
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let auth = spawn_auth();
    auth.service
        .register(register_request("alice"), None)
        .await
        .unwrap();

    let result = auth.service.register(register_request("alice"), None).await;
    assert!(matches!(result, Err(AuthError::UserAlreadyExists)));
}

#[tokio::test]
async fn weak_password_never_reaches_the_store() {
    let auth = spawn_auth();
    let mut request = register_request("alice");
    request.password = "weak".to_string();

    let result = auth.service.register(request, None).await;
    assert!(matches!(result, Err(AuthError::PasswordPolicy(_))));
    assert!(auth.users.user_by_username("alice").await.unwrap().is_none());
}

// --- Refresh rotation ---

#[tokio::test]
async fn refresh_token_is_single_use() {
    let auth = spawn_auth();
    let first = register_and_login(&auth, "alice").await;

    let second = auth.service.refresh(&first.refresh_token).await.unwrap();
    assert_ne!(second.refresh_token, first.refresh_token);
    assert_ne!(second.access_token, first.access_token);

    let replay = auth.service.refresh(&first.refresh_token).await;
    assert!(matches!(replay, Err(AuthError::RefreshTokenNotFound)));
}

#[tokio::test]
async fn refreshed_access_token_authenticates() {
    let auth = spawn_auth();
    let first = register_and_login(&auth, "alice").await;
    let second = auth.service.refresh(&first.refresh_token).await.unwrap();

    let principal = principal_for(&auth, &second).await;
    assert_eq!(principal.username, "alice");
}

#[tokio::test]
async fn expired_refresh_token_is_terminal() {
    let auth = spawn_auth();
    auth.service
        .register(register_request("alice"), None)
        .await
        .unwrap();
    let user_id = user_id_of(&auth, "alice").await;

    let raw = "an-expired-refresh-secret";
    auth.ledger.insert_record(RefreshTokenRecord {
        id: Uuid::new_v4(),
        user_id,
        token_hash: hash_refresh_secret(raw),
        expires_at: Utc::now() - Duration::hours(1),
        revoked: false,
        created_at: Utc::now() - Duration::days(31),
    });

    let first = auth.service.refresh(raw).await;
    assert!(matches!(first, Err(AuthError::RefreshTokenExpired)));

    // The expired record was deleted on first observation.
    let second = auth.service.refresh(raw).await;
    assert!(matches!(second, Err(AuthError::RefreshTokenNotFound)));
}

#[tokio::test]
async fn revoked_flagged_record_reads_as_not_found() {
    let auth = spawn_auth();
    auth.service
        .register(register_request("alice"), None)
        .await
        .unwrap();

    let raw = "a-revoked-refresh-secret";
    auth.ledger.insert_record(RefreshTokenRecord {
        id: Uuid::new_v4(),
        user_id: user_id_of(&auth, "alice").await,
        token_hash: hash_refresh_secret(raw),
        expires_at: Utc::now() + Duration::days(30),
        revoked: true,
        created_at: Utc::now(),
    });

    let result = auth.service.refresh(raw).await;
    assert!(matches!(result, Err(AuthError::RefreshTokenNotFound)));
}

#[tokio::test]
async fn refresh_fails_for_deactivated_owner() {
    let auth = spawn_auth();
    let pair = register_and_login(&auth, "alice").await;
    auth.users.set_active(user_id_of(&auth, "alice").await, false);

    let result = auth.service.refresh(&pair.refresh_token).await;
    assert!(matches!(result, Err(AuthError::UserInactive)));
}

// --- Logout and revocation ---

#[tokio::test]
async fn logout_revokes_access_and_all_refresh_tokens() {
    let auth = spawn_auth();
    let pair = register_and_login(&auth, "alice").await;
    // A second session for the same account.
    let other = auth.service.authenticate("alice", "Secret123!").await.unwrap();
    assert_eq!(auth.ledger.len(), 2);

    let principal = principal_for(&auth, &pair).await;
    auth.service
        .logout(&principal.jti, principal.remaining_ttl(), principal.user_id)
        .await
        .unwrap();

    let revoked = auth.authenticator.authenticate_request(&pair.access_token).await;
    assert!(matches!(revoked, Err(AuthError::AccessRevoked)));

    // Global logout: every session's refresh token is gone.
    assert!(auth.ledger.is_empty());
    let replay = auth.service.refresh(&other.refresh_token).await;
    assert!(matches!(replay, Err(AuthError::RefreshTokenNotFound)));

    // The account itself is untouched.
    assert!(auth.service.authenticate("alice", "Secret123!").await.is_ok());
}

#[tokio::test]
async fn deactivation_closes_the_standing_token_gap() {
    let auth = spawn_auth();
    let pair = register_and_login(&auth, "alice").await;
    auth.users.set_active(user_id_of(&auth, "alice").await, false);

    let result = auth.authenticator.authenticate_request(&pair.access_token).await;
    assert!(matches!(result, Err(AuthError::UserInactive)));
}

#[tokio::test]
async fn deleted_account_fails_user_not_found() {
    let auth = spawn_auth();
    let pair = register_and_login(&auth, "alice").await;
    auth.users.remove(user_id_of(&auth, "alice").await);

    let result = auth.authenticator.authenticate_request(&pair.access_token).await;
    assert!(matches!(result, Err(AuthError::UserNotFound)));
}

#[tokio::test]
async fn garbage_access_token_is_invalid() {
    let auth = spawn_auth();
    let result = auth.authenticator.authenticate_request("not.a.token").await;
    assert!(matches!(result, Err(AuthError::InvalidToken)));
}

#[tokio::test]
async fn registration_logs_out_the_session_it_arrived_with() {
    let auth = spawn_auth();
    let bob_pair = register_and_login(&auth, "bob").await;
    let bob = principal_for(&auth, &bob_pair).await;

    auth.service
        .register(register_request("carol"), Some(&bob))
        .await
        .unwrap();

    let result = auth.authenticator.authenticate_request(&bob_pair.access_token).await;
    assert!(matches!(result, Err(AuthError::AccessRevoked)));
}

// --- Full scenario ---

#[tokio::test]
async fn end_to_end_session_lifecycle() {
    let auth = spawn_auth();

    auth.service
        .register(register_request("alice"), None)
        .await
        .unwrap();

    let p1 = auth.service.authenticate("alice", "Secret123!").await.unwrap();

    let p2 = auth.service.refresh(&p1.refresh_token).await.unwrap();
    assert!(matches!(
        auth.service.refresh(&p1.refresh_token).await,
        Err(AuthError::RefreshTokenNotFound)
    ));

    let principal = principal_for(&auth, &p2).await;
    auth.service
        .logout(&principal.jti, principal.remaining_ttl(), principal.user_id)
        .await
        .unwrap();

    assert!(matches!(
        auth.authenticator.authenticate_request(&p2.access_token).await,
        Err(AuthError::AccessRevoked)
    ));

    // Logout disables the session, not the account.
    assert!(auth.service.authenticate("alice", "Secret123!").await.is_ok());
}
