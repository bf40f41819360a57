//! HTTP-level integration tests for the admin cleanup endpoints, plus the
//! read-time expiry guarantee the sweeper builds on.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, create_test_user, get_auth, login_user, post_auth};
use warden_api::auth::token::{generate_access_token, hash_token};
use warden_core::roles::{ROLE_ADMIN, ROLE_VIEWER};
use warden_db::models::session::CreateSession;
use warden_db::AuthStore;

/// Insert a session row directly, with an arbitrary expiry.
async fn seed_session(
    store: &Arc<dyn AuthStore>,
    user_id: i64,
    token_hash: &str,
    expires_at: chrono::DateTime<Utc>,
) {
    store
        .insert_session(&CreateSession {
            user_id,
            token_hash: token_hash.to_string(),
            refresh_token_hash: format!("refresh-{token_hash}"),
            ip_address: None,
            user_agent: None,
            expires_at,
        })
        .await
        .expect("session insert should succeed");
}

// ---------------------------------------------------------------------------
// Test: expired sessions are dead at read time, before any sweep runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn expired_session_is_rejected_before_any_sweep() {
    let store = common::test_store();
    let user = create_test_user(&store, "timedout@example.com", ROLE_VIEWER).await;

    // A JWT that is still valid for an hour, attached to a session row that
    // expired a minute ago. The row wins: lookups filter on expiry.
    let token = generate_access_token(user.id, &user.role, &common::test_auth_config())
        .expect("token generation should succeed");
    seed_session(
        &store,
        user.id,
        &hash_token(&token),
        Utc::now() - Duration::minutes(1),
    )
    .await;

    let app = common::build_test_app(store);
    let response = get_auth(app, "/api/v1/auth/me", &token).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Session expired or invalid");
}

// ---------------------------------------------------------------------------
// Test: GET /admin/cleanup/stats reports pending work without mutating
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cleanup_stats_reflect_pending_work() {
    let store = common::test_store();
    create_test_user(&store, "janitor@example.com", ROLE_ADMIN).await;
    let user = create_test_user(&store, "mess@example.com", ROLE_VIEWER).await;

    // Two expired sessions, one live.
    seed_session(&store, user.id, "digest-a", Utc::now() - Duration::hours(2)).await;
    seed_session(&store, user.id, "digest-b", Utc::now() - Duration::minutes(5)).await;
    seed_session(&store, user.id, "digest-c", Utc::now() + Duration::hours(1)).await;

    // One lock still in force.
    store
        .lock_user(user.id, Utc::now() + Duration::minutes(10))
        .await
        .expect("lock should succeed");

    let data = login_user(common::build_test_app(Arc::clone(&store)), "janitor@example.com").await;
    let token = data["token"].as_str().unwrap();

    let app = common::build_test_app(Arc::clone(&store));
    let response = get_auth(app, "/api/v1/admin/cleanup/stats", token).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["expiredSessions"], 2);
    assert_eq!(json["data"]["lockedUsers"], 1);
    assert_eq!(json["data"]["oldAuditEntries"], 0);

    // Stats are a read: the expired rows are still there.
    let count = store.count_expired_sessions(Utc::now()).await.unwrap();
    assert_eq!(count, 2);
}

// ---------------------------------------------------------------------------
// Test: POST /admin/cleanup/run sweeps expired state and reports counts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cleanup_run_sweeps_and_reports() {
    let store = common::test_store();
    create_test_user(&store, "sweeper@example.com", ROLE_ADMIN).await;
    let user = create_test_user(&store, "litter@example.com", ROLE_VIEWER).await;
    let other = create_test_user(&store, "walkfree@example.com", ROLE_VIEWER).await;

    // Two expired sessions and one live one.
    seed_session(&store, user.id, "digest-x", Utc::now() - Duration::hours(3)).await;
    seed_session(&store, user.id, "digest-y", Utc::now() - Duration::minutes(1)).await;
    seed_session(&store, user.id, "digest-z", Utc::now() + Duration::hours(1)).await;

    // One lock already elapsed (sweepable), one still in force (not).
    store
        .lock_user(user.id, Utc::now() - Duration::minutes(1))
        .await
        .expect("lock should succeed");
    store
        .lock_user(other.id, Utc::now() + Duration::minutes(30))
        .await
        .expect("lock should succeed");

    let data = login_user(common::build_test_app(Arc::clone(&store)), "sweeper@example.com").await;
    let token = data["token"].as_str().unwrap();

    let app = common::build_test_app(Arc::clone(&store));
    let response = post_auth(app, "/api/v1/admin/cleanup/run", token).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["expiredSessionsRemoved"], 2);
    assert_eq!(json["data"]["locksCleared"], 1);
    assert_eq!(json["data"]["auditEntriesRemoved"], 0);

    // The live session survived the sweep.
    let sessions = store.list_sessions_for_user(user.id).await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].token_hash, "digest-z");

    // The in-force lock survived too.
    let locked = store.count_locked_users(Utc::now()).await.unwrap();
    assert_eq!(locked, 1);

    // A second run finds nothing left to do.
    let app = common::build_test_app(Arc::clone(&store));
    let response = post_auth(app, "/api/v1/admin/cleanup/run", token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["expiredSessionsRemoved"], 0);
    assert_eq!(json["data"]["locksCleared"], 0);
}

// ---------------------------------------------------------------------------
// Test: the cleanup endpoints require authentication at all
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cleanup_endpoints_require_authentication() {
    let app = common::build_test_app(common::test_store());
    let response = common::get(app, "/api/v1/admin/cleanup/stats").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Authentication required");
}
