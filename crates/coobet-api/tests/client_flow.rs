//! Integration tests for credential attachment, refresh-and-replay and failure handling.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use coobet_api::classify::{GENERIC_ERROR_MESSAGE, SERVER_ERROR_MESSAGE};
use coobet_api::session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use coobet_api::{ApiError, Method, RefreshPhase, ToastLevel};
use serde_json::{Value, json};

use common::*;

const PROTECTED: &str = "/mobcash/settings";
const REFRESH: &str = "/auth/refresh";
const LOGIN: &str = "/auth/login";

mod login_tests {
    use super::*;

    #[tokio::test]
    async fn test_login_stores_both_mirrors_and_attaches_bearer() {
        let harness = Harness::new(MockTransport::new(|req| match req.path.as_str() {
            LOGIN => ok(login_body("a1", "r1")),
            _ => ok(json!({"ok": true})),
        }));

        let user = harness.client.login("user@x.com", "secret").await.unwrap();
        assert_eq!(user.email, "user@x.com");

        let session = harness.client.session();
        for mirror in [session.local(), session.server()] {
            assert_eq!(mirror.get(ACCESS_TOKEN_KEY).as_deref(), Some("a1"));
            assert_eq!(mirror.get(REFRESH_TOKEN_KEY).as_deref(), Some("r1"));
        }

        let _: Value = harness.client.get(PROTECTED).await.unwrap();

        let login = &harness.transport.requests_to(LOGIN)[0];
        assert_eq!(login.bearer(), None);
        assert_eq!(
            login.body,
            Some(json!({"email_or_phone": "user@x.com", "password": "secret"}))
        );
        assert_eq!(
            harness.transport.requests_to(PROTECTED)[0].header("authorization"),
            Some("Bearer a1")
        );

        let toasts = harness.notifier.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].level, ToastLevel::Success);
        assert_eq!(harness.navigator.routes(), vec!["/dashboard".to_string()]);
    }

    #[tokio::test]
    async fn test_login_rejection_does_not_trigger_refresh() {
        let harness = Harness::logged_in(MockTransport::new(|req| match req.path.as_str() {
            LOGIN => status(401, json!({"detail": "Identifiants invalides"})),
            _ => ok(json!({"access": "never"})),
        }));

        let err = harness.client.login("user@x.com", "wrong").await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized { ref message } if message == "Identifiants invalides"));
        assert!(harness.transport.requests_to(REFRESH).is_empty());
        // Existing credentials are not attached to the login call either.
        assert_eq!(harness.transport.requests_to(LOGIN)[0].bearer(), None);
        assert_eq!(harness.notifier.errors(), vec!["Identifiants invalides".to_string()]);
    }

    #[tokio::test]
    async fn test_no_bearer_without_session() {
        let harness = Harness::new(MockTransport::new(|_| ok(json!([]))));
        let _: Value = harness.client.get(PROTECTED).await.unwrap();
        assert_eq!(harness.transport.requests()[0].bearer(), None);
    }
}

mod refresh_tests {
    use super::*;

    fn expiring_a1() -> MockTransport {
        MockTransport::new(|req| match (req.path.as_str(), req.bearer()) {
            (REFRESH, _) => {
                assert_eq!(req.body, Some(json!({"refresh": "r1"})));
                ok(json!({"access": "a2"}))
            }
            (PROTECTED, Some("a2")) => ok(json!({"value": 1})),
            (PROTECTED, _) => status(401, json!({"detail": "Token is invalid or expired"})),
            _ => empty(404),
        })
    }

    #[tokio::test]
    async fn test_single_401_is_refreshed_and_replayed_once() {
        let harness = Harness::logged_in(expiring_a1());

        let body: Value = harness.client.get(PROTECTED).await.unwrap();
        assert_eq!(body, json!({"value": 1}));

        let calls = harness.transport.requests_to(PROTECTED);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].bearer(), Some("a1"));
        assert_eq!(calls[1].bearer(), Some("a2"));
        assert_eq!(harness.client.refresh_count(), 1);
        assert_eq!(harness.client.refresh_phase(), RefreshPhase::Idle);

        // The refresh call itself goes out without a bearer.
        assert_eq!(harness.transport.requests_to(REFRESH)[0].bearer(), None);
        // Silent retry: no toast, no redirect.
        assert!(harness.notifier.toasts().is_empty());
        assert!(harness.navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_updates_both_mirrors() {
        let harness = Harness::logged_in(expiring_a1());
        let _: Value = harness.client.get(PROTECTED).await.unwrap();

        let session = harness.client.session();
        assert_eq!(session.local().get(ACCESS_TOKEN_KEY).as_deref(), Some("a2"));
        assert_eq!(session.server().get(ACCESS_TOKEN_KEY).as_deref(), Some("a2"));
        assert_eq!(session.refresh_token().as_deref(), Some("r1"));

        // Later calls carry the new credential directly.
        let _: Value = harness.client.get(PROTECTED).await.unwrap();
        let calls = harness.transport.requests_to(PROTECTED);
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2].bearer(), Some("a2"));
        assert_eq!(harness.client.refresh_count(), 1);
    }

    #[tokio::test]
    async fn test_replayed_401_is_not_retried_again() {
        let harness = Harness::logged_in(MockTransport::new(|req| match req.path.as_str() {
            REFRESH => ok(json!({"access": "a2"})),
            _ => status(401, json!({"detail": "Session revoked"})),
        }));

        let err = harness.client.get::<Value>(PROTECTED).await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized { .. }));
        assert_eq!(harness.transport.requests_to(PROTECTED).len(), 2);
        assert_eq!(harness.client.refresh_count(), 1);
        // A 401 on the replay is surfaced to the operator.
        assert_eq!(harness.notifier.errors(), vec!["Session revoked".to_string()]);
        // The session itself is kept; only refresh failures end it.
        assert!(harness.client.is_authenticated());
    }

    #[tokio::test]
    async fn test_rejected_refresh_wipes_session_and_redirects() {
        let harness = Harness::logged_in(MockTransport::new(|req| match req.path.as_str() {
            REFRESH => status(401, json!({"detail": "Token is blacklisted"})),
            _ => status(401, json!({"detail": "Token is invalid or expired"})),
        }));
        harness
            .client
            .session()
            .cache()
            .insert(coobet_api::QueryKey::new(["transactions"]), &json!([1]))
            .unwrap();

        let err = harness.client.get::<Value>(PROTECTED).await.unwrap_err();

        assert!(matches!(err, ApiError::RefreshFailed { .. }));
        assert!(err.requires_relogin());
        assert_eq!(harness.transport.requests_to(PROTECTED).len(), 1);

        let session = harness.client.session();
        assert!(session.local().is_empty());
        assert!(session.server().is_empty());
        assert!(session.cache().is_empty());

        assert_eq!(harness.navigator.routes(), vec!["/login".to_string()]);
        assert!(harness.notifier.toasts().is_empty());
        assert_eq!(harness.client.refresh_phase(), RefreshPhase::Failed);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_fails_without_calling_refresh() {
        let harness = Harness::new(MockTransport::new(|req| match req.path.as_str() {
            REFRESH => ok(json!({"access": "never"})),
            _ => empty(401),
        }));

        let err = harness.client.get::<Value>(PROTECTED).await.unwrap_err();

        assert!(matches!(err, ApiError::RefreshFailed { ref reason } if reason.contains("No refresh token")));
        assert!(harness.transport.requests_to(REFRESH).is_empty());
        assert_eq!(harness.client.refresh_count(), 0);
        assert_eq!(harness.navigator.routes(), vec!["/login".to_string()]);
    }

    #[tokio::test]
    async fn test_refresh_network_failure_ends_session() {
        let harness = Harness::logged_in(MockTransport::new(|req| match req.path.as_str() {
            REFRESH => Err(ApiError::Network("connection reset".to_string())),
            _ => empty(401),
        }));

        let err = harness.client.get::<Value>(PROTECTED).await.unwrap_err();

        assert!(matches!(err, ApiError::RefreshFailed { ref reason } if reason.contains("connection reset")));
        assert!(!harness.client.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_after_failed_refresh_resets_phase() {
        let harness = Harness::logged_in(MockTransport::new(|req| match req.path.as_str() {
            REFRESH => empty(401),
            LOGIN => ok(login_body("a3", "r3")),
            _ => empty(401),
        }));

        let _ = harness.client.get::<Value>(PROTECTED).await;
        assert_eq!(harness.client.refresh_phase(), RefreshPhase::Failed);

        harness.client.login("user@x.com", "secret").await.unwrap();
        assert_eq!(harness.client.refresh_phase(), RefreshPhase::Idle);
        assert_eq!(harness.client.session().access_token().as_deref(), Some("a3"));
    }
}

mod concurrency_tests {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let transport = MockTransport::new(|req| match (req.path.as_str(), req.bearer()) {
            (REFRESH, _) => ok(json!({"access": "a2"})),
            (_, Some("a2")) => ok(json!({"path": req.path})),
            _ => empty(401),
        })
        .with_delay(REFRESH, Duration::from_millis(50));
        let harness = Harness::logged_in(transport);

        let (a, b, c) = tokio::join!(
            harness.client.get::<Value>("/mobcash/a"),
            harness.client.get::<Value>("/mobcash/b"),
            harness.client.get::<Value>("/mobcash/c"),
        );

        assert_eq!(a.unwrap(), json!({"path": "/mobcash/a"}));
        assert_eq!(b.unwrap(), json!({"path": "/mobcash/b"}));
        assert_eq!(c.unwrap(), json!({"path": "/mobcash/c"}));
        assert_eq!(harness.transport.requests_to(REFRESH).len(), 1);
        assert_eq!(harness.client.refresh_count(), 1);
        assert!(harness.notifier.toasts().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_refresh_failure_redirects_once() {
        let transport = MockTransport::new(|req| match req.path.as_str() {
            REFRESH => empty(401),
            _ => empty(401),
        })
        .with_delay(REFRESH, Duration::from_millis(50));
        let harness = Harness::logged_in(transport);

        let (a, b) = tokio::join!(
            harness.client.get::<Value>("/mobcash/a"),
            harness.client.get::<Value>("/mobcash/b"),
        );

        assert!(matches!(a, Err(ApiError::RefreshFailed { .. })));
        assert!(matches!(b, Err(ApiError::RefreshFailed { .. })));
        assert_eq!(harness.transport.requests_to(REFRESH).len(), 1);
        assert_eq!(harness.navigator.routes(), vec!["/login".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_refresh_coalesces_across_threads() {
        let protected_calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&protected_calls);
        let transport = MockTransport::new(move |req| match (req.path.as_str(), req.bearer()) {
            (REFRESH, _) => ok(json!({"access": "a2"})),
            (_, Some("a2")) => {
                counter.fetch_add(1, Ordering::SeqCst);
                ok(json!({}))
            }
            _ => empty(401),
        })
        .with_delay(REFRESH, Duration::from_millis(100));
        let harness = Arc::new(Harness::logged_in(transport));

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let harness = Arc::clone(&harness);
                tokio::spawn(async move {
                    harness
                        .client
                        .get::<Value>(&format!("/mobcash/item/{i}"))
                        .await
                })
            })
            .collect();

        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        assert_eq!(protected_calls.load(Ordering::SeqCst), 8);
        assert_eq!(harness.transport.requests_to(REFRESH).len(), 1);
    }
}

mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_permission_denied_wipes_session_without_toast() {
        let harness = Harness::logged_in(MockTransport::new(|_| {
            status(
                403,
                json!({"detail": "You do not have permission to perform this action"}),
            )
        }));

        let err = harness.client.get::<Value>(PROTECTED).await.unwrap_err();

        assert!(matches!(err, ApiError::PermissionDenied { .. }));
        assert!(harness.client.session().local().is_empty());
        assert!(harness.client.session().server().is_empty());
        assert_eq!(harness.navigator.routes(), vec!["/login".to_string()]);
        assert!(harness.notifier.toasts().is_empty());
        assert!(harness.transport.requests_to(REFRESH).is_empty());
    }

    #[tokio::test]
    async fn test_server_error_uses_fixed_message() {
        let harness = Harness::logged_in(MockTransport::new(|_| {
            status(500, json!({"detail": "anything"}))
        }));

        let err = harness.client.get::<Value>(PROTECTED).await.unwrap_err();

        assert!(matches!(err, ApiError::ServerError { status: 500, ref message } if message == SERVER_ERROR_MESSAGE));
        assert!(err.is_transient());
        assert_eq!(harness.notifier.errors(), vec![SERVER_ERROR_MESSAGE.to_string()]);
        // No state change on server errors.
        assert!(harness.client.is_authenticated());
        assert!(harness.navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn test_detail_is_preferred_over_error() {
        let harness = Harness::logged_in(MockTransport::new(|_| {
            status(400, json!({"error": "generic", "detail": "Montant trop élevé"}))
        }));

        let err = harness
            .client
            .send(Method::POST, "/mobcash/create-bonus", Some(json!({"amount": 1})))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Other { status: 400, ref message } if message == "Montant trop élevé"));
        assert_eq!(harness.notifier.errors(), vec!["Montant trop élevé".to_string()]);
    }

    #[tokio::test]
    async fn test_network_failure_notifies_generic_message() {
        let harness = Harness::logged_in(MockTransport::new(|_| {
            Err(ApiError::Network("dns failure".to_string()))
        }));

        let err = harness.client.get::<Value>(PROTECTED).await.unwrap_err();

        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(harness.notifier.errors(), vec![GENERIC_ERROR_MESSAGE.to_string()]);
    }

    #[tokio::test]
    async fn test_each_failure_notifies_once() {
        let harness = Harness::logged_in(MockTransport::new(|_| empty(404)));

        let _ = harness.client.get::<Value>("/mobcash/bonus/99").await;
        let _ = harness.client.get::<Value>("/mobcash/bonus/98").await;

        assert_eq!(harness.notifier.errors().len(), 2);
    }
}
