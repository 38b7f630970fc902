//! End-to-end tests against the reference scoring server.
//!
//! Each test binds a fresh server on an ephemeral port and talks to it over
//! real HTTP through [`ScoringClient`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::post, Json, Router};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use statelm::{
    client::MAX_RANDGEN_LEN,
    server::{self, AppState, ServerConfig},
    ClientConfig, ScoringClient, StateHandle, StateLmError, Symbol,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Running reference server; stops when dropped.
struct TestServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    _shutdown: oneshot::Sender<()>,
}

impl TestServer {
    async fn start(vocabulary: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = ServerConfig::default()
            .with_addr(addr)
            .with_vocabulary(vocabulary)
            .without_logging();
        let state = Arc::new(AppState::new(config));

        let (tx, rx) = oneshot::channel::<()>();
        let serve_state = state.clone();
        tokio::spawn(async move {
            let _ = server::serve(listener, serve_state, async {
                let _ = rx.await;
            })
            .await;
        });

        Self {
            addr,
            state,
            _shutdown: tx,
        }
    }

    fn client(&self) -> ScoringClient {
        ScoringClient::connect(&client_config(self.addr)).unwrap()
    }
}

fn client_config(addr: SocketAddr) -> ClientConfig {
    ClientConfig::default()
        .with_server(addr.to_string())
        .with_timeout_secs(5.0)
}

/// Serve an arbitrary router on an ephemeral port.
async fn spawn_router(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

#[tokio::test]
async fn test_updates_at_initial_state_enter_distribution() {
    let server = TestServer::start("").await;
    let client = server.client();

    let prior = client.score(StateHandle::INITIAL, "").await.unwrap();
    client
        .update_symbol(StateHandle::INITIAL, Symbol::Char('a'), 1)
        .await
        .unwrap();
    let after = client
        .update_symbol(StateHandle::INITIAL, Symbol::Char('b'), 1)
        .await
        .unwrap();

    assert_eq!(after.len(), 3);
    for symbol in ["", "a", "b"] {
        assert!(after.probability(symbol).unwrap() > 0.0, "{symbol:?}");
    }
    assert!(prior.probability("a").is_none());
    assert!(after.probability("a").unwrap() > after.probability("").unwrap());
    assert!(after.probability("b").unwrap() > after.probability("").unwrap());

    client.close().await;
}

#[tokio::test]
async fn test_walk_changes_root_distribution() {
    let server = TestServer::start("abc").await;
    let client = server.client();

    let before = client.score(StateHandle::INITIAL, "").await.unwrap();
    let report = client.observe("ab").await.unwrap();
    assert_eq!(report.characters, 2);
    assert_eq!(report.calls, 5);
    assert_ne!(report.final_state, StateHandle::INITIAL);

    assert_ne!(report.root, before);
    assert!(report.root.probability("a").unwrap() > before.probability("a").unwrap());

    // The walk created one state per character.
    assert_eq!(server.state.model.read().await.num_states(), 3);
    client.close().await;
}

#[tokio::test]
async fn test_stateless_score_matches_advanced_state() {
    let server = TestServer::start("xy").await;
    let client = server.client();

    let x = client.advance(StateHandle::INITIAL, "x").await.unwrap();
    client.update_symbol(x, Symbol::Char('y'), 3).await.unwrap();

    let stateless = client.score(StateHandle::UNKNOWN, "x").await.unwrap();
    let stateful = client.score(x, "").await.unwrap();
    assert_eq!(stateless, stateful);

    let via_context = client
        .advance_context(StateHandle::UNKNOWN, "x")
        .await
        .unwrap();
    assert_eq!(via_context, x);
    client.close().await;
}

#[tokio::test]
async fn test_unknown_state_is_invalid_state() {
    let server = TestServer::start("a").await;
    let client = server.client();

    let err = client
        .score(StateHandle::from_wire(999), "")
        .await
        .unwrap_err();
    assert!(matches!(err, StateLmError::InvalidState { state: 999, .. }));

    let err = client
        .update(StateHandle::from_wire(999), 'a' as i32, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, StateLmError::InvalidState { .. }));
    assert!(!err.is_transport());
    client.close().await;
}

#[tokio::test]
async fn test_score_is_idempotent_update_is_not() {
    let server = TestServer::start("ab").await;
    let client = server.client();

    let first = client.score(StateHandle::INITIAL, "").await.unwrap();
    let second = client.score(StateHandle::INITIAL, "").await.unwrap();
    assert_eq!(first, second);

    let once = client.update(StateHandle::INITIAL, 'a' as i32, 1).await.unwrap();
    let twice = client.update(StateHandle::INITIAL, 'a' as i32, 1).await.unwrap();
    assert!(twice.probability("a").unwrap() > once.probability("a").unwrap());
    client.close().await;
}

#[tokio::test]
async fn test_k_best_after_training() {
    let server = TestServer::start("abc").await;
    let client = server.client();

    for text in ["ab", "ac", "ab"] {
        client.observe(text).await.unwrap();
    }

    let best = client.k_best(2, "a").await.unwrap();
    assert_eq!(best.len(), 2);
    assert_eq!(best[0].symbol, "b");
    assert!(best[0].probability >= best[1].probability);
    client.close().await;
}

#[tokio::test]
async fn test_observe_many_runs_every_walk() {
    let server = TestServer::start("").await;
    let client = server.client();

    let reports = client.observe_many(&["abc", "de", ""]).await;
    assert_eq!(reports.len(), 3);
    let characters: Vec<usize> = reports
        .into_iter()
        .map(|r| r.unwrap().characters)
        .collect();
    assert_eq!(characters, vec![3, 2, 0]);
    client.close().await;
}

#[tokio::test]
async fn test_random_generate_is_deterministic_per_seed() {
    let mut outputs = Vec::new();
    for _ in 0..2 {
        let server = TestServer::start("ab").await;
        let client = server.client();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        outputs.push(client.random_generate("a", &mut rng).await.unwrap());
        client.close().await;
    }

    assert_eq!(outputs[0], outputs[1]);
    assert!(outputs[0].starts_with('a'));
    assert!(outputs[0].chars().count() <= 1 + MAX_RANDGEN_LEN + "(reached_length_limit)".len());
}

#[tokio::test]
async fn test_random_generate_stops_at_end_of_string() {
    // Only end-of-string is known, so nothing can be appended.
    let server = TestServer::start("").await;
    let client = server.client();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    assert_eq!(client.random_generate("", &mut rng).await.unwrap(), "");
    client.close().await;
}

#[tokio::test]
async fn test_bits_per_character_counts_oov() {
    let server = TestServer::start("").await;
    let client = server.client();

    let summary = client.bits_per_character(["ab", "ab"]).await.unwrap();
    assert_eq!(summary.total_chars, 6);
    // 'a' and 'b' are unseen the first time only.
    assert_eq!(summary.oov_chars, 2);
    assert!(summary.bits_per_char() > 0.0);
    client.close().await;
}

#[tokio::test]
async fn test_closed_client_rejects_calls() {
    let server = TestServer::start("a").await;
    let client = server.client();

    assert!(client.close().await);
    let err = client.score(StateHandle::INITIAL, "").await.unwrap_err();
    assert!(matches!(err, StateLmError::ConnectionClosed));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_unreachable_server_is_transport_failure() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let client = ScoringClient::connect(&client_config(addr)).unwrap();

    let result = client.score(StateHandle::INITIAL, "").await;
    let err = tokio_test::assert_err!(result);
    assert!(err.is_transport(), "{err:?}");
    client.close().await;
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let router = Router::new().route(
        "/v1/scores",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({"symbols": [], "probabilities": []}))
        }),
    );
    let addr = spawn_router(router).await;
    let config = ClientConfig::default()
        .with_server(addr.to_string())
        .with_timeout_secs(0.2);
    let client = ScoringClient::connect(&config).unwrap();

    let err = client.score(StateHandle::INITIAL, "").await.unwrap_err();
    assert!(matches!(err, StateLmError::Timeout(_)), "{err:?}");
    client.close().await;
}

#[tokio::test]
async fn test_mismatched_response_is_protocol_violation() {
    let router = Router::new().route(
        "/v1/scores",
        post(|| async { Json(json!({"symbols": ["a", "b"], "probabilities": [1.0]})) }),
    );
    let addr = spawn_router(router).await;
    let client = ScoringClient::connect(&client_config(addr)).unwrap();

    let err = client.score(StateHandle::INITIAL, "").await.unwrap_err();
    assert!(matches!(err, StateLmError::ProtocolViolation(_)), "{err:?}");
    client.close().await;
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::start("").await;
    let body: serde_json::Value = reqwest::get(format!("http://{}/health", server.addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["protocol"], statelm::PROTOCOL_VERSION);
    assert_eq!(body["states"], 1);
}
