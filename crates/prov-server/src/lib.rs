//! HTTP server for the provenance ledger.
//!
//! Exposes the reconciliation core as a small JSON API:
//!
//! | Method | Path                       | Operation                      |
//! |--------|----------------------------|--------------------------------|
//! | GET    | `/v1/health`               | liveness                       |
//! | POST   | `/v1/products`             | create product                 |
//! | GET    | `/v1/products`             | list products                  |
//! | GET    | `/v1/products/:id`         | read product + on-chain view   |
//! | PUT    | `/v1/products/:id/stages`  | append custody-chain stage     |
//! | GET    | `/v1/certificates/:hash`   | read by certification hash     |
//!
//! Writes are authenticated through an [`AuthProvider`]; reads are public.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod qr;
pub mod router;
pub mod server;
pub mod state;

pub use auth::{AllowAllAuth, AuthProvider, Credentials, Identity, StaticTokenAuth};
pub use config::{LedgerConfig, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use qr::{NoQrRenderer, QrRenderer};
pub use router::build_router;
pub use server::ProvServer;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use prov_core::{Coordinator, CoordinatorConfig};
    use prov_ledger::{FaultMode, InMemoryLedger, LedgerClient};
    use prov_store::InMemoryProvenanceStore;
    use prov_types::{is_placeholder_ref, ProductId};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn state_with(ledger: Arc<dyn LedgerClient>) -> AppState {
        let coordinator = Coordinator::new(
            ledger,
            Arc::new(InMemoryProvenanceStore::new()),
            CoordinatorConfig::default(),
        );
        AppState::new(Arc::new(coordinator))
    }

    fn app() -> Router {
        build_router(state_with(Arc::new(InMemoryLedger::default())), 1 << 20)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn create_body(id: &str) -> Value {
        json!({
            "productId": id,
            "name": "Coffee",
            "origin": "Kenya",
            "manufacturer": "Acme",
            "certFile": "/uploads/cert.pdf",
            "certificate": BASE64.encode(b"CERT-DATA"),
        })
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (status, body) = send(&app(), get("/v1/health")).await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn create_read_and_stage() {
        let app = app();

        let (status, created) = send(
            &app,
            json_request(Method::POST, "/v1/products", create_body("P1")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["message"], "Product created");
        assert_eq!(created["anchoring"]["status"], "anchored");
        assert_eq!(created["qrCode"], Value::Null);
        assert_eq!(created["product"]["createdByWallet"], "anonymous");
        assert_eq!(created["product"]["certFile"], "/uploads/cert.pdf");
        let tx = created["blockchainTx"].as_str().unwrap().to_string();
        assert_eq!(created["product"]["blockchainRefHash"], tx.as_str());

        let (status, staged) = send(
            &app,
            json_request(Method::PUT, "/v1/products/P1/stages", json!({"stage": "shipped"})),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(staged["stages"], json!(["shipped"]));
        assert_eq!(staged["productId"], "P1");
        assert_ne!(staged["blockchainTx"].as_str().unwrap(), tx);

        let (status, read) = send(&app, get("/v1/products/P1")).await;
        assert_eq!(status, 200);
        assert_eq!(read["stages"], json!(["shipped"]));
        assert_eq!(read["onChain"]["stages"][0]["stage"], "shipped");
        assert!(read["onChain"]["blockNumber"].is_string());

        let hash = created["product"]["certificationHash"].as_str().unwrap();
        let (status, by_cert) = send(&app, get(&format!("/v1/certificates/{hash}"))).await;
        assert_eq!(status, 200);
        assert_eq!(by_cert["productId"], "P1");

        let (status, list) = send(&app, get("/v1/products")).await;
        assert_eq!(status, 200);
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_with_ledger_down_is_still_created() {
        let ledger = Arc::new(InMemoryLedger::default().with_fault(FaultMode::Failing));
        let app = build_router(state_with(ledger), 1 << 20);

        let (status, created) = send(
            &app,
            json_request(Method::POST, "/v1/products", create_body("P1")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["anchoring"]["status"], "unanchored");
        assert!(created["anchoring"]["reason"].is_string());
        assert!(is_placeholder_ref(created["blockchainTx"].as_str().unwrap()));

        let (status, read) = send(&app, get("/v1/products/P1")).await;
        assert_eq!(status, 200);
        assert_eq!(read["onChain"], Value::Null);

        let (status, staged) = send(
            &app,
            json_request(Method::PUT, "/v1/products/P1/stages", json!({"stage": "shipped"})),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(staged["blockchainTx"], Value::Null);
        assert_eq!(staged["blockchainRefHash"], created["blockchainTx"]);
    }

    #[tokio::test]
    async fn error_statuses() {
        let app = app();

        let (status, body) = send(&app, get("/v1/products/nope")).await;
        assert_eq!(status, 404);
        assert!(body["error"].as_str().unwrap().contains("nope"));

        let mut unknown = create_body("P1");
        unknown["stages"] = json!(["forged"]);
        let (status, _) = send(&app, json_request(Method::POST, "/v1/products", unknown)).await;
        assert_eq!(status, 400);

        let mut bad_cert = create_body("P1");
        bad_cert["certificate"] = json!("***");
        let (status, body) = send(&app, json_request(Method::POST, "/v1/products", bad_cert)).await;
        assert_eq!(status, 400);
        assert!(body["error"].as_str().unwrap().contains("base64"));

        let (status, _) = send(
            &app,
            json_request(Method::POST, "/v1/products", json!({"productId": "P1", "name": ""})),
        )
        .await;
        assert_eq!(status, 400);

        let (status, _) = send(&app, json_request(Method::POST, "/v1/products", create_body("P1"))).await;
        assert_eq!(status, 201);
        let (status, _) = send(&app, json_request(Method::POST, "/v1/products", create_body("P1"))).await;
        assert_eq!(status, 409);

        let (status, _) = send(
            &app,
            json_request(Method::PUT, "/v1/products/P1/stages", json!({"stage": ""})),
        )
        .await;
        assert_eq!(status, 400);

        let (status, _) = send(
            &app,
            json_request(Method::PUT, "/v1/products/P9/stages", json!({"stage": "x"})),
        )
        .await;
        assert_eq!(status, 404);

        let (status, _) = send(&app, get("/v1/certificates/deadbeef")).await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn writes_require_a_known_token() {
        let state = state_with(Arc::new(InMemoryLedger::default())).with_auth(Arc::new(
            StaticTokenAuth::new(BTreeMap::from([("t1".to_string(), "0xw1".to_string())])),
        ));
        let app = build_router(state, 1 << 20);

        let (status, _) = send(&app, json_request(Method::POST, "/v1/products", create_body("P1"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut request = json_request(Method::POST, "/v1/products", create_body("P1"));
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, "Bearer t1".parse().unwrap());
        let (status, created) = send(&app, request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["product"]["createdByWallet"], "0xw1");

        // reads stay public
        let (status, _) = send(&app, get("/v1/products/P1")).await;
        assert_eq!(status, 200);
    }

    struct BrokenQr;

    #[async_trait]
    impl QrRenderer for BrokenQr {
        async fn render(&self, _: &ProductId) -> ServerResult<Option<String>> {
            Err(ServerError::Internal("renderer crashed".into()))
        }
    }

    struct FixedQr;

    #[async_trait]
    impl QrRenderer for FixedQr {
        async fn render(&self, id: &ProductId) -> ServerResult<Option<String>> {
            Ok(Some(format!("data:image/png;base64,{id}")))
        }
    }

    #[tokio::test]
    async fn qr_failure_does_not_abort_create() {
        let state = state_with(Arc::new(InMemoryLedger::default())).with_qr(Arc::new(BrokenQr));
        let app = build_router(state, 1 << 20);
        let (status, created) = send(&app, json_request(Method::POST, "/v1/products", create_body("P1"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["qrCode"], Value::Null);

        let state = state_with(Arc::new(InMemoryLedger::default())).with_qr(Arc::new(FixedQr));
        let app = build_router(state, 1 << 20);
        let (_, created) = send(&app, json_request(Method::POST, "/v1/products", create_body("P2"))).await;
        assert_eq!(created["qrCode"], "data:image/png;base64,P2");
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let app = build_router(state_with(Arc::new(InMemoryLedger::default())), 64);
        let mut body = create_body("P1");
        body["certificate"] = json!(BASE64.encode(vec![7u8; 1024]));
        let response = app
            .oneshot(json_request(Method::POST, "/v1/products", body))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }
}
