use std::time::Duration;

use async_trait::async_trait;
use prov_types::{ProductId, StageLabel};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::json;

use crate::error::{LedgerError, LedgerResult};
use crate::records::{LedgerRecord, RecordFields};
use crate::traits::LedgerClient;
use crate::value::LedgerValue;

/// Ledger adapter speaking JSON to a ledger gateway.
///
/// Gateway contract:
/// - `POST {base}/records` with [`RecordFields`] → `{"txRef": "..."}`
/// - `POST {base}/records/{id}/stages` with `{"stage": "..."}` → `{"txRef": "..."}`
/// - `GET {base}/records/{id}` → record JSON, or `404` when absent
///
/// `409` and `422` answers are reported as [`LedgerError::Rejected`].
#[derive(Clone, Debug)]
pub struct HttpLedgerClient {
    base_url: Url,
    timeout: Duration,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct TxReceipt {
    #[serde(rename = "txRef")]
    tx_ref: String,
}

impl HttpLedgerClient {
    /// Create a client for the gateway at `base_url`. Every request is
    /// bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> LedgerResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| LedgerError::Transport(format!("invalid gateway url {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(LedgerError::Transport(format!(
                "gateway url {base_url} cannot carry a path"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("prov-ledger/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> LedgerResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LedgerError::Transport("gateway url cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn transport_error(&self, operation: &'static str, err: reqwest::Error) -> LedgerError {
        if err.is_timeout() {
            LedgerError::Timeout {
                operation,
                after_ms: self.timeout.as_millis() as u64,
            }
        } else if err.is_decode() {
            LedgerError::Decode(err.to_string())
        } else {
            LedgerError::Transport(err.to_string())
        }
    }

    async fn expect_tx(
        &self,
        operation: &'static str,
        response: reqwest::Response,
    ) -> LedgerResult<String> {
        let status = response.status();
        if status.is_success() {
            let receipt: TxReceipt = response
                .json()
                .await
                .map_err(|e| self.transport_error(operation, e))?;
            return Ok(receipt.tx_ref);
        }
        Err(status_error(status, response.text().await.unwrap_or_default()))
    }
}

fn status_error(status: StatusCode, body: String) -> LedgerError {
    match status {
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => LedgerError::Rejected(body),
        _ => LedgerError::Unavailable(format!("gateway answered {status}: {body}")),
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn create_record(&self, id: &ProductId, fields: &RecordFields) -> LedgerResult<String> {
        let url = self.endpoint(&["records"])?;
        tracing::debug!(product_id = %id, %url, "gateway create_record");
        let response = self
            .http
            .post(url)
            .json(fields)
            .send()
            .await
            .map_err(|e| self.transport_error("create_record", e))?;
        self.expect_tx("create_record", response).await
    }

    async fn append_stage(&self, id: &ProductId, stage: &StageLabel) -> LedgerResult<String> {
        let url = self.endpoint(&["records", id.as_str(), "stages"])?;
        tracing::debug!(product_id = %id, %url, "gateway append_stage");
        let response = self
            .http
            .post(url)
            .json(&json!({ "stage": stage.as_str() }))
            .send()
            .await
            .map_err(|e| self.transport_error("append_stage", e))?;
        self.expect_tx("append_stage", response).await
    }

    async fn read_record(&self, id: &ProductId) -> LedgerResult<Option<LedgerRecord>> {
        let url = self.endpoint(&["records", id.as_str()])?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error("read_record", e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(status, response.text().await.unwrap_or_default()));
        }
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| self.transport_error("read_record", e))?;
        Ok(Some(LedgerValue::from_gateway_json(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::Value;

    /// 2^128 + 1, too wide for any native integer type.
    const SUPPLY: &str = "340282366920938463463374607431768211457";

    async fn spawn_gateway() -> String {
        async fn create(Json(body): Json<Value>) -> (AxumStatus, Json<Value>) {
            if body["productId"] == "dup" {
                return (AxumStatus::CONFLICT, Json(json!("exists")));
            }
            (AxumStatus::OK, Json(json!({ "txRef": "0xcreate" })))
        }
        async fn stage(Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
            Json(json!({ "txRef": format!("0x{id}-{}", body["stage"].as_str().unwrap_or("")) }))
        }
        async fn read(Path(id): Path<String>) -> Result<Json<Value>, AxumStatus> {
            match id.as_str() {
                "P1" => Ok(Json(json!({
                    "productId": "P1",
                    "blockNumber": 12_345_678u64,
                    "supply": serde_json::from_str::<Value>(SUPPLY).unwrap(),
                    "stages": [{"stage": "shipped", "timestamp": 1_700_000_000}],
                }))),
                "broken" => Err(AxumStatus::BAD_GATEWAY),
                "slow" => {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Err(AxumStatus::NOT_FOUND)
                }
                _ => Err(AxumStatus::NOT_FOUND),
            }
        }
        let app = Router::new()
            .route("/api/records", post(create))
            .route("/api/records/:id/stages", post(stage))
            .route("/api/records/:id", get(read));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/")
    }

    fn pid(s: &str) -> ProductId {
        ProductId::new(s).unwrap()
    }

    fn fields(id: &str) -> RecordFields {
        RecordFields {
            product_id: id.into(),
            name: "Coffee".into(),
            origin: "Kenya".into(),
            manufacturer: "Acme".into(),
            certification_hash: String::new(),
        }
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(HttpLedgerClient::new("not a url", Duration::from_secs(1)).is_err());
        assert!(HttpLedgerClient::new("mailto:x@example.com", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn endpoint_appends_segments() {
        let client =
            HttpLedgerClient::new("http://gateway.local/api/", Duration::from_secs(1)).unwrap();
        let url = client.endpoint(&["records", "P 1", "stages"]).unwrap();
        assert_eq!(url.as_str(), "http://gateway.local/api/records/P%201/stages");
    }

    #[tokio::test]
    async fn create_and_append_return_tx_refs() {
        let base = spawn_gateway().await;
        let client = HttpLedgerClient::new(&base, Duration::from_secs(2)).unwrap();

        let tx = client.create_record(&pid("P1"), &fields("P1")).await.unwrap();
        assert_eq!(tx, "0xcreate");

        let tx = client
            .append_stage(&pid("P1"), &StageLabel::new("shipped").unwrap())
            .await
            .unwrap();
        assert_eq!(tx, "0xP1-shipped");
    }

    #[tokio::test]
    async fn conflict_is_rejected() {
        let base = spawn_gateway().await;
        let client = HttpLedgerClient::new(&base, Duration::from_secs(2)).unwrap();
        let err = client
            .create_record(&pid("dup"), &fields("dup"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Rejected(_)));
    }

    #[tokio::test]
    async fn read_decodes_integers_and_missing_records() {
        let base = spawn_gateway().await;
        let client = HttpLedgerClient::new(&base, Duration::from_secs(2)).unwrap();

        let record = client.read_record(&pid("P1")).await.unwrap().unwrap();
        assert_eq!(
            record.get("blockNumber"),
            Some(&LedgerValue::integer(12_345_678u64))
        );
        assert_eq!(
            record.get("supply"),
            Some(&LedgerValue::Integer(SUPPLY.parse().unwrap()))
        );
        assert_eq!(crate::normalize(&record).unwrap()["supply"], json!(SUPPLY));
        assert!(client.read_record(&pid("P404")).await.unwrap().is_none());

        let err = client.read_record(&pid("broken")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Unavailable(_)));
    }

    #[tokio::test]
    async fn slow_gateway_times_out() {
        let base = spawn_gateway().await;
        let client = HttpLedgerClient::new(&base, Duration::from_millis(50)).unwrap();
        let err = client.read_record(&pid("slow")).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Timeout {
                operation: "read_record",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unreachable_gateway_is_a_transport_error() {
        let client =
            HttpLedgerClient::new("http://127.0.0.1:9/", Duration::from_millis(500)).unwrap();
        let err = client
            .create_record(&pid("P1"), &fields("P1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Transport(_) | LedgerError::Timeout { .. }
        ));
    }
}
