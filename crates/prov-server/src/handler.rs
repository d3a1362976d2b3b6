use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use prov_types::{Anchoring, Product, ProductInput};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Body of `POST /v1/products`. Unknown fields are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateProductRequest {
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(default)]
    pub blockchain_ref_hash: Option<String>,
    #[serde(default)]
    pub cert_file: Option<String>,
    #[serde(default)]
    pub image_file: Option<String>,
    /// Base64-encoded certificate content.
    #[serde(default)]
    pub certificate: Option<String>,
}

impl CreateProductRequest {
    fn into_parts(self) -> ServerResult<(ProductInput, Option<Vec<u8>>)> {
        let certificate = self
            .certificate
            .map(|encoded| {
                BASE64
                    .decode(encoded.trim())
                    .map_err(|e| ServerError::BadRequest(format!("certificate is not base64: {e}")))
            })
            .transpose()?;
        let input = ProductInput {
            product_id: self.product_id,
            name: self.name,
            origin: self.origin,
            manufacturer: self.manufacturer,
            blockchain_ref_hash: self.blockchain_ref_hash,
            cert_file: self.cert_file,
            image_file: self.image_file,
        };
        Ok((input, certificate))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductResponse {
    pub message: &'static str,
    pub product: Product,
    pub qr_code: Option<String>,
    pub blockchain_tx: String,
    pub anchoring: Anchoring,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppendStageRequest {
    pub stage: String,
}

/// A product with the transaction reference of the write that produced it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResponse {
    #[serde(flatten)]
    pub product: Product,
    pub blockchain_tx: Option<String>,
}

/// A product merged with its on-chain view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub on_chain: Option<Value>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ServerResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ServerError::BadRequest(rejection.body_text()))
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

pub async fn create_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateProductRequest>, JsonRejection>,
) -> ServerResult<(StatusCode, Json<CreateProductResponse>)> {
    let ctx = state.authenticated(&headers).await?;
    let (input, certificate) = body(payload)?.into_parts()?;

    let outcome = state
        .coordinator
        .create_product(&ctx, input, certificate.as_deref())
        .await?;

    let qr_code = match state.qr.render(outcome.product.product_id()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::warn!(product_id = %outcome.product.product_id(), error = %e, "QR rendering failed");
            None
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateProductResponse {
            message: "Product created",
            product: outcome.product,
            qr_code,
            blockchain_tx: outcome.transaction_ref,
            anchoring: outcome.anchoring,
        }),
    ))
}

pub async fn list_products(State(state): State<AppState>) -> ServerResult<Json<Vec<Product>>> {
    let products = state.coordinator.list_products(&state.public())?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<ProductView>> {
    let outcome = state.coordinator.read_product(&state.public(), &id).await?;
    Ok(Json(ProductView {
        product: outcome.product,
        on_chain: outcome.on_chain,
    }))
}

pub async fn get_by_certificate(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> ServerResult<Json<ProductView>> {
    let outcome = state
        .coordinator
        .read_by_certification_hash(&state.public(), &hash)
        .await?;
    Ok(Json(ProductView {
        product: outcome.product,
        on_chain: outcome.on_chain,
    }))
}

pub async fn append_stage(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<AppendStageRequest>, JsonRejection>,
) -> ServerResult<Json<StageResponse>> {
    let ctx = state.authenticated(&headers).await?;
    let request = body(payload)?;
    let outcome = state
        .coordinator
        .append_stage(&ctx, &id, &request.stage)
        .await?;
    let blockchain_tx = outcome.transaction_ref().map(str::to_string);
    Ok(Json(StageResponse {
        product: outcome.product,
        blockchain_tx,
    }))
}
