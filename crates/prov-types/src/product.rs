use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Upper bound for any single text field accepted from callers.
pub const MAX_FIELD_BYTES: usize = 1024;

/// Globally unique, caller-assigned product identifier.
///
/// Immutable once a product has been created.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Parse a product id, rejecting empty or blank input.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TypeError::EmptyField("productId"));
        }
        if id.len() > MAX_FIELD_BYTES {
            return Err(TypeError::TooLong {
                field: "productId",
                max: MAX_FIELD_BYTES,
            });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProductId({})", self.0)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A single custody-chain stage label. Never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageLabel(String);

impl StageLabel {
    pub fn new(label: impl Into<String>) -> Result<Self, TypeError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(TypeError::EmptyField("stage"));
        }
        if label.len() > MAX_FIELD_BYTES {
            return Err(TypeError::TooLong {
                field: "stage",
                max: MAX_FIELD_BYTES,
            });
        }
        Ok(Self(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields accepted when creating a product.
///
/// This is the complete list: unknown fields are rejected on
/// deserialization instead of being merged into the stored record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductInput {
    pub product_id: String,
    pub name: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub manufacturer: String,
    /// Caller-supplied ledger reference, used when no certificate content
    /// is supplied and as the first fallback when anchoring fails.
    #[serde(default)]
    pub blockchain_ref_hash: Option<String>,
    #[serde(default)]
    pub cert_file: Option<String>,
    #[serde(default)]
    pub image_file: Option<String>,
}

impl ProductInput {
    /// Check required fields and length limits, returning the parsed id.
    pub fn validate(&self) -> Result<ProductId, TypeError> {
        let id = ProductId::new(self.product_id.clone())?;
        if self.name.trim().is_empty() {
            return Err(TypeError::EmptyField("name"));
        }
        for (field, value) in [
            ("name", self.name.as_str()),
            ("origin", self.origin.as_str()),
            ("manufacturer", self.manufacturer.as_str()),
        ] {
            if value.len() > MAX_FIELD_BYTES {
                return Err(TypeError::TooLong {
                    field,
                    max: MAX_FIELD_BYTES,
                });
            }
        }
        Ok(id)
    }

    /// The caller-supplied ledger reference, if present and non-blank.
    pub fn supplied_ref(&self) -> Option<&str> {
        self.blockchain_ref_hash
            .as_deref()
            .filter(|r| !r.trim().is_empty())
    }
}

/// The locally owned, authoritative product record.
///
/// Fields are read through accessors. The only mutations are
/// [`push_stage`](Self::push_stage) and
/// [`set_blockchain_ref`](Self::set_blockchain_ref): `stages` only grows,
/// `certification_hash` is fixed at creation, and `blockchain_ref_hash` is
/// never cleared once populated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    product_id: ProductId,
    name: String,
    origin: String,
    manufacturer: String,
    /// Hex digest of the certificate content, or empty.
    certification_hash: String,
    /// Latest anchoring transaction, or a placeholder.
    blockchain_ref_hash: String,
    stages: Vec<String>,
    created_by_wallet: String,
    cert_file: Option<String>,
    image_file: Option<String>,
}

impl Product {
    /// Assemble a new product with an empty custody chain.
    pub fn new(
        id: ProductId,
        input: ProductInput,
        certification_hash: String,
        blockchain_ref_hash: String,
        created_by_wallet: impl Into<String>,
    ) -> Self {
        Self {
            product_id: id,
            name: input.name,
            origin: input.origin,
            manufacturer: input.manufacturer,
            certification_hash,
            blockchain_ref_hash,
            stages: Vec::new(),
            created_by_wallet: created_by_wallet.into(),
            cert_file: input.cert_file,
            image_file: input.image_file,
        }
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn certification_hash(&self) -> &str {
        &self.certification_hash
    }

    pub fn blockchain_ref_hash(&self) -> &str {
        &self.blockchain_ref_hash
    }

    /// Custody chain, oldest first.
    pub fn stages(&self) -> &[String] {
        &self.stages
    }

    pub fn created_by_wallet(&self) -> &str {
        &self.created_by_wallet
    }

    pub fn cert_file(&self) -> Option<&str> {
        self.cert_file.as_deref()
    }

    pub fn image_file(&self) -> Option<&str> {
        self.image_file.as_deref()
    }

    /// Most recent custody-chain stage, if any.
    pub fn current_stage(&self) -> Option<&str> {
        self.stages.last().map(String::as_str)
    }

    /// Extend the custody chain.
    pub fn push_stage(&mut self, stage: &StageLabel) {
        self.stages.push(stage.as_str().to_string());
    }

    /// Replace the ledger reference, returning the previous one.
    ///
    /// An empty reference is rejected and leaves the product unchanged.
    pub fn set_blockchain_ref(&mut self, reference: &str) -> Result<String, TypeError> {
        if reference.is_empty() {
            return Err(TypeError::EmptyField("blockchainRefHash"));
        }
        Ok(std::mem::replace(
            &mut self.blockchain_ref_hash,
            reference.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: &str, name: &str) -> ProductInput {
        ProductInput {
            product_id: id.into(),
            name: name.into(),
            origin: "Kenya".into(),
            manufacturer: "Acme Roasters".into(),
            ..Default::default()
        }
    }

    #[test]
    fn product_id_rejects_blank() {
        assert_eq!(ProductId::new(""), Err(TypeError::EmptyField("productId")));
        assert_eq!(ProductId::new("   "), Err(TypeError::EmptyField("productId")));
        assert_eq!(ProductId::new("P1").unwrap().as_str(), "P1");
    }

    #[test]
    fn stage_label_rejects_blank() {
        assert_eq!(StageLabel::new(""), Err(TypeError::EmptyField("stage")));
        assert_eq!(StageLabel::new("shipped").unwrap().as_str(), "shipped");
    }

    #[test]
    fn overlong_fields_are_rejected() {
        let long = "x".repeat(MAX_FIELD_BYTES + 1);
        assert!(matches!(
            StageLabel::new(long.clone()),
            Err(TypeError::TooLong { field: "stage", .. })
        ));
        let mut bad = input("P1", "Coffee");
        bad.origin = long;
        assert!(matches!(
            bad.validate(),
            Err(TypeError::TooLong { field: "origin", .. })
        ));
    }

    #[test]
    fn validate_requires_name() {
        assert_eq!(
            input("P1", "").validate(),
            Err(TypeError::EmptyField("name"))
        );
        assert_eq!(input("P1", "Coffee").validate().unwrap().as_str(), "P1");
    }

    #[test]
    fn supplied_ref_ignores_blank() {
        let mut i = input("P1", "Coffee");
        assert_eq!(i.supplied_ref(), None);
        i.blockchain_ref_hash = Some("  ".into());
        assert_eq!(i.supplied_ref(), None);
        i.blockchain_ref_hash = Some("0xabc".into());
        assert_eq!(i.supplied_ref(), Some("0xabc"));
    }

    #[test]
    fn input_rejects_unknown_fields() {
        let json = r#"{"productId":"P1","name":"Coffee","stages":["forged"]}"#;
        assert!(serde_json::from_str::<ProductInput>(json).is_err());

        let json = r#"{"productId":"P1","name":"Coffee","certFile":"/uploads/c.pdf"}"#;
        let parsed: ProductInput = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.cert_file.as_deref(), Some("/uploads/c.pdf"));
        assert_eq!(parsed.origin, "");
    }

    #[test]
    fn new_product_starts_with_empty_chain() {
        let i = input("P1", "Coffee");
        let id = i.validate().unwrap();
        let p = Product::new(id, i, "abcd".into(), "0x01".into(), "alice@example.com");
        assert!(p.stages().is_empty());
        assert_eq!(p.current_stage(), None);
        assert_eq!(p.created_by_wallet(), "alice@example.com");
    }

    #[test]
    fn chain_only_grows_and_reference_is_never_cleared() {
        let i = input("P1", "Coffee");
        let id = i.validate().unwrap();
        let mut p = Product::new(id, i, "abcd".into(), "pending-1".into(), "w");

        p.push_stage(&StageLabel::new("harvested").unwrap());
        p.push_stage(&StageLabel::new("shipped").unwrap());
        assert_eq!(p.stages(), ["harvested", "shipped"]);
        assert_eq!(p.current_stage(), Some("shipped"));

        assert_eq!(
            p.set_blockchain_ref(""),
            Err(TypeError::EmptyField("blockchainRefHash"))
        );
        assert_eq!(p.blockchain_ref_hash(), "pending-1");
        assert_eq!(p.set_blockchain_ref("0xabc").unwrap(), "pending-1");
        assert_eq!(p.blockchain_ref_hash(), "0xabc");
        assert_eq!(p.certification_hash(), "abcd");
    }

    #[test]
    fn product_round_trips_through_json_with_private_fields() {
        let i = input("P1", "Coffee");
        let id = i.validate().unwrap();
        let mut p = Product::new(id, i, "abcd".into(), "0x01".into(), "w");
        p.push_stage(&StageLabel::new("roasted").unwrap());
        let back: Product = serde_json::from_value(serde_json::to_value(&p).unwrap()).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn product_serializes_camel_case() {
        let i = input("P1", "Coffee");
        let id = i.validate().unwrap();
        let p = Product::new(id, i, String::new(), "0x01".into(), "w");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["productId"], "P1");
        assert_eq!(json["blockchainRefHash"], "0x01");
        assert_eq!(json["certificationHash"], "");
        assert!(json["stages"].as_array().unwrap().is_empty());
        assert!(json["certFile"].is_null());
    }
}
