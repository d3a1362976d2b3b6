use tracing::Span;
use uuid::Uuid;

/// Principal recorded when no identity was supplied.
pub const ANONYMOUS_PRINCIPAL: &str = "anonymous";

/// Per-operation context passed into every coordinator call.
///
/// Carries the request id, the calling principal (recorded as
/// `createdByWallet` on creation), and the span all of the operation's
/// events attach to.
#[derive(Clone, Debug)]
pub struct OpContext {
    pub request_id: Uuid,
    pub principal: String,
    pub span: Span,
}

impl OpContext {
    /// New context with a fresh request id and its own `prov_op` span.
    pub fn new(principal: impl Into<String>) -> Self {
        let request_id = Uuid::now_v7();
        let principal = principal.into();
        let span = tracing::info_span!("prov_op", %request_id, principal = %principal);
        Self {
            request_id,
            principal,
            span,
        }
    }

    /// New context whose events attach to a caller-provided span.
    pub fn with_span(principal: impl Into<String>, span: Span) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            principal: principal.into(),
            span,
        }
    }

    pub fn anonymous() -> Self {
        Self::new(ANONYMOUS_PRINCIPAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contexts_get_distinct_request_ids() {
        let a = OpContext::new("alice");
        let b = OpContext::anonymous();
        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.principal, "alice");
        assert_eq!(b.principal, ANONYMOUS_PRINCIPAL);
    }
}
