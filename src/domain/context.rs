//! Operation Context
//!
//! Metadata the host attaches to a single unit of work.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context for an operation, supplied by the execution host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationContext {
    /// Host-assigned unique transaction id; used as the reference number
    /// when the caller does not supply one
    pub tx_id: String,

    /// Identity of the submitting client, as asserted by the host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoker: Option<String>,

    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl OperationContext {
    /// Create a context for the given host transaction id
    pub fn new(tx_id: impl Into<String>) -> Self {
        Self {
            tx_id: tx_id.into(),
            invoker: None,
            correlation_id: None,
        }
    }

    /// Create a context with a freshly generated transaction id
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn with_invoker(mut self, invoker: impl Into<String>) -> Self {
        self.invoker = Some(invoker.into());
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Generate a new correlation ID if not present
    pub fn ensure_correlation_id(&mut self) -> Uuid {
        *self.correlation_id.get_or_insert_with(Uuid::new_v4)
    }

    /// Pick the caller's reference number, falling back to the host tx id
    pub fn reference_or_tx_id(&self, reference_number: Option<&str>) -> String {
        reference_number
            .map(str::to_string)
            .unwrap_or_else(|| self.tx_id.clone())
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::generate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let correlation_id = Uuid::new_v4();

        let context = OperationContext::new("tx-1")
            .with_invoker("teller-7")
            .with_correlation_id(correlation_id);

        assert_eq!(context.tx_id, "tx-1");
        assert_eq!(context.invoker.as_deref(), Some("teller-7"));
        assert_eq!(context.correlation_id, Some(correlation_id));
    }

    #[test]
    fn test_ensure_correlation_id() {
        let mut context = OperationContext::new("tx-1");
        assert!(context.correlation_id.is_none());

        let id = context.ensure_correlation_id();
        assert_eq!(context.correlation_id, Some(id));

        // Calling again should return the same ID
        assert_eq!(context.ensure_correlation_id(), id);
    }

    #[test]
    fn test_reference_fallback() {
        let context = OperationContext::new("tx-9");

        assert_eq!(context.reference_or_tx_id(Some("ref-1")), "ref-1");
        assert_eq!(context.reference_or_tx_id(None), "tx-9");
    }

    #[test]
    fn test_generated_tx_ids_are_unique() {
        let a = OperationContext::generate();
        let b = OperationContext::generate();
        assert_ne!(a.tx_id, b.tx_id);
    }
}
