//! Request Context
//!
//! A correlation id travels with every call as an explicit value, never as
//! thread-local state. ULIDs need no coordination and sort by creation time,
//! which keeps log greps over a single request cheap.

use ulid::Ulid;

/// Per-request context passed through the whole call chain.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: Ulid,
}

impl RequestContext {
    /// Create a context with a fresh correlation id.
    pub fn new() -> Self {
        Self {
            correlation_id: Ulid::new(),
        }
    }

    /// Resume a context from an upstream correlation id.
    pub fn with_correlation_id(correlation_id: Ulid) -> Self {
        Self { correlation_id }
    }

    pub fn correlation_id(&self) -> Ulid {
        self.correlation_id
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts_are_unique() {
        let a = RequestContext::new();
        let b = RequestContext::new();
        assert_ne!(a.correlation_id(), b.correlation_id());
    }

    #[test]
    fn test_resumed_context_keeps_id() {
        let upstream = Ulid::new();
        let ctx = RequestContext::with_correlation_id(upstream);
        assert_eq!(ctx.correlation_id(), upstream);
    }
}
