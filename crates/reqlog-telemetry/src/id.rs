//! Request identifiers.
//!
//! # Design
//! - Identifiers are opaque correlation tokens; nothing parses or orders them.
//! - Generation sits behind [`IdGenerator`] so hosts can swap the scheme.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Opaque identifier tying the request, response, and error records of one request together.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(Arc<str>);

impl RequestId {
    /// Wrap an existing identifier value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(Arc::from(value.into()))
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RequestId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Source of fresh request identifiers.
pub trait IdGenerator: Send + Sync {
    /// Produce a new identifier. Every call must return a distinct value.
    fn next_id(&self) -> RequestId;
}

/// Random (v4) UUID identifiers; collision-resistant without coordination between processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> RequestId {
        RequestId::new(Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn uuid_generator_produces_unique_non_empty_ids() {
        let generator = UuidIdGenerator;
        let ids: HashSet<RequestId> = (0..1_000).map(|_| generator.next_id()).collect();
        assert_eq!(ids.len(), 1_000);
        assert!(ids.iter().all(|id| !id.as_str().is_empty()));
    }

    #[test]
    fn request_id_serializes_as_plain_string() -> anyhow::Result<()> {
        let id = RequestId::new("req-1");
        assert_eq!(serde_json::to_value(&id)?, serde_json::json!("req-1"));
        assert_eq!(id.to_string(), "req-1");
        Ok(())
    }
}
