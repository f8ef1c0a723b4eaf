//! # Worker Payload Contracts
//!
//! Immutable request/reply bodies exchanged between the control plane and
//! worker processes. Each contract is scoped to exactly one actor type and is
//! opaque to the engine itself. Every request carries a `request_id` so that
//! workers can treat redelivered identical requests as no-ops.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Opaque reference to stored pipeline data (crawl specs, crawl output,
/// processed output, export archives). The control plane never dereferences
/// these; workers resolve them against file storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageHandle(pub i64);

/// Request to start a crawl: a job specification and a destination for the
/// crawled data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRequest {
    pub spec_handle: StorageHandle,
    pub dest_handle: StorageHandle,
    /// Idempotency key for at-least-once delivery
    pub request_id: Uuid,
}

impl CrawlRequest {
    pub fn new(spec_handle: StorageHandle, dest_handle: StorageHandle) -> Self {
        Self {
            spec_handle,
            dest_handle,
            request_id: Uuid::new_v4(),
        }
    }
}

/// Request to convert crawl output into loadable processed data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub source_handle: StorageHandle,
    pub dest_handle: StorageHandle,
    pub request_id: Uuid,
}

impl ConvertRequest {
    pub fn new(source_handle: StorageHandle, dest_handle: StorageHandle) -> Self {
        Self {
            source_handle,
            dest_handle,
            request_id: Uuid::new_v4(),
        }
    }
}

/// Request to load processed data into the index; input order is significant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadRequest {
    pub input_handles: Vec<StorageHandle>,
    pub request_id: Uuid,
}

impl LoadRequest {
    pub fn new(input_handles: Vec<StorageHandle>) -> Self {
        Self {
            input_handles,
            request_id: Uuid::new_v4(),
        }
    }
}

/// Request to export a data artifact from storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    pub source_handle: StorageHandle,
    pub request_id: Uuid,
}

impl ExportRequest {
    pub fn new(source_handle: StorageHandle) -> Self {
        Self {
            source_handle,
            request_id: Uuid::new_v4(),
        }
    }
}

/// Correlated reply a worker sends back when a dispatched stage finishes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerReply {
    /// Identity of the request this reply answers
    pub request_id: Uuid,
    pub ok: bool,
    pub error: Option<String>,
}

impl WorkerReply {
    pub fn success(request_id: Uuid) -> Self {
        Self {
            request_id,
            ok: true,
            error: None,
        }
    }

    pub fn failure(request_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            request_id,
            ok: false,
            error: Some(error.into()),
        }
    }

    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_request_carries_identity() {
        let a = CrawlRequest::new(StorageHandle(7), StorageHandle(9));
        let b = CrawlRequest::new(StorageHandle(7), StorageHandle(9));
        assert_eq!(a.spec_handle, StorageHandle(7));
        assert_eq!(a.dest_handle, StorageHandle(9));
        // Distinct requests get distinct idempotency keys
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_load_request_preserves_input_order() {
        let request = LoadRequest::new(vec![
            StorageHandle(3),
            StorageHandle(1),
            StorageHandle(2),
        ]);
        let json = serde_json::to_value(&request).unwrap();
        let parsed: LoadRequest = serde_json::from_value(json).unwrap();
        assert_eq!(
            parsed.input_handles,
            vec![StorageHandle(3), StorageHandle(1), StorageHandle(2)]
        );
    }

    #[test]
    fn test_storage_handle_is_transparent() {
        let json = serde_json::to_string(&StorageHandle(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_worker_reply_constructors() {
        let id = Uuid::new_v4();
        let ok = WorkerReply::success(id);
        assert!(ok.ok);
        assert!(ok.error.is_none());

        let failed = WorkerReply::failure(id, "conversion failed");
        assert!(!failed.ok);
        assert_eq!(failed.error.as_deref(), Some("conversion failed"));
    }
}
