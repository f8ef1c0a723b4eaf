// Queue-facing surface of the control plane: envelopes, payload contracts,
// and the transport seam.

pub mod contracts;
pub mod message;
pub mod transport;

pub use contracts::{
    ConvertRequest, CrawlRequest, ExportRequest, LoadRequest, StorageHandle, WorkerReply,
};
pub use message::{is_abort, ActorMessage, MessageMetadata};
pub use transport::{InMemoryQueueTransport, QueueTransport, TransportStats};
