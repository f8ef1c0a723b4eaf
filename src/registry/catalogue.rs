//! # Actor Catalogue
//!
//! The fixed catalogue of workflow templates and control-plane meta-actors.
//! Symbolic names are stable: the wire/storage identifier of every actor is
//! derived deterministically from them, and the daemon-vs-task distinction is
//! a naming convention (`PROC_`/`MONITOR_` prefixes or the `_MONITOR` suffix
//! mark daemons, which are restarted on failure rather than left terminal).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::actor_ids;

/// Derive the wire/storage identifier from a symbolic actor name
pub fn actor_id_for(symbolic_name: &str) -> String {
    format!("{}{}", actor_ids::ID_PREFIX, symbolic_name.to_lowercase())
}

/// Whether a symbolic name marks a daemon actor by naming convention
pub fn is_daemon_name(symbolic_name: &str) -> bool {
    actor_ids::DAEMON_PREFIXES
        .iter()
        .any(|prefix| symbolic_name.starts_with(prefix))
        || symbolic_name.ends_with(actor_ids::DAEMON_SUFFIX)
}

/// Stage-specific workflow actor templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowActor {
    Crawl,
    Recrawl,
    ReconvertLoad,
    ConverterMonitor,
    LoaderMonitor,
    CrawlerMonitor,
    MessageQueueMonitor,
    ProcessLivenessMonitor,
    FileStorageMonitor,
    AdjacencyCalculation,
    CrawlJobExtractor,
    ExportData,
    TruncateLinkDatabase,
    Convert,
}

impl WorkflowActor {
    pub const ALL: &'static [WorkflowActor] = &[
        Self::Crawl,
        Self::Recrawl,
        Self::ReconvertLoad,
        Self::ConverterMonitor,
        Self::LoaderMonitor,
        Self::CrawlerMonitor,
        Self::MessageQueueMonitor,
        Self::ProcessLivenessMonitor,
        Self::FileStorageMonitor,
        Self::AdjacencyCalculation,
        Self::CrawlJobExtractor,
        Self::ExportData,
        Self::TruncateLinkDatabase,
        Self::Convert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crawl => "CRAWL",
            Self::Recrawl => "RECRAWL",
            Self::ReconvertLoad => "RECONVERT_LOAD",
            Self::ConverterMonitor => "CONVERTER_MONITOR",
            Self::LoaderMonitor => "LOADER_MONITOR",
            Self::CrawlerMonitor => "CRAWLER_MONITOR",
            Self::MessageQueueMonitor => "MESSAGE_QUEUE_MONITOR",
            Self::ProcessLivenessMonitor => "PROCESS_LIVENESS_MONITOR",
            Self::FileStorageMonitor => "FILE_STORAGE_MONITOR",
            Self::AdjacencyCalculation => "ADJACENCY_CALCULATION",
            Self::CrawlJobExtractor => "CRAWL_JOB_EXTRACTOR",
            Self::ExportData => "EXPORT_DATA",
            Self::TruncateLinkDatabase => "TRUNCATE_LINK_DATABASE",
            Self::Convert => "CONVERT",
        }
    }

    /// Human label shown on the observability surface
    pub fn description(&self) -> &'static str {
        match self {
            Self::Crawl => "Crawl the web from a specification of known domains",
            Self::Recrawl => "Refresh an existing crawl data set",
            Self::ReconvertLoad => "Convert and load processed data into the index",
            Self::ConverterMonitor => "Watch the converter worker pool",
            Self::LoaderMonitor => "Watch the loader worker pool",
            Self::CrawlerMonitor => "Watch the crawler worker pool",
            Self::MessageQueueMonitor => "Watch the message queue for dead letters",
            Self::ProcessLivenessMonitor => "Watch worker process liveness",
            Self::FileStorageMonitor => "Watch file storage for orphaned artifacts",
            Self::AdjacencyCalculation => "Recompute the domain adjacency graph",
            Self::CrawlJobExtractor => "Extract a crawl job specification",
            Self::ExportData => "Export link and domain data as archives",
            Self::TruncateLinkDatabase => "Truncate the link database",
            Self::Convert => "Convert crawl data into processed data",
        }
    }

    /// Deterministic wire/storage identifier
    pub fn id(&self) -> String {
        actor_id_for(self.as_str())
    }

    /// Daemon actors never terminate naturally and are restarted on failure
    pub fn is_daemon(&self) -> bool {
        is_daemon_name(self.as_str())
    }
}

impl fmt::Display for WorkflowActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WorkflowActor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|actor| actor.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Invalid workflow actor: {s}"))
    }
}

/// Control-plane-level meta-actors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlActor {
    MonitorMessageQueue,
    ReindexAll,
    Rebalance,
}

impl ControlActor {
    pub const ALL: &'static [ControlActor] = &[
        Self::MonitorMessageQueue,
        Self::ReindexAll,
        Self::Rebalance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MonitorMessageQueue => "MONITOR_MESSAGE_QUEUE",
            Self::ReindexAll => "REINDEX_ALL",
            Self::Rebalance => "REBALANCE",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::MonitorMessageQueue => "Watch the control plane's own message queue",
            Self::ReindexAll => "Rebuild the reverse index from loaded data",
            Self::Rebalance => "Rebalance data across index partitions",
        }
    }

    pub fn id(&self) -> String {
        actor_id_for(self.as_str())
    }

    pub fn is_daemon(&self) -> bool {
        is_daemon_name(self.as_str())
    }
}

impl fmt::Display for ControlActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ControlActor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|actor| actor.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Invalid control actor: {s}"))
    }
}
