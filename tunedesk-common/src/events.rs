//! Event types for the TuneDesk event system
//!
//! Provides the shared event definitions and EventBus used by the catalog
//! service and its SSE stream.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Lifecycle state of one upload, as shown next to the file in the upload list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Draft metadata awaiting confirmation
    Editing,
    /// Object is being written to the bucket
    Uploading,
    /// Object stored, track record being written
    Processing,
    /// Track record created
    Complete,
    /// Upload aborted; see the accompanying error
    Error,
}

/// TuneDesk event types
///
/// Events are broadcast via EventBus and can be serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CatalogEvent {
    /// Progress of one upload
    UploadProgress {
        /// Original file name (identifies the upload in the list)
        file_name: String,
        /// Completion percentage (0-100)
        progress: u8,
        /// Current upload state
        status: UploadStatus,
        /// Error description when `status` is `Error`
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A stored track's placeholder duration was replaced by a measured one
    DurationCorrected {
        track_id: Uuid,
        title: String,
        old_seconds: u32,
        new_seconds: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A correction sweep finished
    SweepCompleted {
        /// Tracks that carried the placeholder duration
        scanned: usize,
        corrected: usize,
        unchanged: usize,
        unmeasured: usize,
        failed: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A track record was removed
    TrackDeleted {
        track_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl CatalogEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            CatalogEvent::UploadProgress { .. } => "UploadProgress",
            CatalogEvent::DurationCorrected { .. } => "DurationCorrected",
            CatalogEvent::SweepCompleted { .. } => "SweepCompleted",
            CatalogEvent::TrackDeleted { .. } => "TrackDeleted",
        }
    }
}

/// Broadcast bus for catalog events
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CatalogEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use tunedesk_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: CatalogEvent,
    ) -> Result<usize, broadcast::error::SendError<CatalogEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: CatalogEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
