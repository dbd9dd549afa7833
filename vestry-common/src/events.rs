//! Event types for the Vestry event system
//!
//! Provides shared event definitions and the EventBus used to fan state
//! changes out to SSE subscribers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::taxonomy::Category;

/// Vestry event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
/// All events use this central enum for type safety and exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VestryEvent {
    /// A new item entered the catalog
    ///
    /// Triggers:
    /// - SSE: Prepend the new card to the grid
    /// - SSE: Refresh facet lists
    ItemAdded {
        /// Item UUID
        item_guid: Uuid,
        /// Category the item was filed under
        category: Category,
        /// When the item was added
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Item metadata changed (category, seasons, color, tag)
    ///
    /// Triggers:
    /// - SSE: Re-render the card and composer summaries
    ItemUpdated {
        /// Item UUID
        item_guid: Uuid,
        /// When the item was updated
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Item removed from the catalog
    ///
    /// Saved outfits and the active composition are scrubbed before this
    /// event fires.
    ItemDeleted {
        /// Item UUID
        item_guid: Uuid,
        /// When the item was deleted
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Background sweep produced a thumbnail for an item stored without one
    ///
    /// Triggers:
    /// - SSE: Swap the card's placeholder for the real thumbnail
    ItemThumbnailReady {
        /// Item UUID
        item_guid: Uuid,
        /// When the thumbnail was written
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Active composition persisted as a named outfit
    OutfitSaved {
        /// Outfit UUID
        outfit_guid: Uuid,
        /// Outfit display name
        name: String,
        /// When the outfit was saved
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Saved outfit removed
    OutfitDeleted {
        /// Outfit UUID
        outfit_guid: Uuid,
        /// When the outfit was deleted
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Active composition changed (assign, unassign, clear, load)
    ///
    /// Triggers:
    /// - SSE: Re-render the composer panel
    CompositionChanged {
        /// Number of slots currently holding at least one item
        occupied_slots: usize,
        /// When the composition changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Every item and outfit was deleted and the composition reset
    LibraryCleared {
        /// When the library was cleared
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl VestryEvent {
    /// Get event type as string for filtering and SSE event names
    pub fn event_type(&self) -> &str {
        match self {
            VestryEvent::ItemAdded { .. } => "ItemAdded",
            VestryEvent::ItemUpdated { .. } => "ItemUpdated",
            VestryEvent::ItemDeleted { .. } => "ItemDeleted",
            VestryEvent::ItemThumbnailReady { .. } => "ItemThumbnailReady",
            VestryEvent::OutfitSaved { .. } => "OutfitSaved",
            VestryEvent::OutfitDeleted { .. } => "OutfitDeleted",
            VestryEvent::CompositionChanged { .. } => "CompositionChanged",
            VestryEvent::LibraryCleared { .. } => "LibraryCleared",
        }
    }
}

/// Central event distribution bus for application-wide events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use vestry_common::events::{EventBus, VestryEvent};
/// use std::sync::Arc;
/// use uuid::Uuid;
///
/// let event_bus = Arc::new(EventBus::new(100));
///
/// // Subscribe to events
/// let mut rx = event_bus.subscribe();
///
/// // Emit an event
/// event_bus.emit_lossy(VestryEvent::ItemDeleted {
///     item_guid: Uuid::new_v4(),
///     timestamp: chrono::Utc::now(),
/// });
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<VestryEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Returns a receiver that will receive all events emitted after
    /// subscription. Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<VestryEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: VestryEvent,
    ) -> Result<usize, broadcast::error::SendError<VestryEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// The catalog works the same whether or not a browser tab is
    /// listening, so every emit site in the handlers uses this form.
    pub fn emit_lossy(&self, event: VestryEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    ///
    /// Useful for debugging and monitoring
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
