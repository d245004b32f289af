//! Typed journal events.
//!
//! The trade manager publishes one event per successful command so views,
//! persistence and stats can react without polling. Fan-out uses a tokio
//! broadcast channel; publishing with no subscribers is not an error.

use rust_decimal::Decimal;
use tokio::sync::broadcast;

use crate::models::{Trade, TrimEvent};
use crate::trading::Settings;

/// Something that changed in the journal or the account.
#[derive(Debug, Clone)]
pub enum JournalEvent {
    TradeCreated(Trade),

    /// A partial exit; the trade still has shares open
    TradeTrimmed { trade: Trade, trim: TrimEvent },

    /// The last shares were exited
    TradeClosed { trade: Trade, trim: TrimEvent },

    /// Entry, stop or shares were edited
    TradeUpdated(Trade),

    TradeDeleted(Trade),

    AccountChanged {
        current_size: Decimal,
        realized_pnl: Decimal,
    },

    SettingsChanged(Settings),

    /// Journal and account were cleared
    JournalReset,
}

/// Broadcast channel for [`JournalEvent`]s.
pub struct EventBus {
    sender: broadcast::Sender<JournalEvent>,
}

impl EventBus {
    /// `capacity` events are buffered before slow receivers start lagging.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns the number of receivers that got the event.
    pub fn send(&self, event: JournalEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receivers", &self.receiver_count())
            .finish()
    }
}

/// Subscriber side of the [`EventBus`].
pub struct EventReceiver {
    receiver: broadcast::Receiver<JournalEvent>,
}

impl EventReceiver {
    /// Next event if one is already queued.
    ///
    /// `None` when nothing is queued or the bus is dropped; `Some(Err(..))`
    /// if this receiver lagged and missed events.
    pub fn try_recv(&mut self) -> Option<Result<JournalEvent, String>> {
        match self.receiver.try_recv() {
            Ok(event) => Some(Ok(event)),
            Err(broadcast::error::TryRecvError::Empty) => None,
            Err(broadcast::error::TryRecvError::Closed) => None,
            Err(broadcast::error::TryRecvError::Lagged(count)) => {
                Some(Err(format!("Receiver lagged, missed {} events", count)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_without_subscribers() {
        let bus = EventBus::default();
        assert_eq!(bus.send(JournalEvent::JournalReset), 0);
    }

    #[test]
    fn test_fan_out() {
        let bus = EventBus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        assert_eq!(bus.send(JournalEvent::JournalReset), 2);

        assert!(matches!(a.try_recv(), Some(Ok(JournalEvent::JournalReset))));
        assert!(matches!(b.try_recv(), Some(Ok(JournalEvent::JournalReset))));
        assert!(b.try_recv().is_none());
    }

    #[test]
    fn test_lagged_receiver() {
        let bus = EventBus::new(1);
        let mut rx = bus.subscribe();
        bus.send(JournalEvent::JournalReset);
        bus.send(JournalEvent::JournalReset);

        assert!(matches!(rx.try_recv(), Some(Err(_))));
    }
}
