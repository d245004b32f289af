//! Trading logic: position sizing, the trade manager and its events.

mod config;
mod events;
mod journal;
mod position_sizer;

pub use config::Settings;
pub use events::{EventReceiver, JournalEvent};
pub use journal::{SortKey, StatusFilter, TradeManager};
pub use position_sizer::PositionSizer;
