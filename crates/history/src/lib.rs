//! Bounded temperature history.
//!
//! [`HistoryStore`] is the single owner of the reading time series: the poll
//! loop appends, everything else reads through [`HistoryStore::snapshot`] and
//! [`HistoryStore::current`].

pub mod buffer;
pub mod store;

pub use buffer::RingBuffer;
pub use store::{HistoryStore, Snapshot};
