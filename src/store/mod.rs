//! Event store: read-only, windowed access to the clinical source tables

pub mod event_store;
pub mod loader;
pub mod window;

pub use event_store::{AddRecord, EventSource, EventStore, EventStoreBuilder, StoreSummary};
pub use loader::{FromBatch, LoadOptions, load_records};
pub use window::TimeWindow;
