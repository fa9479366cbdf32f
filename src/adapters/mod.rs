// Adapters layer: concrete implementations of the domain ports (storage, contact store, channels, clock).

pub mod channel;
pub mod clock;
pub mod storage;
pub mod store;
