pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::channel::{CommandChannel, ConfiguredChannel, ConsoleChannel, WebhookChannel};
pub use adapters::clock::{FixedClock, SystemClock};
pub use adapters::storage::LocalStorage;
pub use adapters::store::JsonContactStore;
pub use crate::core::{engine::WisherEngine, notifier::BirthdayNotifier};
pub use domain::model::{Contact, MonthDay, Persistence, RunSummary};
pub use utils::error::{Result, WisherError};
