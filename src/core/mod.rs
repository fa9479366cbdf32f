pub mod engine;
pub mod notifier;

pub use crate::domain::model::{Contact, MonthDay, NotifyOutcome, RunSummary};
pub use crate::domain::ports::{Clock, ContactStore, NotificationChannel, Storage};
pub use crate::utils::error::Result;
