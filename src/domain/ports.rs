use crate::domain::model::Contact;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Byte-level durable storage, paths are relative to the backend's root.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Loads and persists the ordered contact sequence.
pub trait ContactStore: Send + Sync {
    fn load(&self) -> impl std::future::Future<Output = Result<Vec<Contact>>> + Send;
    fn save(&self, contacts: &[Contact]) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// External system that delivers a greeting. `Err` means the attempt failed.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, address: &str, message: &str) -> Result<()>;
}

/// Source of "today" in the local calendar.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}
