use crate::domain::model::Contact;
use crate::domain::ports::{ContactStore, Storage};
use crate::utils::error::{Result, WisherError};
use std::io::ErrorKind;

/// Contacts kept as a pretty-printed JSON array in a single file.
///
/// Only a file that is not an array of objects is corrupt; a record with a
/// wrongly typed field still loads and is judged by the notifier.
#[derive(Debug, Clone)]
pub struct JsonContactStore<S: Storage> {
    storage: S,
    file_name: String,
}

impl<S: Storage> JsonContactStore<S> {
    pub fn new(storage: S, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

impl<S: Storage> ContactStore for JsonContactStore<S> {
    async fn load(&self) -> Result<Vec<Contact>> {
        let data = match self.storage.read_file(&self.file_name).await {
            Ok(data) => data,
            Err(WisherError::IoError(e)) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("'{}' not found, starting with no contacts", self.file_name);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Err(WisherError::StoreCorrupt {
                message: format!("'{}' is empty", self.file_name),
            });
        }

        let contacts: Vec<Contact> =
            serde_json::from_slice(&data).map_err(|e| WisherError::StoreCorrupt {
                message: format!("'{}': {}", self.file_name, e),
            })?;

        tracing::debug!("Read {} contacts from '{}'", contacts.len(), self.file_name);
        Ok(contacts)
    }

    async fn save(&self, contacts: &[Contact]) -> Result<()> {
        let mut data = serde_json::to_vec_pretty(contacts)?;
        data.push(b'\n');

        tracing::debug!("Writing {} contacts ({} bytes) to '{}'", contacts.len(), data.len(), self.file_name);
        self.storage.write_file(&self.file_name, &data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn put(&self, path: &str, data: &str) {
            self.files.lock().await.insert(path.to_string(), data.as_bytes().to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            self.files.lock().await.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                WisherError::IoError(std::io::Error::new(
                    ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let store = JsonContactStore::new(MockStorage::default(), "birthdays.json");
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_or_empty_file_is_an_error() {
        let storage = MockStorage::default();
        let store = JsonContactStore::new(storage.clone(), "birthdays.json");

        let cases = [
            "",
            "  \n",
            "{not json",
            r#"{"name": "Ann"}"#,
            r#"[1, 2]"#,
            r#"[{"name": "Ann"}, "Bob"]"#,
        ];
        for content in cases {
            storage.put("birthdays.json", content).await;
            let err = store.load().await.unwrap_err();
            assert!(
                matches!(err, WisherError::StoreCorrupt { .. }),
                "content {:?} gave {:?}",
                content,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_save_load_keeps_order_and_fields() {
        let storage = MockStorage::default();
        let store = JsonContactStore::new(storage.clone(), "birthdays.json");
        let original = r#"[
  {"name": "Zed", "phone": "+3", "birthdate": "12-31", "last_sent_year": 2024},
  {"name": "Ann", "phone": "+1", "birthdate": "11-02"},
  {"name": "Moe", "phone": "+2", "birthdate": "bogus", "group": "work"}
]"#;
        storage.put("birthdays.json", original).await;

        let contacts = store.load().await.unwrap();
        let names: Vec<_> = contacts.iter().map(|c| c.label()).collect();
        assert_eq!(names, vec!["Zed", "Ann", "Moe"]);

        store.save(&contacts).await.unwrap();
        let saved = storage.get_file("birthdays.json").await.unwrap();
        let saved: serde_json::Value = serde_json::from_slice(&saved).unwrap();
        let original: serde_json::Value = serde_json::from_str(original).unwrap();
        assert_eq!(saved, original);

        assert_eq!(store.load().await.unwrap(), contacts);
    }

    #[tokio::test]
    async fn test_mistyped_record_loads_and_is_written_back_unchanged() {
        let storage = MockStorage::default();
        let store = JsonContactStore::new(storage.clone(), "birthdays.json");
        let original = r#"[
  {"name": 42, "phone": "+1", "birthdate": 1102, "last_sent_year": "2025"},
  {"name": "Ann", "phone": "+1555", "birthdate": "11-02"}
]"#;
        storage.put("birthdays.json", original).await;

        let contacts = store.load().await.unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].name, None);
        assert_eq!(contacts[1].label(), "Ann");

        store.save(&contacts).await.unwrap();
        let saved: serde_json::Value =
            serde_json::from_slice(&storage.get_file("birthdays.json").await.unwrap()).unwrap();
        assert_eq!(saved, serde_json::from_str::<serde_json::Value>(original).unwrap());
    }

    #[tokio::test]
    async fn test_save_uses_two_space_indent() {
        let storage = MockStorage::default();
        let store = JsonContactStore::new(storage.clone(), "birthdays.json");

        store
            .save(&[Contact::new("Ann", "+1555", "11-02").with_last_sent_year(2025)])
            .await
            .unwrap();

        let text = String::from_utf8(storage.get_file("birthdays.json").await.unwrap()).unwrap();
        assert!(text.starts_with("[\n  {\n    \"name\": \"Ann\""));
        assert!(text.contains("\"last_sent_year\": 2025"));
    }
}
