//! Local key-value storage behind an explicit interface.
//!
//! Token records and rate windows are stored as JSON strings under
//! well-known keys. Anything implementing [`KeyValueStore`] can back the
//! pipeline: the in-memory map for tests, or the JSON file under the XDG
//! state directory for the CLI.

mod file;
mod memory;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Error raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend cannot be used at all (missing, disabled, quota).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Backend failed while reading or writing.
    #[error("store i/o: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value could not be decoded.
    #[error("corrupt value under {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded.
    #[error("encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Minimal string-to-string store, synchronous like browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }
}

/// Read and decode a JSON record. Missing key is `Ok(None)`.
pub(crate) fn read_record<T, S>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            }),
    }
}

/// Encode and write a JSON record.
pub(crate) fn write_record<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        n: u32,
    }

    #[test]
    fn record_roundtrip_through_memory_store() {
        let mut store = MemoryStore::new();
        write_record(&mut store, "k", &Sample { n: 7 }).unwrap();
        let got: Option<Sample> = read_record(&store, "k").unwrap();
        assert_eq!(got, Some(Sample { n: 7 }));
    }

    #[test]
    fn missing_record_is_none() {
        let store = MemoryStore::new();
        let got: Option<Sample> = read_record(&store, "absent").unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn garbage_record_is_corrupt() {
        let mut store = MemoryStore::new();
        store.set("k", "{not json").unwrap();
        let err = read_record::<Sample, _>(&store, "k").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref key, .. } if key == "k"));
    }

    #[test]
    fn mut_ref_forwards() {
        fn put<S: KeyValueStore>(mut store: S) {
            store.set("a", "1").unwrap();
        }
        let mut store = MemoryStore::new();
        put(&mut store);
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
    }
}
