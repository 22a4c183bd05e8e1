//! Processed audio storage
//!
//! Results can be kept for later retrieval through an injected
//! [`AudioStore`]. Entries expire after a fixed time-to-live and are removed
//! by an explicit sweep; nothing here runs in the background.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use uuid::Uuid;

use crate::engine::{AudioFormat, AudioMetadata};
use crate::error::{Result, VoiceFxError};
use crate::settings::ProcessorSettings;

/// Encoded audio held by a store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredAudio {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
    pub metadata: AudioMetadata,
    pub created_at: DateTime<Utc>,
}

/// Keyed storage for encoded results
pub trait AudioStore: Send + Sync {
    /// Store audio and return its new identifier
    fn put(&self, audio: StoredAudio) -> Result<String>;

    /// Fetch a live entry
    ///
    /// # Errors
    /// * `NotFound` - If the id is unknown or has expired
    fn get(&self, id: &str) -> Result<StoredAudio>;

    /// Remove an entry
    ///
    /// # Errors
    /// * `NotFound` - If the id is unknown
    fn delete(&self, id: &str) -> Result<()>;

    /// Drop every expired entry and return how many were removed
    fn sweep_expired(&self) -> usize;

    /// Number of entries currently held, expired or not
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Entry {
    audio: StoredAudio,
    stored_at: Instant,
}

/// In-process store with a fixed time-to-live
pub struct MemoryAudioStore {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryAudioStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store whose entries live for `store_ttl_seconds`
    pub fn from_settings(settings: &ProcessorSettings) -> Self {
        Self::new(Duration::from_secs(settings.store_ttl_seconds))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        entry.stored_at.elapsed() >= self.ttl
    }

    // A panic while holding the lock cannot leave the map half-updated, so
    // poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for MemoryAudioStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAudioStore")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

impl AudioStore for MemoryAudioStore {
    fn put(&self, audio: StoredAudio) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.write().insert(
            id.clone(),
            Entry {
                audio,
                stored_at: Instant::now(),
            },
        );
        debug!("Stored audio {}", id);
        Ok(id)
    }

    fn get(&self, id: &str) -> Result<StoredAudio> {
        let entries = self.read();
        match entries.get(id) {
            Some(entry) if !self.is_expired(entry) => Ok(entry.audio.clone()),
            _ => Err(VoiceFxError::NotFound { id: id.to_string() }),
        }
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| VoiceFxError::NotFound { id: id.to_string() })
    }

    fn sweep_expired(&self) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Swept {} expired audio entries", removed);
        }
        removed
    }

    fn len(&self) -> usize {
        self.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Waveform;

    fn sample_audio() -> StoredAudio {
        let wave = Waveform::sine(440.0, 0.1, 8000).unwrap();
        let bytes = vec![1, 2, 3];
        StoredAudio {
            metadata: AudioMetadata::describe(&wave, AudioFormat::Wav, &bytes),
            bytes,
            format: AudioFormat::Wav,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_put_get_delete() {
        let store = MemoryAudioStore::new(Duration::from_secs(60));
        let id = store.put(sample_audio()).unwrap();

        assert_eq!(store.get(&id).unwrap().bytes, vec![1, 2, 3]);
        assert_eq!(store.len(), 1);

        store.delete(&id).unwrap();
        assert!(store.is_empty());
        assert!(matches!(store.get(&id), Err(VoiceFxError::NotFound { .. })));
        assert!(store.delete(&id).is_err());
    }

    #[test]
    fn test_ids_are_unique() {
        let store = MemoryAudioStore::new(Duration::from_secs(60));
        let a = store.put(sample_audio()).unwrap();
        let b = store.put(sample_audio()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_entries_hidden_then_swept() {
        let store = MemoryAudioStore::new(Duration::ZERO);
        let id = store.put(sample_audio()).unwrap();

        assert!(store.get(&id).is_err());
        assert_eq!(store.len(), 1);
        assert_eq!(store.sweep_expired(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_ttl_from_settings() {
        let store = MemoryAudioStore::from_settings(&ProcessorSettings::default());
        assert_eq!(store.ttl(), Duration::from_secs(300));

        let settings = ProcessorSettings {
            store_ttl_seconds: 0,
            ..ProcessorSettings::default()
        };
        let store = MemoryAudioStore::from_settings(&settings);
        let id = store.put(sample_audio()).unwrap();
        assert!(store.get(&id).is_err());
        assert_eq!(store.sweep_expired(), 1);
    }

    #[test]
    fn test_sweep_keeps_live_entries() {
        let store = MemoryAudioStore::new(Duration::from_secs(3600));
        store.put(sample_audio()).unwrap();
        assert_eq!(store.sweep_expired(), 0);
        assert_eq!(store.len(), 1);
    }
}
