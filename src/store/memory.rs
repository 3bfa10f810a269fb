//! In-memory reading store.
//!
//! Readings live only for the lifetime of the process. Each device has its
//! own lock, so writers for different devices do not contend; writers for the
//! same device are serialized, and the server timestamp is taken while that
//! lock is held so "newest first" always matches insertion order.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, RwLock},
};

use tracing::debug;

use super::{ReadingStore, ServerClock, StoreError, MAX_LIMIT};
use crate::models::{Reading, ReadingInput};

// ---

type DeviceReadings = Arc<Mutex<VecDeque<Reading>>>;

#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    devices: RwLock<HashMap<String, DeviceReadings>>,
    clock: ServerClock,
    /// Oldest readings are evicted beyond this many per device; 0 keeps all.
    max_per_device: usize,
}

impl MemoryStore {
    // ---
    pub fn new(max_per_device: usize) -> Self {
        // ---
        Self {
            inner: Arc::new(Inner {
                devices: RwLock::new(HashMap::new()),
                clock: ServerClock::new(),
                max_per_device,
            }),
        }
    }

    /// Number of devices that have stored at least one reading.
    #[cfg(test)]
    fn device_count(&self) -> Result<usize, StoreError> {
        let devices = self
            .inner
            .devices
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(devices.len())
    }

    fn device(&self, device_id: &str) -> Result<Option<DeviceReadings>, StoreError> {
        // ---
        let devices = self
            .inner
            .devices
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(devices.get(device_id).cloned())
    }

    fn device_or_insert(&self, device_id: &str) -> Result<DeviceReadings, StoreError> {
        // ---
        if let Some(existing) = self.device(device_id)? {
            return Ok(existing);
        }

        let mut devices = self
            .inner
            .devices
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        let entry = devices.entry(device_id.to_string()).or_insert_with(|| {
            debug!(%device_id, "Creating reading collection for new device");
            Arc::new(Mutex::new(VecDeque::new()))
        });
        Ok(Arc::clone(entry))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ReadingStore for MemoryStore {
    // ---
    async fn store(&self, reading: ReadingInput) -> Result<Reading, StoreError> {
        // ---
        let collection = self.device_or_insert(&reading.device_id)?;
        let mut readings = collection.lock().map_err(|_| StoreError::LockPoisoned)?;

        let stored = reading.into_reading(self.inner.clock.tick()?);
        readings.push_back(stored.clone());

        let cap = self.inner.max_per_device;
        if cap > 0 && readings.len() > cap {
            let evicted = readings.len() - cap;
            readings.drain(..evicted);
            debug!(device_id = %stored.device_id, evicted, "Evicted oldest readings");
        }

        Ok(stored)
    }

    async fn query(&self, device_id: &str, limit: usize) -> Result<Vec<Reading>, StoreError> {
        // ---
        let Some(collection) = self.device(device_id)? else {
            return Ok(Vec::new());
        };
        let readings = collection.lock().map_err(|_| StoreError::LockPoisoned)?;

        Ok(readings
            .iter()
            .rev()
            .take(limit.min(MAX_LIMIT))
            .cloned()
            .collect())
    }
}
