//! Test doubles for the account store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::store::{Key, Store, Value};

/// In-memory store. The map mutex stands in for the external store's row
/// visibility; it is held only for the duration of a single operation and
/// provides no cross-operation atomicity, exactly like the real thing.
#[derive(Default)]
pub struct Memory {
    rows: Mutex<HashMap<Key, Value>>,
}

impl Store for Memory {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        Ok(self.rows.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: Key, value: Value) -> Result<()> {
        self.rows.lock().unwrap().insert(key, value);
        Ok(())
    }

    async fn insert(&self, key: Key, value: Value) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&key) {
            return Ok(false);
        }
        rows.insert(key, value);
        Ok(true)
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        self.rows.lock().unwrap().remove(key);
        Ok(())
    }
}

impl Memory {
    /// Direct row inspection for assertions.
    pub fn row(&self, key: &Key) -> Option<Value> {
        self.rows.lock().unwrap().get(key).cloned()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

/// Write-fault injector: reads pass through, writes fail while enabled.
/// `fail_puts` narrows the blast radius to row replacements, leaving unique
/// inserts (record guards) succeeding, which is the shape of a partial
/// failure.
pub struct Faulty<S> {
    inner: S,
    fail_writes: AtomicBool,
    fail_puts: AtomicBool,
    fail_next_puts: AtomicUsize,
}

impl<S: Store> Faulty<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
            fail_puts: AtomicBool::new(false),
            fail_next_puts: AtomicUsize::new(0),
        }
    }

    pub fn fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    pub fn fail_puts(&self, enabled: bool) {
        self.fail_puts.store(enabled, Ordering::SeqCst);
    }

    /// Fail only the next `count` puts, then recover.
    pub fn fail_next_puts(&self, count: usize) {
        self.fail_next_puts.store(count, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("injected write failure");
        }
        Ok(())
    }

    fn check_put(&self) -> Result<()> {
        self.check_write()?;
        if self.fail_puts.load(Ordering::SeqCst) {
            bail!("injected put failure");
        }
        if self
            .fail_next_puts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            bail!("injected put failure");
        }
        Ok(())
    }
}

impl<S: Store> Store for Faulty<S> {
    async fn get(&self, key: &Key) -> Result<Option<Value>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: Key, value: Value) -> Result<()> {
        self.check_put()?;
        self.inner.put(key, value).await
    }

    async fn insert(&self, key: Key, value: Value) -> Result<bool> {
        self.check_write()?;
        self.inner.insert(key, value).await
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        self.check_write()?;
        self.inner.delete(key).await
    }
}
