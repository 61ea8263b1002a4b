#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nodeset_core::config::CatalogConfig;
use nodeset_core::{
    Catalog, CatalogEntry, FetchError, FetchResponse, Fetcher, MemoryStore, StorageError, Store,
};

pub const MOTOR_URL: &str = "https://nodesets.test/Motors/Motors.NodeSet2.xml";

/// Motor1 with a HasComponent reference to SerialNumber, both in ns=0.
pub const MOTOR_NODESET: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<UANodeSet xmlns="http://opcfoundation.org/UA/2011/03/UANodeSet.xsd">
  <Aliases>
    <Alias Alias="HasComponent">i=47</Alias>
  </Aliases>
  <UAObject NodeId="ns=0;i=100" BrowseName="Motor1">
    <DisplayName>Motor1</DisplayName>
    <Description>Main drive motor</Description>
    <References>
      <Reference ReferenceType="HasComponent">ns=0;i=101</Reference>
    </References>
  </UAObject>
  <UAVariable NodeId="ns=0;i=101" BrowseName="SerialNumber" DataType="String">
    <DisplayName>SerialNumber</DisplayName>
    <References>
      <Reference ReferenceType="i=47" IsForward="false">ns=0;i=100</Reference>
    </References>
  </UAVariable>
</UANodeSet>"#;

pub const PUMP_URL: &str = "https://nodesets.test/Pumps/Pumps.NodeSet2.xml";

pub const PUMP_NODESET: &str = r#"<UANodeSet>
  <NamespaceUris>
    <Uri>http://example.com/Pumps/</Uri>
  </NamespaceUris>
  <Models>
    <Model ModelUri="http://example.com/Pumps/" Version="1.0.0" />
  </Models>
  <UAObject NodeId="ns=1;i=5001" BrowseName="1:Pump">
    <DisplayName>Pump</DisplayName>
    <References>
      <Reference ReferenceType="HasComponent">ns=1;i=5002</Reference>
    </References>
  </UAObject>
  <UAVariable NodeId="ns=1;i=5002" BrowseName="1:FlowRate" DataType="Double" ValueRank="-1">
    <DisplayName>FlowRate</DisplayName>
  </UAVariable>
</UANodeSet>"#;

/// Serves canned bodies by URL and counts every call.
pub struct FakeFetcher {
    responses: Mutex<HashMap<String, Result<String, FetchError>>>,
    calls: AtomicUsize,
    delay: Duration,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_body(self, url: &str, body: &str) -> Self {
        self.responses
            .lock()
            .insert(url.to_string(), Ok(body.to_string()));
        self
    }

    pub fn with_error(self, url: &str, error: FetchError) -> Self {
        self.responses.lock().insert(url.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let response = self.responses.lock().get(url).cloned();
        match response {
            Some(Ok(body)) => Ok(FetchResponse::ok(body)),
            Some(Err(e)) => Err(e),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

pub fn offline_config() -> CatalogConfig {
    CatalogConfig {
        discovery_enabled: false,
        ..CatalogConfig::default()
    }
}

pub fn motor_entry() -> CatalogEntry {
    let mut entry = CatalogEntry::new("motors", "Motors", MOTOR_URL);
    entry.namespace_uris = vec!["http://opcfoundation.org/UA/".to_string()];
    entry.default_selection = true;
    entry
}

pub fn pump_entry() -> CatalogEntry {
    let mut entry = CatalogEntry::new("pumps", "Pumps", PUMP_URL);
    entry.namespace_uris = vec!["http://opcfoundation.org/UA/".to_string()];
    entry.dependencies = vec!["motors".to_string()];
    entry
}

/// A catalog with discovery off and the given entries as its built-in layer.
pub fn catalog_with(
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn Store>,
    builtins: Vec<CatalogEntry>,
) -> Arc<Catalog> {
    Arc::new(Catalog::with_builtins(fetcher, store, offline_config(), builtins))
}

/// Wraps a [`MemoryStore`]; the first `get` reads its value, then stalls
/// before returning it.
pub struct SlowFirstReadStore {
    inner: MemoryStore,
    stall: Duration,
    stalled: AtomicBool,
}

impl SlowFirstReadStore {
    pub fn new(stall: Duration) -> Self {
        Self {
            inner: MemoryStore::new(),
            stall,
            stalled: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Store for SlowFirstReadStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let value = self.inner.get(key).await?;
        if !self.stalled.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(self.stall).await;
        }
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key).await
    }
}

/// Wraps a [`MemoryStore`] and rejects writes to one key.
pub struct RejectingStore {
    pub inner: MemoryStore,
    rejected_key: String,
}

impl RejectingStore {
    pub fn new(rejected_key: &str) -> Self {
        Self {
            inner: MemoryStore::new(),
            rejected_key: rejected_key.to_string(),
        }
    }
}

#[async_trait]
impl Store for RejectingStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        if key == self.rejected_key {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key).await
    }
}
