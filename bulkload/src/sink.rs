use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::api::WriteFailure;
use crate::record::{Attribute, Record};

/// Where batches end up. Implementations must tolerate batches for the same domain
/// arriving out of order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BatchSink {
    async fn put_batch(&self, domain: &str, records: Vec<Record>) -> Result<(), WriteFailure>;
    async fn create_domain(&self, domain: &str) -> Result<(), WriteFailure>;
    async fn delete_domain(&self, domain: &str) -> Result<(), WriteFailure>;
}

pub struct PrintSink {}

#[async_trait]
impl BatchSink for PrintSink {
    async fn put_batch(&self, domain: &str, records: Vec<Record>) -> Result<(), WriteFailure> {
        let span = tracing::span!(tracing::Level::INFO, "batch of records", domain);
        let _enter = span.enter();

        for record in records {
            match serde_json::to_string(&record) {
                Ok(json) => info!("record: {}", json),
                Err(e) => info!("record {:?} (not serializable: {})", record, e),
            }
        }

        Ok(())
    }

    async fn create_domain(&self, domain: &str) -> Result<(), WriteFailure> {
        info!(domain, "create domain");
        Ok(())
    }

    async fn delete_domain(&self, domain: &str) -> Result<(), WriteFailure> {
        info!(domain, "delete domain");
        Ok(())
    }
}

#[derive(Default)]
struct StoredDomain {
    /// Item name -> attributes of the latest write.
    items: BTreeMap<String, Vec<Attribute>>,
    /// Size of every batch applied, in arrival order.
    batches: Vec<usize>,
}

/// An in-process store. Writes replace whole items, so loading the same key twice leaves
/// one copy. Writing to a domain that was never created is rejected the way the remote
/// store rejects it.
#[derive(Clone, Default)]
pub struct MemorySink {
    domains: Arc<Mutex<HashMap<String, StoredDomain>>>,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }

    pub async fn domain_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.domains.lock().await.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn item_count(&self) -> usize {
        self.domains
            .lock()
            .await
            .values()
            .map(|domain| domain.items.len())
            .sum()
    }

    /// Sizes of the batches written to `domain`, in the order they were applied.
    pub async fn batch_sizes(&self, domain: &str) -> Vec<usize> {
        self.domains
            .lock()
            .await
            .get(domain)
            .map(|domain| domain.batches.clone())
            .unwrap_or_default()
    }

    pub async fn item(&self, domain: &str, id: &str) -> Option<Vec<Attribute>> {
        self.domains
            .lock()
            .await
            .get(domain)
            .and_then(|domain| domain.items.get(id).cloned())
    }
}

#[async_trait]
impl BatchSink for MemorySink {
    #[instrument(skip_all, fields(domain = %domain))]
    async fn put_batch(&self, domain: &str, records: Vec<Record>) -> Result<(), WriteFailure> {
        let mut domains = self.domains.lock().await;
        let stored = domains.get_mut(domain).ok_or_else(|| {
            let request_id = Uuid::new_v4().to_string();
            let body = format!(
                "<Response><Errors><Error><Code>NoSuchDomain</Code>\
                 <Message>The specified domain does not exist.</Message></Error></Errors>\
                 <RequestID>{request_id}</RequestID></Response>"
            );
            WriteFailure::new(format!("the specified domain {domain} does not exist"))
                .with_status(400)
                .with_error("NoSuchDomain", "Sender")
                .with_request_id(request_id)
                .with_body(body)
        })?;

        stored.batches.push(records.len());
        for record in records {
            stored.items.insert(record.id, record.attributes);
        }
        debug!(items = stored.items.len(), "batch applied");

        Ok(())
    }

    async fn create_domain(&self, domain: &str) -> Result<(), WriteFailure> {
        self.domains
            .lock()
            .await
            .entry(domain.to_string())
            .or_default();
        Ok(())
    }

    async fn delete_domain(&self, domain: &str) -> Result<(), WriteFailure> {
        self.domains.lock().await.remove(domain);
        Ok(())
    }
}
