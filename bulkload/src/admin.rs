//! Creating and deleting the domains a load writes to.
//!
//! Every call is fired at once and then awaited; there is no throttling or batching here.
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info};

use crate::api::WriteFailure;
use crate::partition::Domains;
use crate::sink::BatchSink;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DomainAction {
    Create,
    Delete,
}

/// Per-domain failures of an administrative run; empty when everything went through.
pub type AdminFailures = Vec<(String, WriteFailure)>;

pub async fn create_domains(
    sink: Arc<dyn BatchSink + Send + Sync>,
    domains: &Domains,
) -> AdminFailures {
    run(sink, domains, DomainAction::Create).await
}

pub async fn delete_domains(
    sink: Arc<dyn BatchSink + Send + Sync>,
    domains: &Domains,
) -> AdminFailures {
    run(sink, domains, DomainAction::Delete).await
}

async fn run(
    sink: Arc<dyn BatchSink + Send + Sync>,
    domains: &Domains,
    action: DomainAction,
) -> AdminFailures {
    let mut set = JoinSet::new();
    for domain in domains.names() {
        let sink = sink.clone();
        set.spawn(async move {
            let result = match action {
                DomainAction::Create => sink.create_domain(&domain).await,
                DomainAction::Delete => sink.delete_domain(&domain).await,
            };
            (domain, result)
        });
    }

    let mut failures = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((domain, Err(failure))) => {
                error!(
                    %domain,
                    ?action,
                    status_code = ?failure.status_code,
                    error_code = ?failure.error_code,
                    error_type = ?failure.error_type,
                    request_id = ?failure.request_id,
                    "domain request failed: {}",
                    failure.message
                );
                failures.push((domain, failure));
            }
            Err(e) => {
                error!(?action, "domain request task failed: {}", e);
                failures.push((String::new(), WriteFailure::new(format!("task failed: {e}"))));
            }
        }
    }

    info!(
        ?action,
        domains = domains.count(),
        failed = failures.len(),
        "domain requests finished"
    );
    failures
}
