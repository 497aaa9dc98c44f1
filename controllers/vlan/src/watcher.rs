//! Kubernetes resource watcher.
//!
//! Drives the reconciler from a `kube_runtime::Controller` over `Vlan`
//! resources. The controller serializes passes per object and runs distinct
//! objects concurrently up to the configured limit. Each notification is
//! reduced to its `ObjectKey`; the reconciler re-fetches the record itself.

use crate::backoff::BackoffTracker;
use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::reconciler::{ObjectKey, Reconcile, ReconcileError, Requeue};
use crds::Vlan;
use futures::StreamExt;
use kube::{Api, Client};
use kube_runtime::controller::{Action, Config as RuntimeConfig, Error as RuntimeError};
use kube_runtime::{Controller, watcher};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

impl From<Requeue> for Action {
    fn from(requeue: Requeue) -> Self {
        match requeue {
            Requeue::Done => Action::await_change(),
            Requeue::After(delay) => Action::requeue(delay),
        }
    }
}

/// Shared state handed to every reconcile invocation
pub struct Context {
    reconciler: Arc<dyn Reconcile>,
    backoff: BackoffTracker,
}

impl Context {
    /// Creates a context with fresh backoff state
    pub fn new(reconciler: Arc<dyn Reconcile>) -> Self {
        Self {
            reconciler,
            backoff: BackoffTracker::default(),
        }
    }
}

async fn reconcile(vlan: Arc<Vlan>, ctx: Arc<Context>) -> Result<Action, ReconcileError> {
    let Some(key) = ObjectKey::from_resource(vlan.as_ref()) else {
        warn!("Ignoring Vlan notification without metadata.name");
        return Ok(Action::await_change());
    };

    let requeue = ctx.reconciler.reconcile(&key).await?;
    ctx.backoff.reset(&key.to_string());
    Ok(requeue.into())
}

fn error_policy(vlan: Arc<Vlan>, error: &ReconcileError, ctx: Arc<Context>) -> Action {
    let key = ObjectKey::from_resource(vlan.as_ref())
        .map(|k| k.to_string())
        .unwrap_or_default();
    let delay = match error.delay() {
        Some(delay) => delay,
        None => ctx.backoff.next_backoff(&key),
    };
    warn!("Reconciliation of Vlan {} failed: {}, retrying in {:?}", key, error, delay);
    Action::requeue(delay)
}

/// Watches Vlan resources for changes.
pub struct Watcher {
    api: Api<Vlan>,
    context: Arc<Context>,
    debounce: Duration,
    concurrency: u16,
}

impl Watcher {
    /// Creates a watcher over the namespace in `config`, or all namespaces.
    pub fn new(client: Client, reconciler: Arc<dyn Reconcile>, config: &ControllerConfig) -> Self {
        let api = match config.namespace.as_deref() {
            Some(ns) => Api::namespaced(client, ns),
            None => Api::all(client),
        };
        Self {
            api,
            context: Arc::new(Context::new(reconciler)),
            debounce: config.debounce,
            concurrency: config.concurrency,
        }
    }

    /// Runs until the watch stream ends or a shutdown signal arrives.
    pub async fn watch(self) -> Result<(), ControllerError> {
        info!(
            "Starting Vlan watcher (debounce {:?}, concurrency {})",
            self.debounce, self.concurrency
        );

        let runtime_config = RuntimeConfig::default()
            .debounce(self.debounce)
            .concurrency(self.concurrency);

        Controller::new(self.api, watcher::Config::default())
            .with_config(runtime_config)
            .shutdown_on_signal()
            .run(reconcile, error_policy, self.context)
            .for_each(|res| async move {
                match res {
                    Ok((obj, action)) => debug!("Reconciled {}: {:?}", obj, action),
                    Err(RuntimeError::ReconcilerFailed(e, obj)) => {
                        debug!("Reconcile of {} reported: {}", obj, e)
                    }
                    Err(e) => warn!("Vlan controller error: {}", e),
                }
            })
            .await;

        info!("Vlan watcher stopped");
        Ok(())
    }
}
