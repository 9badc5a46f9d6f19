use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::common::config::{Config, Rules};
use crate::layout_engine::build_engines;
use crate::model::events::{EventBus, StoreEvent, SubscriptionId};
use crate::model::positioner;
use crate::model::sector::RootSector;
use crate::model::tx_store::WindowTxStore;
use crate::model::workspace::WorkspaceId;
use crate::pickers::Picker;
use crate::sys::gateway::{GatewayError, MonitorHandle, PlatformGateway, WindowHandle};
use crate::transforms::{Apply, Transform, TransformCtx};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("monitor {0:?} is not tracked")]
    MonitorNotFound(MonitorHandle),
    #[error("window {0} is not tracked")]
    WindowNotFound(WindowHandle),
    #[error("workspace {0:?} does not exist")]
    WorkspaceNotFound(WorkspaceId),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Single-writer owner of all window-management state. Every mutation goes
/// through [`dispatch`](Store::dispatch); reads go through
/// [`pick`](Store::pick). A transform either commits fully or leaves the
/// state untouched, and subscribers only ever observe committed state.
pub struct Store {
    root: RootSector,
    gateway: Arc<dyn PlatformGateway>,
    config: Config,
    rules: Rules,
    bus: EventBus,
    tx: WindowTxStore,
    next_txid: u64,
}

impl Store {
    pub fn new(gateway: Arc<dyn PlatformGateway>, config: Config) -> anyhow::Result<Store> {
        let rules = Rules::compile(&config)?;
        let mut root = RootSector::default();
        for def in &config.workspaces {
            let engines = build_engines(&def.engines, &config.settings);
            root.workspaces.create(Some(def.name.clone()), engines);
        }
        Ok(Store {
            root,
            gateway,
            config,
            rules,
            bus: EventBus::default(),
            tx: WindowTxStore::default(),
            next_txid: 0,
        })
    }

    /// Applies one transform. On success, re-layouts are flushed to the
    /// platform and queued events are delivered in order; on failure the
    /// state is unchanged and all staging is discarded.
    pub fn dispatch(&mut self, transform: impl Into<Transform>) -> Result<(), StoreError> {
        let transform = transform.into();
        let mut cx = TransformCtx {
            root: &mut self.root,
            gateway: self.gateway.as_ref(),
            config: &self.config,
            rules: &self.rules,
            tx: &self.tx,
        };
        match transform.apply(&mut cx) {
            Ok(()) => {
                positioner::flush(
                    &mut self.root,
                    self.gateway.as_ref(),
                    &self.tx,
                    &mut self.next_txid,
                );
                debug_assert_eq!(self.root.check_invariants(), Ok(()));
                for event in self.root.take_events() {
                    self.bus.emit(&event);
                }
                Ok(())
            }
            Err(err) => {
                warn!(%err, ?transform, "transform rejected");
                self.root.take_events();
                self.root.take_relayout();
                self.root.take_ops();
                Err(err)
            }
        }
    }

    pub fn pick<P: Picker>(&self, picker: P) -> Result<P::Output, StoreError> {
        picker.pick(&self.root)
    }

    pub fn subscribe(
        &mut self,
        handler: impl FnMut(&StoreEvent) + Send + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Shared handle for the platform event thread to consult when deciding
    /// whether a move event echoes one of our own frame requests.
    pub fn tx_store(&self) -> WindowTxStore {
        self.tx.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Snapshot of workspace names, engines, and window frames for
    /// persistence across restarts.
    pub fn capture_layout(&self) -> crate::model::persist::LayoutSnapshot {
        crate::model::persist::capture(&self.root)
    }

    /// Best-effort restore of a saved snapshot onto the current state.
    pub fn restore_layout(&mut self, snapshot: &crate::model::persist::LayoutSnapshot) {
        crate::model::persist::seed_positions(&mut self.root, snapshot);
    }

    pub(crate) fn root(&self) -> &RootSector {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut RootSector {
        &mut self.root
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("root", &self.root)
            .field("next_txid", &self.next_txid)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::config::WorkspaceDef;
    use crate::sys::fake::FakePlatform;

    #[test]
    fn configured_workspaces_exist_on_startup() {
        let engines = crate::common::config::default_engines();
        let mut config = Config::default();
        config.workspaces = vec![
            WorkspaceDef { name: "code".into(), engines: engines.clone() },
            WorkspaceDef { name: "chat".into(), engines },
        ];
        let store = Store::new(Arc::new(FakePlatform::with_single_monitor()), config).unwrap();
        assert!(store.root().workspaces.find_by_name("code").is_some());
        assert!(store.root().workspaces.find_by_name("chat").is_some());
        assert_eq!(store.root().workspaces.len(), 2);
    }
}
