//! Monitor topology reconciliation. A single transform re-reads the world
//! from the platform and diffs it against the sector by handle; mappings
//! survive anything short of the monitor itself disappearing.

use tracing::{debug, info, warn};

use super::{Apply, TransformCtx};
use crate::common::config::default_engines;
use crate::layout_engine::build_engines;
use crate::model::events::StoreEvent;
use crate::model::monitor::Monitor;
use crate::model::store::StoreError;
use crate::model::workspace::WorkspaceId;
use crate::sys::gateway::GatewayError;

/// Re-enumerates monitors and reconciles mappings. Every successful refresh
/// reports the partition to subscribers; only an actual change arms the
/// settle counter, so an identical read never schedules a re-layout.
#[derive(Debug, Clone, Default)]
pub struct MonitorsChangedTransform;

impl Apply for MonitorsChangedTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        let monitors: Vec<Monitor> = cx
            .gateway
            .enumerate_monitors()?
            .into_iter()
            .map(Monitor::from)
            .collect();
        if monitors.is_empty() {
            if cx.root.monitors.is_empty() {
                return Err(StoreError::Gateway(GatewayError::NoMonitors));
            }
            // Transient zero-monitor reads happen around lid close and
            // unlock; keep the current state and wait for the next event.
            warn!("platform reported zero monitors, keeping current state");
            return Ok(());
        }

        let partition = cx.root.monitors.replace_all(monitors);
        let changed = partition.topology_changed() || !partition.resized.is_empty();
        if changed {
            info!(
                added = partition.added.len(),
                removed = partition.removed.len(),
                resized = partition.resized.len(),
                "monitor topology changed"
            );

            for removed in &partition.removed {
                if let Some(workspace) = cx.root.maps.release_monitor(removed.handle) {
                    // The workspace and its windows survive; it just stops
                    // being visible until some monitor picks it up again.
                    if let Some(ws) = cx.root.workspaces.get_mut(workspace) {
                        ws.set_active(false);
                    }
                }
            }

            for added in &partition.added {
                let workspace = workspace_for_new_monitor(cx, &added.name)?;
                cx.root.maps.assign_monitor(added.handle, workspace)?;
                if let Some(ws) = cx.root.workspaces.get_mut(workspace) {
                    ws.set_active(true);
                }
                cx.root.queue_event(StoreEvent::WorkspaceShown {
                    monitor: added.handle,
                    workspace,
                    previous: None,
                });
            }

            let active_still_present = cx
                .root
                .active_monitor
                .is_some_and(|m| cx.root.monitors.contains(m));
            if !active_still_present {
                cx.root.active_monitor = cx.root.monitors.primary().map(|m| m.handle);
            }

            cx.root.monitors_changing += 1;
        } else {
            debug!("monitor refresh found no changes");
        }

        // A pure refresh still reports the full partition.
        cx.root.queue_event(StoreEvent::MonitorsChanged {
            unchanged: partition.unchanged,
            added: partition.added,
            removed: partition.removed,
        });
        Ok(())
    }
}

/// Picks the workspace a newly attached monitor should show: configured
/// assignment first, then the oldest unassigned workspace, then a fresh one.
fn workspace_for_new_monitor(
    cx: &mut TransformCtx<'_>,
    monitor_name: &str,
) -> Result<WorkspaceId, StoreError> {
    for assignment in &cx.config.monitors {
        if assignment.monitor != monitor_name && assignment.monitor != "*" {
            continue;
        }
        if let Some(id) = cx.root.workspaces.find_by_name(&assignment.workspace) {
            if !cx.root.maps.is_workspace_visible(id) {
                return Ok(id);
            }
        }
    }
    let unassigned = cx
        .root
        .workspaces
        .iter_created()
        .map(|(id, _)| id)
        .find(|&id| !cx.root.maps.is_workspace_visible(id));
    if let Some(id) = unassigned {
        return Ok(id);
    }
    let engines = build_engines(&default_engines(), &cx.config.settings);
    let id = cx.root.workspaces.create(None, engines);
    let name = cx.root.workspaces.get(id).map(|ws| ws.name.clone()).unwrap_or_default();
    cx.root.queue_event(StoreEvent::WorkspaceAdded { workspace: id, name });
    Ok(id)
}

/// Fires when one settle timer elapses. Only the last timer of a burst
/// triggers the actual re-layout.
#[derive(Debug, Clone, Default)]
pub struct MonitorsSettledTransform;

impl Apply for MonitorsSettledTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        if cx.root.monitors_changing == 0 {
            return Ok(());
        }
        cx.root.monitors_changing -= 1;
        if cx.root.monitors_changing == 0 {
            debug!("monitors settled, refreshing layouts");
            cx.root.mark_relayout_all_visible();
        }
        Ok(())
    }
}
