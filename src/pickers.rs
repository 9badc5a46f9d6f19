//! Read-only queries against the store. A picker is a value describing what
//! to read; `Store::pick` runs it against the current state so readers never
//! observe a half-applied transform.

use crate::model::monitor::Monitor;
use crate::model::sector::RootSector;
use crate::model::store::StoreError;
use crate::model::workspace::WorkspaceId;
use crate::sys::gateway::{MonitorHandle, WindowHandle};

pub trait Picker {
    type Output;

    fn pick(&self, root: &RootSector) -> Result<Self::Output, StoreError>;
}

pub struct AllMonitors;

impl Picker for AllMonitors {
    type Output = Vec<Monitor>;

    fn pick(&self, root: &RootSector) -> Result<Self::Output, StoreError> {
        Ok(root.monitors.iter().cloned().collect())
    }
}

pub struct ActiveMonitor;

impl Picker for ActiveMonitor {
    type Output = Option<Monitor>;

    fn pick(&self, root: &RootSector) -> Result<Self::Output, StoreError> {
        Ok(root.active_monitor.and_then(|m| root.monitors.get(m)).cloned())
    }
}

pub struct WorkspaceForMonitor(pub MonitorHandle);

impl Picker for WorkspaceForMonitor {
    type Output = WorkspaceId;

    fn pick(&self, root: &RootSector) -> Result<Self::Output, StoreError> {
        if !root.monitors.contains(self.0) {
            return Err(StoreError::MonitorNotFound(self.0));
        }
        root.maps.workspace_for_monitor(self.0).ok_or_else(|| {
            StoreError::InvariantViolation(format!("monitor {:?} has no workspace", self.0))
        })
    }
}

pub struct MonitorForWorkspace(pub WorkspaceId);

impl Picker for MonitorForWorkspace {
    type Output = Option<MonitorHandle>;

    fn pick(&self, root: &RootSector) -> Result<Self::Output, StoreError> {
        if !root.workspaces.contains(self.0) {
            return Err(StoreError::WorkspaceNotFound(self.0));
        }
        Ok(root.maps.monitor_for_workspace(self.0))
    }
}

pub struct WorkspaceForWindow(pub WindowHandle);

impl Picker for WorkspaceForWindow {
    type Output = WorkspaceId;

    fn pick(&self, root: &RootSector) -> Result<Self::Output, StoreError> {
        root.maps
            .workspace_for_window(self.0)
            .ok_or(StoreError::WindowNotFound(self.0))
    }
}

/// All workspaces as (id, name), sorted by name.
pub struct WorkspaceList;

impl Picker for WorkspaceList {
    type Output = Vec<(WorkspaceId, String)>;

    fn pick(&self, root: &RootSector) -> Result<Self::Output, StoreError> {
        Ok(root.workspaces.sorted_by_name())
    }
}

pub struct WindowsInWorkspace(pub WorkspaceId);

impl Picker for WindowsInWorkspace {
    type Output = Vec<WindowHandle>;

    fn pick(&self, root: &RootSector) -> Result<Self::Output, StoreError> {
        let ws = root
            .workspaces
            .get(self.0)
            .ok_or(StoreError::WorkspaceNotFound(self.0))?;
        Ok(ws.windows().collect())
    }
}

/// The workspace after `current` in creation order, wrapping around.
pub struct NextWorkspace(pub WorkspaceId);

/// The workspace before `current` in creation order, wrapping around.
pub struct PrevWorkspace(pub WorkspaceId);

fn neighbor(
    root: &RootSector,
    current: WorkspaceId,
    forward: bool,
) -> Result<WorkspaceId, StoreError> {
    let order: Vec<WorkspaceId> = root.workspaces.iter_created().map(|(id, _)| id).collect();
    let position = order
        .iter()
        .position(|&id| id == current)
        .ok_or(StoreError::WorkspaceNotFound(current))?;
    let n = order.len();
    let next = if forward { (position + 1) % n } else { (position + n - 1) % n };
    Ok(order[next])
}

impl Picker for NextWorkspace {
    type Output = WorkspaceId;

    fn pick(&self, root: &RootSector) -> Result<Self::Output, StoreError> {
        neighbor(root, self.0, true)
    }
}

impl Picker for PrevWorkspace {
    type Output = WorkspaceId;

    fn pick(&self, root: &RootSector) -> Result<Self::Output, StoreError> {
        neighbor(root, self.0, false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub monitors: usize,
    pub workspaces: usize,
    pub windows: usize,
    pub visible_workspaces: usize,
}

pub struct Stats;

impl Picker for Stats {
    type Output = StatsSnapshot;

    fn pick(&self, root: &RootSector) -> Result<Self::Output, StoreError> {
        Ok(StatsSnapshot {
            monitors: root.monitors.len(),
            workspaces: root.workspaces.len(),
            windows: root.windows.len(),
            visible_workspaces: root.maps.assigned_monitors().count(),
        })
    }
}

/// Outstanding monitor settle timers. Non-zero means re-layouts are on hold.
pub struct MonitorsChangingCount;

impl Picker for MonitorsChangingCount {
    type Output = u32;

    fn pick(&self, root: &RootSector) -> Result<Self::Output, StoreError> {
        Ok(root.monitors_changing)
    }
}

/// The window currently being dragged, if any.
pub struct DraggingWindow;

impl Picker for DraggingWindow {
    type Output = Option<WindowHandle>;

    fn pick(&self, root: &RootSector) -> Result<Self::Output, StoreError> {
        Ok(root.dragging())
    }
}

/// Human-readable description of every workspace, for diagnostics.
pub struct DebugDescription;

impl Picker for DebugDescription {
    type Output = String;

    fn pick(&self, root: &RootSector) -> Result<Self::Output, StoreError> {
        use std::fmt::Write;

        let mut out = String::new();
        for (id, ws) in root.workspaces.iter_created() {
            let visibility = match root.maps.monitor_for_workspace(id) {
                Some(monitor) => format!("on {monitor:?}"),
                None => "hidden".to_string(),
            };
            let _ = writeln!(
                out,
                "{} [{}] engine={} windows={}",
                ws.name,
                visibility,
                ws.active_engine().name(),
                ws.window_count(),
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::config::Config;
    use crate::model::store::Store;
    use crate::sys::fake::FakePlatform;
    use crate::sys::gateway::WindowInfo;
    use crate::transforms::{
        AddWorkspaceTransform, MonitorsChangedTransform, WindowAddedTransform,
    };

    fn booted_store(fake: &Arc<FakePlatform>) -> Store {
        let mut store = Store::new(fake.clone(), Config::default()).unwrap();
        store.dispatch(MonitorsChangedTransform).unwrap();
        store
    }

    #[test]
    fn workspace_list_is_sorted_by_name() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let mut store = booted_store(&fake);
        store.dispatch(AddWorkspaceTransform { name: Some("alpha".into()) }).unwrap();
        store.dispatch(AddWorkspaceTransform { name: Some("zeta".into()) }).unwrap();
        let names: Vec<String> =
            store.pick(WorkspaceList).unwrap().into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["Workspace 1", "alpha", "zeta"]);
    }

    #[test]
    fn neighbor_navigation_wraps_in_creation_order() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let mut store = booted_store(&fake);
        store.dispatch(AddWorkspaceTransform { name: Some("b".into()) }).unwrap();
        store.dispatch(AddWorkspaceTransform { name: Some("a".into()) }).unwrap();
        let first = store.root().workspaces.find_by_name("Workspace 1").unwrap();
        let b = store.root().workspaces.find_by_name("b").unwrap();
        let a = store.root().workspaces.find_by_name("a").unwrap();

        assert_eq!(store.pick(NextWorkspace(first)).unwrap(), b);
        assert_eq!(store.pick(NextWorkspace(a)).unwrap(), first);
        assert_eq!(store.pick(PrevWorkspace(first)).unwrap(), a);
    }

    #[test]
    fn stats_count_the_world() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let mut store = booted_store(&fake);
        store
            .dispatch(WindowAddedTransform {
                info: WindowInfo {
                    handle: WindowHandle::new(1),
                    title: "t".into(),
                    process: "p.exe".into(),
                    class: "c".into(),
                    minimized: false,
                    maximized: false,
                },
            })
            .unwrap();
        let stats = store.pick(Stats).unwrap();
        assert_eq!(
            stats,
            StatsSnapshot { monitors: 1, workspaces: 1, windows: 1, visible_workspaces: 1 }
        );
    }

    #[test]
    fn unknown_handles_are_reported_as_such() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let store = booted_store(&fake);
        assert!(matches!(
            store.pick(WorkspaceForMonitor(MonitorHandle::new(99))),
            Err(StoreError::MonitorNotFound(_))
        ));
        assert!(matches!(
            store.pick(WorkspaceForWindow(WindowHandle::new(99))),
            Err(StoreError::WindowNotFound(_))
        ));
    }
}
