use crate::common::collections::HashMap;
use crate::model::store::StoreError;
use crate::model::workspace::WorkspaceId;
use crate::sys::gateway::{MonitorHandle, WindowHandle};

/// Cross-entity relations: which workspace each monitor shows, and which
/// workspace owns each window. The monitor relation is kept injective so a
/// workspace is never visible on two monitors at once.
#[derive(Debug, Default)]
pub struct MapSector {
    monitor_to_workspace: HashMap<MonitorHandle, WorkspaceId>,
    window_to_workspace: HashMap<WindowHandle, WorkspaceId>,
}

impl MapSector {
    pub fn workspace_for_monitor(&self, monitor: MonitorHandle) -> Option<WorkspaceId> {
        self.monitor_to_workspace.get(&monitor).copied()
    }

    pub fn monitor_for_workspace(&self, workspace: WorkspaceId) -> Option<MonitorHandle> {
        self.monitor_to_workspace
            .iter()
            .find(|&(_, &ws)| ws == workspace)
            .map(|(&m, _)| m)
    }

    pub fn is_workspace_visible(&self, workspace: WorkspaceId) -> bool {
        self.monitor_for_workspace(workspace).is_some()
    }

    /// Binds `workspace` to `monitor`, replacing whatever the monitor showed
    /// before. Fails if the workspace is already visible elsewhere.
    pub fn assign_monitor(
        &mut self,
        monitor: MonitorHandle,
        workspace: WorkspaceId,
    ) -> Result<Option<WorkspaceId>, StoreError> {
        if let Some(other) = self.monitor_for_workspace(workspace) {
            if other != monitor {
                return Err(StoreError::InvariantViolation(format!(
                    "workspace {workspace:?} is already shown on monitor {other:?}"
                )));
            }
        }
        Ok(self.monitor_to_workspace.insert(monitor, workspace))
    }

    pub fn release_monitor(&mut self, monitor: MonitorHandle) -> Option<WorkspaceId> {
        self.monitor_to_workspace.remove(&monitor)
    }

    pub fn workspace_for_window(&self, window: WindowHandle) -> Option<WorkspaceId> {
        self.window_to_workspace.get(&window).copied()
    }

    pub fn assign_window(&mut self, window: WindowHandle, workspace: WorkspaceId) {
        self.window_to_workspace.insert(window, workspace);
    }

    pub fn remove_window(&mut self, window: WindowHandle) -> Option<WorkspaceId> {
        self.window_to_workspace.remove(&window)
    }

    pub fn assigned_monitors(&self) -> impl Iterator<Item = (MonitorHandle, WorkspaceId)> + '_ {
        self.monitor_to_workspace.iter().map(|(&m, &w)| (m, w))
    }

    pub fn windows(&self) -> impl Iterator<Item = (WindowHandle, WorkspaceId)> + '_ {
        self.window_to_workspace.iter().map(|(&w, &ws)| (w, ws))
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;
    use crate::model::workspace::WorkspaceId;

    fn two_ids() -> (WorkspaceId, WorkspaceId) {
        let mut sm: SlotMap<WorkspaceId, ()> = SlotMap::with_key();
        (sm.insert(()), sm.insert(()))
    }

    #[test]
    fn workspace_cannot_be_visible_twice() {
        let (ws_a, _) = two_ids();
        let mut maps = MapSector::default();
        maps.assign_monitor(MonitorHandle::new(1), ws_a).unwrap();
        let err = maps.assign_monitor(MonitorHandle::new(2), ws_a).unwrap_err();
        assert!(matches!(err, StoreError::InvariantViolation(_)));
    }

    #[test]
    fn reassigning_a_monitor_returns_the_previous_workspace() {
        let (ws_a, ws_b) = two_ids();
        let mut maps = MapSector::default();
        let monitor = MonitorHandle::new(1);
        assert_eq!(maps.assign_monitor(monitor, ws_a).unwrap(), None);
        assert_eq!(maps.assign_monitor(monitor, ws_b).unwrap(), Some(ws_a));
        assert_eq!(maps.monitor_for_workspace(ws_a), None);
        assert_eq!(maps.workspace_for_monitor(monitor), Some(ws_b));
    }
}
