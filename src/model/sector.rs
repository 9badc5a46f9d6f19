use crate::layout_engine::Direction;
use crate::model::events::StoreEvent;
use crate::model::map::MapSector;
use crate::model::monitor::MonitorSector;
use crate::model::store::StoreError;
use crate::model::window::WindowSector;
use crate::model::workspace::{WorkspaceId, WorkspaceSector};
use crate::sys::gateway::{MonitorHandle, NativeOp, WindowHandle};

/// The whole mutable world state: entity sectors plus per-dispatch staging
/// (queued events, workspaces needing re-layout, batched native ops).
/// Transforms mutate this through the combined operations below so the
/// ownership and mapping invariants cannot drift apart.
#[derive(Debug, Default)]
pub struct RootSector {
    pub monitors: MonitorSector,
    pub windows: WindowSector,
    pub workspaces: WorkspaceSector,
    pub maps: MapSector,
    pub active_monitor: Option<MonitorHandle>,
    /// Outstanding settle timers for monitor churn. Layout refreshes are
    /// deferred while this is non-zero.
    pub monitors_changing: u32,
    dragging: Option<WindowHandle>,
    pending_events: Vec<StoreEvent>,
    relayout: Vec<WorkspaceId>,
    pending_ops: Vec<NativeOp>,
}

impl RootSector {
    pub fn queue_event(&mut self, event: StoreEvent) {
        self.pending_events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn mark_relayout(&mut self, workspace: WorkspaceId) {
        if !self.relayout.contains(&workspace) {
            self.relayout.push(workspace);
        }
    }

    pub fn mark_relayout_all_visible(&mut self) {
        let visible: Vec<_> = self.maps.assigned_monitors().map(|(_, ws)| ws).collect();
        for ws in visible {
            self.mark_relayout(ws);
        }
    }

    pub fn take_relayout(&mut self) -> Vec<WorkspaceId> {
        std::mem::take(&mut self.relayout)
    }

    pub fn push_op(&mut self, op: NativeOp) {
        self.pending_ops.push(op);
    }

    pub fn take_ops(&mut self) -> Vec<NativeOp> {
        std::mem::take(&mut self.pending_ops)
    }

    pub fn dragging(&self) -> Option<WindowHandle> { self.dragging }

    pub fn set_dragging(&mut self, window: Option<WindowHandle>) {
        self.dragging = window;
    }

    /// Puts a tracked window into a workspace, updating the ownership map
    /// and workspace membership together.
    pub fn assign_window(
        &mut self,
        window: WindowHandle,
        workspace: WorkspaceId,
        direction: Option<Direction>,
    ) -> Result<(), StoreError> {
        if !self.windows.contains(window) {
            return Err(StoreError::WindowNotFound(window));
        }
        let ws = self
            .workspaces
            .get_mut(workspace)
            .ok_or(StoreError::WorkspaceNotFound(workspace))?;
        match direction {
            Some(direction) => ws.add_window_in_direction(window, direction),
            None => ws.add_window(window),
        }
        self.maps.assign_window(window, workspace);
        Ok(())
    }

    /// Detaches a window from whatever workspace owns it. Returns the old
    /// owner, or `None` if the window was unowned.
    pub fn unassign_window(&mut self, window: WindowHandle) -> Option<WorkspaceId> {
        let workspace = self.maps.remove_window(window)?;
        if let Some(ws) = self.workspaces.get_mut(workspace) {
            ws.remove_window(window);
        }
        Some(workspace)
    }

    /// Checks the cross-sector invariants; returns a description of the
    /// first violation found. Run under `debug_assert!` after every commit.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut seen = Vec::new();
        for (monitor, workspace) in self.maps.assigned_monitors() {
            if !self.monitors.contains(monitor) {
                return Err(format!("mapping references unknown monitor {monitor:?}"));
            }
            let Some(ws) = self.workspaces.get(workspace) else {
                return Err(format!("monitor {monitor:?} mapped to dead workspace"));
            };
            if !ws.is_active() {
                return Err(format!("workspace {:?} is visible but inactive", ws.name));
            }
            if seen.contains(&workspace) {
                return Err(format!("workspace {:?} visible on two monitors", ws.name));
            }
            seen.push(workspace);
        }
        for (id, ws) in self.workspaces.iter() {
            if ws.is_active() && !seen.contains(&id) {
                return Err(format!("workspace {:?} active but not mapped", ws.name));
            }
            for window in ws.windows() {
                if self.maps.workspace_for_window(window) != Some(id) {
                    return Err(format!(
                        "window {window} in workspace {:?} but mapped elsewhere",
                        ws.name
                    ));
                }
                if !self.windows.contains(window) {
                    return Err(format!("workspace {:?} holds untracked window", ws.name));
                }
            }
        }
        for (window, workspace) in self.maps.windows() {
            let owned = self
                .workspaces
                .get(workspace)
                .is_some_and(|ws| ws.contains_window(window));
            if !owned {
                return Err(format!("window {window} mapped to workspace lacking it"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::geometry::Rect;
    use crate::layout_engine::{ColumnEngine, LayoutEngine};
    use crate::model::monitor::test_monitor;
    use crate::model::window::Window;
    use crate::model::window::WindowSizeState;

    fn engines() -> Vec<Arc<dyn LayoutEngine>> {
        vec![Arc::new(ColumnEngine::default())]
    }

    fn tracked(root: &mut RootSector, id: u64) -> WindowHandle {
        let handle = WindowHandle::new(id);
        root.windows.insert(Window {
            handle,
            title: format!("win {id}"),
            process: "test.exe".into(),
            class: "TestClass".into(),
            size_state: WindowSizeState::Normal,
        });
        handle
    }

    #[test]
    fn assign_and_unassign_keep_map_and_membership_in_sync() {
        let mut root = RootSector::default();
        let ws = root.workspaces.create(None, engines());
        let w = tracked(&mut root, 1);
        root.assign_window(w, ws, None).unwrap();
        assert_eq!(root.maps.workspace_for_window(w), Some(ws));
        assert!(root.workspaces.get(ws).unwrap().contains_window(w));
        assert_eq!(root.check_invariants(), Ok(()));

        assert_eq!(root.unassign_window(w), Some(ws));
        assert_eq!(root.maps.workspace_for_window(w), None);
        assert!(!root.workspaces.get(ws).unwrap().contains_window(w));
        assert_eq!(root.check_invariants(), Ok(()));
    }

    #[test]
    fn assigning_an_untracked_window_fails() {
        let mut root = RootSector::default();
        let ws = root.workspaces.create(None, engines());
        let err = root.assign_window(WindowHandle::new(9), ws, None).unwrap_err();
        assert!(matches!(err, StoreError::WindowNotFound(_)));
    }

    #[test]
    fn invariants_catch_visible_but_inactive_workspace() {
        let mut root = RootSector::default();
        let monitor = test_monitor(1, Rect::new(0, 0, 100, 100));
        root.monitors.replace_all(vec![monitor.clone()]);
        let ws = root.workspaces.create(None, engines());
        root.maps.assign_monitor(monitor.handle, ws).unwrap();
        assert!(root.check_invariants().is_err());
        root.workspaces.get_mut(ws).unwrap().set_active(true);
        assert_eq!(root.check_invariants(), Ok(()));
    }

    #[test]
    fn relayout_marks_deduplicate() {
        let mut root = RootSector::default();
        let ws = root.workspaces.create(None, engines());
        root.mark_relayout(ws);
        root.mark_relayout(ws);
        assert_eq!(root.take_relayout(), vec![ws]);
        assert!(root.take_relayout().is_empty());
    }
}
