//! Workspace lifecycle, switching, and engine control transforms.

use tracing::{debug, info};

use super::{Apply, TransformCtx};
use crate::common::config::default_engines;
use crate::layout_engine::build_engines;
use crate::model::events::StoreEvent;
use crate::model::store::StoreError;
use crate::model::window::WindowSizeState;
use crate::model::workspace::WorkspaceId;
use crate::sys::gateway::{MonitorHandle, NativeOp, WindowHandle};

#[derive(Debug, Clone, Default)]
pub struct AddWorkspaceTransform {
    /// `None` gets the next auto-generated name.
    pub name: Option<String>,
}

impl Apply for AddWorkspaceTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        if let Some(name) = &self.name {
            if name.is_empty() {
                return Err(StoreError::InvariantViolation(
                    "workspace name cannot be empty".into(),
                ));
            }
            if cx.root.workspaces.find_by_name(name).is_some() {
                return Err(StoreError::InvariantViolation(format!(
                    "workspace {name:?} already exists"
                )));
            }
        }
        let engines = build_engines(&default_engines(), &cx.config.settings);
        let workspace = cx.root.workspaces.create(self.name.clone(), engines);
        let name = cx
            .root
            .workspaces
            .get(workspace)
            .map(|ws| ws.name.clone())
            .unwrap_or_default();
        info!(%name, "workspace added");
        cx.root.queue_event(StoreEvent::WorkspaceAdded { workspace, name });
        Ok(())
    }
}

/// Deletes a hidden workspace. Its windows migrate to the oldest surviving
/// workspace; removing a visible workspace or the last one is rejected.
#[derive(Debug, Clone)]
pub struct RemoveWorkspaceTransform {
    pub workspace: WorkspaceId,
}

impl Apply for RemoveWorkspaceTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        if !cx.root.workspaces.contains(self.workspace) {
            return Err(StoreError::WorkspaceNotFound(self.workspace));
        }
        if cx.root.maps.is_workspace_visible(self.workspace) {
            return Err(StoreError::InvariantViolation(
                "cannot remove a workspace that is shown on a monitor".into(),
            ));
        }
        let fallback = cx
            .root
            .workspaces
            .iter_created()
            .map(|(id, _)| id)
            .find(|&id| id != self.workspace)
            .ok_or_else(|| {
                StoreError::InvariantViolation("cannot remove the last workspace".into())
            })?;

        let members: Vec<WindowHandle> = cx
            .root
            .workspaces
            .get(self.workspace)
            .map(|ws| ws.windows().collect())
            .unwrap_or_default();
        let fallback_visible = cx.root.maps.is_workspace_visible(fallback);
        for window in members {
            cx.root.unassign_window(window);
            cx.root.assign_window(window, fallback, None)?;
            let minimized = cx
                .root
                .windows
                .get(window)
                .is_some_and(|w| w.size_state == WindowSizeState::Minimized);
            if minimized {
                if let Some(ws) = cx.root.workspaces.get_mut(fallback) {
                    ws.exclude_window(window);
                }
            }
            if fallback_visible {
                if minimized {
                    cx.root.push_op(NativeOp::Minimize(window));
                } else {
                    cx.root.push_op(NativeOp::Show(window));
                }
            }
            cx.root.queue_event(StoreEvent::WindowMovedToWorkspace {
                window,
                from: self.workspace,
                to: fallback,
            });
        }
        if fallback_visible {
            cx.root.mark_relayout(fallback);
        }
        cx.root.workspaces.remove(self.workspace);
        cx.root.queue_event(StoreEvent::WorkspaceRemoved { workspace: self.workspace });
        Ok(())
    }
}

/// Shows a workspace on a monitor, swapping out whatever it showed before.
#[derive(Debug, Clone)]
pub struct SwitchWorkspaceTransform {
    pub monitor: MonitorHandle,
    pub workspace: WorkspaceId,
}

impl Apply for SwitchWorkspaceTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        if !cx.root.monitors.contains(self.monitor) {
            return Err(StoreError::MonitorNotFound(self.monitor));
        }
        if !cx.root.workspaces.contains(self.workspace) {
            return Err(StoreError::WorkspaceNotFound(self.workspace));
        }
        if cx.root.maps.workspace_for_monitor(self.monitor) == Some(self.workspace) {
            return Ok(());
        }
        if let Some(other) = cx.root.maps.monitor_for_workspace(self.workspace) {
            return Err(StoreError::InvariantViolation(format!(
                "workspace is already shown on monitor {other:?}"
            )));
        }

        let previous = cx.root.maps.release_monitor(self.monitor);
        if let Some(previous) = previous {
            if let Some(ws) = cx.root.workspaces.get_mut(previous) {
                ws.set_active(false);
                let hidden: Vec<_> = ws.windows().collect();
                for window in hidden {
                    cx.root.push_op(NativeOp::Hide(window));
                }
            }
        }
        cx.root.maps.assign_monitor(self.monitor, self.workspace)?;
        if let Some(ws) = cx.root.workspaces.get_mut(self.workspace) {
            ws.set_active(true);
            let shown: Vec<_> = ws.windows().collect();
            for window in shown {
                let minimized = cx
                    .root
                    .windows
                    .get(window)
                    .is_some_and(|w| w.size_state == WindowSizeState::Minimized);
                // Members recorded minimized come back to the taskbar, not
                // to the screen.
                if minimized {
                    cx.root.push_op(NativeOp::Minimize(window));
                } else {
                    cx.root.push_op(NativeOp::Show(window));
                }
            }
        }
        cx.root.mark_relayout(self.workspace);
        debug!(monitor = ?self.monitor, workspace = ?self.workspace, "workspace switched");
        cx.root.queue_event(StoreEvent::WorkspaceShown {
            monitor: self.monitor,
            workspace: self.workspace,
            previous,
        });
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RenameWorkspaceTransform {
    pub workspace: WorkspaceId,
    pub name: String,
}

impl Apply for RenameWorkspaceTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        if self.name.is_empty() {
            return Err(StoreError::InvariantViolation(
                "workspace name cannot be empty".into(),
            ));
        }
        if let Some(existing) = cx.root.workspaces.find_by_name(&self.name) {
            if existing != self.workspace {
                return Err(StoreError::InvariantViolation(format!(
                    "workspace {:?} already exists",
                    self.name
                )));
            }
        }
        let ws = cx
            .root
            .workspaces
            .get_mut(self.workspace)
            .ok_or(StoreError::WorkspaceNotFound(self.workspace))?;
        ws.name = self.name.clone();
        cx.root.queue_event(StoreEvent::WorkspaceRenamed {
            workspace: self.workspace,
            name: self.name.clone(),
        });
        Ok(())
    }
}

/// Moves one window to another workspace, hiding or showing it as needed.
#[derive(Debug, Clone)]
pub struct MoveWindowToWorkspaceTransform {
    pub window: WindowHandle,
    pub workspace: WorkspaceId,
}

impl Apply for MoveWindowToWorkspaceTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        if !cx.root.workspaces.contains(self.workspace) {
            return Err(StoreError::WorkspaceNotFound(self.workspace));
        }
        let from = cx
            .root
            .maps
            .workspace_for_window(self.window)
            .ok_or(StoreError::WindowNotFound(self.window))?;
        if from == self.workspace {
            return Ok(());
        }
        cx.root.unassign_window(self.window);
        cx.root.assign_window(self.window, self.workspace, None)?;
        if cx.root.maps.is_workspace_visible(from) {
            cx.root.mark_relayout(from);
        }
        let minimized = cx
            .root
            .windows
            .get(self.window)
            .is_some_and(|w| w.size_state == WindowSizeState::Minimized);
        if minimized {
            if let Some(ws) = cx.root.workspaces.get_mut(self.workspace) {
                ws.exclude_window(self.window);
            }
        }
        if cx.root.maps.is_workspace_visible(self.workspace) {
            if minimized {
                cx.root.push_op(NativeOp::Minimize(self.window));
            } else {
                cx.root.push_op(NativeOp::Show(self.window));
            }
            cx.root.mark_relayout(self.workspace);
        } else {
            cx.root.push_op(NativeOp::Hide(self.window));
        }
        cx.root.queue_event(StoreEvent::WindowMovedToWorkspace {
            window: self.window,
            from,
            to: self.workspace,
        });
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SetActiveEngineTransform {
    pub workspace: WorkspaceId,
    pub index: usize,
}

impl Apply for SetActiveEngineTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        let ws = cx
            .root
            .workspaces
            .get_mut(self.workspace)
            .ok_or(StoreError::WorkspaceNotFound(self.workspace))?;
        if !ws.set_active_engine(self.index) {
            return Err(StoreError::InvariantViolation(format!(
                "engine index {} out of range ({} engines)",
                self.index,
                ws.engine_count()
            )));
        }
        if cx.root.maps.is_workspace_visible(self.workspace) {
            cx.root.mark_relayout(self.workspace);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CycleEngineTransform {
    pub workspace: WorkspaceId,
    pub forward: bool,
}

impl Apply for CycleEngineTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        let ws = cx
            .root
            .workspaces
            .get_mut(self.workspace)
            .ok_or(StoreError::WorkspaceNotFound(self.workspace))?;
        ws.cycle_engine(self.forward);
        if cx.root.maps.is_workspace_visible(self.workspace) {
            cx.root.mark_relayout(self.workspace);
        }
        Ok(())
    }
}

/// Resets the active engine's proportions to even.
#[derive(Debug, Clone)]
pub struct EqualizeWorkspaceTransform {
    pub workspace: WorkspaceId,
}

impl Apply for EqualizeWorkspaceTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        let ws = cx
            .root
            .workspaces
            .get_mut(self.workspace)
            .ok_or(StoreError::WorkspaceNotFound(self.workspace))?;
        ws.equalize();
        if cx.root.maps.is_workspace_visible(self.workspace) {
            cx.root.mark_relayout(self.workspace);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::config::Config;
    use crate::model::store::{Store, StoreError};
    use crate::sys::fake::FakePlatform;
    use crate::sys::gateway::{WindowHandle, WindowInfo};
    use crate::transforms::{
        MonitorsChangedTransform, WindowAddedTransform, WindowMinimizedTransform,
    };

    fn window_info(id: u64) -> WindowInfo {
        WindowInfo {
            handle: WindowHandle::new(id),
            title: format!("window {id}"),
            process: "app.exe".into(),
            class: "AppClass".into(),
            minimized: false,
            maximized: false,
        }
    }

    fn booted_store(fake: &Arc<FakePlatform>) -> Store {
        let mut store = Store::new(fake.clone(), Config::default()).unwrap();
        store.dispatch(MonitorsChangedTransform).unwrap();
        store
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let mut store = booted_store(&fake);
        store.dispatch(AddWorkspaceTransform { name: Some("mail".into()) }).unwrap();
        let err = store
            .dispatch(AddWorkspaceTransform { name: Some("mail".into()) })
            .unwrap_err();
        assert!(matches!(err, StoreError::InvariantViolation(_)));
    }

    #[test]
    fn switching_swaps_visibility_and_hides_old_windows() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let mut store = booted_store(&fake);
        store.dispatch(WindowAddedTransform { info: window_info(1) }).unwrap();
        fake.take_ops();

        store.dispatch(AddWorkspaceTransform { name: Some("two".into()) }).unwrap();
        let monitor = store.root().active_monitor.unwrap();
        let first = store.root().maps.workspace_for_monitor(monitor).unwrap();
        let second = store.root().workspaces.find_by_name("two").unwrap();

        store.dispatch(SwitchWorkspaceTransform { monitor, workspace: second }).unwrap();
        let root = store.root();
        assert_eq!(root.maps.workspace_for_monitor(monitor), Some(second));
        assert!(!root.workspaces.get(first).unwrap().is_active());
        assert!(root.workspaces.get(second).unwrap().is_active());
        let ops = fake.take_ops();
        assert_eq!(ops, vec![NativeOp::Hide(WindowHandle::new(1))]);
        assert!(fake.is_hidden(WindowHandle::new(1)));

        // Switching back shows the window and lays it out again.
        store.dispatch(SwitchWorkspaceTransform { monitor, workspace: first }).unwrap();
        let ops = fake.take_ops();
        assert!(ops.contains(&NativeOp::Show(WindowHandle::new(1))));
        assert!(!fake.is_hidden(WindowHandle::new(1)));
    }

    #[test]
    fn showing_a_workspace_minimizes_its_minimized_members() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let mut store = booted_store(&fake);
        let (w1, w2) = (WindowHandle::new(1), WindowHandle::new(2));
        store.dispatch(WindowAddedTransform { info: window_info(1) }).unwrap();
        store.dispatch(WindowAddedTransform { info: window_info(2) }).unwrap();
        store.dispatch(WindowMinimizedTransform { window: w2, minimized: true }).unwrap();
        fake.take_ops();

        store.dispatch(AddWorkspaceTransform { name: Some("two".into()) }).unwrap();
        let monitor = store.root().active_monitor.unwrap();
        let first = store.root().maps.workspace_for_monitor(monitor).unwrap();
        let second = store.root().workspaces.find_by_name("two").unwrap();

        store.dispatch(SwitchWorkspaceTransform { monitor, workspace: second }).unwrap();
        let ops = fake.take_ops();
        assert!(ops.contains(&NativeOp::Hide(w1)));
        assert!(ops.contains(&NativeOp::Hide(w2)));

        // Coming back, the minimized member goes to the taskbar instead of
        // the screen.
        store.dispatch(SwitchWorkspaceTransform { monitor, workspace: first }).unwrap();
        let ops = fake.take_ops();
        assert!(ops.contains(&NativeOp::Show(w1)));
        assert!(ops.contains(&NativeOp::Minimize(w2)));
        assert!(!ops.contains(&NativeOp::Show(w2)));
        assert!(fake.is_minimized(w2));
        assert!(!fake.is_hidden(w2));
        assert!(!fake.is_hidden(w1));
    }

    #[test]
    fn moving_a_minimized_window_to_a_visible_workspace_keeps_it_minimized() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let mut store = booted_store(&fake);
        let w = WindowHandle::new(1);
        store.dispatch(WindowAddedTransform { info: window_info(1) }).unwrap();
        store.dispatch(AddWorkspaceTransform { name: Some("two".into()) }).unwrap();
        let monitor = store.root().active_monitor.unwrap();
        let second = store.root().workspaces.find_by_name("two").unwrap();

        // Hide the window's workspace, then minimize it behind the scenes.
        store.dispatch(SwitchWorkspaceTransform { monitor, workspace: second }).unwrap();
        store.dispatch(WindowMinimizedTransform { window: w, minimized: true }).unwrap();
        fake.take_ops();

        store.dispatch(MoveWindowToWorkspaceTransform { window: w, workspace: second }).unwrap();
        let ops = fake.take_ops();
        assert!(ops.contains(&NativeOp::Minimize(w)));
        assert!(!ops.contains(&NativeOp::Show(w)));
    }

    #[test]
    fn a_visible_workspace_cannot_be_removed() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let mut store = booted_store(&fake);
        let monitor = store.root().active_monitor.unwrap();
        let visible = store.root().maps.workspace_for_monitor(monitor).unwrap();
        let err = store
            .dispatch(RemoveWorkspaceTransform { workspace: visible })
            .unwrap_err();
        assert!(matches!(err, StoreError::InvariantViolation(_)));
        assert!(store.root().workspaces.contains(visible));
    }

    #[test]
    fn removal_migrates_windows_to_the_oldest_survivor() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let mut store = booted_store(&fake);
        store.dispatch(AddWorkspaceTransform { name: Some("doomed".into()) }).unwrap();
        let doomed = store.root().workspaces.find_by_name("doomed").unwrap();
        let w = WindowHandle::new(1);
        store.dispatch(WindowAddedTransform { info: window_info(1) }).unwrap();
        store.dispatch(MoveWindowToWorkspaceTransform { window: w, workspace: doomed }).unwrap();

        store.dispatch(RemoveWorkspaceTransform { workspace: doomed }).unwrap();
        let root = store.root();
        assert!(!root.workspaces.contains(doomed));
        let owner = root.maps.workspace_for_window(w).unwrap();
        assert!(root.workspaces.get(owner).unwrap().contains_window(w));
    }

    #[test]
    fn renaming_updates_lookup() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let mut store = booted_store(&fake);
        let monitor = store.root().active_monitor.unwrap();
        let ws = store.root().maps.workspace_for_monitor(monitor).unwrap();
        store
            .dispatch(RenameWorkspaceTransform { workspace: ws, name: "renamed".into() })
            .unwrap();
        assert_eq!(store.root().workspaces.find_by_name("renamed"), Some(ws));
        assert_eq!(store.root().workspaces.find_by_name("Workspace 1"), None);
    }

    #[test]
    fn engine_switching_relayouts_with_the_new_engine() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let mut store = booted_store(&fake);
        for id in 1..=2 {
            store.dispatch(WindowAddedTransform { info: window_info(id) }).unwrap();
        }
        fake.take_ops();
        let monitor = store.root().active_monitor.unwrap();
        let ws = store.root().maps.workspace_for_monitor(monitor).unwrap();

        // Default engines are column then tree; index 1 is the tree.
        store.dispatch(SetActiveEngineTransform { workspace: ws, index: 1 }).unwrap();
        assert_eq!(store.root().workspaces.get(ws).unwrap().active_engine_index(), 1);
        // Both engines hold both windows, so no window is lost.
        assert_eq!(store.root().workspaces.get(ws).unwrap().window_count(), 2);

        let err = store
            .dispatch(SetActiveEngineTransform { workspace: ws, index: 9 })
            .unwrap_err();
        assert!(matches!(err, StoreError::InvariantViolation(_)));
    }
}
