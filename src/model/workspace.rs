use std::sync::Arc;

use slotmap::{SlotMap, new_key_type};

use crate::common::collections::{HashMap, HashSet};
use crate::common::geometry::Rect;
use crate::layout_engine::{Direction, LayoutEngine};
use crate::model::window::WindowPosition;
use crate::sys::gateway::WindowHandle;

new_key_type! {
    pub struct WorkspaceId;
}

/// A named group of windows with one layout engine per configured kind.
/// Every member window is present in every engine so switching the active
/// engine never loses windows; only the active engine produces placements.
#[derive(Debug)]
pub struct Workspace {
    pub name: String,
    engines: Vec<Arc<dyn LayoutEngine>>,
    active_engine: usize,
    windows: HashSet<WindowHandle>,
    positions: HashMap<WindowHandle, WindowPosition>,
    last_focused: Option<WindowHandle>,
    active: bool,
}

impl Workspace {
    pub fn new(name: String, engines: Vec<Arc<dyn LayoutEngine>>) -> Self {
        debug_assert!(!engines.is_empty());
        Workspace {
            name,
            engines,
            active_engine: 0,
            windows: HashSet::default(),
            positions: HashMap::default(),
            last_focused: None,
            active: false,
        }
    }

    pub fn active_engine(&self) -> &Arc<dyn LayoutEngine> {
        &self.engines[self.active_engine]
    }

    pub fn active_engine_index(&self) -> usize { self.active_engine }

    pub fn engine_count(&self) -> usize { self.engines.len() }

    pub fn engine_names(&self) -> Vec<&'static str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    pub fn set_active_engine(&mut self, index: usize) -> bool {
        if index < self.engines.len() {
            self.active_engine = index;
            true
        } else {
            false
        }
    }

    pub fn cycle_engine(&mut self, forward: bool) {
        let n = self.engines.len();
        self.active_engine = if forward {
            (self.active_engine + 1) % n
        } else {
            (self.active_engine + n - 1) % n
        };
    }

    pub fn add_window(&mut self, window: WindowHandle) {
        if self.windows.insert(window) {
            for engine in &mut self.engines {
                *engine = engine.add_window(window);
            }
        }
    }

    pub fn add_window_in_direction(&mut self, window: WindowHandle, direction: Direction) {
        if self.windows.insert(window) {
            for engine in &mut self.engines {
                *engine = engine.add_window_in_direction(window, direction);
            }
        }
    }

    pub fn remove_window(&mut self, window: WindowHandle) -> bool {
        if !self.windows.remove(&window) {
            return false;
        }
        for engine in &mut self.engines {
            *engine = engine.remove_window(window);
        }
        self.positions.remove(&window);
        if self.last_focused == Some(window) {
            self.last_focused = None;
        }
        true
    }

    /// Takes a member window out of every engine without giving up
    /// ownership. Used while a window is minimized.
    pub fn exclude_window(&mut self, window: WindowHandle) {
        if self.windows.contains(&window) {
            for engine in &mut self.engines {
                *engine = engine.remove_window(window);
            }
        }
    }

    /// Puts a previously excluded member window back into every engine.
    pub fn include_window(&mut self, window: WindowHandle) {
        if self.windows.contains(&window) {
            for engine in &mut self.engines {
                *engine = engine.add_window(window);
            }
        }
    }

    pub fn focus_window(&mut self, window: WindowHandle) {
        if self.windows.contains(&window) {
            self.last_focused = Some(window);
            for engine in &mut self.engines {
                *engine = engine.focus_window(window);
            }
        }
    }

    pub fn equalize(&mut self) {
        let engine = &mut self.engines[self.active_engine];
        *engine = engine.equalize();
    }

    pub fn user_resized(
        &mut self,
        window: WindowHandle,
        old_frame: Rect<i32>,
        new_frame: Rect<i32>,
        area: Rect<i32>,
    ) {
        let engine = &mut self.engines[self.active_engine];
        *engine = engine.user_resized(window, old_frame, new_frame, area);
    }

    pub fn contains_window(&self, window: WindowHandle) -> bool {
        self.windows.contains(&window)
    }

    pub fn windows(&self) -> impl Iterator<Item = WindowHandle> + '_ {
        self.windows.iter().copied()
    }

    pub fn window_count(&self) -> usize { self.windows.len() }

    pub fn last_focused(&self) -> Option<WindowHandle> { self.last_focused }

    pub fn position(&self, window: WindowHandle) -> Option<WindowPosition> {
        self.positions.get(&window).copied()
    }

    pub fn set_position(&mut self, window: WindowHandle, position: WindowPosition) {
        if self.windows.contains(&window) {
            self.positions.insert(window, position);
        }
    }

    pub fn is_active(&self) -> bool { self.active }

    pub fn set_active(&mut self, active: bool) { self.active = active; }
}

/// All workspaces, in a slotmap so ids stay stable across removals.
/// Creation order is tracked separately for deterministic reassignment
/// when monitors appear.
#[derive(Debug, Default)]
pub struct WorkspaceSector {
    workspaces: SlotMap<WorkspaceId, Workspace>,
    creation_order: Vec<WorkspaceId>,
    name_counter: usize,
}

impl WorkspaceSector {
    pub fn create(
        &mut self,
        name: Option<String>,
        engines: Vec<Arc<dyn LayoutEngine>>,
    ) -> WorkspaceId {
        let name = name.unwrap_or_else(|| {
            self.name_counter += 1;
            format!("Workspace {}", self.name_counter)
        });
        let id = self.workspaces.insert(Workspace::new(name, engines));
        self.creation_order.push(id);
        id
    }

    pub fn remove(&mut self, id: WorkspaceId) -> Option<Workspace> {
        let workspace = self.workspaces.remove(id)?;
        self.creation_order.retain(|&w| w != id);
        Some(workspace)
    }

    pub fn get(&self, id: WorkspaceId) -> Option<&Workspace> { self.workspaces.get(id) }

    pub fn get_mut(&mut self, id: WorkspaceId) -> Option<&mut Workspace> {
        self.workspaces.get_mut(id)
    }

    pub fn contains(&self, id: WorkspaceId) -> bool { self.workspaces.contains_key(id) }

    pub fn len(&self) -> usize { self.workspaces.len() }

    pub fn is_empty(&self) -> bool { self.workspaces.is_empty() }

    pub fn find_by_name(&self, name: &str) -> Option<WorkspaceId> {
        self.iter_created().find(|&(_, ws)| ws.name == name).map(|(id, _)| id)
    }

    /// Workspaces in creation order.
    pub fn iter_created(&self) -> impl Iterator<Item = (WorkspaceId, &Workspace)> {
        self.creation_order.iter().filter_map(|&id| Some((id, self.workspaces.get(id)?)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (WorkspaceId, &Workspace)> {
        self.workspaces.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (WorkspaceId, &mut Workspace)> {
        self.workspaces.iter_mut()
    }

    /// (id, name) pairs sorted by name, for UI listings.
    pub fn sorted_by_name(&self) -> Vec<(WorkspaceId, String)> {
        let mut out: Vec<_> = self
            .workspaces
            .iter()
            .map(|(id, ws)| (id, ws.name.clone()))
            .collect();
        out.sort_by(|a, b| a.1.cmp(&b.1));
        out
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::layout_engine::{ColumnEngine, TreeEngine};

    fn test_engines() -> Vec<Arc<dyn LayoutEngine>> {
        vec![Arc::new(ColumnEngine::default()), Arc::new(TreeEngine::default())]
    }

    #[test]
    fn auto_names_are_sequential() {
        let mut sector = WorkspaceSector::default();
        let a = sector.create(None, test_engines());
        let b = sector.create(None, test_engines());
        assert_eq!(sector.get(a).unwrap().name, "Workspace 1");
        assert_eq!(sector.get(b).unwrap().name, "Workspace 2");
    }

    #[test]
    fn windows_join_every_engine() {
        let mut sector = WorkspaceSector::default();
        let id = sector.create(Some("main".into()), test_engines());
        let ws = sector.get_mut(id).unwrap();
        let w = WindowHandle::new(7);
        ws.add_window(w);
        ws.set_active_engine(1);
        assert!(ws.active_engine().contains_window(w));
        ws.set_active_engine(0);
        assert!(ws.active_engine().contains_window(w));
    }

    #[test]
    fn removal_keeps_creation_order_consistent() {
        let mut sector = WorkspaceSector::default();
        let a = sector.create(Some("a".into()), test_engines());
        let b = sector.create(Some("b".into()), test_engines());
        let c = sector.create(Some("c".into()), test_engines());
        sector.remove(b);
        let order: Vec<_> = sector.iter_created().map(|(id, _)| id).collect();
        assert_eq!(order, vec![a, c]);
        assert_eq!(sector.find_by_name("b"), None);
    }

    #[test]
    fn cycle_engine_wraps_both_ways() {
        let mut sector = WorkspaceSector::default();
        let id = sector.create(None, test_engines());
        let ws = sector.get_mut(id).unwrap();
        ws.cycle_engine(true);
        assert_eq!(ws.active_engine_index(), 1);
        ws.cycle_engine(true);
        assert_eq!(ws.active_engine_index(), 0);
        ws.cycle_engine(false);
        assert_eq!(ws.active_engine_index(), 1);
    }
}
