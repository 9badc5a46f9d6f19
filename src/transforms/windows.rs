//! Window lifecycle and movement transforms.

use bitflags::bitflags;
use tracing::{debug, trace, warn};

use super::{Apply, TransformCtx};
use crate::common::geometry::{Point, Rect};
use crate::model::events::StoreEvent;
use crate::model::store::StoreError;
use crate::model::window::{Window, WindowPosition, WindowSizeState};
use crate::sys::gateway::{NativeOp, WindowHandle, WindowInfo};

/// Edge movement below this many pixels is treated as event jitter.
pub const DRAG_EDGE_SLOP_PX: i32 = 2;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EdgeFlags: u8 {
        const LEFT = 1;
        const RIGHT = 1 << 1;
        const TOP = 1 << 2;
        const BOTTOM = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveClass {
    Unchanged,
    /// Same size, different origin.
    Translated,
    /// Only the listed edges moved, at most one per axis.
    Resized(EdgeFlags),
    /// Both edges of one axis moved by different amounts; the event stream
    /// is lying to us (often a DPI change mid-drag). Not actionable.
    Unreliable,
}

/// Classifies a frame change by which edges moved beyond the slop.
pub fn classify_move(old: Rect<i32>, new: Rect<i32>) -> MoveClass {
    let dl = new.x - old.x;
    let dt = new.y - old.y;
    let dr = new.max_x() - old.max_x();
    let db = new.max_y() - old.max_y();
    let moved = |d: i32| d.abs() > DRAG_EDGE_SLOP_PX;

    if !moved(dl) && !moved(dr) && !moved(dt) && !moved(db) {
        return MoveClass::Unchanged;
    }
    if (dl - dr).abs() <= DRAG_EDGE_SLOP_PX && (dt - db).abs() <= DRAG_EDGE_SLOP_PX {
        return MoveClass::Translated;
    }
    let mut edges = EdgeFlags::empty();
    if moved(dl) {
        edges |= EdgeFlags::LEFT;
    }
    if moved(dr) {
        edges |= EdgeFlags::RIGHT;
    }
    if moved(dt) {
        edges |= EdgeFlags::TOP;
    }
    if moved(db) {
        edges |= EdgeFlags::BOTTOM;
    }
    if edges.contains(EdgeFlags::LEFT | EdgeFlags::RIGHT)
        || edges.contains(EdgeFlags::TOP | EdgeFlags::BOTTOM)
    {
        return MoveClass::Unreliable;
    }
    MoveClass::Resized(edges)
}

/// A new native window appeared. Filters drop it, routers pick its
/// workspace, otherwise it lands on the active monitor's workspace.
#[derive(Debug, Clone)]
pub struct WindowAddedTransform {
    pub info: WindowInfo,
}

impl Apply for WindowAddedTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        if cx.rules.is_filtered(&self.info) {
            trace!(window = %self.info.handle, process = %self.info.process, "filtered");
            return Ok(());
        }
        if cx.root.windows.contains(self.info.handle) {
            return Ok(());
        }

        let routed = cx
            .rules
            .route(&self.info)
            .and_then(|name| cx.root.workspaces.find_by_name(name));
        let target = routed
            .or_else(|| {
                cx.root
                    .active_monitor
                    .and_then(|m| cx.root.maps.workspace_for_monitor(m))
            })
            .or_else(|| {
                cx.root
                    .monitors
                    .primary()
                    .and_then(|m| cx.root.maps.workspace_for_monitor(m.handle))
            })
            .or_else(|| cx.root.workspaces.iter_created().next().map(|(id, _)| id))
            .ok_or_else(|| {
                StoreError::InvariantViolation("no workspace to place a window in".into())
            })?;

        let handle = self.info.handle;
        cx.root.windows.insert(Window::from(self.info.clone()));
        cx.root.assign_window(handle, target, None)?;
        if self.info.minimized {
            // Already-minimized windows are tracked but take no tile.
            if let Some(ws) = cx.root.workspaces.get_mut(target) {
                ws.exclude_window(handle);
            }
        }
        if let Some(frame) = cx.gateway.window_frame(handle) {
            let state = cx
                .root
                .windows
                .get(handle)
                .map(|w| w.size_state)
                .unwrap_or_default();
            if let Some(ws) = cx.root.workspaces.get_mut(target) {
                ws.set_position(handle, WindowPosition { frame, state });
            }
        }

        if cx.root.maps.is_workspace_visible(target) {
            cx.root.mark_relayout(target);
        } else {
            cx.root.push_op(NativeOp::Hide(handle));
        }
        debug!(window = %handle, workspace = ?target, "window added");
        cx.root.queue_event(StoreEvent::WindowAdded { window: handle, workspace: target });
        Ok(())
    }
}

/// A tracked window is gone (destroyed, or a quirk decided it should be
/// treated as gone). Unknown handles are ignored.
#[derive(Debug, Clone)]
pub struct WindowRemovedTransform {
    pub window: WindowHandle,
}

impl Apply for WindowRemovedTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        if cx.root.windows.remove(self.window).is_none() {
            return Ok(());
        }
        cx.tx.remove(self.window);
        if cx.root.dragging() == Some(self.window) {
            cx.root.set_dragging(None);
        }
        if let Some(workspace) = cx.root.unassign_window(self.window) {
            if cx.root.maps.is_workspace_visible(workspace) {
                cx.root.mark_relayout(workspace);
            }
            cx.root.queue_event(StoreEvent::WindowRemoved { window: self.window, workspace });
        }
        Ok(())
    }
}

/// Foreground focus moved. Tracks the active monitor and feeds engine focus
/// so directional operations have an anchor.
#[derive(Debug, Clone)]
pub struct WindowFocusedTransform {
    pub window: Option<WindowHandle>,
}

impl Apply for WindowFocusedTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        // Some platforms report focus loss as `None` even though a window
        // holds the foreground; ask the OS before giving up.
        let window = self.window.or_else(|| cx.gateway.foreground_window());
        if let Some(window) = window {
            if let Some(workspace) = cx.root.maps.workspace_for_window(window) {
                if let Some(ws) = cx.root.workspaces.get_mut(workspace) {
                    ws.focus_window(window);
                }
                if let Some(monitor) = cx.root.maps.monitor_for_workspace(workspace) {
                    cx.root.active_monitor = Some(monitor);
                }
            } else if let Some(monitor) = cx.gateway.monitor_from_window(window) {
                // Untracked windows still move the active monitor.
                if cx.root.monitors.contains(monitor) {
                    cx.root.active_monitor = Some(monitor);
                }
            }
        } else {
            cx.root.active_monitor = cx.root.monitors.primary().map(|m| m.handle);
        }
        cx.root.queue_event(StoreEvent::WindowFocused {
            window,
            monitor: cx.root.active_monitor,
        });
        Ok(())
    }
}

/// The pointer went down. A press that lands on another monitor moves the
/// active monitor even when it hits no tracked window.
#[derive(Debug, Clone)]
pub struct MouseDownTransform {
    pub pos: Point<i32>,
}

impl Apply for MouseDownTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        if let Some(monitor) = cx.gateway.monitor_from_point(self.pos) {
            if cx.root.monitors.contains(monitor) {
                cx.root.active_monitor = Some(monitor);
            }
        }
        Ok(())
    }
}

fn handle_observed_frame(
    cx: &mut TransformCtx<'_>,
    window: WindowHandle,
    frame: Rect<i32>,
) -> Result<(), StoreError> {
    let Some(workspace) = cx.root.maps.workspace_for_window(window) else {
        return Ok(());
    };

    // Frames we asked for echo back as move events; they must not feed the
    // drag heuristic or we would loop.
    if let Some(record) = cx.tx.get(window) {
        if record.target == frame {
            cx.tx.remove(window);
            if let Some(ws) = cx.root.workspaces.get_mut(workspace) {
                ws.set_position(window, WindowPosition::normal(frame));
            }
        }
        // A non-matching frame while a request is in flight is an
        // intermediate animation step; the final echo clears the record.
        return Ok(());
    }

    let cached = cx.root.workspaces.get(workspace).and_then(|ws| ws.position(window));
    let Some(cached) = cached else {
        if let Some(ws) = cx.root.workspaces.get_mut(workspace) {
            ws.set_position(window, WindowPosition::normal(frame));
        }
        return Ok(());
    };

    match classify_move(cached.frame, frame) {
        MoveClass::Unchanged => {}
        MoveClass::Translated => {
            if let Some(ws) = cx.root.workspaces.get_mut(workspace) {
                ws.set_position(window, WindowPosition::normal(frame));
            }
            // Engines own placement; a re-layout snaps the window back.
            cx.root.mark_relayout(workspace);
        }
        MoveClass::Resized(edges) => {
            trace!(%window, ?edges, "user resize");
            let area = cx
                .root
                .maps
                .monitor_for_workspace(workspace)
                .and_then(|m| cx.root.monitors.get(m))
                .map(|m| m.work_area);
            if let Some(area) = area {
                if let Some(ws) = cx.root.workspaces.get_mut(workspace) {
                    ws.user_resized(window, cached.frame, frame, area);
                    ws.set_position(window, WindowPosition::normal(frame));
                }
                cx.root.mark_relayout(workspace);
            }
        }
        MoveClass::Unreliable => {
            warn!(%window, old = ?cached.frame, new = ?frame, "inconsistent move event, ignoring");
        }
    }
    Ok(())
}

/// A window's frame changed outside our own positioning requests.
#[derive(Debug, Clone)]
pub struct WindowMovedTransform {
    pub window: WindowHandle,
    pub frame: Rect<i32>,
}

impl Apply for WindowMovedTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        handle_observed_frame(cx, self.window, self.frame)
    }
}

/// The user started dragging a window. Layout flushes are held until the
/// drag ends so the engine doesn't fight the mouse.
#[derive(Debug, Clone)]
pub struct WindowMoveStartedTransform {
    pub window: WindowHandle,
}

impl Apply for WindowMoveStartedTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        if cx.root.windows.contains(self.window) {
            cx.root.set_dragging(Some(self.window));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct WindowMoveEndedTransform {
    pub window: WindowHandle,
}

impl Apply for WindowMoveEndedTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        if cx.root.dragging() == Some(self.window) {
            cx.root.set_dragging(None);
        }
        if let Some(frame) = cx.gateway.window_frame(self.window) {
            handle_observed_frame(cx, self.window, frame)?;
        }
        if let Some(workspace) = cx.root.maps.workspace_for_window(self.window) {
            if cx.root.maps.is_workspace_visible(workspace) {
                cx.root.mark_relayout(workspace);
            }
        }
        Ok(())
    }
}

/// Minimize state changed from the native side.
#[derive(Debug, Clone)]
pub struct WindowMinimizedTransform {
    pub window: WindowHandle,
    pub minimized: bool,
}

impl Apply for WindowMinimizedTransform {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError> {
        let Some(window) = cx.root.windows.get_mut(self.window) else {
            return Ok(());
        };
        let state = if self.minimized {
            WindowSizeState::Minimized
        } else {
            WindowSizeState::Normal
        };
        window.size_state = state;
        if let Some(workspace) = cx.root.maps.workspace_for_window(self.window) {
            if let Some(ws) = cx.root.workspaces.get_mut(workspace) {
                // Minimized windows keep their workspace but leave the
                // engines so the rest reclaim the space.
                if self.minimized {
                    ws.exclude_window(self.window);
                } else {
                    ws.include_window(self.window);
                }
                if let Some(mut position) = ws.position(self.window) {
                    position.state = state;
                    ws.set_position(self.window, position);
                }
            }
            if cx.root.maps.is_workspace_visible(workspace) {
                cx.root.mark_relayout(workspace);
            } else if !self.minimized {
                // Restored behind our back while its workspace is off
                // screen; it must stay hidden until the workspace shows.
                cx.root.push_op(NativeOp::Hide(self.window));
            }
        }
        Ok(())
    }
}
