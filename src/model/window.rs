use serde::{Deserialize, Serialize};

use crate::common::collections::HashMap;
use crate::common::geometry::Rect;
use crate::sys::gateway::{WindowHandle, WindowInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSizeState {
    #[default]
    Normal,
    Minimized,
    Maximized,
}

/// One native top-level window under management.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub handle: WindowHandle,
    pub title: String,
    pub process: String,
    pub class: String,
    pub size_state: WindowSizeState,
}

impl From<WindowInfo> for Window {
    fn from(info: WindowInfo) -> Self {
        let size_state = if info.minimized {
            WindowSizeState::Minimized
        } else if info.maximized {
            WindowSizeState::Maximized
        } else {
            WindowSizeState::Normal
        };
        Window {
            handle: info.handle,
            title: info.title,
            process: info.process,
            class: info.class,
            size_state,
        }
    }
}

/// Last rectangle and size classification we applied or observed for a
/// window, kept per workspace. Used to detect externally-triggered moves
/// and to compute the minimal delta to apply.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowPosition {
    pub frame: Rect<i32>,
    pub state: WindowSizeState,
}

impl WindowPosition {
    pub fn normal(frame: Rect<i32>) -> Self {
        WindowPosition { frame, state: WindowSizeState::Normal }
    }
}

/// Authoritative collection of tracked windows, keyed by native handle.
#[derive(Debug, Default)]
pub struct WindowSector {
    windows: HashMap<WindowHandle, Window>,
}

impl WindowSector {
    pub fn insert(&mut self, window: Window) -> Option<Window> {
        self.windows.insert(window.handle, window)
    }

    pub fn remove(&mut self, handle: WindowHandle) -> Option<Window> {
        self.windows.remove(&handle)
    }

    pub fn get(&self, handle: WindowHandle) -> Option<&Window> { self.windows.get(&handle) }

    pub fn get_mut(&mut self, handle: WindowHandle) -> Option<&mut Window> {
        self.windows.get_mut(&handle)
    }

    pub fn contains(&self, handle: WindowHandle) -> bool {
        self.windows.contains_key(&handle)
    }

    pub fn len(&self) -> usize { self.windows.len() }

    pub fn is_empty(&self) -> bool { self.windows.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &Window> { self.windows.values() }
}
