use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::geometry::{Point, Rect};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct MonitorHandle(NonZeroU64);

impl MonitorHandle {
    pub fn new(id: u64) -> MonitorHandle { MonitorHandle(NonZeroU64::new(id).unwrap()) }

    pub fn get(&self) -> u64 { self.0.get() }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct WindowHandle(NonZeroU64);

impl WindowHandle {
    pub fn new(id: u64) -> WindowHandle { WindowHandle(NonZeroU64::new(id).unwrap()) }

    pub fn get(&self) -> u64 { self.0.get() }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.get()) }
}

/// One physical display as reported by the platform layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorInfo {
    pub handle: MonitorHandle,
    pub name: String,
    /// Screen pixels usable by normal windows; excludes OS-reserved regions.
    pub work_area: Rect<i32>,
    pub scale_factor: f64,
    pub is_primary: bool,
}

/// One native top-level window as reported by the platform layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub handle: WindowHandle,
    pub title: String,
    pub process: String,
    pub class: String,
    pub minimized: bool,
    pub maximized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Enumeration reported zero monitors. Fatal at startup.
    #[error("platform reported zero monitors")]
    NoMonitors,
    #[error("window {0} is gone")]
    WindowGone(WindowHandle),
    #[error("platform call failed: {0}")]
    Backend(String),
}

/// A single deferred native operation. Operations are batched and applied
/// together so sequential per-window repositioning doesn't flicker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NativeOp {
    Position { window: WindowHandle, frame: Rect<i32> },
    /// Sends a window to the taskbar, unhiding it if we hid it earlier.
    /// Un-minimizing is always platform-initiated and arrives back as a
    /// `WindowRestored` event.
    Minimize(WindowHandle),
    Hide(WindowHandle),
    Show(WindowHandle),
}

impl NativeOp {
    pub fn window(&self) -> WindowHandle {
        match *self {
            NativeOp::Position { window, .. } => window,
            NativeOp::Minimize(window)
            | NativeOp::Hide(window)
            | NativeOp::Show(window) => window,
        }
    }
}

/// The native platform seam. The core only talks to the OS through this
/// trait; implementations marshal their event callbacks onto the reactor
/// channel so the store is only ever driven from one logical thread.
pub trait PlatformGateway: Send + Sync {
    fn enumerate_monitors(&self) -> Result<Vec<MonitorInfo>, GatewayError>;

    fn window_frame(&self, window: WindowHandle) -> Option<Rect<i32>>;

    fn foreground_window(&self) -> Option<WindowHandle>;

    fn monitor_from_point(&self, point: Point<i32>) -> Option<MonitorHandle>;

    fn monitor_from_window(&self, window: WindowHandle) -> Option<MonitorHandle>;

    /// Applies a batch of deferred operations. Returns one result per op, in
    /// order; callers log and skip individual failures.
    fn apply_ops(&self, ops: &[NativeOp]) -> Vec<Result<(), GatewayError>>;
}

/// Raw window event kinds, used both in `NativeEvent` and by the per-process
/// quirk state machines.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
pub enum WindowEventKind {
    Shown,
    Hidden,
    Destroyed,
    Cloaked,
    Uncloaked,
    Focused,
    MoveStarted,
    MoveEnded,
    Moved,
    MinimizeStarted,
    MinimizeEnded,
}

/// Events delivered by the platform layer, already marshaled onto the
/// dispatch thread. Serializable so traces can be recorded and replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NativeEvent {
    /// Display configuration changed: resolution, monitor added/removed,
    /// work area, or DPI.
    DisplaysChanged,
    SessionChanged { unlocked: bool },
    WindowShown(WindowInfo),
    WindowHidden(WindowHandle),
    WindowDestroyed(WindowHandle),
    WindowCloaked(WindowHandle),
    WindowUncloaked(WindowHandle),
    /// `None` means the foreground moved to an untracked or no window.
    WindowFocused(Option<WindowHandle>),
    WindowMoveStarted(WindowHandle),
    WindowMoveEnded(WindowHandle),
    WindowMoved { window: WindowHandle, frame: Rect<i32> },
    WindowMinimized(WindowHandle),
    WindowRestored(WindowHandle),
    MouseDown { pos: Point<i32> },
    MouseUp { pos: Point<i32> },
}

impl NativeEvent {
    /// The window event kind this event classifies as, if any. Quirk state
    /// machines operate on these.
    pub fn window_event(&self) -> Option<(WindowHandle, WindowEventKind)> {
        use WindowEventKind::*;
        match *self {
            NativeEvent::WindowShown(ref info) => Some((info.handle, Shown)),
            NativeEvent::WindowHidden(w) => Some((w, Hidden)),
            NativeEvent::WindowDestroyed(w) => Some((w, Destroyed)),
            NativeEvent::WindowCloaked(w) => Some((w, Cloaked)),
            NativeEvent::WindowUncloaked(w) => Some((w, Uncloaked)),
            NativeEvent::WindowFocused(Some(w)) => Some((w, Focused)),
            NativeEvent::WindowMoveStarted(w) => Some((w, MoveStarted)),
            NativeEvent::WindowMoveEnded(w) => Some((w, MoveEnded)),
            NativeEvent::WindowMoved { window, .. } => Some((window, Moved)),
            NativeEvent::WindowMinimized(w) => Some((w, MinimizeStarted)),
            NativeEvent::WindowRestored(w) => Some((w, MinimizeEnded)),
            _ => None,
        }
    }
}
