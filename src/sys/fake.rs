//! Scriptable in-memory platform gateway.
//!
//! Backs the test suite and the `--replay` tool; the real platform layer
//! lives outside this crate.

use parking_lot::Mutex;

use super::gateway::{
    GatewayError, MonitorHandle, MonitorInfo, NativeOp, PlatformGateway, WindowHandle,
};
use crate::common::collections::{HashMap, HashSet};
use crate::common::geometry::{Point, Rect};

#[derive(Default)]
struct FakeState {
    monitors: Vec<MonitorInfo>,
    frames: HashMap<WindowHandle, Rect<i32>>,
    minimized: HashSet<WindowHandle>,
    hidden: HashSet<WindowHandle>,
    foreground: Option<WindowHandle>,
    /// Windows whose native calls fail, to exercise skip-and-log paths.
    failing: HashSet<WindowHandle>,
    ops: Vec<NativeOp>,
}

#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<FakeState>,
}

impl FakePlatform {
    pub fn new() -> Self { Self::default() }

    /// Convenience constructor: one primary 1920x1080 monitor at the origin.
    pub fn with_single_monitor() -> Self {
        let fake = Self::new();
        fake.set_monitors(vec![monitor(1, "FAKE-1", Rect::new(0, 0, 1920, 1080), true)]);
        fake
    }

    pub fn set_monitors(&self, monitors: Vec<MonitorInfo>) {
        self.state.lock().monitors = monitors;
    }

    pub fn set_window_frame(&self, window: WindowHandle, frame: Rect<i32>) {
        self.state.lock().frames.insert(window, frame);
    }

    pub fn set_foreground(&self, window: Option<WindowHandle>) {
        self.state.lock().foreground = window;
    }

    pub fn fail_window(&self, window: WindowHandle) {
        self.state.lock().failing.insert(window);
    }

    /// Drains the recorded operation log.
    pub fn take_ops(&self) -> Vec<NativeOp> {
        std::mem::take(&mut self.state.lock().ops)
    }

    pub fn is_minimized(&self, window: WindowHandle) -> bool {
        self.state.lock().minimized.contains(&window)
    }

    pub fn is_hidden(&self, window: WindowHandle) -> bool {
        self.state.lock().hidden.contains(&window)
    }
}

pub fn monitor(id: u64, name: &str, work_area: Rect<i32>, is_primary: bool) -> MonitorInfo {
    MonitorInfo {
        handle: MonitorHandle::new(id),
        name: name.to_string(),
        work_area,
        scale_factor: 1.0,
        is_primary,
    }
}

impl PlatformGateway for FakePlatform {
    fn enumerate_monitors(&self) -> Result<Vec<MonitorInfo>, GatewayError> {
        Ok(self.state.lock().monitors.clone())
    }

    fn window_frame(&self, window: WindowHandle) -> Option<Rect<i32>> {
        self.state.lock().frames.get(&window).copied()
    }

    fn foreground_window(&self) -> Option<WindowHandle> { self.state.lock().foreground }

    fn monitor_from_point(&self, point: Point<i32>) -> Option<MonitorHandle> {
        let state = self.state.lock();
        state
            .monitors
            .iter()
            .find(|m| m.work_area.contains(point))
            .or_else(|| state.monitors.iter().find(|m| m.is_primary))
            .map(|m| m.handle)
    }

    fn monitor_from_window(&self, window: WindowHandle) -> Option<MonitorHandle> {
        let state = self.state.lock();
        let frame = state.frames.get(&window)?;
        let center = frame.center();
        state
            .monitors
            .iter()
            .find(|m| m.work_area.contains(center))
            .or_else(|| state.monitors.iter().find(|m| m.is_primary))
            .map(|m| m.handle)
    }

    fn apply_ops(&self, ops: &[NativeOp]) -> Vec<Result<(), GatewayError>> {
        let mut state = self.state.lock();
        ops.iter()
            .map(|op| {
                if state.failing.contains(&op.window()) {
                    return Err(GatewayError::WindowGone(op.window()));
                }
                match *op {
                    NativeOp::Position { window, frame } => {
                        state.frames.insert(window, frame);
                    }
                    NativeOp::Minimize(window) => {
                        state.minimized.insert(window);
                        state.hidden.remove(&window);
                    }
                    NativeOp::Hide(window) => {
                        state.hidden.insert(window);
                    }
                    NativeOp::Show(window) => {
                        state.hidden.remove(&window);
                    }
                }
                state.ops.push(op.clone());
                Ok(())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn failing_window_reports_error_without_aborting_batch() {
        let fake = FakePlatform::with_single_monitor();
        let bad = WindowHandle::new(7);
        let good = WindowHandle::new(8);
        fake.fail_window(bad);

        let results = fake.apply_ops(&[
            NativeOp::Position { window: bad, frame: Rect::new(0, 0, 10, 10) },
            NativeOp::Position { window: good, frame: Rect::new(10, 0, 10, 10) },
        ]);
        assert_eq!(results[0], Err(GatewayError::WindowGone(bad)));
        assert_eq!(results[1], Ok(()));
        assert_eq!(fake.window_frame(good), Some(Rect::new(10, 0, 10, 10)));
    }

    #[test]
    fn monitor_from_window_uses_center_point() {
        let fake = FakePlatform::new();
        fake.set_monitors(vec![
            monitor(1, "L", Rect::new(0, 0, 1920, 1080), true),
            monitor(2, "R", Rect::new(1920, 0, 1920, 1080), false),
        ]);
        let w = WindowHandle::new(3);
        fake.set_window_frame(w, Rect::new(1800, 0, 400, 400));
        assert_eq!(fake.monitor_from_window(w), Some(MonitorHandle::new(2)));
    }
}
