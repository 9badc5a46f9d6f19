use std::sync::Arc;

use super::engine::{LayoutEngine, WindowPlacement};
use crate::common::geometry::Rect;
use crate::model::monitor::Monitor;
use crate::sys::gateway::WindowHandle;

/// Divides the rectangle into equal-width vertical columns, one per window,
/// left to right in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ColumnEngine {
    windows: Vec<WindowHandle>,
}

impl LayoutEngine for ColumnEngine {
    fn name(&self) -> &'static str { "column" }

    fn do_layout(&self, rect: Rect<i32>, _monitor: &Monitor) -> Vec<WindowPlacement> {
        let n = self.windows.len() as i32;
        if n == 0 {
            return Vec::new();
        }
        let column = rect.width / n;
        self.windows
            .iter()
            .enumerate()
            .map(|(i, &window)| {
                let i = i as i32;
                let x = rect.x + i * column;
                // The last column absorbs the rounding remainder.
                let width = if i == n - 1 { rect.max_x() - x } else { column };
                WindowPlacement {
                    window,
                    frame: Rect::new(x, rect.y, width, rect.height),
                }
            })
            .collect()
    }

    fn add_window(&self, window: WindowHandle) -> Arc<dyn LayoutEngine> {
        let mut next = self.clone();
        if !next.windows.contains(&window) {
            next.windows.push(window);
        }
        Arc::new(next)
    }

    fn remove_window(&self, window: WindowHandle) -> Arc<dyn LayoutEngine> {
        let mut next = self.clone();
        next.windows.retain(|&w| w != window);
        Arc::new(next)
    }

    fn contains_window(&self, window: WindowHandle) -> bool {
        self.windows.contains(&window)
    }

    fn windows(&self) -> Vec<WindowHandle> { self.windows.clone() }

    fn clone_engine(&self) -> Arc<dyn LayoutEngine> { Arc::new(self.clone()) }
}
