use std::sync::Arc;

use super::engine::{LayoutEngine, WindowPlacement};
use crate::common::geometry::Rect;
use crate::model::monitor::Monitor;
use crate::sys::gateway::WindowHandle;

/// One primary window on the left, remaining windows stacked vertically on
/// the right. The first window in insertion order is the primary.
#[derive(Debug, Clone)]
pub struct SliceEngine {
    windows: Vec<WindowHandle>,
    primary_ratio: f64,
}

impl SliceEngine {
    pub fn new(primary_ratio: f64) -> Self {
        SliceEngine {
            windows: Vec::new(),
            primary_ratio: primary_ratio.clamp(0.05, 0.95),
        }
    }
}

impl LayoutEngine for SliceEngine {
    fn name(&self) -> &'static str { "slice" }

    fn do_layout(&self, rect: Rect<i32>, _monitor: &Monitor) -> Vec<WindowPlacement> {
        match self.windows.as_slice() {
            [] => Vec::new(),
            [only] => vec![WindowPlacement { window: *only, frame: rect }],
            [primary, rest @ ..] => {
                let primary_width =
                    (f64::from(rect.width) * self.primary_ratio).round() as i32;
                let mut out = vec![WindowPlacement {
                    window: *primary,
                    frame: Rect::new(rect.x, rect.y, primary_width, rect.height),
                }];
                let stack_x = rect.x + primary_width;
                let stack_width = rect.max_x() - stack_x;
                let n = rest.len() as i32;
                let row = rect.height / n;
                for (i, &window) in rest.iter().enumerate() {
                    let i = i as i32;
                    let y = rect.y + i * row;
                    let height = if i == n - 1 { rect.max_y() - y } else { row };
                    out.push(WindowPlacement {
                        window,
                        frame: Rect::new(stack_x, y, stack_width, height),
                    });
                }
                out
            }
        }
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
