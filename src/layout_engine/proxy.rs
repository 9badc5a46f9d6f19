//! Decorator engines. A proxy wraps an inner engine, adjusts the rectangle
//! handed down and/or post-processes the result, and delegates all window
//! membership operations; cross-cutting layout concerns compose this way
//! without the base engines knowing about them.

use std::sync::Arc;

use super::engine::{Direction, LayoutEngine, WindowPlacement};
use crate::common::geometry::{Insets, Rect};
use crate::model::monitor::Monitor;
use crate::sys::gateway::WindowHandle;

/// Reserves a fixed number of pixels at the top of the rectangle (for a
/// status bar) before delegating to the inner engine.
#[derive(Debug, Clone)]
pub struct BarReserveEngine {
    inner: Arc<dyn LayoutEngine>,
    height: i32,
}

impl BarReserveEngine {
    pub fn new(inner: Arc<dyn LayoutEngine>, height: i32) -> Self {
        BarReserveEngine { inner, height }
    }

    fn rewrap(&self, inner: Arc<dyn LayoutEngine>) -> Arc<dyn LayoutEngine> {
        Arc::new(BarReserveEngine { inner, height: self.height })
    }
}

impl LayoutEngine for BarReserveEngine {
    fn name(&self) -> &'static str { self.inner.name() }

    fn do_layout(&self, rect: Rect<i32>, monitor: &Monitor) -> Vec<WindowPlacement> {
        let shrunk = Rect::new(
            rect.x,
            rect.y + self.height,
            rect.width,
            (rect.height - self.height).max(0),
        );
        self.inner.do_layout(shrunk, monitor)
    }

    fn add_window(&self, window: WindowHandle) -> Arc<dyn LayoutEngine> {
        self.rewrap(self.inner.add_window(window))
    }

    fn add_window_in_direction(
        &self,
        window: WindowHandle,
        direction: Direction,
    ) -> Arc<dyn LayoutEngine> {
        self.rewrap(self.inner.add_window_in_direction(window, direction))
    }

    fn remove_window(&self, window: WindowHandle) -> Arc<dyn LayoutEngine> {
        self.rewrap(self.inner.remove_window(window))
    }

    fn contains_window(&self, window: WindowHandle) -> bool {
        self.inner.contains_window(window)
    }

    fn windows(&self) -> Vec<WindowHandle> { self.inner.windows() }

    fn clone_engine(&self) -> Arc<dyn LayoutEngine> { Arc::new(self.clone()) }

    fn focus_window(&self, window: WindowHandle) -> Arc<dyn LayoutEngine> {
        self.rewrap(self.inner.focus_window(window))
    }

    fn equalize(&self) -> Arc<dyn LayoutEngine> { self.rewrap(self.inner.equalize()) }

    fn user_resized(
        &self,
        window: WindowHandle,
        old_frame: Rect<i32>,
        new_frame: Rect<i32>,
        area: Rect<i32>,
    ) -> Arc<dyn LayoutEngine> {
        let shrunk = Rect::new(
            area.x,
            area.y + self.height,
            area.width,
            (area.height - self.height).max(0),
        );
        self.rewrap(self.inner.user_resized(window, old_frame, new_frame, shrunk))
    }
}

/// Insets the whole area by the outer gaps, then shrinks each placement by
/// half the inner gap so adjacent windows end up `inner_gap` apart.
#[derive(Debug, Clone)]
pub struct GapEngine {
    inner: Arc<dyn LayoutEngine>,
    outer: Insets,
    inner_gap: i32,
}

impl GapEngine {
    pub fn new(inner: Arc<dyn LayoutEngine>, outer: Insets, inner_gap: i32) -> Self {
        GapEngine { inner, outer, inner_gap }
    }

    fn rewrap(&self, inner: Arc<dyn LayoutEngine>) -> Arc<dyn LayoutEngine> {
        Arc::new(GapEngine {
            inner,
            outer: self.outer,
            inner_gap: self.inner_gap,
        })
    }

    fn tiling_area(&self, rect: Rect<i32>) -> Rect<i32> {
        if self.outer.is_zero() { rect } else { rect.inset(self.outer) }
    }
}

impl LayoutEngine for GapEngine {
    fn name(&self) -> &'static str { self.inner.name() }

    fn do_layout(&self, rect: Rect<i32>, monitor: &Monitor) -> Vec<WindowPlacement> {
        let area = self.tiling_area(rect);
        let mut placements = self.inner.do_layout(area, monitor);
        if self.inner_gap > 0 {
            let margin = Insets::uniform(self.inner_gap / 2);
            for p in &mut placements {
                p.frame = p.frame.inset(margin);
            }
        }
        placements
    }

    fn add_window(&self, window: WindowHandle) -> Arc<dyn LayoutEngine> {
        self.rewrap(self.inner.add_window(window))
    }

    fn add_window_in_direction(
        &self,
        window: WindowHandle,
        direction: Direction,
    ) -> Arc<dyn LayoutEngine> {
        self.rewrap(self.inner.add_window_in_direction(window, direction))
    }

    fn remove_window(&self, window: WindowHandle) -> Arc<dyn LayoutEngine> {
        self.rewrap(self.inner.remove_window(window))
    }

    fn contains_window(&self, window: WindowHandle) -> bool {
        self.inner.contains_window(window)
    }

    fn windows(&self) -> Vec<WindowHandle> { self.inner.windows() }

    fn clone_engine(&self) -> Arc<dyn LayoutEngine> { Arc::new(self.clone()) }

    fn focus_window(&self, window: WindowHandle) -> Arc<dyn LayoutEngine> {
        self.rewrap(self.inner.focus_window(window))
    }

    fn equalize(&self) -> Arc<dyn LayoutEngine> { self.rewrap(self.inner.equalize()) }

    fn user_resized(
        &self,
        window: WindowHandle,
        old_frame: Rect<i32>,
        new_frame: Rect<i32>,
        area: Rect<i32>,
    ) -> Arc<dyn LayoutEngine> {
        self.rewrap(
            self.inner.user_resized(window, old_frame, new_frame, self.tiling_area(area)),
        )
    }
}
