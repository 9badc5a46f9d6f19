use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::common::config::{EngineKind, Settings};
use crate::common::geometry::Rect;
use crate::model::monitor::Monitor;
use crate::sys::gateway::WindowHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn axis(self) -> Axis {
        match self {
            Direction::Left | Direction::Right => Axis::Horizontal,
            Direction::Up | Direction::Down => Axis::Vertical,
        }
    }

    /// Whether the new window lands before the reference along the axis.
    pub fn is_leading(self) -> bool {
        matches!(self, Direction::Left | Direction::Up)
    }
}

/// One computed window position. Engines return fewer placements than held
/// windows only for windows that should not be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlacement {
    pub window: WindowHandle,
    pub frame: Rect<i32>,
}

/// A pure layout strategy over a persistent window set.
///
/// Engines are value-like: every mutation returns a new engine and leaves
/// previously returned instances untouched, so holders of an old reference
/// can diff before/after layouts. Implementations may share structure but
/// must never let an old reference observe a later mutation.
pub trait LayoutEngine: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Pure and deterministic; returns an empty sequence for an empty
    /// window set.
    fn do_layout(&self, rect: Rect<i32>, monitor: &Monitor) -> Vec<WindowPlacement>;

    fn add_window(&self, window: WindowHandle) -> Arc<dyn LayoutEngine>;

    /// Directional insert relative to the focused window. Engines without a
    /// notion of direction fall back to `add_window`.
    fn add_window_in_direction(
        &self,
        window: WindowHandle,
        _direction: Direction,
    ) -> Arc<dyn LayoutEngine> {
        self.add_window(window)
    }

    fn remove_window(&self, window: WindowHandle) -> Arc<dyn LayoutEngine>;

    fn contains_window(&self, window: WindowHandle) -> bool;

    fn windows(&self) -> Vec<WindowHandle>;

    fn window_count(&self) -> usize { self.windows().len() }

    /// Returns an identical engine. Used by the defaulted mutators below.
    fn clone_engine(&self) -> Arc<dyn LayoutEngine>;

    fn focus_window(&self, _window: WindowHandle) -> Arc<dyn LayoutEngine> {
        self.clone_engine()
    }

    /// Redistributes space evenly between windows where that is meaningful.
    fn equalize(&self) -> Arc<dyn LayoutEngine> { self.clone_engine() }

    /// Reacts to a user-initiated move/resize of `window` from `old_frame`
    /// to `new_frame` within `area`. Engines that track proportions adjust
    /// them; others ignore it.
    fn user_resized(
        &self,
        _window: WindowHandle,
        _old_frame: Rect<i32>,
        _new_frame: Rect<i32>,
        _area: Rect<i32>,
    ) -> Arc<dyn LayoutEngine> {
        self.clone_engine()
    }
}

/// Builds one engine from config, wrapped in the configured decorators.
pub fn build_engine(kind: EngineKind, settings: &Settings) -> Arc<dyn LayoutEngine> {
    use super::column::ColumnEngine;
    use super::proxy::{BarReserveEngine, GapEngine};
    use super::slice::SliceEngine;
    use super::tree::TreeEngine;

    let base: Arc<dyn LayoutEngine> = match kind {
        EngineKind::Column => Arc::new(ColumnEngine::default()),
        EngineKind::Tree => Arc::new(TreeEngine::new()),
        EngineKind::Slice => Arc::new(SliceEngine::new(settings.primary_ratio)),
    };
    let engine: Arc<dyn LayoutEngine> =
        if settings.inner_gap > 0 || !settings.outer_gaps.is_zero() {
            Arc::new(GapEngine::new(base, settings.outer_gaps, settings.inner_gap))
        } else {
            base
        };
    if settings.bar_height > 0 {
        Arc::new(BarReserveEngine::new(engine, settings.bar_height))
    } else {
        engine
    }
}

pub fn build_engines(kinds: &[EngineKind], settings: &Settings) -> Vec<Arc<dyn LayoutEngine>> {
    kinds.iter().map(|&kind| build_engine(kind, settings)).collect()
}
