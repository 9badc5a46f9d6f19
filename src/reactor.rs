//! The single-threaded event loop that drives the store. Platform callbacks
//! marshal onto an unbounded channel; the reactor applies them one at a
//! time, runs quirk state machines first, and owns the debounce timers for
//! monitor churn and session unlock.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace};

use crate::model::quirks::{EventDisposition, QuirkRegistry};
use crate::model::store::{Store, StoreError};
use crate::pickers::{DraggingWindow, MonitorsChangingCount};
use crate::sys::gateway::{NativeEvent, WindowEventKind, WindowHandle};
use crate::transforms::{
    MonitorsChangedTransform, MonitorsSettledTransform, MouseDownTransform,
    WindowAddedTransform, WindowFocusedTransform, WindowMinimizedTransform,
    WindowMoveEndedTransform, WindowMoveStartedTransform, WindowMovedTransform,
    WindowRemovedTransform,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    MonitorSettle,
    UnlockRefresh,
}

pub struct Reactor {
    store: Store,
    quirks: QuirkRegistry,
    /// Pending timers, sorted by deadline.
    timers: VecDeque<(Instant, TimerKind)>,
    shutdown: CancellationToken,
}

impl Reactor {
    pub fn new(store: Store, quirks: QuirkRegistry, shutdown: CancellationToken) -> Reactor {
        Reactor { store, quirks, timers: VecDeque::new(), shutdown }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn into_store(self) -> Store {
        self.store
    }

    pub async fn run(mut self, mut events: UnboundedReceiver<NativeEvent>) -> Store {
        info!("reactor started");
        loop {
            let next_deadline = self.timers.front().map(|&(deadline, _)| deadline);
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                maybe_event = events.recv() => match maybe_event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                _ = async { sleep_until(next_deadline.unwrap()).await },
                    if next_deadline.is_some() =>
                {
                    self.run_due_timers(Instant::now());
                }
            }
        }
        info!("reactor stopped");
        self.store
    }

    /// Applies one native event. Errors are logged, never propagated: a bad
    /// event must not take down the loop.
    pub fn handle_event(&mut self, event: NativeEvent) {
        trace!(?event, "native event");
        if let Err(err) = self.step(event) {
            error!(%err, "event dropped");
        }
    }

    /// Replays a recorded event trace synchronously, firing all pending
    /// timers after the last event so the outcome is deterministic.
    pub fn replay(&mut self, events: impl IntoIterator<Item = NativeEvent>) {
        for event in events {
            self.handle_event(event);
        }
        while let Some((_, kind)) = self.timers.pop_front() {
            self.fire_timer(kind);
        }
    }

    fn step(&mut self, event: NativeEvent) -> Result<(), StoreError> {
        if let Some((window, kind)) = event.window_event() {
            if let NativeEvent::WindowShown(ref info) = event {
                self.quirks.attach(window, &info.process);
            }
            match self.quirks.disposition(window, kind) {
                EventDisposition::Process => {}
                EventDisposition::Ignore => {
                    trace!(%window, %kind, "event suppressed by quirk");
                    return Ok(());
                }
                EventDisposition::Remove => {
                    self.quirks.forget(window);
                    return self.store.dispatch(WindowRemovedTransform { window });
                }
            }
            if kind == WindowEventKind::Destroyed {
                self.quirks.forget(window);
            }
        }

        match event {
            NativeEvent::DisplaysChanged => self.refresh_monitors(),
            NativeEvent::SessionChanged { unlocked } => {
                if unlocked {
                    // Work areas are often stale right after unlock; check
                    // again once the desktop has settled.
                    let delay = Duration::from_millis(
                        self.store.config().settings.unlock_refresh_ms,
                    );
                    self.schedule(delay, TimerKind::UnlockRefresh);
                }
                Ok(())
            }
            NativeEvent::WindowShown(info) => {
                self.store.dispatch(WindowAddedTransform { info })
            }
            NativeEvent::WindowHidden(window) | NativeEvent::WindowCloaked(window) => {
                if self.hidden_by_us(window) {
                    Ok(())
                } else {
                    self.store.dispatch(WindowRemovedTransform { window })
                }
            }
            NativeEvent::WindowDestroyed(window) => {
                self.store.dispatch(WindowRemovedTransform { window })
            }
            NativeEvent::WindowUncloaked(_) => Ok(()),
            NativeEvent::WindowFocused(window) => {
                self.store.dispatch(WindowFocusedTransform { window })
            }
            NativeEvent::WindowMoveStarted(window) => {
                self.store.dispatch(WindowMoveStartedTransform { window })
            }
            NativeEvent::WindowMoveEnded(window) => {
                self.store.dispatch(WindowMoveEndedTransform { window })
            }
            NativeEvent::WindowMoved { window, frame } => {
                self.store.dispatch(WindowMovedTransform { window, frame })
            }
            NativeEvent::WindowMinimized(window) => {
                self.store.dispatch(WindowMinimizedTransform { window, minimized: true })
            }
            NativeEvent::WindowRestored(window) => {
                self.store.dispatch(WindowMinimizedTransform { window, minimized: false })
            }
            NativeEvent::MouseDown { pos } => {
                self.store.dispatch(MouseDownTransform { pos })
            }
            NativeEvent::MouseUp { .. } => {
                // Some platforms drop the move-ended notification; the mouse
                // release is the ground truth that the drag is over.
                match self.store.pick(DraggingWindow)? {
                    Some(window) => {
                        self.store.dispatch(WindowMoveEndedTransform { window })
                    }
                    None => Ok(()),
                }
            }
        }
    }

    /// True when the hide was our own doing (the window sits on a workspace
    /// we swapped off screen), so the event must not untrack it.
    fn hidden_by_us(&self, window: WindowHandle) -> bool {
        let root = self.store.root();
        root.maps
            .workspace_for_window(window)
            .is_some_and(|ws| !root.maps.is_workspace_visible(ws))
    }

    fn refresh_monitors(&mut self) -> Result<(), StoreError> {
        let before = self.store.pick(MonitorsChangingCount)?;
        self.store.dispatch(MonitorsChangedTransform)?;
        let after = self.store.pick(MonitorsChangingCount)?;
        if after > before {
            let delay =
                Duration::from_millis(self.store.config().settings.monitor_settle_ms);
            self.schedule(delay, TimerKind::MonitorSettle);
        }
        Ok(())
    }

    fn schedule(&mut self, delay: Duration, kind: TimerKind) {
        let deadline = Instant::now() + delay;
        let position = self.timers.partition_point(|&(d, _)| d <= deadline);
        self.timers.insert(position, (deadline, kind));
    }

    pub fn run_due_timers(&mut self, now: Instant) {
        while let Some(&(deadline, kind)) = self.timers.front() {
            if deadline > now {
                break;
            }
            self.timers.pop_front();
            self.fire_timer(kind);
        }
    }

    fn fire_timer(&mut self, kind: TimerKind) {
        let result = match kind {
            TimerKind::MonitorSettle => self.store.dispatch(MonitorsSettledTransform),
            TimerKind::UnlockRefresh => self.refresh_monitors(),
        };
        if let Err(err) = result {
            error!(%err, ?kind, "timer dispatch failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::common::config::Config;
    use crate::common::geometry::Rect;
    use crate::sys::fake::{FakePlatform, monitor};
    use crate::sys::gateway::{NativeOp, WindowInfo};

    fn window_info(id: u64, process: &str) -> WindowInfo {
        WindowInfo {
            handle: WindowHandle::new(id),
            title: format!("window {id}"),
            process: process.into(),
            class: "AppClass".into(),
            minimized: false,
            maximized: false,
        }
    }

    fn booted_reactor(fake: &Arc<FakePlatform>) -> Reactor {
        let store = Store::new(fake.clone(), Config::default()).unwrap();
        let mut reactor =
            Reactor::new(store, QuirkRegistry::with_defaults(), CancellationToken::new());
        reactor.handle_event(NativeEvent::DisplaysChanged);
        reactor
    }

    #[tokio::test(start_paused = true)]
    async fn monitor_churn_collapses_into_one_relayout() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let mut reactor = booted_reactor(&fake);
        tokio::time::advance(Duration::from_millis(1100)).await;
        reactor.run_due_timers(Instant::now());
        reactor.handle_event(NativeEvent::WindowShown(window_info(1, "app.exe")));
        fake.take_ops();

        // A burst of geometry changes within the settle window.
        for width in [1600, 1700, 1800] {
            fake.set_monitors(vec![monitor(1, "FAKE-1", Rect::new(0, 0, width, 1080), true)]);
            reactor.handle_event(NativeEvent::DisplaysChanged);
            tokio::time::advance(Duration::from_millis(200)).await;
            reactor.run_due_timers(Instant::now());
        }
        // Nothing due yet; the last change reset the trailing edge.
        assert!(fake.take_ops().is_empty());

        tokio::time::advance(Duration::from_millis(1100)).await;
        reactor.run_due_timers(Instant::now());
        let ops = fake.take_ops();
        assert_eq!(
            ops,
            vec![NativeOp::Position {
                window: WindowHandle::new(1),
                frame: Rect::new(0, 0, 1800, 1080),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unlock_schedules_a_deferred_refresh() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let mut reactor = booted_reactor(&fake);
        tokio::time::advance(Duration::from_millis(1100)).await;
        reactor.run_due_timers(Instant::now());

        fake.set_monitors(vec![monitor(1, "FAKE-1", Rect::new(0, 0, 2560, 1440), true)]);
        reactor.handle_event(NativeEvent::SessionChanged { unlocked: true });
        assert_eq!(reactor.store().root().monitors.iter().next().unwrap().work_area.width, 1920);

        // The refresh fires after the configured delay and picks up the new
        // geometry, then schedules its own settle timer.
        tokio::time::advance(Duration::from_millis(3100)).await;
        reactor.run_due_timers(Instant::now());
        assert_eq!(reactor.store().root().monitors.iter().next().unwrap().work_area.width, 2560);
    }

    #[test]
    fn quirk_removal_untracks_the_window() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let store = Store::new(fake.clone(), Config::default()).unwrap();
        let mut reactor =
            Reactor::new(store, QuirkRegistry::with_defaults(), CancellationToken::new());
        reactor.handle_event(NativeEvent::DisplaysChanged);

        reactor.handle_event(NativeEvent::WindowShown(window_info(1, "firefox.exe")));
        assert_eq!(reactor.store().root().windows.len(), 1);
        // A hide before the first focus means a pre-render window.
        reactor.handle_event(NativeEvent::WindowHidden(WindowHandle::new(1)));
        assert_eq!(reactor.store().root().windows.len(), 0);
    }

    #[test]
    fn our_own_hides_do_not_untrack_windows() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let mut reactor = booted_reactor(&fake);
        reactor.handle_event(NativeEvent::WindowShown(window_info(1, "app.exe")));

        use crate::transforms::{AddWorkspaceTransform, SwitchWorkspaceTransform};
        reactor
            .store_mut()
            .dispatch(AddWorkspaceTransform { name: Some("two".into()) })
            .unwrap();
        let monitor = reactor.store().root().active_monitor.unwrap();
        let two = reactor.store().root().workspaces.find_by_name("two").unwrap();
        reactor
            .store_mut()
            .dispatch(SwitchWorkspaceTransform { monitor, workspace: two })
            .unwrap();

        // The platform echoes our hide; the window must stay tracked.
        reactor.handle_event(NativeEvent::WindowHidden(WindowHandle::new(1)));
        assert_eq!(reactor.store().root().windows.len(), 1);
    }

    #[test]
    fn mouse_up_ends_an_orphaned_drag() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let mut reactor = booted_reactor(&fake);
        reactor.handle_event(NativeEvent::WindowShown(window_info(1, "app.exe")));
        let w = WindowHandle::new(1);
        reactor.handle_event(NativeEvent::WindowMoveStarted(w));
        assert_eq!(reactor.store().pick(DraggingWindow).unwrap(), Some(w));

        reactor.handle_event(NativeEvent::MouseUp { pos: crate::common::geometry::Point::new(5, 5) });
        assert_eq!(reactor.store().pick(DraggingWindow).unwrap(), None);
    }

    #[test]
    fn replay_applies_a_trace_deterministically() {
        let fake = Arc::new(FakePlatform::with_single_monitor());
        let store = Store::new(fake.clone(), Config::default()).unwrap();
        let mut reactor =
            Reactor::new(store, QuirkRegistry::with_defaults(), CancellationToken::new());
        reactor.replay(vec![
            NativeEvent::DisplaysChanged,
            NativeEvent::WindowShown(window_info(1, "a.exe")),
            NativeEvent::WindowShown(window_info(2, "b.exe")),
            NativeEvent::WindowDestroyed(WindowHandle::new(1)),
        ]);
        let root = reactor.store().root();
        assert_eq!(root.windows.len(), 1);
        assert_eq!(root.monitors_changing, 0);
    }
}
