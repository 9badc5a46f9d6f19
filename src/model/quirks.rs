//! Per-process workarounds for applications whose windows misbehave at the
//! event level. Each quirk is a small state machine attached to a window at
//! registration time; it sees every native event for that window before the
//! store does and decides whether the event is processed, dropped, or turns
//! into a removal.

use crate::common::collections::HashMap;
use crate::sys::gateway::{WindowEventKind, WindowHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// Handle the event normally.
    Process,
    /// Drop the event silently.
    Ignore,
    /// Stop tracking the window as if it were destroyed.
    Remove,
}

pub trait WindowEventResponder: Send {
    fn on_event(&mut self, kind: WindowEventKind) -> EventDisposition;
}

type ResponderFactory = Box<dyn Fn() -> Box<dyn WindowEventResponder> + Send + Sync>;

/// Maps process names to responder factories and owns the live responders.
/// First registered match wins; windows of unlisted processes pass through.
#[derive(Default)]
pub struct QuirkRegistry {
    factories: Vec<(String, ResponderFactory)>,
    active: HashMap<WindowHandle, Box<dyn WindowEventResponder>>,
}

impl std::fmt::Debug for QuirkRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuirkRegistry")
            .field("factories", &self.factories.len())
            .field("active", &self.active.len())
            .finish()
    }
}

impl QuirkRegistry {
    pub fn with_defaults() -> Self {
        let mut registry = QuirkRegistry::default();
        registry.register("msedgewebview2.exe", || Box::new(CloakChurnQuirk));
        registry.register("firefox.exe", || Box::new(PrerenderQuirk::default()));
        registry
    }

    pub fn register(
        &mut self,
        process: &str,
        factory: impl Fn() -> Box<dyn WindowEventResponder> + Send + Sync + 'static,
    ) {
        self.factories.push((process.to_ascii_lowercase(), Box::new(factory)));
    }

    /// Attaches a responder to a new window if its process has one.
    pub fn attach(&mut self, window: WindowHandle, process: &str) {
        let process = process.to_ascii_lowercase();
        if let Some((_, factory)) = self.factories.iter().find(|(p, _)| *p == process) {
            self.active.insert(window, factory());
        }
    }

    pub fn disposition(
        &mut self,
        window: WindowHandle,
        kind: WindowEventKind,
    ) -> EventDisposition {
        match self.active.get_mut(&window) {
            Some(responder) => responder.on_event(kind),
            None => EventDisposition::Process,
        }
    }

    pub fn forget(&mut self, window: WindowHandle) {
        self.active.remove(&window);
    }
}

/// WebView hosts cloak and uncloak their windows during composition without
/// any user-visible change; both events are noise.
struct CloakChurnQuirk;

impl WindowEventResponder for CloakChurnQuirk {
    fn on_event(&mut self, kind: WindowEventKind) -> EventDisposition {
        match kind {
            WindowEventKind::Cloaked | WindowEventKind::Uncloaked => EventDisposition::Ignore,
            _ => EventDisposition::Process,
        }
    }
}

/// Browsers pre-render pages in windows that are shown once, hidden
/// immediately, and never used again. A hide arriving before the window was
/// ever focused means the window should be dropped, not tracked as hidden.
#[derive(Default)]
struct PrerenderQuirk {
    focused_once: bool,
}

impl WindowEventResponder for PrerenderQuirk {
    fn on_event(&mut self, kind: WindowEventKind) -> EventDisposition {
        match kind {
            WindowEventKind::Focused => {
                self.focused_once = true;
                EventDisposition::Process
            }
            WindowEventKind::Hidden if !self.focused_once => EventDisposition::Remove,
            _ => EventDisposition::Process,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn unlisted_processes_pass_through() {
        let mut registry = QuirkRegistry::with_defaults();
        let w = WindowHandle::new(1);
        registry.attach(w, "notepad.exe");
        assert_eq!(
            registry.disposition(w, WindowEventKind::Hidden),
            EventDisposition::Process
        );
    }

    #[test]
    fn cloak_churn_is_ignored() {
        let mut registry = QuirkRegistry::with_defaults();
        let w = WindowHandle::new(2);
        registry.attach(w, "MSEdgeWebView2.EXE");
        assert_eq!(
            registry.disposition(w, WindowEventKind::Cloaked),
            EventDisposition::Ignore
        );
        assert_eq!(
            registry.disposition(w, WindowEventKind::Moved),
            EventDisposition::Process
        );
    }

    #[test]
    fn prerender_hide_removes_until_first_focus() {
        let mut registry = QuirkRegistry::with_defaults();
        let w = WindowHandle::new(3);
        registry.attach(w, "firefox.exe");
        assert_eq!(
            registry.disposition(w, WindowEventKind::Hidden),
            EventDisposition::Remove
        );

        let w2 = WindowHandle::new(4);
        registry.attach(w2, "firefox.exe");
        registry.disposition(w2, WindowEventKind::Focused);
        assert_eq!(
            registry.disposition(w2, WindowEventKind::Hidden),
            EventDisposition::Process
        );
    }

    #[test]
    fn forget_detaches_the_responder() {
        let mut registry = QuirkRegistry::with_defaults();
        let w = WindowHandle::new(5);
        registry.attach(w, "firefox.exe");
        registry.forget(w);
        assert_eq!(
            registry.disposition(w, WindowEventKind::Hidden),
            EventDisposition::Process
        );
    }
}
