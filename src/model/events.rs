use crate::model::monitor::Monitor;
use crate::model::workspace::WorkspaceId;
use crate::sys::gateway::{MonitorHandle, WindowHandle};

/// Notifications delivered to subscribers after a transform commits. Events
/// describe state that has already been applied; handlers observing the
/// store see the post-transform world.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    MonitorsChanged {
        unchanged: Vec<Monitor>,
        added: Vec<Monitor>,
        removed: Vec<Monitor>,
    },
    WindowAdded {
        window: WindowHandle,
        workspace: WorkspaceId,
    },
    WindowRemoved {
        window: WindowHandle,
        workspace: WorkspaceId,
    },
    WindowFocused {
        window: Option<WindowHandle>,
        monitor: Option<MonitorHandle>,
    },
    WindowMovedToWorkspace {
        window: WindowHandle,
        from: WorkspaceId,
        to: WorkspaceId,
    },
    WorkspaceAdded {
        workspace: WorkspaceId,
        name: String,
    },
    WorkspaceRemoved {
        workspace: WorkspaceId,
    },
    WorkspaceRenamed {
        workspace: WorkspaceId,
        name: String,
    },
    WorkspaceShown {
        monitor: MonitorHandle,
        workspace: WorkspaceId,
        previous: Option<WorkspaceId>,
    },
    LayoutApplied {
        workspace: WorkspaceId,
        moved: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&StoreEvent) + Send>;

/// Ordered fan-out of committed events. Subscribers are invoked in
/// subscription order, synchronously, after all mutations flush.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventBus {
    pub fn subscribe(
        &mut self,
        handler: impl FnMut(&StoreEvent) + Send + 'static,
    ) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn emit(&mut self, event: &StoreEvent) {
        for (_, handler) in &mut self.subscribers {
            handler(event);
        }
    }
}
