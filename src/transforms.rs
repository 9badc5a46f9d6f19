//! Transforms are the only way to mutate the store. Each transform
//! validates against current state before touching anything, so a returned
//! error means nothing changed. Mutations stage re-layout marks, native ops,
//! and events on the root sector; the store flushes them after a successful
//! apply.

pub mod monitors;
pub mod windows;
pub mod workspaces;

use enum_dispatch::enum_dispatch;

use crate::common::config::{Config, Rules};
use crate::model::sector::RootSector;
use crate::model::store::StoreError;
use crate::model::tx_store::WindowTxStore;
use crate::sys::gateway::PlatformGateway;

pub use monitors::{MonitorsChangedTransform, MonitorsSettledTransform};
pub use windows::{
    DRAG_EDGE_SLOP_PX, EdgeFlags, MouseDownTransform, MoveClass, WindowAddedTransform,
    WindowFocusedTransform, WindowMinimizedTransform, WindowMoveEndedTransform,
    WindowMoveStartedTransform, WindowMovedTransform, WindowRemovedTransform, classify_move,
};
pub use workspaces::{
    AddWorkspaceTransform, CycleEngineTransform, EqualizeWorkspaceTransform,
    MoveWindowToWorkspaceTransform, RemoveWorkspaceTransform, RenameWorkspaceTransform,
    SetActiveEngineTransform, SwitchWorkspaceTransform,
};

/// Everything a transform may touch while applying.
pub struct TransformCtx<'a> {
    pub root: &'a mut RootSector,
    pub gateway: &'a dyn PlatformGateway,
    pub config: &'a Config,
    pub rules: &'a Rules,
    pub tx: &'a WindowTxStore,
}

#[enum_dispatch]
pub trait Apply {
    fn apply(&self, cx: &mut TransformCtx<'_>) -> Result<(), StoreError>;
}

#[enum_dispatch(Apply)]
#[derive(Debug, Clone)]
pub enum Transform {
    MonitorsChanged(MonitorsChangedTransform),
    MonitorsSettled(MonitorsSettledTransform),
    WindowAdded(WindowAddedTransform),
    WindowRemoved(WindowRemovedTransform),
    WindowFocused(WindowFocusedTransform),
    WindowMoved(WindowMovedTransform),
    WindowMoveStarted(WindowMoveStartedTransform),
    WindowMoveEnded(WindowMoveEndedTransform),
    WindowMinimized(WindowMinimizedTransform),
    MouseDown(MouseDownTransform),
    AddWorkspace(AddWorkspaceTransform),
    RemoveWorkspace(RemoveWorkspaceTransform),
    SwitchWorkspace(SwitchWorkspaceTransform),
    RenameWorkspace(RenameWorkspaceTransform),
    MoveWindowToWorkspace(MoveWindowToWorkspaceTransform),
    SetActiveEngine(SetActiveEngineTransform),
    CycleEngine(CycleEngineTransform),
    EqualizeWorkspace(EqualizeWorkspaceTransform),
}
