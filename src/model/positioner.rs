//! Turns re-layout marks into native positioning calls. Runs at the end of
//! every successful dispatch, after all mutations and before events flush.

use tracing::{debug, warn};

use crate::model::events::StoreEvent;
use crate::model::sector::RootSector;
use crate::model::tx_store::{TransactionId, WindowTxStore};
use crate::model::window::{WindowPosition, WindowSizeState};
use crate::sys::gateway::{NativeOp, PlatformGateway};

pub(crate) fn flush(
    root: &mut RootSector,
    gateway: &dyn PlatformGateway,
    tx: &WindowTxStore,
    next_txid: &mut u64,
) {
    let mut ops = root.take_ops();

    // While a drag is in flight the engine would fight the user's mouse;
    // marks stay queued and are flushed by the move-ended transform.
    if root.dragging().is_none() {
        let marked = root.take_relayout();
        for ws_id in marked {
            let Some(monitor_handle) = root.maps.monitor_for_workspace(ws_id) else {
                continue;
            };
            let Some(monitor) = root.monitors.get(monitor_handle).cloned() else {
                continue;
            };
            let placements = match root.workspaces.get(ws_id) {
                Some(ws) => ws.active_engine().do_layout(monitor.work_area, &monitor),
                None => continue,
            };

            let mut moved = 0;
            for placement in placements {
                let minimized = root
                    .windows
                    .get(placement.window)
                    .is_some_and(|w| w.size_state == WindowSizeState::Minimized);
                if minimized {
                    continue;
                }
                let cached =
                    root.workspaces.get(ws_id).and_then(|ws| ws.position(placement.window));
                if cached.is_some_and(|p| {
                    p.frame == placement.frame && p.state == WindowSizeState::Normal
                }) {
                    continue;
                }
                *next_txid += 1;
                tx.insert(placement.window, TransactionId(*next_txid), placement.frame);
                ops.push(NativeOp::Position {
                    window: placement.window,
                    frame: placement.frame,
                });
                if let Some(ws) = root.workspaces.get_mut(ws_id) {
                    ws.set_position(placement.window, WindowPosition::normal(placement.frame));
                }
                moved += 1;
            }
            if moved > 0 {
                debug!(?ws_id, moved, "layout applied");
                root.queue_event(StoreEvent::LayoutApplied { workspace: ws_id, moved });
            }
        }
    }

    if ops.is_empty() {
        return;
    }
    let results = gateway.apply_ops(&ops);
    for (op, result) in ops.iter().zip(results) {
        if let Err(err) = result {
            // One stubborn window must not block the rest of the batch.
            warn!(window = %op.window(), %err, "native op failed, skipping");
            if let NativeOp::Position { window, .. } = op {
                tx.remove(*window);
            }
        }
    }
}
