//! Best-effort layout persistence. On shutdown we snapshot workspace names,
//! active engines, and window frames as work-area fractions; on startup a
//! matching window (same process and title) gets its old fractional frame
//! back before the first layout pass. Anything that fails to match is
//! simply laid out fresh.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::geometry::FracRect;
use crate::model::sector::RootSector;
use crate::model::window::WindowPosition;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub title: String,
    pub process: String,
    pub frac: FracRect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    pub name: String,
    pub active_engine: usize,
    pub windows: Vec<WindowSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub version: u32,
    pub workspaces: Vec<WorkspaceSnapshot>,
}

pub fn capture(root: &RootSector) -> LayoutSnapshot {
    let mut workspaces = Vec::new();
    for (id, ws) in root.workspaces.iter_created() {
        // Fractions are relative to the showing monitor; fall back to the
        // primary for workspaces that are not currently visible.
        let work_area = root
            .maps
            .monitor_for_workspace(id)
            .and_then(|m| root.monitors.get(m))
            .or_else(|| root.monitors.primary())
            .map(|m| m.work_area);
        let mut windows = Vec::new();
        if let Some(work_area) = work_area {
            for window in ws.windows() {
                let Some(position) = ws.position(window) else { continue };
                let Some(frac) = FracRect::from_pixels(position.frame, work_area) else {
                    continue;
                };
                let Some(info) = root.windows.get(window) else { continue };
                windows.push(WindowSnapshot {
                    title: info.title.clone(),
                    process: info.process.clone(),
                    frac,
                });
            }
        }
        workspaces.push(WorkspaceSnapshot {
            name: ws.name.clone(),
            active_engine: ws.active_engine_index(),
            windows,
        });
    }
    LayoutSnapshot { version: SNAPSHOT_VERSION, workspaces }
}

pub fn save(path: &Path, snapshot: &LayoutSnapshot) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let contents = ron::ser::to_string_pretty(snapshot, Default::default())?;
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn load(path: &Path) -> anyhow::Result<LayoutSnapshot> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let snapshot: LayoutSnapshot = ron::from_str(&contents)?;
    anyhow::ensure!(
        snapshot.version == SNAPSHOT_VERSION,
        "unsupported snapshot version {}",
        snapshot.version
    );
    Ok(snapshot)
}

/// Applies a snapshot to already-tracked windows. Matching is by workspace
/// name, then process plus title; each snapshot entry seeds at most one
/// window.
pub fn seed_positions(root: &mut RootSector, snapshot: &LayoutSnapshot) {
    for ws_snapshot in &snapshot.workspaces {
        let Some(id) = root.workspaces.find_by_name(&ws_snapshot.name) else { continue };
        let work_area = root
            .maps
            .monitor_for_workspace(id)
            .and_then(|m| root.monitors.get(m))
            .or_else(|| root.monitors.primary())
            .map(|m| m.work_area);
        let Some(work_area) = work_area else { continue };

        let members: Vec<_> = root
            .workspaces
            .get(id)
            .map(|ws| ws.windows().collect())
            .unwrap_or_default();
        let mut unmatched = members;
        for entry in &ws_snapshot.windows {
            let Some(pos) = unmatched.iter().position(|&w| {
                root.windows
                    .get(w)
                    .is_some_and(|info| info.process == entry.process && info.title == entry.title)
            }) else {
                continue;
            };
            let window = unmatched.swap_remove(pos);
            let frame = entry.frac.to_pixels(work_area);
            if let Some(ws) = root.workspaces.get_mut(id) {
                ws.set_position(window, WindowPosition::normal(frame));
            }
            debug!(%window, workspace = %ws_snapshot.name, "seeded restored frame");
        }
        if let Some(ws) = root.workspaces.get_mut(id) {
            ws.set_active_engine(ws_snapshot.active_engine);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::common::geometry::Rect;

    fn sample() -> LayoutSnapshot {
        LayoutSnapshot {
            version: SNAPSHOT_VERSION,
            workspaces: vec![WorkspaceSnapshot {
                name: "code".into(),
                active_engine: 1,
                windows: vec![WindowSnapshot {
                    title: "main.rs".into(),
                    process: "editor.exe".into(),
                    frac: FracRect::from_pixels(
                        Rect::new(0, 0, 960, 1080),
                        Rect::new(0, 0, 1920, 1080),
                    )
                    .unwrap(),
                }],
            }],
        }
    }

    #[test]
    fn snapshot_round_trips_through_ron() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.ron");
        let snapshot = sample();
        save(&path, &snapshot).unwrap();
        assert_eq!(load(&path).unwrap(), snapshot);
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.ron");
        let mut snapshot = sample();
        snapshot.version = 99;
        save(&path, &snapshot).unwrap();
        assert!(load(&path).is_err());
    }
}
