use serde::{Deserialize, Serialize};

use crate::common::geometry::Rect;
use crate::sys::gateway::{MonitorHandle, MonitorInfo};

/// One physical display. Immutable value object; a monitor whose geometry
/// changed is a new value with the same handle. Identity is handle-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monitor {
    pub handle: MonitorHandle,
    pub name: String,
    pub work_area: Rect<i32>,
    pub scale_factor: f64,
    pub is_primary: bool,
}

impl From<MonitorInfo> for Monitor {
    fn from(info: MonitorInfo) -> Self {
        Monitor {
            handle: info.handle,
            name: info.name,
            work_area: info.work_area,
            scale_factor: info.scale_factor,
            is_primary: info.is_primary,
        }
    }
}

#[cfg(test)]
pub fn test_monitor(id: u64, work_area: Rect<i32>) -> Monitor {
    Monitor {
        handle: MonitorHandle::new(id),
        name: format!("TEST-{id}"),
        work_area,
        scale_factor: 1.0,
        is_primary: id == 1,
    }
}

/// Result of a topology refresh, partitioned by handle membership.
/// `resized` lists unchanged handles whose geometry or scale differs; those
/// never cause a remap but do invalidate cached layouts.
#[derive(Debug, Clone, Default)]
pub struct MonitorPartition {
    pub unchanged: Vec<Monitor>,
    pub added: Vec<Monitor>,
    pub removed: Vec<Monitor>,
    pub resized: Vec<MonitorHandle>,
}

impl MonitorPartition {
    pub fn topology_changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Authoritative collection of currently known monitors, replaced wholesale
/// on every topology refresh.
#[derive(Debug, Default)]
pub struct MonitorSector {
    monitors: Vec<Monitor>,
}

impl MonitorSector {
    pub fn get(&self, handle: MonitorHandle) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.handle == handle)
    }

    pub fn contains(&self, handle: MonitorHandle) -> bool { self.get(handle).is_some() }

    pub fn primary(&self) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.is_primary).or_else(|| self.monitors.first())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Monitor> { self.monitors.iter() }

    pub fn len(&self) -> usize { self.monitors.len() }

    pub fn is_empty(&self) -> bool { self.monitors.is_empty() }

    /// Replaces the whole sector and reports the partition against the
    /// previous contents. Identity is handle-only.
    pub fn replace_all(&mut self, current: Vec<Monitor>) -> MonitorPartition {
        let mut partition = MonitorPartition::default();
        for old in &self.monitors {
            if !current.iter().any(|m| m.handle == old.handle) {
                partition.removed.push(old.clone());
            }
        }
        for new in &current {
            match self.monitors.iter().find(|m| m.handle == new.handle) {
                None => partition.added.push(new.clone()),
                Some(old) => {
                    partition.unchanged.push(new.clone());
                    if old.work_area != new.work_area
                        || old.scale_factor != new.scale_factor
                    {
                        partition.resized.push(new.handle);
                    }
                }
            }
        }
        self.monitors = current;
        partition
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn replace_all_partitions_by_handle() {
        let mut sector = MonitorSector::default();
        let a = test_monitor(1, Rect::new(0, 0, 1920, 1080));
        let b = test_monitor(2, Rect::new(1920, 0, 1920, 1080));
        let first = sector.replace_all(vec![a.clone(), b.clone()]);
        assert_eq!(first.added.len(), 2);
        assert!(first.removed.is_empty() && first.unchanged.is_empty());

        let c = test_monitor(3, Rect::new(0, 1080, 1280, 720));
        let second = sector.replace_all(vec![a.clone(), c.clone()]);
        assert_eq!(second.unchanged, vec![a]);
        assert_eq!(second.added, vec![c]);
        assert_eq!(second.removed, vec![b]);
        assert!(second.resized.is_empty());
    }

    #[test]
    fn geometry_change_is_unchanged_but_resized() {
        let mut sector = MonitorSector::default();
        let a = test_monitor(1, Rect::new(0, 0, 1920, 1080));
        sector.replace_all(vec![a.clone()]);

        let mut a2 = a.clone();
        a2.work_area = Rect::new(0, 0, 2560, 1440);
        let partition = sector.replace_all(vec![a2.clone()]);
        assert!(!partition.topology_changed());
        assert_eq!(partition.unchanged, vec![a2]);
        assert_eq!(partition.resized, vec![MonitorHandle::new(1)]);
    }
}
