use std::sync::Arc;

use dashmap::DashMap;

use crate::common::geometry::Rect;
use crate::sys::gateway::WindowHandle;

/// Monotonic id for a frame we asked the platform to apply. Used to tell
/// our own moves apart from user-initiated ones when move events echo back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TxRecord {
    pub txid: TransactionId,
    pub target: Rect<i32>,
}

/// Shared map of in-flight frame requests, readable from the platform event
/// callback thread without taking the store lock.
#[derive(Debug, Clone, Default)]
pub struct WindowTxStore {
    inner: Arc<DashMap<WindowHandle, TxRecord>>,
}

impl WindowTxStore {
    pub fn insert(&self, window: WindowHandle, txid: TransactionId, target: Rect<i32>) {
        self.inner.insert(window, TxRecord { txid, target });
    }

    pub fn get(&self, window: WindowHandle) -> Option<TxRecord> {
        self.inner.get(&window).map(|r| *r)
    }

    pub fn remove(&self, window: WindowHandle) -> Option<TxRecord> {
        self.inner.remove(&window).map(|(_, r)| r)
    }

    pub fn len(&self) -> usize { self.inner.len() }

    pub fn is_empty(&self) -> bool { self.inner.is_empty() }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn insert_overwrites_older_transactions() {
        let store = WindowTxStore::default();
        let w = WindowHandle::new(3);
        store.insert(w, TransactionId(1), Rect::new(0, 0, 100, 100));
        store.insert(w, TransactionId(2), Rect::new(0, 0, 200, 200));
        assert_eq!(store.get(w).unwrap().txid, TransactionId(2));
        assert_eq!(store.remove(w).unwrap().target, Rect::new(0, 0, 200, 200));
        assert!(store.get(w).is_none());
    }
}
