// ── Ordered reactive row storage ──
//
// One `RowStore` backs one collection view. Rows keep their server
// order; every mutation publishes a fresh shared snapshot over a
// `watch` channel, so renderers redraw whole lists instead of diffing.
// Published snapshots are immutable: mutation goes copy-on-write
// through `Arc::make_mut` under the channel's own lock, which is also
// what makes `begin_update`'s claim atomic.

use std::sync::Arc;

use tokio::sync::watch;

use crate::draft::{Draft, RowId, Rows};
use crate::model::Resource;

pub(crate) struct RowStore<R: Resource> {
    snapshot: watch::Sender<Rows<R>>,
}

impl<R: Resource> RowStore<R> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self { snapshot }
    }

    /// Replace the whole collection, as a bootstrap load does.
    pub(crate) fn replace_all(&self, drafts: Vec<Draft<R>>) {
        let rows: Vec<Arc<Draft<R>>> = drafts.into_iter().map(Arc::new).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(rows));
    }

    /// Append one row at the end.
    pub(crate) fn append(&self, draft: Draft<R>) {
        self.snapshot.send_modify(|snap| {
            Arc::make_mut(snap).push(Arc::new(draft));
        });
    }

    /// Row at `index`, if any.
    pub(crate) fn get(&self, index: usize) -> Option<Arc<Draft<R>>> {
        self.snapshot.borrow().get(index).cloned()
    }

    /// Current position of a row, if it is still present.
    pub(crate) fn index_of(&self, row: RowId) -> Option<usize> {
        self.snapshot
            .borrow()
            .iter()
            .position(|draft| draft.row_id() == row)
    }

    /// Land `draft` on the row carrying its identity, wherever that row
    /// sits by now. Returns `false` if the row is gone, in which case
    /// the draft is dropped.
    pub(crate) fn replace_row(&self, draft: Draft<R>) -> bool {
        let row = draft.row_id();
        let mut replaced = false;
        self.snapshot.send_if_modified(|snap| {
            let Some(index) = snap.iter().position(|d| d.row_id() == row) else {
                return false;
            };
            if let Some(slot) = Arc::make_mut(snap).get_mut(index) {
                *slot = Arc::new(draft);
                replaced = true;
            }
            replaced
        });
        replaced
    }

    /// Remove the identified row. Returns it if it was still present.
    pub(crate) fn remove_row(&self, row: RowId) -> Option<Arc<Draft<R>>> {
        let mut removed = None;
        self.snapshot.send_if_modified(|snap| {
            let Some(index) = snap.iter().position(|d| d.row_id() == row) else {
                return false;
            };
            removed = Some(Arc::make_mut(snap).remove(index));
            true
        });
        removed
    }

    /// Atomically claim a row for one round trip.
    ///
    /// Fails if the row is gone or already has a request in flight.
    /// On success the stored row shows `updating` and the returned
    /// copy, flagged the same way, is what the caller should send.
    pub(crate) fn begin_update(&self, row: RowId) -> Option<Draft<R>> {
        let mut claimed = None;
        self.snapshot.send_if_modified(|snap| {
            let Some(index) = snap.iter().position(|d| d.row_id() == row) else {
                return false;
            };
            let Some(slot) = Arc::make_mut(snap).get_mut(index) else {
                return false;
            };
            if slot.flags.updating {
                return false;
            }
            let mut draft = (**slot).clone();
            draft.flags.updating = true;
            *slot = Arc::new(draft.clone());
            claimed = Some(draft);
            true
        });
        claimed
    }

    /// Current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Rows<R> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Rows<R>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.snapshot.borrow().is_empty()
    }
}
