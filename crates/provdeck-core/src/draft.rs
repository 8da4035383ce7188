// ── Draft rows: entities plus edit state ──
//
// A draft is what one table row renders: the wire entity, the flags
// describing how far it has drifted from the server, and a session-
// local identity that survives any amount of list reshuffling.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::CoreError;
use crate::field::{InputKind, coerce};
use crate::model::Resource;

static NEXT_ROW_ID: AtomicU64 = AtomicU64::new(1);

/// Session-local row identity, stable across reordering and never
/// reused within a process. A save completion addresses its row by
/// this, so a list that was reloaded mid-flight simply absorbs nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId(u64);

impl RowId {
    fn next() -> Self {
        Self(NEXT_ROW_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Shared immutable snapshot of a collection's rows.
pub type Rows<R> = Arc<Vec<Arc<Draft<R>>>>;

/// Per-row edit state, rendered alongside the entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFlags {
    /// Exists locally only; saving creates instead of updating.
    pub is_new: bool,
    /// Has local changes not yet saved.
    pub edited: bool,
    /// A save or delete for this row is in flight.
    pub updating: bool,
    /// What the last failed round trip said, until the next attempt.
    pub error: Option<String>,
    /// The detail editor is open.
    pub expanded: bool,
}

/// The single badge that best describes a row.
///
/// Order matters: an errored row stays errored even though it is also
/// new or edited. `updating` is deliberately not a badge -- it overlays
/// whichever one the row already shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Errored,
    New,
    Edited,
    Clean,
}

/// One row of a collection: a wire entity plus the console's edit
/// state for it.
///
/// `Clone` deep-copies entity and flags while keeping the row identity,
/// which is exactly what a detail editor wants: mutate the clone, then
/// commit it back through the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft<R: Resource> {
    row: RowId,
    pub entity: R,
    pub flags: RowFlags,
}

impl<R: Resource> Draft<R> {
    /// Brand-new draft from the kind's defaults.
    pub fn new() -> Self {
        Self {
            row: RowId::next(),
            entity: R::default_draft(),
            flags: RowFlags {
                is_new: true,
                ..RowFlags::default()
            },
        }
    }

    /// Brand-new draft seeded from a template.
    pub fn from_template(template: &R::Template) -> Self {
        let mut draft = Self::new();
        draft.entity.apply_template(template);
        draft
    }

    /// Row for an entity that already lives on the server.
    pub fn saved(entity: R) -> Self {
        Self {
            row: RowId::next(),
            entity,
            flags: RowFlags::default(),
        }
    }

    /// A freshly saved entity landing back on an existing row: the
    /// server's canonical answer with every flag reset.
    pub(crate) fn absorbed(row: RowId, entity: R) -> Self {
        Self {
            row,
            entity,
            flags: RowFlags::default(),
        }
    }

    pub fn row_id(&self) -> RowId {
        self.row
    }

    /// The badge for this row, highest severity first.
    pub fn sync_state(&self) -> SyncState {
        if self.flags.error.is_some() {
            SyncState::Errored
        } else if self.flags.is_new {
            SyncState::New
        } else if self.flags.edited {
            SyncState::Edited
        } else {
            SyncState::Clean
        }
    }

    /// Coerce one raw input and write it to the named field.
    ///
    /// The key field locks once the entity is saved. On success the
    /// draft is marked edited; on failure it is left untouched, so a
    /// rejected input never dirties the row.
    pub fn apply_field_change(
        &mut self,
        field: &str,
        raw: &str,
        kind: InputKind,
    ) -> Result<(), CoreError> {
        if R::is_key_field(field) && !self.flags.is_new {
            return Err(CoreError::KeyLocked {
                noun: R::NOUN,
                field: field.to_owned(),
            });
        }
        self.entity.set_field(field, coerce(kind, raw))?;
        self.flags.edited = true;
        Ok(())
    }

    /// Open or close the detail editor. Pure view state, never an edit.
    pub fn toggle_expanded(&mut self) {
        self.flags.expanded = !self.flags.expanded;
    }
}

impl<R: Resource> Default for Draft<R> {
    fn default() -> Self {
        Self::new()
    }
}
