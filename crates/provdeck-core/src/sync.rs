// ── Save/delete round trips ──
//
// One engine per collection. Every round trip starts from a claimed
// draft (its stored row already shows `updating`) and finishes by
// landing on the row identity it started from: the server's canonical
// entity on success, the draft plus an error banner on failure. A row
// that vanished in between -- the list was reloaded -- absorbs nothing.

use std::sync::Arc;

use provdeck_api::ProvisionClient;
use tracing::{debug, warn};

use crate::draft::Draft;
use crate::model::Resource;
use crate::store::RowStore;

#[derive(Clone)]
pub(crate) struct SyncEngine<R: Resource> {
    client: Arc<ProvisionClient>,
    store: Arc<RowStore<R>>,
}

impl<R: Resource> SyncEngine<R> {
    pub(crate) fn new(client: Arc<ProvisionClient>, store: Arc<RowStore<R>>) -> Self {
        Self { client, store }
    }

    /// Save a claimed draft: POST for rows born in the console, PUT for
    /// rows that came from the server.
    pub(crate) async fn save(&self, draft: Draft<R>) {
        if draft.flags.is_new {
            let result = self.client.create::<R, R>(R::KIND, &draft.entity).await;
            self.land(draft, result);
        } else if let Some(key) = draft.entity.key() {
            let result = self
                .client
                .update::<R, R>(R::KIND, &key, &draft.entity)
                .await;
            self.land(draft, result);
        } else {
            // a row can't be non-new without a server key
            self.fail(draft, "missing server key".to_owned());
        }
    }

    /// Delete a claimed draft's entity on the server, then its row.
    pub(crate) async fn remove(&self, key: &str, draft: Draft<R>) {
        match self.client.remove(R::KIND, key).await {
            Ok(()) => {
                debug!(kind = R::KIND, %key, "deleted");
                if self.store.remove_row(draft.row_id()).is_none() {
                    debug!(kind = R::KIND, "row vanished before its delete landed");
                }
            }
            Err(err) => self.fail(draft, failure_message(&err)),
        }
    }

    /// Land a save result on the row that started it.
    fn land(&self, draft: Draft<R>, result: Result<R, provdeck_api::Error>) {
        match result {
            Ok(entity) => {
                if !self.store.replace_row(Draft::absorbed(draft.row_id(), entity)) {
                    debug!(kind = R::KIND, "row vanished before its save landed");
                }
            }
            Err(err) => self.fail(draft, failure_message(&err)),
        }
    }

    /// Keep the draft, banner the failure, clear the in-flight overlay.
    fn fail(&self, mut draft: Draft<R>, message: String) {
        warn!(kind = R::KIND, %message, "request failed");
        draft.flags.updating = false;
        draft.flags.error = Some(message);
        if !self.store.replace_row(draft) {
            debug!(kind = R::KIND, "row vanished before its failure landed");
        }
    }
}

/// Build the row banner for a failed round trip.
///
/// Structured rejections read `"Error (422): msg1, msg2"`; a rejection
/// with no usable body collapses to the bare status digits; transport
/// failures fall back to the error's own text.
pub(crate) fn failure_message(err: &provdeck_api::Error) -> String {
    match err {
        provdeck_api::Error::Api { status, messages } if messages.is_empty() => status.to_string(),
        provdeck_api::Error::Api { status, messages } => {
            format!("Error ({status}): {}", messages.join(", "))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_rejections_join_their_messages() {
        let err = provdeck_api::Error::Api {
            status: 422,
            messages: vec!["subnet overlaps lab".into(), "bad ActiveStart".into()],
        };
        assert_eq!(
            failure_message(&err),
            "Error (422): subnet overlaps lab, bad ActiveStart"
        );
    }

    #[test]
    fn bodyless_rejections_collapse_to_bare_digits() {
        let err = provdeck_api::Error::Api {
            status: 500,
            messages: vec![],
        };
        assert_eq!(failure_message(&err), "500");
    }

    #[test]
    fn transport_failures_keep_their_own_text() {
        let err = provdeck_api::Error::Tls("handshake refused".into());
        assert_eq!(failure_message(&err), "TLS error: handshake refused");
    }
}
