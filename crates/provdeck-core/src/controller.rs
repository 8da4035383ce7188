// ── Collection controllers ──
//
// The consumer-facing lifecycle for each collection view: bootstrap it
// from the server, hold its rows, run row operations against them.
// One generic controller covers boot environments and machines;
// subnets get a wrapper that also carries the server's NIC list, and
// `Console` bundles the three behind a single shared API client.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use provdeck_api::ProvisionClient;
use provdeck_api::transport::{TlsMode, TransportConfig};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{ConsoleConfig, TlsVerification};
use crate::draft::{Draft, RowId, Rows};
use crate::error::CoreError;
use crate::model::{BootEnv, Iface, Machine, Resource, Subnet, SubnetTemplate};
use crate::store::RowStore;
use crate::stream::RowStream;
use crate::sync::{SyncEngine, failure_message};

// ── LoadState ────────────────────────────────────────────────────

/// Bootstrap state of one collection, observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// No load has finished yet, or one is on the wire.
    Loading,
    /// The last load succeeded.
    Loaded,
    /// The last load failed; `load()` again to retry.
    Failed(String),
}

// ── ResourceController ───────────────────────────────────────────

/// Lifecycle of one collection view.
///
/// Cheaply cloneable via `Arc`; every clone sees the same rows. Row
/// operations address rows by their current index but resolve them to
/// stable identities before anything async happens, so a list that
/// shifts under a slow request cannot redirect the result.
#[derive(Clone)]
pub struct ResourceController<R: Resource> {
    inner: Arc<ControllerInner<R>>,
}

struct ControllerInner<R: Resource> {
    client: Arc<ProvisionClient>,
    store: Arc<RowStore<R>>,
    engine: SyncEngine<R>,
    load_state: watch::Sender<LoadState>,
    loaded_at: watch::Sender<Option<DateTime<Utc>>>,
}

impl<R: Resource> ResourceController<R> {
    /// Controller over a shared API client. Does NOT touch the
    /// network -- call [`load()`](Self::load).
    pub fn new(client: Arc<ProvisionClient>) -> Self {
        let store = Arc::new(RowStore::new());
        let engine = SyncEngine::new(Arc::clone(&client), Arc::clone(&store));
        let (load_state, _) = watch::channel(LoadState::Loading);
        let (loaded_at, _) = watch::channel(None);

        Self {
            inner: Arc::new(ControllerInner {
                client,
                store,
                engine,
                load_state,
                loaded_at,
            }),
        }
    }

    // ── Bootstrap ────────────────────────────────────────────────

    /// Fetch the collection and replace every row with the server's
    /// answer. Local drafts and edits do not survive a reload.
    pub async fn load(&self) -> Result<(), CoreError> {
        let _ = self.inner.load_state.send(LoadState::Loading);

        match self.inner.client.list::<R>(R::KIND).await {
            Ok(entities) => {
                let drafts = entities.into_iter().map(Draft::saved).collect();
                self.inner.store.replace_all(drafts);
                let _ = self.inner.loaded_at.send(Some(Utc::now()));
                let _ = self.inner.load_state.send(LoadState::Loaded);
                info!(kind = R::KIND, rows = self.inner.store.len(), "loaded");
                Ok(())
            }
            Err(err) => {
                let message = failure_message(&err);
                warn!(kind = R::KIND, %message, "load failed");
                let _ = self.inner.load_state.send(LoadState::Failed(message));
                Err(err.into())
            }
        }
    }

    // State hooks for wrappers whose bootstrap spans more than one
    // request.

    pub(crate) fn mark_loading(&self) {
        let _ = self.inner.load_state.send(LoadState::Loading);
    }

    pub(crate) fn mark_load_failed(&self, message: String) {
        let _ = self.inner.load_state.send(LoadState::Failed(message));
    }

    pub(crate) fn client(&self) -> &Arc<ProvisionClient> {
        &self.inner.client
    }

    // ── Row operations ───────────────────────────────────────────

    /// Append a new draft, optionally seeded from a template. Local
    /// only: nothing reaches the server until [`update()`](Self::update).
    pub fn add(&self, template: Option<&R::Template>) -> RowId {
        let draft = match template {
            Some(template) => Draft::from_template(template),
            None => Draft::new(),
        };
        let row = draft.row_id();
        self.inner.store.append(draft);
        row
    }

    /// Append a new draft copied from the row at `index`.
    pub fn copy(&self, index: usize) -> Result<RowId, CoreError> {
        let source = self.target(index)?;
        let template = R::Template::from(&source.entity);
        Ok(self.add(Some(&template)))
    }

    /// Commit an edited draft back onto its row.
    ///
    /// The draft's own identity decides where it lands, so an index
    /// gone stale while the list shifted cannot misdirect the edit;
    /// `index` only names the row in the error when it is gone.
    pub fn change(&self, index: usize, draft: Draft<R>) -> Result<(), CoreError> {
        if self.inner.store.replace_row(draft) {
            Ok(())
        } else {
            Err(CoreError::RowNotFound {
                noun: R::NOUN,
                index,
            })
        }
    }

    /// Save the row at `index`: POST if it was born in the console,
    /// PUT if it came from the server. Claims the row first; a second
    /// save while one is in flight is [`CoreError::RowBusy`].
    ///
    /// The handle is for tests and orderly shutdown -- the save lands
    /// on the row whether or not anyone awaits it.
    pub fn update(&self, index: usize) -> Result<JoinHandle<()>, CoreError> {
        let target = self.target(index)?;
        let draft = self.claim(target.row_id(), index)?;
        let engine = self.inner.engine.clone();
        Ok(tokio::spawn(async move {
            engine.save(draft).await;
        }))
    }

    /// Remove the row at `index`.
    ///
    /// Rows that never reached the server disappear locally and return
    /// `Ok(None)`; saved rows are deleted remotely, and the row leaves
    /// the list only once the server agrees.
    pub fn remove(&self, index: usize) -> Result<Option<JoinHandle<()>>, CoreError> {
        let target = self.target(index)?;
        if target.flags.is_new {
            let _ = self.inner.store.remove_row(target.row_id());
            return Ok(None);
        }
        let Some(key) = target.entity.key() else {
            return Err(CoreError::Internal(format!(
                "saved {} without a server key",
                R::NOUN
            )));
        };
        let draft = self.claim(target.row_id(), index)?;
        let engine = self.inner.engine.clone();
        Ok(Some(tokio::spawn(async move {
            engine.remove(&key, draft).await;
        })))
    }

    // ── Snapshots & subscriptions ────────────────────────────────

    /// Current rows (cheap `Arc` clone).
    pub fn rows(&self) -> Rows<R> {
        self.inner.store.snapshot()
    }

    /// Row at `index` as currently stored.
    pub fn row(&self, index: usize) -> Option<Arc<Draft<R>>> {
        self.inner.store.get(index)
    }

    /// Subscribe to row changes.
    pub fn subscribe(&self) -> RowStream<R> {
        RowStream::new(self.inner.store.subscribe())
    }

    /// Subscribe to bootstrap state changes.
    pub fn load_state(&self) -> watch::Receiver<LoadState> {
        self.inner.load_state.subscribe()
    }

    /// When the last successful load finished.
    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        *self.inner.loaded_at.borrow()
    }

    /// How long ago that was, or `None` before the first load.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.loaded_at().map(|t| Utc::now() - t)
    }

    pub fn len(&self) -> usize {
        self.inner.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────

    fn target(&self, index: usize) -> Result<Arc<Draft<R>>, CoreError> {
        self.row(index).ok_or(CoreError::RowNotFound {
            noun: R::NOUN,
            index,
        })
    }

    /// Claim a row for one round trip, telling the two failure modes
    /// apart for the caller.
    fn claim(&self, row: RowId, index: usize) -> Result<Draft<R>, CoreError> {
        self.inner.store.begin_update(row).ok_or_else(|| {
            if self.inner.store.index_of(row).is_some() {
                CoreError::RowBusy {
                    noun: R::NOUN,
                    index,
                }
            } else {
                CoreError::RowNotFound {
                    noun: R::NOUN,
                    index,
                }
            }
        })
    }
}

/// Boot environments use the generic controller unchanged.
pub type BootEnvsController = ResourceController<BootEnv>;

/// So do machines; their Uuid keying lives in the model.
pub type MachinesController = ResourceController<Machine>;

// ── SubnetsController ────────────────────────────────────────────

/// Subnets plus the server's own NICs.
///
/// The subnet view leans on the interface list twice over: the "new
/// subnet on this NIC" shortcut seeds from it, and operators read the
/// two side by side. `load()` therefore fetches interfaces first and
/// fails the whole bootstrap when they are unavailable.
#[derive(Clone)]
pub struct SubnetsController {
    inner: Arc<SubnetsInner>,
}

struct SubnetsInner {
    rows: ResourceController<Subnet>,
    interfaces: watch::Sender<Arc<Vec<Iface>>>,
}

impl SubnetsController {
    pub fn new(client: Arc<ProvisionClient>) -> Self {
        let (interfaces, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            inner: Arc::new(SubnetsInner {
                rows: ResourceController::new(client),
                interfaces,
            }),
        }
    }

    /// Interfaces first, then subnets; either failure fails the load.
    pub async fn load(&self) -> Result<(), CoreError> {
        self.inner.rows.mark_loading();

        match self.inner.rows.client().list_interfaces().await {
            Ok(interfaces) => {
                let _ = self.inner.interfaces.send(Arc::new(interfaces));
            }
            Err(err) => {
                let message = failure_message(&err);
                warn!(%message, "interface load failed");
                self.inner.rows.mark_load_failed(message);
                return Err(err.into());
            }
        }

        self.inner.rows.load().await
    }

    /// The server's NICs as of the last successful `load()`.
    pub fn interfaces(&self) -> Arc<Vec<Iface>> {
        self.inner.interfaces.borrow().clone()
    }

    /// Append a new subnet draft seeded from one of the server's NICs.
    pub fn add_from_interface(&self, iface: &Iface, address: &str) -> RowId {
        self.inner
            .rows
            .add(Some(&SubnetTemplate::from_interface(iface, address)))
    }

    // ── Delegation to the row controller ─────────────────────────

    pub fn add(&self, template: Option<&SubnetTemplate>) -> RowId {
        self.inner.rows.add(template)
    }

    pub fn copy(&self, index: usize) -> Result<RowId, CoreError> {
        self.inner.rows.copy(index)
    }

    pub fn change(&self, index: usize, draft: Draft<Subnet>) -> Result<(), CoreError> {
        self.inner.rows.change(index, draft)
    }

    pub fn update(&self, index: usize) -> Result<JoinHandle<()>, CoreError> {
        self.inner.rows.update(index)
    }

    pub fn remove(&self, index: usize) -> Result<Option<JoinHandle<()>>, CoreError> {
        self.inner.rows.remove(index)
    }

    pub fn rows(&self) -> Rows<Subnet> {
        self.inner.rows.rows()
    }

    pub fn row(&self, index: usize) -> Option<Arc<Draft<Subnet>>> {
        self.inner.rows.row(index)
    }

    pub fn subscribe(&self) -> RowStream<Subnet> {
        self.inner.rows.subscribe()
    }

    pub fn load_state(&self) -> watch::Receiver<LoadState> {
        self.inner.rows.load_state()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.inner.rows.loaded_at()
    }

    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.inner.rows.data_age()
    }

    pub fn len(&self) -> usize {
        self.inner.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.rows.is_empty()
    }
}

// ── Console ──────────────────────────────────────────────────────

/// One handle for everything the admin console shows.
///
/// Builds a single shared API client from the configuration and one
/// controller per collection.
#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleInner>,
}

struct ConsoleInner {
    config: ConsoleConfig,
    subnets: SubnetsController,
    bootenvs: BootEnvsController,
    machines: MachinesController,
}

impl Console {
    /// Wire up the controllers. Does NOT touch the network -- call
    /// [`load_all()`](Self::load_all) or the per-collection loads.
    pub fn new(config: ConsoleConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let client = Arc::new(ProvisionClient::new(config.url.as_str(), &transport)?);

        Ok(Self {
            inner: Arc::new(ConsoleInner {
                config,
                subnets: SubnetsController::new(Arc::clone(&client)),
                bootenvs: BootEnvsController::new(Arc::clone(&client)),
                machines: MachinesController::new(client),
            }),
        })
    }

    /// Access the console configuration.
    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    pub fn subnets(&self) -> &SubnetsController {
        &self.inner.subnets
    }

    pub fn bootenvs(&self) -> &BootEnvsController {
        &self.inner.bootenvs
    }

    pub fn machines(&self) -> &MachinesController {
        &self.inner.machines
    }

    /// Bootstrap every collection concurrently. Each records its own
    /// [`LoadState`]; the first failure is returned once all three
    /// have finished.
    pub async fn load_all(&self) -> Result<(), CoreError> {
        let (subnets, bootenvs, machines) = tokio::join!(
            self.inner.subnets.load(),
            self.inner.bootenvs.load(),
            self.inner.machines.load(),
        );
        subnets?;
        bootenvs?;
        machines?;
        info!("console loaded");
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Build a [`TransportConfig`] from the console configuration.
fn build_transport(config: &ConsoleConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
