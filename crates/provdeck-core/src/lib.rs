// ── provdeck-core: Reactive draft store and sync engine ──
//
// Sits between `provdeck-api` and a console front end. Each provisioning
// collection (subnets, boot environments, machines) is held as an ordered
// list of drafts: server entities annotated with row-level edit state.
// Mutations replace whole snapshots and are broadcast over `watch`
// channels; saves run as spawned tasks and land back on the row that
// started them, no matter how the list has shifted in between.

pub mod config;
pub mod controller;
pub mod draft;
pub mod error;
pub mod field;
pub mod model;
mod store;
pub mod stream;
mod sync;

pub use config::{ConsoleConfig, TlsVerification};
pub use controller::{
    BootEnvsController, Console, LoadState, MachinesController, ResourceController,
    SubnetsController,
};
pub use draft::{Draft, RowFlags, RowId, Rows, SyncState};
pub use error::CoreError;
pub use field::{FieldValue, InputKind, coerce};
pub use model::{
    BootEnv, BootEnvTemplate, DhcpOption, Iface, Machine, MachineTemplate, OsInfo, Resource,
    Subnet, SubnetTemplate, TemplateInfo,
};
pub use stream::RowStream;
