// ── Domain model: editable provisioning entities ──
//
// Wire types come from `provdeck-api`; this module teaches them the
// console's editing vocabulary. `Resource` is the seam everything above
// the model layer is generic over: where a collection lives on the
// server, what a fresh draft looks like, and how coerced form input
// lands on named fields.

mod bootenv;
mod machine;
mod subnet;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CoreError;
use crate::field::FieldValue;

pub use bootenv::BootEnvTemplate;
pub use machine::MachineTemplate;
pub use provdeck_api::types::{
    BootEnv, DhcpOption, Iface, Machine, OsInfo, Subnet, TemplateInfo,
};
pub use subnet::SubnetTemplate;

/// An entity kind the console can list, draft and save.
pub trait Resource:
    Clone + PartialEq + std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Collection path segment under `/api/v3/`.
    const KIND: &'static str;

    /// Singular noun for log lines and error messages.
    const NOUN: &'static str;

    /// Partial seed merged over [`Resource::default_draft`] when a row
    /// is created from a template or copied from an existing entity.
    type Template: Default + Send + Sync + for<'a> From<&'a Self>;

    /// The server-side key used in item URLs, or `None` until the
    /// server has assigned one.
    fn key(&self) -> Option<String>;

    /// Baseline entity for a brand-new row.
    fn default_draft() -> Self;

    /// Merge a template's populated fields over this entity.
    fn apply_template(&mut self, template: &Self::Template);

    /// Write one field, addressed by wire name, from a coerced input
    /// value. Fails without touching the entity if the field is not
    /// editable or the value does not fit.
    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError>;

    /// Whether `field` names the entity's server-side key.
    fn is_key_field(field: &str) -> bool;
}
