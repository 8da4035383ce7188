// ── Machines: hosts under provisioning control ──
//
// Machines are the one kind keyed by a server-assigned Uuid instead of
// a user-chosen name, so a draft has no key until its first save lands.

use provdeck_api::types::Machine;

use super::Resource;
use crate::error::CoreError;
use crate::field::FieldValue;

impl Resource for Machine {
    const KIND: &'static str = "machines";
    const NOUN: &'static str = "machine";

    type Template = MachineTemplate;

    fn key(&self) -> Option<String> {
        self.uuid.map(|uuid| uuid.to_string())
    }

    fn default_draft() -> Self {
        Machine {
            name: String::new(),
            description: String::new(),
            uuid: None,
            address: String::new(),
            boot_env: String::new(),
            profiles: Vec::new(),
            validated: false,
            available: false,
            errors: Vec::new(),
        }
    }

    fn apply_template(&mut self, template: &MachineTemplate) {
        if let Some(name) = &template.name {
            self.name.clone_from(name);
        }
        if let Some(description) = &template.description {
            self.description.clone_from(description);
        }
        if let Some(address) = &template.address {
            self.address.clone_from(address);
        }
        if let Some(boot_env) = &template.boot_env {
            self.boot_env.clone_from(boot_env);
        }
        if let Some(profiles) = &template.profiles {
            self.profiles.clone_from(profiles);
        }
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError> {
        match field {
            "Name" => self.name = value.into_text(),
            "Description" => self.description = value.into_text(),
            "Address" => self.address = value.into_text(),
            "BootEnv" => self.boot_env = value.into_text(),
            other => {
                return Err(CoreError::NotEditable {
                    noun: Self::NOUN,
                    field: other.to_owned(),
                });
            }
        }
        Ok(())
    }

    fn is_key_field(field: &str) -> bool {
        field == "Uuid"
    }
}

/// Partial machine used to seed new rows.
///
/// Deliberately excludes `Uuid` and the validation verdict: a copy has
/// to earn its own identity from the server.
#[derive(Debug, Clone, Default)]
pub struct MachineTemplate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub boot_env: Option<String>,
    pub profiles: Option<Vec<String>>,
}

impl From<&Machine> for MachineTemplate {
    fn from(machine: &Machine) -> Self {
        Self {
            name: Some(machine.name.clone()),
            description: Some(machine.description.clone()),
            address: Some(machine.address.clone()),
            boot_env: Some(machine.boot_env.clone()),
            profiles: Some(machine.profiles.clone()),
        }
    }
}
