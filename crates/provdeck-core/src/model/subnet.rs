// ── Subnets: DHCP address pools ──

use provdeck_api::types::{DhcpOption, Iface, Subnet};

use super::Resource;
use crate::draft::Draft;
use crate::error::CoreError;
use crate::field::FieldValue;

/// Option codes every fresh subnet starts with: router, DNS servers,
/// domain name and bootfile name.
const SEED_OPTION_CODES: [u8; 4] = [3, 6, 15, 67];

/// Lease defaults for a fresh subnet, in seconds.
const DEFAULT_ACTIVE_LEASE_SECS: u32 = 60;
const DEFAULT_RESERVED_LEASE_SECS: u32 = 7200;

impl Resource for Subnet {
    const KIND: &'static str = "subnets";
    const NOUN: &'static str = "subnet";

    type Template = SubnetTemplate;

    fn key(&self) -> Option<String> {
        if self.name.is_empty() {
            None
        } else {
            Some(self.name.clone())
        }
    }

    fn default_draft() -> Self {
        Subnet {
            name: String::new(),
            subnet: String::new(),
            next_server: None,
            active_start: String::new(),
            active_end: String::new(),
            active_lease_time: Some(DEFAULT_ACTIVE_LEASE_SECS),
            reserved_lease_time: Some(DEFAULT_RESERVED_LEASE_SECS),
            only_reservations: false,
            strategy: "MAC".to_owned(),
            options: SEED_OPTION_CODES
                .iter()
                .map(|&code| DhcpOption {
                    code,
                    value: String::new(),
                })
                .collect(),
        }
    }

    fn apply_template(&mut self, template: &SubnetTemplate) {
        if let Some(name) = &template.name {
            self.name.clone_from(name);
        }
        if let Some(subnet) = &template.subnet {
            self.subnet.clone_from(subnet);
        }
        if let Some(next_server) = &template.next_server {
            self.next_server = Some(next_server.clone());
        }
        if let Some(active_start) = &template.active_start {
            self.active_start.clone_from(active_start);
        }
        if let Some(active_end) = &template.active_end {
            self.active_end.clone_from(active_end);
        }
        if let Some(active_lease_time) = template.active_lease_time {
            self.active_lease_time = Some(active_lease_time);
        }
        if let Some(reserved_lease_time) = template.reserved_lease_time {
            self.reserved_lease_time = Some(reserved_lease_time);
        }
        if let Some(only_reservations) = template.only_reservations {
            self.only_reservations = only_reservations;
        }
        if let Some(strategy) = &template.strategy {
            self.strategy.clone_from(strategy);
        }
        if let Some(options) = &template.options {
            merge_options(&mut self.options, options);
        }
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError> {
        match field {
            "Name" => self.name = value.into_text(),
            "Subnet" => self.subnet = value.into_text(),
            "NextServer" => self.next_server = value.into_optional_text(),
            "ActiveStart" => self.active_start = value.into_text(),
            "ActiveEnd" => self.active_end = value.into_text(),
            "ActiveLeaseTime" => self.active_lease_time = value.optional_u32(field)?,
            "ReservedLeaseTime" => self.reserved_lease_time = value.optional_u32(field)?,
            "OnlyReservations" => self.only_reservations = value.boolean(field)?,
            "Strategy" => self.strategy = value.into_text(),
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
        field == "Name"
    }
}

/// Merge incoming options over `current` by code.
///
/// A value for one of the seeded codes overwrites that slot in place,
/// keeping the seed order stable; any other code appends.
fn merge_options(current: &mut Vec<DhcpOption>, incoming: &[DhcpOption]) {
    for option in incoming {
        if SEED_OPTION_CODES.contains(&option.code) {
            if let Some(slot) = current.iter_mut().find(|slot| slot.code == option.code) {
                slot.value.clone_from(&option.value);
                continue;
            }
        }
        current.push(option.clone());
    }
}

/// Partial subnet used to seed new rows.
///
/// Populated fields merge over [`Resource::default_draft`]; everything
/// else keeps its default.
#[derive(Debug, Clone, Default)]
pub struct SubnetTemplate {
    pub name: Option<String>,
    pub subnet: Option<String>,
    pub next_server: Option<String>,
    pub active_start: Option<String>,
    pub active_end: Option<String>,
    pub active_lease_time: Option<u32>,
    pub reserved_lease_time: Option<u32>,
    pub only_reservations: Option<bool>,
    pub strategy: Option<String>,
    pub options: Option<Vec<DhcpOption>>,
}

impl SubnetTemplate {
    /// Seed for the "new subnet on this NIC" shortcut: the interface
    /// name becomes the subnet name and `address` its CIDR range.
    pub fn from_interface(iface: &Iface, address: &str) -> Self {
        Self {
            name: Some(iface.name.clone()),
            subnet: Some(address.to_owned()),
            ..Self::default()
        }
    }
}

impl From<&Subnet> for SubnetTemplate {
    /// Full-copy template, as used by the row copy button.
    fn from(subnet: &Subnet) -> Self {
        Self {
            name: Some(subnet.name.clone()),
            subnet: Some(subnet.subnet.clone()),
            next_server: subnet.next_server.clone(),
            active_start: Some(subnet.active_start.clone()),
            active_end: Some(subnet.active_end.clone()),
            active_lease_time: subnet.active_lease_time,
            reserved_lease_time: subnet.reserved_lease_time,
            only_reservations: Some(subnet.only_reservations),
            strategy: Some(subnet.strategy.clone()),
            options: Some(subnet.options.clone()),
        }
    }
}

impl Draft<Subnet> {
    /// Edit one DHCP option value by code, as the expanded row's option
    /// inputs do. Unknown codes are appended so a bare draft can still
    /// gain options.
    pub fn set_option_value(&mut self, code: u8, value: &str) {
        match self.entity.options.iter_mut().find(|opt| opt.code == code) {
            Some(opt) => value.clone_into(&mut opt.value),
            None => self.entity.options.push(DhcpOption {
                code,
                value: value.to_owned(),
            }),
        }
        self.flags.edited = true;
    }
}
