// Wire types for the provisioning service's v3 API.
//
// The service is written in Go and serializes with Go's default field
// naming, so everything here is PascalCase on the wire. Fields the
// server may omit (or that older servers don't know) carry
// `#[serde(default)]` so list payloads from mixed versions still decode.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── DHCP subnets ─────────────────────────────────────────────────────

/// A single DHCP option handed to every lease in a subnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DhcpOption {
    pub code: u8,
    pub value: String,
}

/// A DHCP subnet managed by the provisioner.
///
/// Keyed by `name`. Addresses are carried as strings end to end: the
/// server validates them, and the console round-trips whatever the
/// operator typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Subnet {
    pub name: String,
    /// Network address in CIDR form (e.g. `192.168.124.0/24`).
    pub subnet: String,
    /// Address of the next server in the PXE chain, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_server: Option<String>,
    /// First address handed out to non-reserved leases.
    #[serde(default)]
    pub active_start: String,
    /// Last address handed out to non-reserved leases.
    #[serde(default)]
    pub active_end: String,
    /// Lease duration in seconds for non-reserved leases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_lease_time: Option<u32>,
    /// Lease duration in seconds for reserved leases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_lease_time: Option<u32>,
    /// Only hand out leases backed by a preexisting reservation.
    #[serde(default)]
    pub only_reservations: bool,
    /// How leases are bound to clients (normally `"MAC"`).
    #[serde(default)]
    pub strategy: String,
    #[serde(default)]
    pub options: Vec<DhcpOption>,
}

// ── Boot environments ────────────────────────────────────────────────

/// Metadata about the OS a boot environment installs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OsInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub codename: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub iso_file: String,
    #[serde(default)]
    pub iso_sha256: String,
    #[serde(default)]
    pub iso_url: String,
}

/// A template rendered into the boot environment's file tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateInfo {
    pub name: String,
    pub path: String,
    #[serde(rename = "ID")]
    pub id: String,
}

/// A boot environment: everything needed to netboot a machine into an
/// OS installer or a live image.
///
/// Keyed by `name`. `validated`/`available`/`errors` are the server's
/// validation verdict and are read-only from the console's point of
/// view; they round-trip untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BootEnv {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "OS", default)]
    pub os: OsInfo,
    #[serde(default)]
    pub templates: Vec<TemplateInfo>,
    /// Path to the kernel within the expanded ISO.
    #[serde(default)]
    pub kernel: String,
    #[serde(default)]
    pub initrds: Vec<String>,
    /// Kernel command-line template.
    #[serde(default)]
    pub boot_params: String,
    /// Parameters that must be set on a machine before it can boot this.
    #[serde(default)]
    pub required_params: Vec<String>,
    #[serde(default)]
    pub validated: bool,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

// ── Machines ─────────────────────────────────────────────────────────

/// A bare-metal system whose boot environment the provisioner manages.
///
/// Keyed by `uuid`, which the server assigns at create time; a machine
/// that has never been saved has no uuid yet, and the field is omitted
/// from the create payload so the server picks one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Machine {
    /// By convention the machine's FQDN; uniqueness is not enforced here.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    /// IPv4 address used for PXE purposes.
    #[serde(default)]
    pub address: String,
    /// Name of the boot environment this machine boots into; blank means
    /// the server's global default.
    #[serde(default)]
    pub boot_env: String,
    /// Profiles consulted in order during template rendering.
    #[serde(default)]
    pub profiles: Vec<String>,
    #[serde(default)]
    pub validated: bool,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

// ── Interfaces ───────────────────────────────────────────────────────

/// A network interface on the provisioning server itself.
///
/// Read-only; the console offers these as seeds for new subnets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Iface {
    pub name: String,
    #[serde(default)]
    pub index: i64,
    /// Addresses in CIDR form, one per configured network.
    #[serde(default)]
    pub addresses: Vec<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_subnet_wire_names() {
        let subnet = Subnet {
            name: "local".into(),
            subnet: "192.168.124.0/24".into(),
            next_server: None,
            active_start: "192.168.124.10".into(),
            active_end: "192.168.124.245".into(),
            active_lease_time: Some(60),
            reserved_lease_time: Some(7200),
            only_reservations: false,
            strategy: "MAC".into(),
            options: vec![DhcpOption {
                code: 3,
                value: "192.168.124.1".into(),
            }],
        };

        let v = serde_json::to_value(&subnet).unwrap();
        assert_eq!(v["Name"], "local");
        assert_eq!(v["ActiveLeaseTime"], 60);
        assert_eq!(v["OnlyReservations"], false);
        assert_eq!(v["Options"][0]["Code"], 3);
        // None serializes as absent, not null
        assert!(v.get("NextServer").is_none());
    }

    #[test]
    fn test_bootenv_os_and_template_id_renames() {
        let env = BootEnv {
            name: "ubuntu-16.04-install".into(),
            description: String::new(),
            os: OsInfo {
                name: "ubuntu-16.04".into(),
                ..OsInfo::default()
            },
            templates: vec![TemplateInfo {
                name: "pxelinux".into(),
                path: "pxelinux.cfg/{{.Machine.HexAddress}}".into(),
                id: "default-pxelinux.tmpl".into(),
            }],
            kernel: String::new(),
            initrds: vec![],
            boot_params: String::new(),
            required_params: vec![],
            validated: true,
            available: true,
            errors: vec![],
        };

        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["OS"]["Name"], "ubuntu-16.04");
        assert_eq!(v["Templates"][0]["ID"], "default-pxelinux.tmpl");
    }

    #[test]
    fn test_machine_uuid_omitted_until_assigned() {
        let machine = Machine {
            name: "node-1.example.com".into(),
            description: String::new(),
            uuid: None,
            address: "192.168.124.30".into(),
            boot_env: String::new(),
            profiles: vec![],
            validated: false,
            available: false,
            errors: vec![],
        };

        let v = serde_json::to_value(&machine).unwrap();
        assert!(v.get("Uuid").is_none());

        let saved: Machine = serde_json::from_value(serde_json::json!({
            "Name": "node-1.example.com",
            "Uuid": "3945838b-bf0d-4b0c-97c5-f2f03fd7a433",
            "Address": "192.168.124.30",
            "BootEnv": "local",
        }))
        .unwrap();
        assert!(saved.uuid.is_some());
        assert_eq!(saved.boot_env, "local");
    }

    #[test]
    fn test_sparse_payload_decodes_with_defaults() {
        // Older servers omit fields newer ones always send.
        let subnet: Subnet = serde_json::from_value(serde_json::json!({
            "Name": "bare",
            "Subnet": "10.0.0.0/8",
        }))
        .unwrap();
        assert_eq!(subnet.active_lease_time, None);
        assert!(subnet.options.is_empty());
        assert!(!subnet.only_reservations);
    }
}
