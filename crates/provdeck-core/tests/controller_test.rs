#![allow(clippy::unwrap_used)]
// Integration tests for the collection controllers against a mock
// provisioning server: bootstrap, optimistic edits, and how save and
// delete completions land back on rows.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use provdeck_core::{Console, ConsoleConfig, CoreError, InputKind, LoadState, SyncState};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Console) {
    let server = MockServer::start().await;
    let config = ConsoleConfig {
        url: server.uri().parse().unwrap(),
        ..ConsoleConfig::default()
    };
    let console = Console::new(config).unwrap();
    (server, console)
}

fn bootenv(name: &str) -> serde_json::Value {
    json!({
        "Name": name,
        "Description": "CentOS 7 installer",
        "OS": { "Name": "centos-7" },
        "Kernel": "vmlinuz0",
        "Validated": true,
        "Available": true,
    })
}

async fn mount_bootenvs(server: &MockServer, payload: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/v3/bootenvs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&payload))
        .mount(server)
        .await;
}

// ── Bootstrap ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_load_replaces_rows_and_marks_loaded() {
    let (server, console) = setup().await;
    let bootenvs = console.bootenvs();

    mount_bootenvs(&server, json!([bootenv("local"), bootenv("discovery")])).await;

    assert_eq!(*bootenvs.load_state().borrow(), LoadState::Loading);
    assert_eq!(bootenvs.loaded_at(), None);

    bootenvs.load().await.unwrap();

    assert_eq!(bootenvs.len(), 2);
    assert_eq!(*bootenvs.load_state().borrow(), LoadState::Loaded);
    assert!(bootenvs.loaded_at().is_some());
    assert!(bootenvs.data_age().unwrap() >= chrono::Duration::zero());

    let rows = bootenvs.rows();
    assert_eq!(rows[0].entity.name, "local");
    assert_eq!(rows[1].entity.name, "discovery");
    assert_eq!(rows[0].sync_state(), SyncState::Clean);
}

#[tokio::test]
async fn test_load_failure_keeps_the_message_until_a_retry_lands() {
    let (server, console) = setup().await;
    let bootenvs = console.bootenvs();

    Mock::given(method("GET"))
        .and(path("/api/v3/bootenvs"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_bootenvs(&server, json!([bootenv("local")])).await;

    let result = bootenvs.load().await;
    assert!(matches!(result, Err(CoreError::Rejected { status: 500, .. })));
    assert_eq!(*bootenvs.load_state().borrow(), LoadState::Failed("500".into()));
    assert_eq!(bootenvs.loaded_at(), None);

    bootenvs.load().await.unwrap();
    assert_eq!(*bootenvs.load_state().borrow(), LoadState::Loaded);
    assert_eq!(bootenvs.len(), 1);
}

// ── Draft lifecycle ─────────────────────────────────────────────────

#[tokio::test]
async fn test_adding_a_draft_never_touches_the_network() {
    let (server, console) = setup().await;
    let bootenvs = console.bootenvs();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let row = bootenvs.add(None);

    assert_eq!(bootenvs.len(), 1);
    let draft = bootenvs.row(0).unwrap();
    assert_eq!(draft.row_id(), row);
    assert!(draft.flags.is_new);
    assert_eq!(draft.sync_state(), SyncState::New);
    // new boot environments start available until validation says otherwise
    assert!(draft.entity.available);
}

#[tokio::test]
async fn test_subscriptions_see_appends() {
    let (_server, console) = setup().await;
    let bootenvs = console.bootenvs();

    let mut stream = bootenvs.subscribe();
    bootenvs.add(None);

    let rows = stream.changed().await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_change_lands_by_row_identity_not_by_index() {
    let (server, console) = setup().await;
    let bootenvs = console.bootenvs();

    mount_bootenvs(&server, json!([bootenv("local"), bootenv("discovery")])).await;
    bootenvs.load().await.unwrap();

    // edit the second row, then hand it back with a stale index
    let mut draft = (*bootenvs.row(1).unwrap()).clone();
    draft
        .apply_field_change("Description", "PXE discovery", InputKind::Text)
        .unwrap();
    bootenvs.change(0, draft).unwrap();

    let rows = bootenvs.rows();
    assert_eq!(rows[0].entity.description, "CentOS 7 installer");
    assert_eq!(rows[1].entity.description, "PXE discovery");
    assert_eq!(rows[1].sync_state(), SyncState::Edited);

    // a draft whose row was reloaded away has nowhere to land
    let orphan = (*bootenvs.row(0).unwrap()).clone();
    bootenvs.load().await.unwrap();
    assert!(matches!(
        bootenvs.change(0, orphan),
        Err(CoreError::RowNotFound { .. })
    ));
}

#[tokio::test]
async fn test_out_of_range_indexes_are_row_not_found() {
    let (_server, console) = setup().await;
    let machines = console.machines();

    assert!(matches!(machines.copy(7), Err(CoreError::RowNotFound { .. })));
    assert!(matches!(machines.update(7), Err(CoreError::RowNotFound { .. })));
    assert!(matches!(machines.remove(7), Err(CoreError::RowNotFound { .. })));
}

#[tokio::test]
async fn test_copying_a_saved_row_yields_an_editable_new_draft() {
    let (server, console) = setup().await;
    let bootenvs = console.bootenvs();

    mount_bootenvs(&server, json!([bootenv("local")])).await;
    bootenvs.load().await.unwrap();

    // a dirty, errored source must not leak its state into the copy
    let mut source = (*bootenvs.row(0).unwrap()).clone();
    source.flags.edited = true;
    source.flags.error = Some("previous save failed".into());
    bootenvs.change(0, source).unwrap();

    bootenvs.copy(0).unwrap();

    assert_eq!(bootenvs.len(), 2);
    let copy = bootenvs.row(1).unwrap();
    assert!(copy.flags.is_new);
    assert!(!copy.flags.edited);
    assert_eq!(copy.flags.error, None);
    assert_eq!(copy.entity.kernel, "vmlinuz0");

    // the copy's name is still editable, unlike the original's
    let mut draft = (*copy).clone();
    draft
        .apply_field_change("Name", "local-uefi", InputKind::Text)
        .unwrap();
    assert_eq!(draft.entity.name, "local-uefi");
}

// ── Saving ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_saving_a_new_row_posts_and_absorbs_the_answer() {
    let (server, console) = setup().await;
    let bootenvs = console.bootenvs();

    Mock::given(method("POST"))
        .and(path("/api/v3/bootenvs"))
        .and(body_partial_json(json!({ "Name": "sandbox" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(bootenv("sandbox")))
        .mount(&server)
        .await;

    let row = bootenvs.add(None);
    let mut draft = (*bootenvs.row(0).unwrap()).clone();
    draft
        .apply_field_change("Name", "sandbox", InputKind::Text)
        .unwrap();
    bootenvs.change(0, draft).unwrap();

    bootenvs.update(0).unwrap().await.unwrap();

    let saved = bootenvs.row(0).unwrap();
    // same row, now carrying the server's canonical answer
    assert_eq!(saved.row_id(), row);
    assert_eq!(saved.sync_state(), SyncState::Clean);
    assert!(!saved.flags.is_new);
    assert!(!saved.flags.updating);
    assert!(saved.entity.validated);
    assert_eq!(saved.entity.kernel, "vmlinuz0");
}

#[tokio::test]
async fn test_saving_an_edited_row_puts_by_name() {
    let (server, console) = setup().await;
    let bootenvs = console.bootenvs();

    mount_bootenvs(&server, json!([bootenv("local")])).await;

    let mut canonical = bootenv("local");
    canonical["Description"] = json!("local disk boot");
    Mock::given(method("PUT"))
        .and(path("/api/v3/bootenvs/local"))
        .and(body_partial_json(json!({ "Description": "local disk boot" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(&canonical))
        .mount(&server)
        .await;

    bootenvs.load().await.unwrap();
    let mut draft = (*bootenvs.row(0).unwrap()).clone();
    draft
        .apply_field_change("Description", "local disk boot", InputKind::Text)
        .unwrap();
    bootenvs.change(0, draft).unwrap();

    bootenvs.update(0).unwrap().await.unwrap();

    let saved = bootenvs.row(0).unwrap();
    assert_eq!(saved.entity.description, "local disk boot");
    assert_eq!(saved.sync_state(), SyncState::Clean);
}

#[tokio::test]
async fn test_a_rejected_save_keeps_the_draft_and_the_reason() {
    let (server, console) = setup().await;
    let bootenvs = console.bootenvs();

    mount_bootenvs(&server, json!([bootenv("local")])).await;
    Mock::given(method("PUT"))
        .and(path("/api/v3/bootenvs/local"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "Messages": ["Kernel vmlinuz9 missing", "no templates"]
        })))
        .mount(&server)
        .await;

    bootenvs.load().await.unwrap();
    let mut draft = (*bootenvs.row(0).unwrap()).clone();
    draft
        .apply_field_change("Kernel", "vmlinuz9", InputKind::Text)
        .unwrap();
    bootenvs.change(0, draft).unwrap();

    bootenvs.update(0).unwrap().await.unwrap();

    let kept = bootenvs.row(0).unwrap();
    assert_eq!(kept.sync_state(), SyncState::Errored);
    assert_eq!(
        kept.flags.error.as_deref(),
        Some("Error (422): Kernel vmlinuz9 missing, no templates")
    );
    // the edit survives for the operator to fix and retry
    assert!(kept.flags.edited);
    assert!(!kept.flags.updating);
    assert_eq!(kept.entity.kernel, "vmlinuz9");
}

#[tokio::test]
async fn test_a_failure_without_messages_reads_as_the_bare_status() {
    let (server, console) = setup().await;
    let bootenvs = console.bootenvs();

    Mock::given(method("POST"))
        .and(path("/api/v3/bootenvs"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    bootenvs.add(None);
    bootenvs.update(0).unwrap().await.unwrap();

    assert_eq!(bootenvs.row(0).unwrap().flags.error.as_deref(), Some("500"));
}

#[tokio::test]
async fn test_a_second_save_while_one_is_in_flight_is_busy() {
    let (server, console) = setup().await;
    let bootenvs = console.bootenvs();

    mount_bootenvs(&server, json!([bootenv("local")])).await;
    Mock::given(method("PUT"))
        .and(path("/api/v3/bootenvs/local"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(bootenv("local"))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    bootenvs.load().await.unwrap();
    let mut draft = (*bootenvs.row(0).unwrap()).clone();
    draft
        .apply_field_change("Description", "twice", InputKind::Text)
        .unwrap();
    bootenvs.change(0, draft).unwrap();

    let first = bootenvs.update(0).unwrap();
    assert!(bootenvs.row(0).unwrap().flags.updating);
    assert!(matches!(
        bootenvs.update(0),
        Err(CoreError::RowBusy { .. })
    ));

    first.await.unwrap();
    assert!(!bootenvs.row(0).unwrap().flags.updating);
}

#[tokio::test]
async fn test_independent_rows_complete_out_of_order() {
    let (server, console) = setup().await;
    let bootenvs = console.bootenvs();

    mount_bootenvs(
        &server,
        json!([bootenv("local"), bootenv("discovery"), bootenv("sledgehammer")]),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/api/v3/bootenvs/local"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(bootenv("local"))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v3/bootenvs/sledgehammer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bootenv("sledgehammer")))
        .mount(&server)
        .await;

    bootenvs.load().await.unwrap();
    for index in [0, 2] {
        let mut draft = (*bootenvs.row(index).unwrap()).clone();
        draft
            .apply_field_change("Description", "touched", InputKind::Text)
            .unwrap();
        bootenvs.change(index, draft).unwrap();
    }

    let slow = bootenvs.update(0).unwrap();
    let fast = bootenvs.update(2).unwrap();

    // the later row's answer comes back first and only settles itself
    fast.await.unwrap();
    assert!(bootenvs.row(0).unwrap().flags.updating);
    assert_eq!(bootenvs.row(0).unwrap().entity.description, "touched");
    assert_eq!(bootenvs.row(2).unwrap().sync_state(), SyncState::Clean);

    slow.await.unwrap();
    assert!(!bootenvs.row(0).unwrap().flags.updating);
    assert_eq!(bootenvs.row(0).unwrap().sync_state(), SyncState::Clean);
}

#[tokio::test]
async fn test_a_completion_after_a_reload_lands_nowhere() {
    let (server, console) = setup().await;
    let bootenvs = console.bootenvs();

    Mock::given(method("GET"))
        .and(path("/api/v3/bootenvs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([bootenv("local")])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_bootenvs(&server, json!([bootenv("rescued")])).await;
    Mock::given(method("PUT"))
        .and(path("/api/v3/bootenvs/local"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(bootenv("local"))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    bootenvs.load().await.unwrap();
    let old_row = bootenvs.row(0).unwrap().row_id();
    let handle = bootenvs.update(0).unwrap();

    // the list is reloaded out from under the in-flight save
    bootenvs.load().await.unwrap();
    handle.await.unwrap();

    let rows = bootenvs.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].entity.name, "rescued");
    assert_ne!(rows[0].row_id(), old_row);
    assert!(!rows[0].flags.updating);
    assert_eq!(rows[0].sync_state(), SyncState::Clean);
}

// ── Removal ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_removing_a_new_row_never_touches_the_network() {
    let (server, console) = setup().await;
    let bootenvs = console.bootenvs();

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    bootenvs.add(None);
    let handle = bootenvs.remove(0).unwrap();

    assert!(handle.is_none());
    assert!(bootenvs.is_empty());
}

#[tokio::test]
async fn test_a_saved_row_leaves_only_when_the_server_agrees() {
    let (server, console) = setup().await;
    let bootenvs = console.bootenvs();

    mount_bootenvs(&server, json!([bootenv("local")])).await;
    // the service answers DELETE with the removed entity
    Mock::given(method("DELETE"))
        .and(path("/api/v3/bootenvs/local"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bootenv("local")))
        .mount(&server)
        .await;

    bootenvs.load().await.unwrap();
    let handle = bootenvs.remove(0).unwrap().unwrap();

    // still listed while the round trip is out
    assert_eq!(bootenvs.len(), 1);
    assert!(bootenvs.row(0).unwrap().flags.updating);

    handle.await.unwrap();
    assert!(bootenvs.is_empty());
}

#[tokio::test]
async fn test_a_refused_delete_keeps_the_row_with_a_banner() {
    let (server, console) = setup().await;
    let bootenvs = console.bootenvs();

    mount_bootenvs(&server, json!([bootenv("local")])).await;
    Mock::given(method("DELETE"))
        .and(path("/api/v3/bootenvs/local"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "Messages": ["machine node-1 still boots local"]
        })))
        .mount(&server)
        .await;

    bootenvs.load().await.unwrap();
    bootenvs.remove(0).unwrap().unwrap().await.unwrap();

    let kept = bootenvs.row(0).unwrap();
    assert_eq!(bootenvs.len(), 1);
    assert_eq!(
        kept.flags.error.as_deref(),
        Some("Error (409): machine node-1 still boots local")
    );
    assert!(!kept.flags.updating);
}

// ── Subnets and interfaces ──────────────────────────────────────────

#[tokio::test]
async fn test_subnets_load_interfaces_first_and_fail_together() {
    let (server, console) = setup().await;
    let subnets = console.subnets();

    Mock::given(method("GET"))
        .and(path("/api/v3/interfaces"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    // without the NIC list the subnet fetch never goes out
    Mock::given(method("GET"))
        .and(path("/api/v3/subnets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let result = subnets.load().await;

    assert!(result.is_err());
    assert_eq!(*subnets.load_state().borrow(), LoadState::Failed("500".into()));
    assert!(subnets.interfaces().is_empty());
}

#[tokio::test]
async fn test_subnets_load_exposes_the_interface_list() {
    let (server, console) = setup().await;
    let subnets = console.subnets();

    Mock::given(method("GET"))
        .and(path("/api/v3/interfaces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "Name": "eth0", "Index": 2, "Addresses": ["192.168.124.1/24"] }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/subnets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "Name": "lab", "Subnet": "10.20.0.0/16" }
        ])))
        .mount(&server)
        .await;

    subnets.load().await.unwrap();

    assert_eq!(*subnets.load_state().borrow(), LoadState::Loaded);
    assert_eq!(subnets.len(), 1);
    let interfaces = subnets.interfaces();
    assert_eq!(interfaces.len(), 1);
    assert_eq!(interfaces[0].addresses[0], "192.168.124.1/24");
}

#[tokio::test]
async fn test_a_subnet_drafted_from_a_nic_is_ready_to_save() {
    let (server, console) = setup().await;
    let subnets = console.subnets();

    Mock::given(method("GET"))
        .and(path("/api/v3/interfaces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "Name": "eth0", "Index": 2, "Addresses": ["192.168.124.1/24"] }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/subnets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    subnets.load().await.unwrap();
    let interfaces = subnets.interfaces();
    let row = subnets.add_from_interface(&interfaces[0], "192.168.124.0/24");

    let draft = subnets.row(0).unwrap();
    assert_eq!(draft.row_id(), row);
    assert!(draft.flags.is_new);
    assert_eq!(draft.entity.name, "eth0");
    assert_eq!(draft.entity.subnet, "192.168.124.0/24");
    assert_eq!(draft.entity.strategy, "MAC");
    assert_eq!(draft.entity.active_lease_time, Some(60));
    assert_eq!(draft.entity.reserved_lease_time, Some(7200));
    let codes: Vec<u8> = draft.entity.options.iter().map(|o| o.code).collect();
    assert_eq!(codes, vec![3, 6, 15, 67]);
}

// ── Machines ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_a_machine_is_created_without_a_uuid_then_put_by_it() {
    let (server, console) = setup().await;
    let machines = console.machines();

    let uuid = "3945838b-bf0d-4b0c-97c5-f2f03fd7a433";
    let assigned = json!({
        "Name": "node-1.example.com",
        "Uuid": uuid,
        "Address": "192.168.124.30",
        "BootEnv": "local",
        "Validated": true,
        "Available": true,
    });
    Mock::given(method("POST"))
        .and(path("/api/v3/machines"))
        .and(body_partial_json(json!({ "Name": "node-1.example.com" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(&assigned))
        .mount(&server)
        .await;

    machines.add(None);
    let mut draft = (*machines.row(0).unwrap()).clone();
    draft
        .apply_field_change("Name", "node-1.example.com", InputKind::Text)
        .unwrap();
    draft
        .apply_field_change("Address", "192.168.124.30", InputKind::Text)
        .unwrap();
    draft
        .apply_field_change("BootEnv", "local", InputKind::Text)
        .unwrap();
    // nothing to send as Uuid yet
    assert_eq!(draft.entity.uuid, None);
    machines.change(0, draft).unwrap();

    machines.update(0).unwrap().await.unwrap();

    let saved = machines.row(0).unwrap();
    assert_eq!(saved.entity.uuid.unwrap().to_string(), uuid);
    assert_eq!(saved.sync_state(), SyncState::Clean);

    // machines stay renameable because the Uuid is the key, not the name
    let mut renamed = (*saved).clone();
    renamed
        .apply_field_change("Name", "node-1.lab.example.com", InputKind::Text)
        .unwrap();
    machines.change(0, renamed).unwrap();

    let mut echoed = assigned.clone();
    echoed["Name"] = json!("node-1.lab.example.com");
    Mock::given(method("PUT"))
        .and(path(format!("/api/v3/machines/{uuid}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(&echoed))
        .mount(&server)
        .await;

    machines.update(0).unwrap().await.unwrap();
    assert_eq!(machines.row(0).unwrap().entity.name, "node-1.lab.example.com");
}

// ── Console ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_load_all_bootstraps_every_collection() {
    let (server, console) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/interfaces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "Name": "eth0", "Index": 2, "Addresses": ["192.168.124.1/24"] }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/subnets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "Name": "eth0", "Subnet": "192.168.124.0/24" }
        ])))
        .mount(&server)
        .await;
    mount_bootenvs(&server, json!([bootenv("local"), bootenv("discovery")])).await;
    Mock::given(method("GET"))
        .and(path("/api/v3/machines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    console.load_all().await.unwrap();

    assert_eq!(console.subnets().len(), 1);
    assert_eq!(console.bootenvs().len(), 2);
    assert!(console.machines().is_empty());
    assert_eq!(*console.subnets().load_state().borrow(), LoadState::Loaded);
    assert_eq!(*console.bootenvs().load_state().borrow(), LoadState::Loaded);
    assert_eq!(*console.machines().load_state().borrow(), LoadState::Loaded);
}
