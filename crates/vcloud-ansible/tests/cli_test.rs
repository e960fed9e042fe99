//! Integration tests for the `vcd-inventory` and `vcd-vapp-network` binaries.
//!
//! Every command runs with an isolated HOME, config dir and cache dir so the
//! user's real configuration and cache are never touched.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

fn isolate(cmd: &mut assert_cmd::Command, home: &Path) {
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("VCD_CACHE_DIR", home.join("cache"))
        .env_remove("VCD_URL")
        .env_remove("VCD_USER")
        .env_remove("VCD_PASSWORD")
        .env_remove("VCD_ORG")
        .env_remove("VCD_ANSIBLE_CONFIG")
        .env_remove("VCD_INSECURE")
        .env_remove("VCD_TIMEOUT")
        .env_remove("VCD_TASK_TIMEOUT")
        .env_remove("VCD_API_VERSION")
        .env_remove("RUST_LOG");
}

fn inventory_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("vcd-inventory");
    isolate(&mut cmd, home);
    cmd
}

fn module_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("vcd-vapp-network");
    isolate(&mut cmd, home);
    cmd
}

fn with_credentials(cmd: &mut assert_cmd::Command, url: &str) {
    cmd.env("VCD_URL", url)
        .env("VCD_USER", "ansible")
        .env("VCD_PASSWORD", "s3cret")
        .env("VCD_ORG", "acme");
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}):\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/vnd.vmware.vcloud+xml")
        .set_body_string(body)
}

async fn mount_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-vcloud-authorization", "tok"))
        .mount(server)
        .await;
}

/// `vapp1` holding `web1` (10.0.0.5) tagged `prod`.
async fn mount_inventory(server: &MockServer) {
    let base = server.uri();
    mount_session(server).await;

    Mock::given(method("GET"))
        .and(path("/api/vApps/query"))
        .respond_with(xml(format!(
            r#"<QueryResultRecords xmlns="http://www.vmware.com/vcloud/v1.5">
                <VAppRecord name="vapp1" href="{base}/api/vApp/vapp-1"/>
            </QueryResultRecords>"#
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/vApp/vapp-1"))
        .respond_with(xml(format!(
            r#"<VApp xmlns="http://www.vmware.com/vcloud/v1.5" name="vapp1"><Children>
                <Vm name="web1" href="{base}/api/vApp/vm-1">
                    <NetworkConnectionSection><NetworkConnection><IpAddress>10.0.0.5</IpAddress></NetworkConnection></NetworkConnectionSection>
                </Vm>
            </Children></VApp>"#
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/vApp/vm-1/metadata"))
        .respond_with(xml(
            r#"<Metadata xmlns="http://www.vmware.com/vcloud/v1.5">
                <MetadataEntry><Key>ansible_groups</Key><TypedValue><Value>prod</Value></TypedValue></MetadataEntry>
            </Metadata>"#
                .to_owned(),
        ))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    let home = TempDir::new().unwrap();
    inventory_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("vCloud Director")
                .and(predicate::str::contains("--list"))
                .and(predicate::str::contains("--refresh-cache")),
        );
}

#[test]
fn test_version_flag() {
    let home = TempDir::new().unwrap();
    inventory_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vcd-inventory"));
}

#[test]
fn test_host_conflicts_with_refresh() {
    let home = TempDir::new().unwrap();
    inventory_cmd(home.path())
        .args(["--host", "web1", "--refresh-cache"])
        .assert()
        .code(2);
}

#[test]
fn test_completions_bash() {
    let home = TempDir::new().unwrap();
    inventory_cmd(home.path())
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vcd-inventory"));
}

// ── Credentials ─────────────────────────────────────────────────────

#[test]
fn test_missing_credentials_exit_code() {
    let home = TempDir::new().unwrap();
    inventory_cmd(home.path())
        .arg("--list")
        .assert()
        .code(3)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Missing VCD_URL environment variable!"));
}

#[test]
fn test_blank_password_is_missing() {
    let home = TempDir::new().unwrap();
    let mut cmd = inventory_cmd(home.path());
    with_credentials(&mut cmd, "https://vcd.example.com");
    cmd.env("VCD_PASSWORD", "  ")
        .arg("--list")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Missing VCD_PASSWORD environment variable!"));
}

#[test]
fn test_explicit_config_must_exist() {
    let home = TempDir::new().unwrap();
    let mut cmd = inventory_cmd(home.path());
    with_credentials(&mut cmd, "https://vcd.example.com");
    cmd.args(["--config", "/nonexistent/vcd.toml", "--list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("config file not found"));
}

// ── Inventory against a mocked cell ─────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_list_prints_inventory_and_writes_cache() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    let home = TempDir::new().unwrap();

    let mut cmd = inventory_cmd(home.path());
    with_credentials(&mut cmd, &server.uri());
    let output = cmd.arg("--list").output().unwrap();
    assert!(output.status.success(), "{output:?}");

    let doc = stdout_json(&output);
    assert_eq!(doc["_meta"]["hostvars"]["web1"]["ansible_host"], "10.0.0.5");
    assert_eq!(doc["prod"]["hosts"], json!(["web1"]));
    assert_eq!(doc["vapp1"]["hosts"], json!(["web1"]));
    assert_eq!(doc["server"]["hosts"], json!(["web1"]));

    assert!(home.path().join("cache").join("acme-ansible.cache").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_host_returns_hostvars() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    let home = TempDir::new().unwrap();

    let mut cmd = inventory_cmd(home.path());
    with_credentials(&mut cmd, &server.uri());
    let output = cmd.args(["--host", "web1"]).output().unwrap();
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout_json(&output), json!({ "ansible_host": "10.0.0.5" }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_host_is_empty_object() {
    let server = MockServer::start().await;
    mount_inventory(&server).await;
    let home = TempDir::new().unwrap();

    let mut cmd = inventory_cmd(home.path());
    with_credentials(&mut cmd, &server.uri());
    let output = cmd.args(["--host", "missing-host"]).output().unwrap();
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout_json(&output), json!({}));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_login_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();

    let mut cmd = inventory_cmd(home.path());
    with_credentials(&mut cmd, &server.uri());
    let output = cmd.arg("--list").output().unwrap();
    assert_eq!(output.status.code(), Some(3), "{output:?}");
    assert!(output.stdout.is_empty());
    assert!(!home.path().join("cache").join("acme-ansible.cache").exists());
}

// ── vApp network module ─────────────────────────────────────────────

#[test]
fn test_module_unreadable_args_file_fails_as_json() {
    let home = TempDir::new().unwrap();
    let output = module_cmd(home.path())
        .arg(home.path().join("missing.json"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["failed"], true);
    assert_eq!(result["changed"], false);
}

#[test]
fn test_module_missing_credentials_fails_as_json() {
    let home = TempDir::new().unwrap();
    let args = home.path().join("args.json");
    std::fs::write(
        &args,
        json!({"network": "n", "vapp": "vapp1", "vdc": "vdc1", "state": "absent"}).to_string(),
    )
    .unwrap();

    let output = module_cmd(home.path()).arg(&args).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["failed"], true);
    assert_eq!(result["msg"], "Missing VCD_URL environment variable!");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_module_check_mode_reports_change_without_put() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/org"))
        .respond_with(xml(format!(
            r#"<OrgList xmlns="http://www.vmware.com/vcloud/v1.5"><Org name="acme" href="{base}/api/org/o-1"/></OrgList>"#
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/org/o-1"))
        .respond_with(xml(format!(
            r#"<Org xmlns="http://www.vmware.com/vcloud/v1.5" name="acme">
                <Link rel="down" type="application/vnd.vmware.vcloud.vdc+xml" name="vdc1" href="{base}/api/vdc/v-1"/>
            </Org>"#
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/vdc/v-1"))
        .respond_with(xml(format!(
            r#"<Vdc xmlns="http://www.vmware.com/vcloud/v1.5" name="vdc1">
                <ResourceEntities>
                    <ResourceEntity type="application/vnd.vmware.vcloud.vApp+xml" name="vapp1" href="{base}/api/vApp/vapp-1"/>
                </ResourceEntities>
            </Vdc>"#
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/vApp/vapp-1"))
        .respond_with(xml(format!(
            r#"<VApp xmlns="http://www.vmware.com/vcloud/v1.5" name="vapp1">
                <NetworkConfigSection href="{base}/api/vApp/vapp-1/networkConfigSection/"/>
            </VApp>"#
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/vApp/vapp-1/networkConfigSection/"))
        .respond_with(xml(format!(
            r#"<NetworkConfigSection xmlns="http://www.vmware.com/vcloud/v1.5">
                <Link rel="edit" type="application/vnd.vmware.vcloud.networkConfigSection+xml" href="{base}/api/vApp/vapp-1/networkConfigSection/"/>
            </NetworkConfigSection>"#
        )))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let args = home.path().join("args.json");
    std::fs::write(
        &args,
        json!({
            "network": "vapp1_net", "vapp": "vapp1", "vdc": "vdc1", "state": "present",
            "ip_scope": "10.0.0.0/24", "fence_mode": "isolated",
            "host": base, "user": "ansible", "password": "s3cret", "org": "acme",
            "_ansible_check_mode": true,
        })
        .to_string(),
    )
    .unwrap();

    let output = module_cmd(home.path()).arg(&args).output().unwrap();
    assert!(output.status.success(), "{output:?}");
    let result = stdout_json(&output);
    assert_eq!(result["changed"], true);
    assert_eq!(result["failed"], false);
}
