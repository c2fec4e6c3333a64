//! Admin surface on the root host.

use reqwest::header::{HOST, WWW_AUTHENTICATE};
use reqwest::StatusCode;
use serde_json::Value;

use request_catcher::config::CatcherConfig;

mod common;

use common::{connect_viewer, start_catcher, wait_for_viewers};

fn admin_config() -> CatcherConfig {
    let mut config = CatcherConfig::default();
    config.root_host = "catch.test".into();
    config.admin.enabled = true;
    config.admin.password = "hunter2".into();
    config
}

#[tokio::test]
async fn requires_credentials() {
    let catcher = start_catcher(admin_config()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{}/admin/status", catcher.addr))
        .header(HOST, "catch.test")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[WWW_AUTHENTICATE], "Basic realm=\"admin\"");

    let response = client
        .get(format!("http://{}/admin/status", catcher.addr))
        .header(HOST, "catch.test")
        .basic_auth("admin", Some("wrong"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reports_tenants_and_viewers() {
    let catcher = start_catcher(admin_config()).await;
    let _viewer = connect_viewer(catcher.addr, "alpha.catch.test").await.unwrap();
    wait_for_viewers(&catcher.registry, "alpha.catch.test", 1).await;
    let client = reqwest::Client::new();

    let status: Value = client
        .get(format!("http://{}/admin/status", catcher.addr))
        .header(HOST, "catch.test:8080")
        .basic_auth("admin", Some("hunter2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["status"], "operational");
    assert_eq!(status["tenants"], 1);
    assert_eq!(status["viewers"], 1);

    let tenants: Value = client
        .get(format!("http://{}/admin/tenants", catcher.addr))
        .header(HOST, "catch.test")
        .basic_auth("admin", Some("hunter2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        tenants,
        serde_json::json!([{ "host": "alpha.catch.test", "subscribers": 1 }])
    );
}

#[tokio::test]
async fn admin_paths_on_tenant_hosts_are_caught() {
    let catcher = start_catcher(admin_config()).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{}/admin/status", catcher.addr))
        .header(HOST, "alpha.catch.test")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");
}
