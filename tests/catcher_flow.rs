//! End-to-end flows: viewers attach over WebSocket and receive what is caught.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use reqwest::header::{HOST, LOCATION};
use reqwest::StatusCode;
use tokio_tungstenite::tungstenite::Message;

use request_catcher::config::CatcherConfig;

mod common;

use common::{connect_viewer, next_event, rejection_status, send_capture, start_catcher, wait_for_viewers};

#[tokio::test]
async fn caught_request_reaches_viewer() {
    let catcher = start_catcher(CatcherConfig::default()).await;
    let mut viewer = connect_viewer(catcher.addr, "alpha.catch.test").await.unwrap();

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{}/hooks/github?delivery=7", catcher.addr))
        .header(HOST, "Alpha.Catch.Test:8080")
        .header("X-Trace", "one")
        .header("X-Trace", "two")
        .body("{\"zen\":\"keep it simple\"}")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");

    let event = next_event(&mut viewer).await;
    assert_eq!(event["host"], "alpha.catch.test");
    assert_eq!(event["method"], "POST");
    assert_eq!(event["path"], "/hooks/github?delivery=7");
    assert_eq!(event["headers"]["X-Trace"], serde_json::json!(["one", "two"]));
    assert_eq!(event["body"], "{\"zen\":\"keep it simple\"}");
    assert_eq!(event["body_truncated"], false);
    assert!(event["remote_addr"].as_str().unwrap().starts_with("127.0.0.1:"));
    assert!(event["raw_request"]
        .as_str()
        .unwrap()
        .starts_with("POST /hooks/github?delivery=7 HTTP/1.1"));
}

#[tokio::test]
async fn unknown_host_is_acknowledged_without_creating_a_tenant() {
    let catcher = start_catcher(CatcherConfig::default()).await;
    let client = reqwest::Client::new();

    let body = send_capture(&client, catcher.addr, "nobody.catch.test", "/x", "hello").await;
    assert_eq!(body, "ok");
    assert!(catcher.registry.lookup("nobody.catch.test").is_none());
    assert!(catcher.registry.is_empty());
}

#[tokio::test]
async fn exclusive_tenant_refuses_second_viewer_until_first_leaves() {
    let catcher = start_catcher(CatcherConfig::default()).await;
    let host = "solo.catch.test";

    let mut first = connect_viewer(catcher.addr, host).await.unwrap();
    let err = connect_viewer(catcher.addr, host).await.unwrap_err();
    assert_eq!(rejection_status(&err), 405);
    assert_eq!(catcher.registry.lookup(host).unwrap().subscriber_count(), 1);

    first.close(None).await.unwrap();
    wait_for_viewers(&catcher.registry, host, 0).await;

    let mut second = connect_viewer(catcher.addr, host).await.unwrap();
    let client = reqwest::Client::new();
    send_capture(&client, catcher.addr, host, "/after", "").await;
    assert_eq!(next_event(&mut second).await["path"], "/after");
}

#[tokio::test]
async fn shared_tenant_fans_out_to_every_viewer() {
    let config = CatcherConfig {
        allow_multiple: true,
        ..CatcherConfig::default()
    };
    let catcher = start_catcher(config).await;
    let host = "team.catch.test";

    let mut viewers = Vec::new();
    for _ in 0..3 {
        viewers.push(connect_viewer(catcher.addr, host).await.unwrap());
    }
    wait_for_viewers(&catcher.registry, host, 3).await;

    let client = reqwest::Client::new();
    send_capture(&client, catcher.addr, host, "/deploy", "v2").await;

    for viewer in &mut viewers {
        let event = next_event(viewer).await;
        assert_eq!(event["path"], "/deploy");
        assert_eq!(event["body"], "v2");
    }
}

#[tokio::test]
async fn subscribe_with_wrong_method_is_refused() {
    let catcher = start_catcher(CatcherConfig::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/init-client", catcher.addr))
        .header(HOST, "a.catch.test")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(catcher.registry.is_empty());
}

#[tokio::test]
async fn www_prefix_is_redirected_to_bare_host() {
    let catcher = start_catcher(CatcherConfig::default()).await;
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let response = client
        .get(format!("http://{}/inbox?tab=2", catcher.addr))
        .header(HOST, "www.alpha.catch.test")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        response.headers()[LOCATION],
        "http://alpha.catch.test/inbox?tab=2"
    );
}

#[tokio::test]
async fn tenants_are_isolated() {
    let catcher = start_catcher(CatcherConfig::default()).await;
    let mut alpha = connect_viewer(catcher.addr, "alpha.catch.test").await.unwrap();
    let mut beta = connect_viewer(catcher.addr, "beta.catch.test").await.unwrap();

    let client = reqwest::Client::new();
    send_capture(&client, catcher.addr, "beta.catch.test", "/for-beta", "").await;
    send_capture(&client, catcher.addr, "alpha.catch.test", "/for-alpha", "").await;

    assert_eq!(next_event(&mut alpha).await["path"], "/for-alpha");
    assert_eq!(next_event(&mut beta).await["path"], "/for-beta");
}

#[tokio::test]
async fn sequential_captures_arrive_in_order() {
    let catcher = start_catcher(CatcherConfig::default()).await;
    let host = "order.catch.test";
    let mut viewer = connect_viewer(catcher.addr, host).await.unwrap();

    let client = reqwest::Client::new();
    for i in 0..20 {
        send_capture(&client, catcher.addr, host, &format!("/seq/{i}"), "").await;
    }

    for i in 0..20 {
        assert_eq!(next_event(&mut viewer).await["path"], format!("/seq/{i}"));
    }
}

#[tokio::test]
async fn viewer_sees_nothing_captured_before_it_attached() {
    let config = CatcherConfig {
        allow_multiple: true,
        ..CatcherConfig::default()
    };
    let catcher = start_catcher(config).await;
    let host = "late.catch.test";
    let _early = connect_viewer(catcher.addr, host).await.unwrap();

    let client = reqwest::Client::new();
    send_capture(&client, catcher.addr, host, "/before", "").await;

    let mut late = connect_viewer(catcher.addr, host).await.unwrap();
    send_capture(&client, catcher.addr, host, "/after", "").await;
    assert_eq!(next_event(&mut late).await["path"], "/after");
}

#[tokio::test]
async fn shutdown_closes_viewers() {
    let catcher = start_catcher(CatcherConfig::default()).await;
    let host = "bye.catch.test";
    let mut viewer = connect_viewer(catcher.addr, host).await.unwrap();

    catcher.shutdown.trigger();

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match viewer.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "viewer was not closed on shutdown");
    wait_for_viewers(&catcher.registry, host, 0).await;
}

#[tokio::test]
async fn viewer_frames_from_client_are_ignored() {
    let catcher = start_catcher(CatcherConfig::default()).await;
    let host = "chatty.catch.test";
    let mut viewer = connect_viewer(catcher.addr, host).await.unwrap();

    viewer.send(Message::Text("hello?".into())).await.unwrap();

    let client = reqwest::Client::new();
    send_capture(&client, catcher.addr, host, "/still-here", "").await;
    assert_eq!(next_event(&mut viewer).await["path"], "/still-here");
}
