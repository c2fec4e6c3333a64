//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::HOST;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use request_catcher::config::CatcherConfig;
use request_catcher::http::HttpServer;
use request_catcher::lifecycle::Shutdown;
use request_catcher::TenantRegistry;

pub type Viewer = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestCatcher {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub registry: Arc<TenantRegistry>,
}

impl Drop for TestCatcher {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a catcher on an ephemeral local port.
pub async fn start_catcher(config: CatcherConfig) -> TestCatcher {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config);
    let shutdown = server.shutdown_handle();
    let registry = server.registry();

    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    TestCatcher { addr, shutdown, registry }
}

/// Open a viewer socket for `host`.
pub async fn connect_viewer(addr: SocketAddr, host: &str) -> Result<Viewer, tungstenite::Error> {
    let mut request = format!("ws://{addr}/init-client").into_client_request()?;
    request
        .headers_mut()
        .insert(HOST, HeaderValue::from_str(host).unwrap());
    let (stream, _) = tokio_tungstenite::connect_async(request).await?;
    Ok(stream)
}

/// Status code of a refused viewer handshake.
pub fn rejection_status(err: &tungstenite::Error) -> u16 {
    match err {
        tungstenite::Error::Http(response) => response.status().as_u16(),
        other => panic!("expected an HTTP rejection, got {other:?}"),
    }
}

/// Send a request to `host` and return the response body.
pub async fn send_capture(
    client: &reqwest::Client,
    addr: SocketAddr,
    host: &str,
    path: &str,
    body: &str,
) -> String {
    let response = client
        .post(format!("http://{addr}{path}"))
        .header(HOST, host)
        .body(body.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    response.text().await.unwrap()
}

/// Next caught request delivered to `viewer`, as JSON.
pub async fn next_event(viewer: &mut Viewer) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), viewer.next())
            .await
            .expect("timed out waiting for an event")
            .expect("viewer stream ended")
            .expect("viewer stream failed");
        match message {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame {other:?}"),
        }
    }
}

/// Wait until `host` has exactly `count` viewers attached.
pub async fn wait_for_viewers(registry: &TenantRegistry, host: &str, count: usize) {
    for _ in 0..200 {
        let current = registry
            .lookup(host)
            .map(|tenant| tenant.subscriber_count())
            .unwrap_or(0);
        if current == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("{host} never reached {count} viewers");
}
