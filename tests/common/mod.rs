//! Shared utilities for integration testing.

#![allow(dead_code)]

use async_trait::async_trait;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use users_service::config::ServiceConfig;
use users_service::connectivity::{BackendDriver, ConnectError, Endpoint};

/// A fake backend that can be stopped, dropping every open connection.
pub struct MockBackend {
    pub addr: SocketAddr,
    stop: watch::Sender<bool>,
}

impl MockBackend {
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Reserve a local port nothing is listening on.
pub async fn free_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Start a backend that only accepts TCP connections and holds them open.
pub async fn start_mock_backend(addr: SocketAddr) -> MockBackend {
    serve(addr, |socket, mut stop| async move {
        let _socket = socket;
        let _ = stop.changed().await;
    })
    .await
}

/// Start a minimal RESP server answering PING with +PONG and AUTH with +OK.
pub async fn start_fake_redis(addr: SocketAddr) -> MockBackend {
    serve(addr, |socket, mut stop| async move {
        tokio::select! {
            _ = answer_resp(socket) => {},
            _ = stop.changed() => {},
        }
    })
    .await
}

async fn serve<F, Fut>(addr: SocketAddr, handler: F) -> MockBackend
where
    F: Fn(TcpStream, watch::Receiver<bool>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, mut stopped) = watch::channel(false);
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((socket, _)) => {
                        tokio::spawn(handler(socket, stopped.clone()));
                    }
                    Err(_) => break,
                },
                _ = stopped.changed() => break,
            }
        }
    });

    MockBackend { addr, stop }
}

async fn answer_resp(socket: TcpStream) {
    let mut conn = BufReader::new(socket);
    let mut line = String::new();
    loop {
        line.clear();
        match conn.read_line(&mut line).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let Some(count) = line.trim().strip_prefix('*').and_then(|n| n.parse::<usize>().ok()) else {
            return;
        };

        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            // $<len> header, then the argument itself.
            line.clear();
            if conn.read_line(&mut line).await.unwrap_or(0) == 0 {
                return;
            }
            line.clear();
            if conn.read_line(&mut line).await.unwrap_or(0) == 0 {
                return;
            }
            args.push(line.trim().to_ascii_uppercase());
        }

        let reply: &[u8] = match args.first().map(String::as_str) {
            Some("PING") => b"+PONG\r\n",
            Some("AUTH") => b"+OK\r\n",
            _ => b"-ERR unknown command\r\n",
        };
        if conn.get_mut().write_all(reply).await.is_err() {
            return;
        }
    }
}

/// Driver whose connect never completes.
pub struct HangingDriver;

#[async_trait]
impl BackendDriver for HangingDriver {
    async fn connect(&self, _endpoint: &Endpoint) -> Result<(), ConnectError> {
        std::future::pending().await
    }

    async fn ping(&self) -> Result<(), ConnectError> {
        Ok(())
    }
}

/// Driver that always connects.
pub struct AlwaysUpDriver;

#[async_trait]
impl BackendDriver for AlwaysUpDriver {
    async fn connect(&self, _endpoint: &Endpoint) -> Result<(), ConnectError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), ConnectError> {
        Ok(())
    }
}

/// Driver that always connects; its link health is switchable.
pub struct SwitchableLinkDriver {
    pub link_up: AtomicBool,
}

impl SwitchableLinkDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { link_up: AtomicBool::new(true) })
    }
}

#[async_trait]
impl BackendDriver for SwitchableLinkDriver {
    async fn connect(&self, _endpoint: &Endpoint) -> Result<(), ConnectError> {
        self.link_up.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn ping(&self) -> Result<(), ConnectError> {
        if self.link_up.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ConnectError::NotConnected)
        }
    }
}

/// Config with fast retries, pointed at the given backends.
pub fn test_config(datastore: SocketAddr, cache: SocketAddr) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.datastore.url = format!("mongodb://app:s3cret@{}/users", datastore);
    config.cache.url = format!("redis://:s3cret@{}", cache);
    config.cache.heartbeat_interval_secs = 1;
    config.retries.max_retries = 2;
    config.retries.base_delay_ms = 50;
    config.retries.max_delay_ms = 100;
    config.timeouts.connect_secs = 1;
    config.admin.enabled = true;
    config.admin.api_key = "test-admin-key".to_string();
    config
}

/// Poll `check` every 50ms until it returns true or `within` elapses.
pub async fn eventually<F, Fut>(within: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + within;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
