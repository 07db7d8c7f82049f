//! Backend drivers.
//!
//! # Responsibilities
//! - Open a connection to a backend endpoint (`connect`)
//! - Probe an established link (`ping`)
//!
//! # Design Decisions
//! - The datastore is probed at the TCP level only; its wire protocol is
//!   out of scope, so connect-time failure is the only signal
//! - The cache speaks enough RESP to authenticate and answer `PING`
//! - Drivers never retry on their own; the supervisor owns retry policy

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::connectivity::Endpoint;

/// Failure of a single connect or ping attempt.
///
/// Always recovered by the supervisor; never surfaced to request handlers.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("connection failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected reply: {0}")]
    Protocol(String),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("not connected")]
    NotConnected,
}

/// Capability a supervisor needs from a backend client library.
#[async_trait]
pub trait BackendDriver: Send + Sync {
    /// Establish a connection to `endpoint`.
    async fn connect(&self, endpoint: &Endpoint) -> Result<(), ConnectError>;

    /// Check that the established link is still alive.
    async fn ping(&self) -> Result<(), ConnectError>;
}

/// Datastore driver: a successful TCP handshake means reachable.
#[derive(Debug, Clone)]
pub struct TcpProbeDriver {
    connect_timeout: Duration,
}

impl TcpProbeDriver {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl BackendDriver for TcpProbeDriver {
    async fn connect(&self, endpoint: &Endpoint) -> Result<(), ConnectError> {
        let stream = timeout(self.connect_timeout, TcpStream::connect(endpoint.socket_target()))
            .await
            .map_err(|_| ConnectError::Timeout(self.connect_timeout))??;
        drop(stream);
        Ok(())
    }

    async fn ping(&self) -> Result<(), ConnectError> {
        Ok(())
    }
}

/// Cache driver speaking the Redis serialization protocol.
pub struct RespDriver {
    io_timeout: Duration,
    conn: Mutex<Option<BufReader<TcpStream>>>,
}

impl RespDriver {
    pub fn new(io_timeout: Duration) -> Self {
        Self {
            io_timeout,
            conn: Mutex::new(None),
        }
    }

    async fn open(&self, endpoint: &Endpoint) -> Result<BufReader<TcpStream>, ConnectError> {
        let stream = timeout(self.io_timeout, TcpStream::connect(endpoint.socket_target()))
            .await
            .map_err(|_| ConnectError::Timeout(self.io_timeout))??;
        stream.set_nodelay(true)?;
        let mut conn = BufReader::new(stream);

        if let Some(password) = endpoint.password() {
            let mut args = vec!["AUTH"];
            if let Some(user) = endpoint.username() {
                args.push(user);
            }
            args.push(password);
            let reply = self.command(&mut conn, &args).await?;
            if !reply.starts_with("+OK") {
                // Server error text never echoes the password, but scrub anyway.
                return Err(ConnectError::Auth(endpoint.scrub(reply.trim())));
            }
        }

        self.expect_pong(&mut conn).await?;
        Ok(conn)
    }

    async fn expect_pong(&self, conn: &mut BufReader<TcpStream>) -> Result<(), ConnectError> {
        let reply = self.command(conn, &["PING"]).await?;
        if reply.starts_with("+PONG") {
            Ok(())
        } else {
            Err(ConnectError::Protocol(reply.trim().to_string()))
        }
    }

    async fn command(&self, conn: &mut BufReader<TcpStream>, args: &[&str]) -> Result<String, ConnectError> {
        let frame = encode_command(args);
        let io = async {
            conn.get_mut().write_all(&frame).await?;
            let mut line = String::new();
            let n = conn.read_line(&mut line).await?;
            if n == 0 {
                return Err(ConnectError::Io(std::io::ErrorKind::UnexpectedEof.into()));
            }
            Ok::<_, ConnectError>(line)
        };
        timeout(self.io_timeout, io)
            .await
            .map_err(|_| ConnectError::Timeout(self.io_timeout))?
    }
}

#[async_trait]
impl BackendDriver for RespDriver {
    async fn connect(&self, endpoint: &Endpoint) -> Result<(), ConnectError> {
        let conn = self.open(endpoint).await?;
        *self.conn.lock().await = Some(conn);
        Ok(())
    }

    async fn ping(&self) -> Result<(), ConnectError> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(ConnectError::NotConnected)?;
        let result = self.expect_pong(conn).await;
        if result.is_err() {
            // Drop the broken socket; a later connect opens a fresh one.
            *guard = None;
        }
        result
    }
}

/// Encode a command as a RESP array of bulk strings.
fn encode_command(args: &[&str]) -> Vec<u8> {
    let mut out = format!("*{}\r\n", args.len()).into_bytes();
    for arg in args {
        out.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        out.extend_from_slice(arg.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    #[test]
    fn test_encode_command() {
        assert_eq!(encode_command(&["PING"]), b"*1\r\n$4\r\nPING\r\n".to_vec());
        assert_eq!(
            encode_command(&["AUTH", "pw"]),
            b"*2\r\n$4\r\nAUTH\r\n$2\r\npw\r\n".to_vec()
        );
    }

    #[tokio::test]
    async fn test_tcp_probe_reports_refused_connection() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let endpoint = Endpoint::parse(&format!("mongodb://{}/users", addr)).unwrap();
        let driver = TcpProbeDriver::new(Duration::from_secs(1));
        assert!(driver.connect(&endpoint).await.is_err());
    }

    #[tokio::test]
    async fn test_tcp_probe_succeeds_against_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let endpoint = Endpoint::parse(&format!("mongodb://{}/users", addr)).unwrap();
        let driver = TcpProbeDriver::new(Duration::from_secs(1));
        assert!(driver.connect(&endpoint).await.is_ok());
    }

    /// Accept one connection; answer AUTH with `auth_reply` and PING with +PONG.
    async fn spawn_resp_server(auth_reply: &'static str) -> (std::net::SocketAddr, Arc<Mutex<Vec<Vec<String>>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut conn = BufReader::new(socket);
            let mut line = String::new();
            loop {
                line.clear();
                if conn.read_line(&mut line).await.unwrap_or(0) == 0 {
                    return;
                }
                let count: usize = line.trim().trim_start_matches('*').parse().unwrap();
                let mut args = Vec::new();
                for _ in 0..count {
                    line.clear();
                    conn.read_line(&mut line).await.unwrap();
                    line.clear();
                    conn.read_line(&mut line).await.unwrap();
                    args.push(line.trim().to_string());
                }
                let reply = if args[0] == "AUTH" { auth_reply } else { "+PONG\r\n" };
                log.lock().await.push(args);
                conn.get_mut().write_all(reply.as_bytes()).await.unwrap();
            }
        });
        (addr, seen)
    }

    #[tokio::test]
    async fn test_resp_authenticates_before_ping() {
        let (addr, seen) = spawn_resp_server("+OK\r\n").await;
        let endpoint = Endpoint::parse(&format!("redis://app:s3cret@{}", addr)).unwrap();
        let driver = RespDriver::new(Duration::from_secs(1));

        driver.connect(&endpoint).await.unwrap();
        driver.ping().await.unwrap();

        let seen = seen.lock().await.clone();
        assert_eq!(seen[0], vec!["AUTH", "app", "s3cret"]);
        assert_eq!(seen[1], vec!["PING"]);
        assert_eq!(seen.len(), 3);
    }

    #[tokio::test]
    async fn test_resp_rejected_auth_is_scrubbed() {
        let (addr, _seen) = spawn_resp_server("-WRONGPASS invalid password s3cret\r\n").await;
        let endpoint = Endpoint::parse(&format!("redis://:s3cret@{}", addr)).unwrap();
        let driver = RespDriver::new(Duration::from_secs(1));

        match driver.connect(&endpoint).await {
            Err(ConnectError::Auth(message)) => {
                assert!(message.contains("WRONGPASS"));
                assert!(!message.contains("s3cret"));
            }
            other => panic!("expected auth error, got {:?}", other),
        }
        assert!(matches!(driver.ping().await, Err(ConnectError::NotConnected)));
    }

    #[tokio::test]
    async fn test_resp_ping_without_connection() {
        let driver = RespDriver::new(Duration::from_secs(1));
        assert!(matches!(driver.ping().await, Err(ConnectError::NotConnected)));
    }
}
