//! Test IRC server.
//!
//! A scripted server on a loopback port: tests accept the client's
//! connection, read the lines it sends and write whatever the scenario needs.

#![allow(dead_code)]

use std::time::Duration;

use slirc_client::{ClientConfig, Session, SessionEvent};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

const TIMEOUT: Duration = Duration::from_secs(5);

/// A listening test server.
pub struct MockServer {
    listener: TcpListener,
    port: u16,
}

impl MockServer {
    /// Bind to an ephemeral loopback port.
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        Ok(Self { listener, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Client configuration pointing at this server.
    pub fn config(&self, nickname: &str) -> ClientConfig {
        ClientConfig::new(nickname).with_server("127.0.0.1", self.port)
    }

    /// Accept the next client connection.
    pub async fn accept(&self) -> anyhow::Result<ServerConn> {
        let (stream, _) = timeout(TIMEOUT, self.listener.accept()).await??;
        let (read_half, write_half) = stream.into_split();
        Ok(ServerConn {
            reader: BufReader::new(read_half),
            writer: write_half,
        })
    }
}

/// The server's side of one client connection.
pub struct ServerConn {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl ServerConn {
    /// Receive one line from the client, without its terminator.
    pub async fn recv(&mut self) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(TIMEOUT, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("client closed the connection");
        }
        anyhow::ensure!(line.ends_with("\r\n"), "line not CRLF-terminated: {:?}", line);
        Ok(line.trim_end_matches("\r\n").to_string())
    }

    /// Wait for the client to close its side.
    pub async fn expect_eof(&mut self) -> anyhow::Result<()> {
        let mut line = String::new();
        let n = timeout(TIMEOUT, self.reader.read_line(&mut line)).await??;
        anyhow::ensure!(n == 0, "expected EOF, got {:?}", line);
        Ok(())
    }

    /// Send raw bytes, exactly as given.
    pub async fn send_bytes(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Send one line, adding `\r\n`.
    pub async fn send(&mut self, line: &str) -> anyhow::Result<()> {
        self.send_bytes(format!("{}\r\n", line).as_bytes()).await
    }
}

/// Receive the next session event, failing the test after a timeout.
pub async fn next_event(events: &mut mpsc::Receiver<SessionEvent>) -> SessionEvent {
    timeout(TIMEOUT, events.recv())
        .await
        .expect("timed out waiting for a session event")
        .expect("event channel closed")
}

/// A connected session with its registration already consumed.
pub async fn connected(
    nickname: &str,
) -> anyhow::Result<(MockServer, Session, mpsc::Receiver<SessionEvent>, ServerConn)> {
    let server = MockServer::bind().await?;
    let (mut session, mut events) = Session::new(server.config(nickname));
    session.connect().await?;
    let mut conn = server.accept().await?;

    assert_eq!(conn.recv().await?, format!("NICK {}", nickname));
    assert_eq!(conn.recv().await?, format!("USER {0} 0 * :{0}", nickname));
    assert!(matches!(
        next_event(&mut events).await,
        SessionEvent::Connected { .. }
    ));

    Ok((server, session, events, conn))
}
