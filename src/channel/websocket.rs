//! Blocking WebSocket transport with bounded reads.
//!
//! The socket's read timeout is set to the poll budget before every read, so
//! the single-threaded event loop is never parked on the network for longer
//! than one tick. Connecting is bounded too: the TCP connect and the opening
//! handshake each give up after the connect timeout, so a blackholed host or
//! a server that accepts and stays silent surfaces as an ordinary connect
//! failure and the reconnect schedule keeps running.

#![allow(missing_docs)]

use std::fmt;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tungstenite::client::IntoClientRequest;
use tungstenite::http::Uri;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::channel::transport::{Transport, TransportEvent};
use crate::core::errors::{DashError, Result};

/// Smallest read timeout handed to the socket; zero would mean "block forever".
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

pub struct WebSocketTransport {
    url: String,
    connect_timeout: Duration,
    socket: Option<WebSocket<MaybeTlsStream<TcpStream>>>,
}

impl WebSocketTransport {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            socket: None,
        }
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout.max(MIN_READ_TIMEOUT);
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn transport_error(&self, err: impl fmt::Display) -> DashError {
        DashError::Transport {
            details: format!("{}: {err}", self.url),
        }
    }

    /// Send a close frame if connected.
    pub fn close(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.close(None);
            let _ = socket.flush();
        }
    }
}

/// TCP connection to the request's host, trying each resolved address.
fn open_stream(uri: &Uri, timeout: Duration) -> io::Result<TcpStream> {
    let host = uri
        .host()
        .map(|h| h.trim_start_matches('[').trim_end_matches(']'))
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "url has no host"))?;
    let default_port = if uri.scheme_str() == Some("wss") { 443 } else { 80 };
    let port = uri.port_u16().unwrap_or(default_port);

    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, format!("{host}: no addresses"))
    }))
}

fn set_read_timeout(stream: &MaybeTlsStream<TcpStream>, timeout: Duration) -> io::Result<()> {
    let timeout = Some(timeout.max(MIN_READ_TIMEOUT));
    match stream {
        MaybeTlsStream::Plain(tcp) => tcp.set_read_timeout(timeout),
        MaybeTlsStream::Rustls(tls) => tls.get_ref().set_read_timeout(timeout),
        _ => Ok(()),
    }
}

fn is_timeout(err: &tungstenite::Error) -> bool {
    matches!(
        err,
        tungstenite::Error::Io(e)
            if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
    )
}

impl Transport for WebSocketTransport {
    fn connect(&mut self) -> Result<()> {
        self.close();
        let request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| self.transport_error(e))?;
        let stream =
            open_stream(request.uri(), self.connect_timeout).map_err(|e| self.transport_error(e))?;
        stream
            .set_read_timeout(Some(self.connect_timeout))
            .and_then(|()| stream.set_write_timeout(Some(self.connect_timeout)))
            .map_err(|e| self.transport_error(e))?;
        let (socket, _response) =
            tungstenite::client_tls(request, stream).map_err(|e| self.transport_error(e))?;
        self.socket = Some(socket);
        Ok(())
    }

    fn poll(&mut self, timeout: Duration) -> Option<TransportEvent> {
        let socket = self.socket.as_mut()?;
        if let Err(e) = set_read_timeout(socket.get_ref(), timeout) {
            self.socket = None;
            return Some(TransportEvent::Closed {
                reason: e.to_string(),
            });
        }
        let event = match socket.read() {
            Ok(Message::Text(text)) => Some(TransportEvent::Message(text.as_str().to_owned())),
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => Some(TransportEvent::Message(text.to_owned())),
                Err(_) => None,
            },
            Ok(Message::Close(frame)) => Some(TransportEvent::Closed {
                reason: frame.map(|f| f.reason.as_str().to_owned()).unwrap_or_default(),
            }),
            Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => None,
            Err(e) if is_timeout(&e) => None,
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Some(TransportEvent::Closed {
                    reason: String::new(),
                })
            }
            Err(e) => Some(TransportEvent::Closed {
                reason: e.to_string(),
            }),
        };
        if matches!(event, Some(TransportEvent::Closed { .. })) {
            self.socket = None;
        }
        event
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Instant;

    use super::*;

    #[test]
    fn unreachable_endpoint_is_a_transport_error() {
        let mut t = WebSocketTransport::new("ws://127.0.0.1:9/ws");
        let err = t.connect().unwrap_err();
        assert_eq!(err.code(), "VD-3001");
        assert!(err.is_retryable());
        assert_eq!(t.poll(Duration::ZERO), None);
    }

    #[test]
    fn silent_server_fails_the_handshake_within_the_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let (release, hold) = mpsc::channel::<()>();
        let server = thread::spawn(move || {
            let accepted = listener.accept();
            let _ = hold.recv();
            drop(accepted);
        });

        let mut t = WebSocketTransport::new(format!("ws://127.0.0.1:{port}/ws"))
            .with_connect_timeout(Duration::from_millis(200));
        let started = Instant::now();
        let err = t.connect().unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(3), "{:?}", started.elapsed());
        assert_eq!(err.code(), "VD-3001");
        assert_eq!(t.poll(Duration::ZERO), None);

        drop(release);
        server.join().unwrap();
    }

    #[test]
    fn malformed_url_is_a_transport_error() {
        let mut t = WebSocketTransport::new("not a url");
        assert!(t.connect().is_err());
        assert_eq!(t.url(), "not a url");
    }
}
