//! Loopback servers shared by the integration tests.
#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use quote_common::{Quote, Symbol};
use quote_watch::event::AppEvent;
use quote_watch::snapshot::SnapshotSource;
use quote_watch::stream::StreamConnector;
use quote_watch::{QuoteSessionManager, Result};
use tungstenite::Message;
use tungstenite::handshake::server::{ErrorResponse, Request, Response};

/// Snapshot source that always answers with the same price.
pub struct StaticSource(pub f64);

impl SnapshotSource for StaticSource {
    fn fetch_quote(&self, _symbol: &Symbol) -> Result<Quote> {
        Ok(Quote { current: Some(self.0), ..Quote::default() })
    }
}

/// What the fake stream server observed on one connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerSeen {
    /// Request URI of the handshake.
    Handshake(String),
    /// First text frame (the subscribe command), parsed as JSON.
    Subscribed(serde_json::Value),
    /// The client closed the connection; carries the subscribed symbol.
    Closed(String),
}

/// Fake streaming server. Every accepted connection reports what it sees and
/// forwards frames pushed through `push`.
pub struct StreamServer {
    pub addr: SocketAddr,
    pub seen: Receiver<ServerSeen>,
    pushers: Receiver<Sender<String>>,
}

impl StreamServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (seen_tx, seen_rx) = unbounded();
        let (push_tx, pushers) = unbounded::<Sender<String>>();
        let registry = push_tx;

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let seen_tx = seen_tx.clone();
                let registry = registry.clone();
                thread::spawn(move || serve_connection(stream, seen_tx, registry));
            }
        });

        StreamServer { addr, seen: seen_rx, pushers }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Sender for frames on the next connection that has subscribed.
    pub fn next_connection(&self) -> Sender<String> {
        self.pushers.recv_timeout(Duration::from_secs(5)).expect("connection")
    }

    pub fn expect_seen(&self) -> ServerSeen {
        self.seen.recv_timeout(Duration::from_secs(5)).expect("server observation")
    }
}

fn serve_connection(stream: TcpStream, seen: Sender<ServerSeen>, registry: Sender<Sender<String>>) {
    let handshake_seen = seen.clone();
    let callback = move |request: &Request, response: Response| -> std::result::Result<Response, ErrorResponse> {
        let _ = handshake_seen.send(ServerSeen::Handshake(request.uri().to_string()));
        Ok(response)
    };
    let Ok(mut socket) = tungstenite::accept_hdr(stream, callback) else { return };

    let subscribe = match socket.read() {
        Ok(Message::Text(text)) => serde_json::from_str::<serde_json::Value>(text.as_str()).unwrap_or_default(),
        _ => return,
    };
    let symbol = subscribe["symbol"].as_str().unwrap_or_default().to_string();
    let _ = seen.send(ServerSeen::Subscribed(subscribe));

    let (frame_tx, frame_rx) = unbounded::<String>();
    let _ = registry.send(frame_tx);

    let _ = socket.get_ref().set_read_timeout(Some(Duration::from_millis(50)));
    loop {
        while let Ok(frame) = frame_rx.try_recv() {
            if socket.send(Message::text(frame)).is_err() {
                let _ = seen.send(ServerSeen::Closed(symbol));
                return;
            }
        }
        match socket.read() {
            Ok(_) => {}
            Err(tungstenite::Error::Io(e))
                if e.kind() == std::io::ErrorKind::WouldBlock || e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(_) => {
                let _ = seen.send(ServerSeen::Closed(symbol));
                return;
            }
        }
    }
}

/// A listener that accepts connections but never answers the upgrade
/// request. It reports each accepted connection and each client hang-up.
pub struct StalledServer {
    pub addr: SocketAddr,
    accepted: Receiver<()>,
    hung_up: Receiver<()>,
}

impl StalledServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (accepted_tx, accepted) = unbounded();
        let (hung_up_tx, hung_up) = unbounded();

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let _ = accepted_tx.send(());
                let hung_up_tx = hung_up_tx.clone();
                thread::spawn(move || {
                    let _ = stream.set_read_timeout(Some(Duration::from_secs(30)));
                    let mut buf = [0u8; 1024];
                    while let Ok(n) = stream.read(&mut buf) {
                        if n == 0 {
                            break;
                        }
                    }
                    let _ = hung_up_tx.send(());
                });
            }
        });

        StalledServer { addr, accepted, hung_up }
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub fn expect_accepted(&self) {
        self.accepted.recv_timeout(Duration::from_secs(5)).expect("accepted connection");
    }

    /// Wait for the client side of some held connection to go away.
    pub fn expect_hang_up(&self) {
        self.hung_up.recv_timeout(Duration::from_secs(5)).expect("client hang-up");
    }
}

/// A minimal HTTP/1.1 server answering every request with `status` and `body`.
/// Request lines are reported on the returned receiver.
pub fn http_server(status: &'static str, body: &'static str) -> (SocketAddr, Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            let mut header = String::new();
            while reader.read_line(&mut header).map(|n| n > 2).unwrap_or(false) {
                header.clear();
            }
            let _ = tx.send(request_line.trim().to_string());
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });
    (addr, rx)
}

/// A local address nothing listens on.
pub fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("addr")
}

/// Feed events into `manager` until `done` holds or five seconds pass.
pub fn pump_until<C, F>(manager: &mut QuoteSessionManager<C>, events: &Receiver<AppEvent>, done: F) -> bool
where
    C: StreamConnector,
    F: Fn(&QuoteSessionManager<C>) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if done(&*manager) {
            return true;
        }
        if let Ok(event) = events.recv_timeout(Duration::from_millis(50)) {
            manager.handle(event);
        }
    }
    done(&*manager)
}
