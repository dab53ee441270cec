//! Streaming connection worker.
//!
//! Each session gets its own thread that connects, sends the `subscribe`
//! command, and then forwards trade samples to the controller as
//! `AppEvent::Stream` events tagged with the session id. The socket carries a
//! short read/write timeout from the moment it is connected, so the worker
//! notices its close flag during the TLS and upgrade handshakes as well as
//! between reads.
use std::io::{self, ErrorKind};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use log::{debug, error, info, warn};
use native_tls::{HandshakeError as TlsHandshakeError, TlsConnector, TlsStream};
use quote_common::net::stream_url;
use quote_common::{StreamCommand, StreamMessage, Symbol};
use tungstenite::client::{IntoClientRequest, uri_mode};
use tungstenite::error::UrlError;
use tungstenite::handshake::HandshakeError;
use tungstenite::stream::{MaybeTlsStream, Mode};
use tungstenite::{Message, WebSocket};

use crate::error::Result;
use crate::event::{AppEvent, StreamEvent};
use crate::session::SessionId;

/// How often a worker wakes up to check its close flag.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Upper bound for TCP connect plus TLS and upgrade handshakes.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How long `StreamHandle::join` waits before leaving the worker detached.
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Owner-side handle of a stream worker.
pub struct StreamHandle {
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl StreamHandle {
    /// Wrap a close flag and an optional worker thread.
    pub fn new(stop: Arc<AtomicBool>, worker: Option<JoinHandle<()>>) -> Self {
        StreamHandle { stop, worker }
    }

    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        StreamHandle::new(Arc::new(AtomicBool::new(false)), None)
    }

    #[cfg(test)]
    pub(crate) fn close_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Ask the worker to close the connection.
    pub fn close(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Wait up to [`JOIN_TIMEOUT`] for the worker thread to exit. Returns
    /// `false` when the worker was still running and got left behind.
    pub fn join(self) -> bool {
        self.join_within(JOIN_TIMEOUT)
    }

    fn join_within(mut self, timeout: Duration) -> bool {
        let Some(worker) = self.worker.take() else {
            return true;
        };
        let deadline = Instant::now() + timeout;
        while !worker.is_finished() {
            if Instant::now() >= deadline {
                warn!("Stream worker still running after {:?}, detaching", timeout);
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
        if worker.join().is_err() {
            warn!("Stream worker panicked");
        }
        true
    }
}

/// Opens streaming sessions. Implemented over WebSocket in production and by
/// in-memory fakes in tests.
pub trait StreamConnector {
    /// Start a session for `symbol`. Connection happens asynchronously; its
    /// progress is reported through `events`.
    fn open(&self, session: SessionId, symbol: &Symbol, events: Sender<AppEvent>) -> Result<StreamHandle>;
}

/// WebSocket connector authenticating with a token query parameter.
pub struct WsConnector {
    url: String,
    poll_interval: Duration,
    connect_timeout: Duration,
}

impl WsConnector {
    /// Connector for `base_url`, authenticated with `token`.
    pub fn new(base_url: &str, token: &str) -> Self {
        WsConnector {
            url: stream_url(base_url, token),
            poll_interval: DEFAULT_POLL_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Override how often workers check their close flag.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Override how long connecting and handshaking may take in total.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

impl StreamConnector for WsConnector {
    fn open(&self, session: SessionId, symbol: &Symbol, events: Sender<AppEvent>) -> Result<StreamHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let worker = StreamWorker {
            url: self.url.clone(),
            session,
            symbol: symbol.clone(),
            stop: Arc::clone(&stop),
            poll_interval: self.poll_interval,
            connect_timeout: self.connect_timeout,
            events,
        };
        let join = thread::Builder::new()
            .name(format!("stream-{}", session.0))
            .spawn(move || worker.run())?;
        Ok(StreamHandle::new(stop, Some(join)))
    }
}

struct StreamWorker {
    url: String,
    session: SessionId,
    symbol: Symbol,
    stop: Arc<AtomicBool>,
    poll_interval: Duration,
    connect_timeout: Duration,
    events: Sender<AppEvent>,
}

impl StreamWorker {
    fn run(self) {
        match self.stream_loop() {
            Ok(()) => {
                info!("Session {}: connection closed", self.session);
                self.emit(StreamEvent::Closed);
            }
            Err(e) if self.stopped() => {
                debug!("Session {}: error after close request: {}", self.session, e);
                self.emit(StreamEvent::Closed);
            }
            Err(e) => {
                error!("Session {}: stream error: {}", self.session, e);
                self.emit(StreamEvent::Error(e.to_string()));
            }
        }
    }

    fn stream_loop(&self) -> Result<()> {
        let Some(mut socket) = self.connect()? else {
            return Ok(());
        };
        if self.stopped() {
            close_socket(&mut socket);
            return Ok(());
        }

        let subscribe = StreamCommand::subscribe(self.symbol.clone()).to_json()?;
        match socket.send(Message::text(subscribe)) {
            Ok(()) => {}
            Err(e) if is_timeout(&e) => {
                if !self.flush_pending(&mut socket)? {
                    close_socket(&mut socket);
                    return Ok(());
                }
            }
            Err(e) => return Err(e.into()),
        }
        info!("Session {}: subscribed to {}", self.session, self.symbol);
        self.emit(StreamEvent::Opened);

        loop {
            if self.stopped() {
                close_socket(&mut socket);
                return Ok(());
            }
            match socket.read() {
                Ok(Message::Text(text)) => self.handle_text(text.as_str()),
                Ok(Message::Close(frame)) => {
                    debug!("Session {}: close frame received: {:?}", self.session, frame);
                }
                Ok(_) => {}
                Err(e) if is_timeout(&e) => continue,
                Err(tungstenite::Error::ConnectionClosed) | Err(tungstenite::Error::AlreadyClosed) => {
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Connect and run both handshakes. `Ok(None)` means the close flag was
    /// raised before the socket became usable.
    fn connect(&self) -> Result<Option<Socket>> {
        let deadline = Instant::now() + self.connect_timeout;
        let request = self.url.as_str().into_client_request()?;
        let mode = uri_mode(request.uri())?;
        let host = request
            .uri()
            .host()
            .map(|host| host.trim_start_matches('[').trim_end_matches(']').to_string())
            .ok_or(tungstenite::Error::Url(UrlError::NoHostName))?;
        let port = request.uri().port_u16().unwrap_or(match mode {
            Mode::Plain => 80,
            Mode::Tls => 443,
        });

        let tcp = connect_tcp(&host, port, self.connect_timeout)?;
        tcp.set_read_timeout(Some(self.poll_interval))?;
        tcp.set_write_timeout(Some(self.poll_interval))?;
        tcp.set_nodelay(true)?;

        let stream = match mode {
            Mode::Plain => MaybeTlsStream::Plain(tcp),
            Mode::Tls => match self.tls_handshake(&host, tcp, deadline)? {
                Some(tls) => MaybeTlsStream::NativeTls(tls),
                None => return Ok(None),
            },
        };

        let mut attempt = tungstenite::client(request, stream);
        loop {
            match attempt {
                Ok((socket, _response)) => return Ok(Some(socket)),
                Err(HandshakeError::Interrupted(mid)) => {
                    if self.stopped() {
                        debug!("Session {}: close requested during upgrade", self.session);
                        return Ok(None);
                    }
                    check_deadline(deadline, "WebSocket upgrade")?;
                    attempt = mid.handshake();
                }
                Err(HandshakeError::Failure(e)) => return Err(e.into()),
            }
        }
    }

    fn tls_handshake(
        &self,
        host: &str,
        tcp: TcpStream,
        deadline: Instant,
    ) -> Result<Option<TlsStream<TcpStream>>> {
        let mut attempt = TlsConnector::new()?.connect(host, tcp);
        loop {
            match attempt {
                Ok(tls) => return Ok(Some(tls)),
                Err(TlsHandshakeError::WouldBlock(mid)) => {
                    if self.stopped() {
                        debug!("Session {}: close requested during TLS handshake", self.session);
                        return Ok(None);
                    }
                    check_deadline(deadline, "TLS handshake")?;
                    attempt = mid.handshake();
                }
                Err(TlsHandshakeError::Failure(e)) => return Err(e.into()),
            }
        }
    }

    /// Push out a frame the socket only queued. `false` means the close flag
    /// was raised first.
    fn flush_pending(&self, socket: &mut Socket) -> Result<bool> {
        loop {
            if self.stopped() {
                return Ok(false);
            }
            match socket.flush() {
                Ok(()) => return Ok(true),
                Err(e) if is_timeout(&e) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn handle_text(&self, text: &str) {
        match StreamMessage::from_json(text) {
            Ok(message) => match message.price_sample() {
                Some(sample) => {
                    debug!(
                        "TRADE: {} Price={} Time={}",
                        sample.symbol.as_deref().unwrap_or(self.symbol.as_str()),
                        sample.price,
                        format_trade_time(sample.timestamp)
                    );
                    self.emit(StreamEvent::Trade(sample.clone()));
                }
                None => debug!("Session {}: ignoring {:?}", self.session, message),
            },
            Err(e) => debug!("Session {}: skipping frame ({}): {}", self.session, e, text),
        }
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    fn emit(&self, event: StreamEvent) {
        if let Err(e) = self.events.send(AppEvent::Stream { session: self.session, event }) {
            debug!("Session {}: controller gone: {}", self.session, e);
        }
    }
}

fn connect_tcp(host: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_error = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(ErrorKind::NotFound, format!("{host}:{port} resolved to no addresses"))
    }))
}

fn check_deadline(deadline: Instant, stage: &str) -> io::Result<()> {
    if Instant::now() >= deadline {
        return Err(io::Error::new(ErrorKind::TimedOut, format!("{stage} timed out")));
    }
    Ok(())
}

fn is_timeout(e: &tungstenite::Error) -> bool {
    matches!(e, tungstenite::Error::Io(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut))
}

fn close_socket(socket: &mut Socket) {
    if let Err(e) = socket.close(None) {
        debug!("Close handshake failed: {}", e);
        return;
    }
    let _ = socket.flush();
}

fn format_trade_time(timestamp_ms: Option<i64>) -> String {
    timestamp_ms
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|time| time.format("%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_close_sets_flag() {
        let handle = StreamHandle::detached();
        let flag = handle.close_flag();
        assert!(!flag.load(Ordering::SeqCst));
        handle.close();
        assert!(flag.load(Ordering::SeqCst));
        assert!(handle.join());
    }

    #[test]
    fn join_gives_up_on_a_stuck_worker() {
        let (release_tx, release_rx) = crossbeam_channel::bounded::<()>(0);
        let worker = thread::spawn(move || {
            let _ = release_rx.recv();
        });
        let handle = StreamHandle::new(Arc::new(AtomicBool::new(false)), Some(worker));
        handle.close();

        let started = Instant::now();
        assert!(!handle.join_within(Duration::from_millis(100)));
        assert!(started.elapsed() < Duration::from_secs(2));
        drop(release_tx);
    }

    #[test]
    fn connect_timeout_is_configurable() {
        let connector = WsConnector::new("ws://127.0.0.1:1", "k3y");
        assert_eq!(connector.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
        let connector = connector.with_connect_timeout(Duration::from_millis(250));
        assert_eq!(connector.connect_timeout, Duration::from_millis(250));
    }

    #[test]
    fn connector_builds_authenticated_url() {
        let connector = WsConnector::new("ws://127.0.0.1:1", "k3y");
        assert_eq!(connector.url, "ws://127.0.0.1:1/?token=k3y");
    }

    #[test]
    fn trade_time_formatting() {
        assert_eq!(format_trade_time(Some(1_700_000_000_123)), "22:13:20.123");
        assert_eq!(format_trade_time(None), "-");
    }
}
