//! TransportClient implementation

use super::config::{ClientConfig, RetryPolicy};
use super::connection_string::ConnectionInfo;
use crate::connection::{ConnectionState, Connector, Endpoint, SecureTransport, TcpConnector};
use crate::metrics::{counters, histograms, labels};
use crate::protocol::constants::MAX_PREFIX_WIDTH;
use crate::protocol::{decode_payload, LengthPrefix};
use crate::{Error, Result};
use bytes::Bytes;
use std::io;
use std::time::Instant;

/// Largest slice of a message body read in one call
const READ_CHUNK: usize = 64 * 1024;

/// Which side of the connection failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Writing a message
    Send,
    /// Reading a message
    Receive,
}

impl Direction {
    fn label(self) -> &'static str {
        match self {
            Direction::Send => labels::DIRECTION_SEND,
            Direction::Receive => labels::DIRECTION_RECEIVE,
        }
    }
}

/// Framed message client over plain TCP or TLS.
///
/// Every message on the wire is a length prefix followed by that many payload
/// bytes. The client connects lazily: the first operation (or [`connect`]) opens
/// the connection, and after a failure the next operation opens a fresh one.
/// Whether failures reach the caller is decided by the [`RetryPolicy`].
///
/// [`connect`]: TransportClient::connect
pub struct TransportClient<C: Connector = TcpConnector> {
    config: ClientConfig,
    endpoint: Endpoint,
    connector: C,
    transport: Option<C::Transport>,
    state: ConnectionState,
    attempted: bool,
}

impl TransportClient<TcpConnector> {
    /// Create a client without connecting
    ///
    /// The connection is opened by the first send or receive.
    pub fn new(config: ClientConfig) -> Self {
        let mut connector = TcpConnector::new(config.connect_timeout, config.io_timeout);
        if let Some(tls) = config.tls.clone() {
            connector = connector.with_tls(tls);
        }
        Self::with_connector(config, connector)
    }

    /// Create a client and connect immediately
    ///
    /// With [`RetryPolicy::Throw`] a failed connection is returned as `Err`.
    /// With [`RetryPolicy::Silent`] the client is returned disconnected and the
    /// next operation tries again.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # fn example() -> framewire::Result<()> {
    /// use framewire::{ClientConfig, TransportClient};
    ///
    /// let mut client = TransportClient::connect(ClientConfig::new("127.0.0.1", 9000))?;
    /// client.send_str("hello")?;
    /// let reply = client.receive_message()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let mut client = Self::new(config);
        client.establish()?;
        Ok(client)
    }

    /// Create a client from a `tcp://` or `tls://` connection string and connect
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # fn example() -> framewire::Result<()> {
    /// use framewire::TransportClient;
    ///
    /// let client = TransportClient::connect_str("tcp://127.0.0.1:9000?retry=silent")?;
    /// let secure = TransportClient::connect_str(
    ///     "tls://10.0.0.5:4433?rootcert=/etc/framewire/ca.pem&sni=relay.example.com",
    /// )?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn connect_str(connection_string: &str) -> Result<Self> {
        let config = ConnectionInfo::parse(connection_string)?.to_config()?;
        Self::connect(config)
    }
}

impl<C: Connector> TransportClient<C> {
    /// Create a client that opens transports through `connector`
    ///
    /// Nothing is connected until the first operation.
    pub fn with_connector(config: ClientConfig, connector: C) -> Self {
        let endpoint = Endpoint::new(config.host.clone(), config.port);
        Self {
            config,
            endpoint,
            connector,
            transport: None,
            state: ConnectionState::Disconnected,
            attempted: false,
        }
    }

    /// Send one message
    ///
    /// Returns `Ok(true)` once the prefix and payload are fully written,
    /// `Ok(false)` if the connection failed under [`RetryPolicy::Silent`].
    pub fn send_message(&mut self, payload: &[u8]) -> Result<bool> {
        self.send_batch(&[payload])
    }

    /// Send a UTF-8 string as one message
    pub fn send_str(&mut self, text: &str) -> Result<bool> {
        self.send_message(text.as_bytes())
    }

    /// Send several fragments as one message
    ///
    /// A single prefix carrying the summed length is followed by each fragment
    /// in order, so the peer sees the same bytes as for the concatenation.
    pub fn send_batch(&mut self, fragments: &[&[u8]]) -> Result<bool> {
        if !self.establish()? {
            return Ok(false);
        }

        let total: usize = fragments.iter().map(|f| f.len()).sum();
        let prefix = self.config.length_prefix;

        let result = match self.transport.as_mut() {
            Some(transport) => write_frame(transport, prefix, total, fragments),
            None => Err(not_connected()),
        };

        match result {
            Ok(()) => {
                counters::message_sent(total);
                histograms::message_size(labels::DIRECTION_SEND, total);
                tracing::trace!(len = total, fragments = fragments.len(), "message sent");
                Ok(true)
            }
            Err(e) => {
                self.lost_connection(Direction::Send, Error::connection_lost(e))?;
                Ok(false)
            }
        }
    }

    /// Receive one message exactly as framed on the wire
    ///
    /// Returns `Ok(None)` if the connection failed under [`RetryPolicy::Silent`].
    /// A partial message is never returned.
    pub fn receive_raw(&mut self) -> Result<Option<Bytes>> {
        if !self.establish()? {
            return Ok(None);
        }

        let prefix = self.config.length_prefix;
        let max_len = self.config.max_message_len;

        let result = match self.transport.as_mut() {
            Some(transport) => read_frame(transport, prefix, max_len),
            None => Err(Error::connection_lost(not_connected())),
        };

        match result {
            Ok(payload) => {
                counters::message_received(payload.len());
                histograms::message_size(labels::DIRECTION_RECEIVE, payload.len());
                tracing::trace!(len = payload.len(), "message received");
                Ok(Some(payload))
            }
            Err(e) => {
                self.lost_connection(Direction::Receive, e)?;
                Ok(None)
            }
        }
    }

    /// Receive one message, decoding the null sentinel as the empty payload
    pub fn receive_message(&mut self) -> Result<Option<Bytes>> {
        Ok(self.receive_raw()?.map(decode_payload))
    }

    /// Tear down the connection after a failure and apply the retry policy
    ///
    /// The transport is closed unconditionally. Under [`RetryPolicy::Throw`] the
    /// cause is returned; under [`RetryPolicy::Silent`] it is logged and dropped.
    pub fn lost_connection(&mut self, direction: Direction, cause: Error) -> Result<()> {
        self.close_transport();
        if self.state.can_transition_to(ConnectionState::Failed) {
            self.state = ConnectionState::Failed;
        }

        counters::connection_lost(direction.label(), cause.category());
        self.lifecycle("connection lost");
        tracing::warn!(
            host = %self.endpoint.host,
            port = self.endpoint.port,
            direction = direction.label(),
            error = %cause,
            "connection lost"
        );

        self.apply_policy(cause)
    }

    /// Close the current connection (if any) and connect again
    ///
    /// Returns `Ok(false)` if connecting failed under [`RetryPolicy::Silent`].
    pub fn reconnect(&mut self) -> Result<bool> {
        self.close_transport();
        self.state.transition(ConnectionState::Disconnected)?;
        self.establish()
    }

    /// Close the connection
    ///
    /// The next operation reconnects.
    pub fn disconnect(&mut self) {
        if self.transport.is_some() {
            self.lifecycle("disconnecting");
        }
        self.close_transport();
        self.state = ConnectionState::Disconnected;
    }

    /// Whether a connection is currently open
    pub fn is_connected(&self) -> bool {
        self.state.is_connected() && self.transport.is_some()
    }

    /// Remote host
    pub fn host(&self) -> &str {
        &self.endpoint.host
    }

    /// Remote port
    pub fn port(&self) -> u16 {
        self.endpoint.port
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Failure propagation mode
    pub fn retry_policy(&self) -> RetryPolicy {
        self.config.retry_policy
    }

    /// Whether connections are TLS-encrypted
    pub fn is_encrypted(&self) -> bool {
        match &self.transport {
            Some(transport) => transport.is_encrypted(),
            None => self.connector.is_encrypted(),
        }
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Connect if needed, applying the retry policy to a failure.
    ///
    /// `Ok(true)`: connected. `Ok(false)`: failed under Silent.
    fn establish(&mut self) -> Result<bool> {
        match self.ensure_connected() {
            Ok(()) => Ok(true),
            Err(e) => {
                self.apply_policy(e)?;
                Ok(false)
            }
        }
    }

    fn ensure_connected(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let event = if self.attempted {
            "reconnecting"
        } else {
            "connecting"
        };
        self.attempted = true;
        self.lifecycle(event);
        self.state.transition(ConnectionState::Connecting)?;

        let transport_label = labels::transport(self.connector.is_encrypted());
        counters::connect_attempted(transport_label);

        let span = tracing::debug_span!(
            "connect",
            host = %self.endpoint.host,
            port = self.endpoint.port,
            transport = transport_label
        );
        let _enter = span.enter();
        let started = Instant::now();

        match self.connector.connect(&self.endpoint) {
            Ok(transport) => {
                self.transport = Some(transport);
                self.state.transition(ConnectionState::Connected)?;

                let elapsed = started.elapsed().as_millis() as u64;
                counters::connection_established(transport_label);
                histograms::connect_duration(transport_label, elapsed);
                tracing::debug!(duration_ms = elapsed, "connection established");
                self.lifecycle("connected");
                Ok(())
            }
            Err(e) => {
                self.state.transition(ConnectionState::Failed)?;
                counters::connect_failed(transport_label, e.category());
                tracing::warn!(error = %e, "connect failed");
                Err(e)
            }
        }
    }

    fn apply_policy(&self, cause: Error) -> Result<()> {
        match self.config.retry_policy {
            RetryPolicy::Throw => Err(cause),
            RetryPolicy::Silent => {
                tracing::debug!(error = %cause, "failure suppressed by silent retry policy");
                Ok(())
            }
        }
    }

    fn close_transport(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
    }

    fn lifecycle(&self, event: &'static str) {
        if self.config.debug {
            tracing::info!(host = %self.endpoint.host, port = self.endpoint.port, "{}", event);
        } else {
            tracing::debug!(host = %self.endpoint.host, port = self.endpoint.port, "{}", event);
        }
    }
}

impl<C: Connector> Drop for TransportClient<C> {
    fn drop(&mut self) {
        self.close_transport();
    }
}

impl<C: Connector> std::fmt::Debug for TransportClient<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportClient")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state)
            .field("retry_policy", &self.config.retry_policy)
            .field("encrypted", &self.is_encrypted())
            .finish()
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "no open transport")
}

fn write_frame<T: SecureTransport>(
    transport: &mut T,
    prefix: LengthPrefix,
    total: usize,
    fragments: &[&[u8]],
) -> io::Result<()> {
    let encoded = prefix.encode(total);
    transport.send(&encoded[..prefix.width()])?;
    for fragment in fragments.iter().filter(|f| !f.is_empty()) {
        transport.send(fragment)?;
    }
    Ok(())
}

fn read_frame<T: SecureTransport>(
    transport: &mut T,
    prefix: LengthPrefix,
    max_len: usize,
) -> Result<Bytes> {
    let width = prefix.width();
    let mut raw = [0u8; MAX_PREFIX_WIDTH];
    let n = transport
        .recv(&mut raw[..width])
        .map_err(Error::connection_lost)?;
    if n < width {
        return Err(Error::connection_lost(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "peer closed the connection before a length prefix",
        )));
    }

    let declared = prefix.decode(&raw[..width]);
    if declared > max_len as u64 {
        return Err(Error::FrameTooLarge {
            len: declared,
            max: max_len,
        });
    }

    // Grow with the bytes that arrive, not with the declared length
    let len = declared as usize;
    let mut payload = Vec::new();
    while payload.len() < len {
        let start = payload.len();
        let step = (len - start).min(READ_CHUNK);
        payload
            .try_reserve(step)
            .map_err(|_| Error::FrameTooLarge {
                len: declared,
                max: max_len,
            })?;
        payload.resize(start + step, 0);

        let n = transport
            .recv(&mut payload[start..])
            .map_err(Error::connection_lost)?;
        if n < step {
            return Err(Error::connection_lost(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "peer closed the connection after {} of {} bytes",
                    start + n,
                    len
                ),
            )));
        }
    }

    Ok(Bytes::from(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{read_full, write_full};
    use crate::protocol::encode_frame;
    use std::collections::VecDeque;
    use std::io::{Read, Write};
    use std::sync::{Arc, Mutex};

    /// Simulated peer shared by a mock connector and its transports
    #[derive(Default)]
    struct Wire {
        inbound: VecDeque<u8>,
        outbound: Vec<u8>,
        chunk: usize,
        fail_recv: Option<io::ErrorKind>,
        fail_send: Option<io::ErrorKind>,
        refuse_connects: usize,
        connects: usize,
        closes: usize,
    }

    type SharedWire = Arc<Mutex<Wire>>;

    fn wire(chunk: usize) -> SharedWire {
        Arc::new(Mutex::new(Wire {
            chunk,
            ..Wire::default()
        }))
    }

    struct MockTransport {
        wire: SharedWire,
    }

    impl Read for MockTransport {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let mut wire = self.wire.lock().unwrap();
            if wire.inbound.is_empty() {
                return match wire.fail_recv.take() {
                    Some(kind) => Err(io::Error::new(kind, "injected read failure")),
                    None => Ok(0),
                };
            }
            let n = buf.len().min(wire.chunk).min(wire.inbound.len());
            for slot in buf.iter_mut().take(n) {
                *slot = wire.inbound.pop_front().unwrap();
            }
            Ok(n)
        }
    }

    impl Write for MockTransport {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let mut wire = self.wire.lock().unwrap();
            if let Some(kind) = wire.fail_send.take() {
                return Err(io::Error::new(kind, "injected write failure"));
            }
            let n = buf.len().min(wire.chunk);
            wire.outbound.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SecureTransport for MockTransport {
        fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            read_full(self, buf)
        }

        fn send(&mut self, buf: &[u8]) -> io::Result<()> {
            write_full(self, buf)
        }

        fn close(&mut self) {
            self.wire.lock().unwrap().closes += 1;
        }

        fn is_encrypted(&self) -> bool {
            false
        }
    }

    struct MockConnector {
        wire: SharedWire,
    }

    impl Connector for MockConnector {
        type Transport = MockTransport;

        fn connect(&mut self, endpoint: &Endpoint) -> Result<MockTransport> {
            let mut wire = self.wire.lock().unwrap();
            if wire.refuse_connects > 0 {
                wire.refuse_connects -= 1;
                return Err(Error::Connect {
                    host: endpoint.host.clone(),
                    port: endpoint.port,
                });
            }
            wire.connects += 1;
            Ok(MockTransport {
                wire: self.wire.clone(),
            })
        }
    }

    fn client(policy: RetryPolicy, wire: &SharedWire) -> TransportClient<MockConnector> {
        let config = ClientConfig::builder("127.0.0.1", 9000)
            .retry_policy(policy)
            .build();
        TransportClient::with_connector(
            config,
            MockConnector {
                wire: wire.clone(),
            },
        )
    }

    fn queue_frame(wire: &SharedWire, payload: &[u8]) {
        let frame = encode_frame(LengthPrefix::U64Le, payload);
        wire.lock().unwrap().inbound.extend(frame.iter().copied());
    }

    #[test]
    fn test_connects_lazily() {
        let wire = wire(64);
        let mut client = client(RetryPolicy::Throw, &wire);
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(!client.is_connected());
        assert_eq!(wire.lock().unwrap().connects, 0);

        assert!(client.send_message(b"x").unwrap());
        assert!(client.is_connected());
        assert_eq!(wire.lock().unwrap().connects, 1);
    }

    #[test]
    fn test_send_message_with_short_writes() {
        let wire = wire(7);
        let mut client = client(RetryPolicy::Throw, &wire);
        let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();

        assert!(client.send_message(&payload).unwrap());

        let expected = encode_frame(LengthPrefix::U64Le, &payload);
        assert_eq!(wire.lock().unwrap().outbound, expected.to_vec());
    }

    #[test]
    fn test_send_batch_matches_concatenation() {
        let batch_wire = wire(5);
        let mut batch = client(RetryPolicy::Throw, &batch_wire);
        assert!(batch.send_batch(&[b"head-", b"", b"body-", b"tail"]).unwrap());

        let single_wire = wire(5);
        let mut single = client(RetryPolicy::Throw, &single_wire);
        assert!(single.send_message(b"head-body-tail").unwrap());

        assert_eq!(
            batch_wire.lock().unwrap().outbound,
            single_wire.lock().unwrap().outbound
        );
    }

    #[test]
    fn test_send_str() {
        let wire = wire(64);
        let mut client = client(RetryPolicy::Throw, &wire);
        assert!(client.send_str("héllo").unwrap());
        let outbound = wire.lock().unwrap().outbound.clone();
        assert_eq!(&outbound[..8], &6u64.to_le_bytes());
        assert_eq!(&outbound[8..], "héllo".as_bytes());
    }

    #[test]
    fn test_receive_with_short_reads() {
        let wire = wire(3);
        let payload: Vec<u8> = (0..70_000u32).map(|i| (i % 13) as u8).collect();
        queue_frame(&wire, &payload);

        let mut client = client(RetryPolicy::Throw, &wire);
        let received = client.receive_message().unwrap().unwrap();
        assert_eq!(received.as_ref(), payload.as_slice());
    }

    #[test]
    fn test_receive_null_sentinel() {
        let wire = wire(64);
        queue_frame(&wire, &[0]);
        queue_frame(&wire, &[0]);

        let mut client = client(RetryPolicy::Throw, &wire);
        assert!(client.receive_message().unwrap().unwrap().is_empty());
        assert_eq!(client.receive_raw().unwrap().unwrap().as_ref(), &[0]);
    }

    #[test]
    fn test_receive_zero_length() {
        let wire = wire(64);
        queue_frame(&wire, b"");

        let mut client = client(RetryPolicy::Throw, &wire);
        assert!(client.receive_message().unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_throw_reports_one_failure_then_reconnects() {
        let wire = wire(64);
        {
            let mut w = wire.lock().unwrap();
            w.inbound.extend(10u64.to_le_bytes());
            w.inbound.extend([1, 2, 3]);
            w.fail_recv = Some(io::ErrorKind::ConnectionReset);
        }

        let mut client = client(RetryPolicy::Throw, &wire);
        let err = client.receive_message().unwrap_err();
        assert!(matches!(err, Error::ConnectionLost { .. }));
        assert!(!client.is_connected());
        assert_eq!(client.state(), ConnectionState::Failed);
        assert_eq!(wire.lock().unwrap().closes, 1);

        assert!(client.send_message(b"again").unwrap());
        assert!(client.is_connected());
        let w = wire.lock().unwrap();
        assert_eq!(w.connects, 2);
        assert_eq!(w.outbound, encode_frame(LengthPrefix::U64Le, b"again").to_vec());
    }

    #[test]
    fn test_silent_swallows_failure_then_recovers() {
        let wire = wire(64);
        {
            let mut w = wire.lock().unwrap();
            w.inbound.extend(10u64.to_le_bytes());
            w.fail_recv = Some(io::ErrorKind::ConnectionReset);
        }

        let mut client = client(RetryPolicy::Silent, &wire);
        assert_eq!(client.receive_message().unwrap(), None);
        assert!(!client.is_connected());

        queue_frame(&wire, b"back");
        let received = client.receive_message().unwrap().unwrap();
        assert_eq!(received.as_ref(), b"back");
        assert_eq!(wire.lock().unwrap().connects, 2);
    }

    #[test]
    fn test_silent_send_failure_returns_false() {
        let wire = wire(64);
        let mut client = client(RetryPolicy::Silent, &wire);
        assert!(client.send_message(b"one").unwrap());

        wire.lock().unwrap().fail_send = Some(io::ErrorKind::BrokenPipe);
        assert!(!client.send_message(b"two").unwrap());
        assert_eq!(client.state(), ConnectionState::Failed);

        assert!(client.send_message(b"three").unwrap());
    }

    #[test]
    fn test_throw_send_failure() {
        let wire = wire(64);
        wire.lock().unwrap().fail_send = Some(io::ErrorKind::BrokenPipe);

        let mut client = client(RetryPolicy::Throw, &wire);
        let err = client.send_message(b"lost").unwrap_err();
        assert!(err.is_retriable());
        assert!(client.send_message(b"kept").unwrap());
    }

    #[test]
    fn test_connect_refused_throw() {
        let wire = wire(64);
        wire.lock().unwrap().refuse_connects = 1;

        let mut client = client(RetryPolicy::Throw, &wire);
        let err = client.send_message(b"nobody home").unwrap_err();
        assert!(matches!(err, Error::Connect { port: 9000, .. }));
        assert_eq!(client.state(), ConnectionState::Failed);
        assert!(wire.lock().unwrap().outbound.is_empty());

        assert!(client.send_message(b"now").unwrap());
    }

    #[test]
    fn test_connect_refused_silent() {
        let wire = wire(64);
        wire.lock().unwrap().refuse_connects = 2;

        let mut client = client(RetryPolicy::Silent, &wire);
        assert!(!client.send_message(b"a").unwrap());
        assert_eq!(client.receive_message().unwrap(), None);
        assert!(client.send_message(b"b").unwrap());
    }

    #[test]
    fn test_peer_close_mid_message() {
        let wire = wire(64);
        {
            let mut w = wire.lock().unwrap();
            w.inbound.extend(10u64.to_le_bytes());
            w.inbound.extend([1, 2, 3, 4]);
        }

        let mut client = client(RetryPolicy::Throw, &wire);
        match client.receive_raw().unwrap_err() {
            Error::ConnectionLost { source } => {
                assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof)
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!client.is_connected());
    }

    #[test]
    fn test_frame_too_large() {
        let wire = wire(64);
        wire.lock()
            .unwrap()
            .inbound
            .extend(u64::MAX.to_le_bytes());

        let config = ClientConfig::builder("127.0.0.1", 9000)
            .max_message_len(1024)
            .build();
        let mut client = TransportClient::with_connector(
            config,
            MockConnector {
                wire: wire.clone(),
            },
        );

        let err = client.receive_message().unwrap_err();
        assert!(matches!(err, Error::FrameTooLarge { len: u64::MAX, max: 1024 }));
        assert_eq!(wire.lock().unwrap().closes, 1);
        assert!(!client.is_connected());
    }

    #[test]
    fn test_unbounded_max_with_undeliverable_length() {
        let wire = wire(64);
        {
            let mut w = wire.lock().unwrap();
            w.inbound.extend(u64::MAX.to_le_bytes());
            w.inbound.extend([1, 2, 3]);
        }

        let config = ClientConfig::builder("127.0.0.1", 9000)
            .max_message_len(usize::MAX)
            .build();
        let mut client = TransportClient::with_connector(
            config,
            MockConnector {
                wire: wire.clone(),
            },
        );

        match client.receive_message().unwrap_err() {
            Error::ConnectionLost { source } => {
                assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof)
            }
            // A u64 length cannot fit a 32-bit usize
            Error::FrameTooLarge { len, .. } => assert_eq!(len, u64::MAX),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(wire.lock().unwrap().closes, 1);
        assert!(!client.is_connected());

        queue_frame(&wire, b"after");
        assert_eq!(client.receive_message().unwrap().unwrap().as_ref(), b"after");
    }

    #[test]
    fn test_unbounded_max_large_message() {
        let wire = wire(4096);
        let payload: Vec<u8> = (0..300_000u32).map(|i| (i % 199) as u8).collect();
        queue_frame(&wire, &payload);

        let config = ClientConfig::builder("127.0.0.1", 9000)
            .max_message_len(usize::MAX)
            .build();
        let mut client = TransportClient::with_connector(
            config,
            MockConnector {
                wire: wire.clone(),
            },
        );

        let received = client.receive_raw().unwrap().unwrap();
        assert_eq!(received.as_ref(), payload.as_slice());
    }

    #[test]
    fn test_native_prefix_on_the_wire() {
        let wire = wire(64);
        let config = ClientConfig::builder("127.0.0.1", 9000)
            .length_prefix(LengthPrefix::Native)
            .build();
        let mut client = TransportClient::with_connector(
            config,
            MockConnector {
                wire: wire.clone(),
            },
        );

        assert!(client.send_message(b"abc").unwrap());
        let outbound = wire.lock().unwrap().outbound.clone();
        let width = std::mem::size_of::<usize>();
        assert_eq!(&outbound[..width], &3usize.to_ne_bytes());
        assert_eq!(&outbound[width..], b"abc");
    }

    #[test]
    fn test_disconnect_and_reconnect() {
        let wire = wire(64);
        let mut client = client(RetryPolicy::Throw, &wire);
        assert!(client.reconnect().unwrap());
        assert!(client.is_connected());

        client.disconnect();
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_eq!(wire.lock().unwrap().closes, 1);

        assert!(client.reconnect().unwrap());
        assert!(client.reconnect().unwrap());
        let w = wire.lock().unwrap();
        assert_eq!(w.connects, 3);
        assert_eq!(w.closes, 2);
    }

    #[test]
    fn test_drop_closes_transport() {
        let wire = wire(64);
        {
            let mut client = client(RetryPolicy::Throw, &wire);
            assert!(client.send_message(b"bye").unwrap());
        }
        assert_eq!(wire.lock().unwrap().closes, 1);
    }

    #[test]
    fn test_accessors() {
        let wire = wire(64);
        let client = client(RetryPolicy::Silent, &wire);
        assert_eq!(client.host(), "127.0.0.1");
        assert_eq!(client.port(), 9000);
        assert_eq!(client.retry_policy(), RetryPolicy::Silent);
        assert!(!client.is_encrypted());
        assert_eq!(client.config().port, 9000);
    }

    #[test]
    fn test_lost_connection_policy() {
        let wire = wire(64);
        let mut throw = client(RetryPolicy::Throw, &wire);
        assert!(throw.send_message(b"x").unwrap());
        let cause = Error::connection_lost(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(throw
            .lost_connection(Direction::Send, cause)
            .is_err());
        assert!(!throw.is_connected());

        let mut silent = client(RetryPolicy::Silent, &wire);
        assert!(silent.send_message(b"x").unwrap());
        let cause = Error::connection_lost(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(silent
            .lost_connection(Direction::Send, cause)
            .is_ok());
        assert_eq!(silent.state(), ConnectionState::Failed);
    }
}
