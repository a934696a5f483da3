//! Blocking Gadget Connection
//!
//! One connection carries a sequence of identifier-tagged records in both
//! directions. Every call blocks until the whole record has moved or failed;
//! there is no partial-record resumption. A fatal wire error leaves the peer's
//! view of the stream unknown, so the connection refuses further traffic and
//! the caller should drop it.

use crate::error::{NetworkError, Result};
use crate::registry::{Inbound, ReaderRegistry, WriterRegistry};
use gadget_codec::MessageId;
use gadget_config::WireConfig;
use gadget_types::{Acquisition, MessageChain};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Per-connection counters
#[derive(Debug, Clone)]
pub struct ConnectionStats {
    pub opened_at: Instant,
    pub records_sent: u64,
    pub records_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl ConnectionStats {
    fn new() -> Self {
        Self {
            opened_at: Instant::now(),
            records_sent: 0,
            records_received: 0,
            bytes_sent: 0,
            bytes_received: 0,
        }
    }

    pub fn age(&self) -> Duration {
        self.opened_at.elapsed()
    }
}

/// Stream wrapper that counts transferred bytes
struct Counted<S> {
    inner: S,
    read: u64,
    written: u64,
}

impl<S: Read> Read for Counted<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.read += n as u64;
        Ok(n)
    }
}

impl<S: Write> Write for Counted<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// A gadget connection over any blocking byte stream
pub struct Connection<S> {
    stream: Counted<S>,
    readers: Arc<ReaderRegistry>,
    writers: Arc<WriterRegistry>,
    peer: Option<SocketAddr>,
    stats: ConnectionStats,
    broken: Option<String>,
}

impl<S> Connection<S> {
    pub fn new(stream: S, readers: Arc<ReaderRegistry>, writers: Arc<WriterRegistry>) -> Self {
        Self {
            stream: Counted {
                inner: stream,
                read: 0,
                written: 0,
            },
            readers,
            writers,
            peer: None,
            stats: ConnectionStats::new(),
            broken: None,
        }
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn is_broken(&self) -> bool {
        self.broken.is_some()
    }

    /// Give back the underlying stream
    pub fn into_inner(self) -> S {
        self.stream.inner
    }

    fn ensure_open(&self) -> Result<()> {
        match &self.broken {
            Some(reason) => Err(NetworkError::Broken {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn fail(&mut self, fatal: bool, err: NetworkError) -> NetworkError {
        if fatal {
            error!(peer = ?self.peer, error = %err, "Connection broken");
            self.broken = Some(err.to_string());
        } else {
            warn!(peer = ?self.peer, error = %err, "Record rejected");
        }
        err
    }
}

impl<S: Write> Connection<S> {
    /// Send one chain with the writer registered for `id`
    pub fn send(&mut self, id: impl Into<u16>, chain: &MessageChain) -> Result<()> {
        self.ensure_open()?;
        let id = id.into();

        let before = self.stream.written;
        let written = self.writers.write_message(&mut self.stream, id, chain);
        self.stats.bytes_sent = self.stream.written;
        if let Err(e) = written {
            return Err(self.fail(e.is_fatal(), e.into()));
        }
        self.flush()?;

        self.stats.records_sent += 1;
        debug!(
            peer = ?self.peer,
            id,
            bytes = self.stream.written - before,
            total_sent = self.stats.bytes_sent,
            "Sent record"
        );
        Ok(())
    }

    /// Send a typed acquisition; ownership passes to the connection
    pub fn send_acquisition(&mut self, acquisition: Acquisition) -> Result<()> {
        self.send(MessageId::IsmrmrdAcquisition, &MessageChain::from(acquisition))
    }

    /// Tell the peer no more records follow
    pub fn send_close(&mut self) -> Result<()> {
        self.ensure_open()?;
        let written = self.writers.write_close(&mut self.stream);
        self.stats.bytes_sent = self.stream.written;
        if let Err(e) = written {
            return Err(self.fail(true, e.into()));
        }
        self.flush()?;
        info!(
            peer = ?self.peer,
            records_sent = self.stats.records_sent,
            bytes_sent = self.stats.bytes_sent,
            age = ?self.stats.age(),
            "Sent close"
        );
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Err(e) = self.stream.flush() {
            let err = NetworkError::connection_with_source("Failed to flush stream", self.peer, e);
            return Err(self.fail(true, err));
        }
        Ok(())
    }
}

impl<S: Read> Connection<S> {
    /// Block until the next record or close arrives
    pub fn receive(&mut self) -> Result<Inbound> {
        self.ensure_open()?;

        let before = self.stream.read;
        let read = self.readers.read_message(&mut self.stream);
        self.stats.bytes_received = self.stream.read;
        let inbound = match read {
            Ok(inbound) => inbound,
            Err(e) => return Err(self.fail(e.is_fatal(), e.into())),
        };

        match &inbound {
            Inbound::Message { id, chain } => {
                self.stats.records_received += 1;
                debug!(
                    peer = ?self.peer,
                    id,
                    nodes = chain.len(),
                    bytes = self.stream.read - before,
                    total_received = self.stats.bytes_received,
                    "Received record"
                );
            }
            Inbound::Close => {
                info!(
                    peer = ?self.peer,
                    records_received = self.stats.records_received,
                    age = ?self.stats.age(),
                    "Peer closed session"
                );
            }
        }
        Ok(inbound)
    }

    /// Receive records until the peer closes, handing each chain to `handler`
    ///
    /// Returns the number of records handled.
    pub fn receive_until_close<F>(&mut self, mut handler: F) -> Result<u64>
    where
        F: FnMut(u16, MessageChain) -> Result<()>,
    {
        let mut handled = 0;
        loop {
            match self.receive()? {
                Inbound::Message { id, chain } => {
                    handler(id, chain)?;
                    handled += 1;
                }
                Inbound::Close => return Ok(handled),
            }
        }
    }
}

impl Connection<TcpStream> {
    /// Connect to `config.peer_address`, trying each resolved address in turn
    pub fn connect(
        config: &WireConfig,
        readers: Arc<ReaderRegistry>,
        writers: Arc<WriterRegistry>,
    ) -> Result<Self> {
        let address = config
            .peer_address
            .as_deref()
            .ok_or_else(|| NetworkError::configuration("peer_address is not set"))?;

        let candidates = address.to_socket_addrs().map_err(|e| {
            NetworkError::connection_with_source(
                format!("Failed to resolve {}", address),
                None,
                e,
            )
        })?;

        let mut last_error = None;
        for addr in candidates {
            match TcpStream::connect_timeout(&addr, config.connect_timeout()) {
                Ok(stream) => return Self::from_tcp(stream, config, readers, writers),
                Err(e) => {
                    warn!(%addr, error = %e, "Connect attempt failed");
                    last_error = Some(NetworkError::connection_with_source(
                        "Failed to connect",
                        Some(addr),
                        e,
                    ));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            NetworkError::connection(format!("{} resolved to no addresses", address), None)
        }))
    }

    /// Wrap an established socket (for example one returned by `accept`)
    pub fn from_tcp(
        stream: TcpStream,
        config: &WireConfig,
        readers: Arc<ReaderRegistry>,
        writers: Arc<WriterRegistry>,
    ) -> Result<Self> {
        let peer = stream.peer_addr().ok();
        let configure = |stream: &TcpStream| -> io::Result<()> {
            stream.set_nodelay(config.nodelay)?;
            stream.set_read_timeout(config.read_timeout())?;
            stream.set_write_timeout(config.write_timeout())?;
            Ok(())
        };
        configure(&stream).map_err(|e| {
            NetworkError::connection_with_source("Failed to configure socket", peer, e)
        })?;

        info!(?peer, nodelay = config.nodelay, "Connection established");

        let mut connection = Self::new(stream, readers, writers);
        connection.peer = peer;
        Ok(connection)
    }

    /// Close both directions of the socket
    pub fn shutdown(self) -> Result<()> {
        let peer = self.peer;
        self.stream
            .inner
            .shutdown(Shutdown::Both)
            .map_err(|e| NetworkError::connection_with_source("Failed to shutdown stream", peer, e))?;
        info!(?peer, "Connection closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::default_registries;
    use gadget_codec::{Section, WireError, WireLimits};
    use gadget_types::{AcquisitionHeader, Payload};
    use std::io::Cursor;

    fn registries() -> (Arc<ReaderRegistry>, Arc<WriterRegistry>) {
        let (readers, writers) = default_registries(WireLimits::default());
        (Arc::new(readers), Arc::new(writers))
    }

    fn encoded(acqs: &[Acquisition], close: bool) -> Vec<u8> {
        let (readers, writers) = registries();
        let mut conn = Connection::new(Vec::new(), readers, writers);
        for acq in acqs {
            conn.send_acquisition(acq.clone()).unwrap();
        }
        if close {
            conn.send_close().unwrap();
        }
        conn.into_inner()
    }

    /// Write side of a `Vec` read side of a `Cursor`
    struct Duplex {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_send_counts_bytes() {
        let (readers, writers) = registries();
        let mut conn = Connection::new(Vec::new(), readers, writers);
        conn.send_acquisition(Acquisition::new(AcquisitionHeader::new(128, 4, 0)).unwrap())
            .unwrap();

        assert_eq!(conn.stats().records_sent, 1);
        assert_eq!(conn.stats().bytes_sent, (2 + AcquisitionHeader::SIZE + 4096) as u64);
    }

    #[test]
    fn test_receive_until_close() {
        let acqs = vec![
            Acquisition::new(AcquisitionHeader::new(8, 2, 0)).unwrap(),
            Acquisition::new(AcquisitionHeader::new(4, 1, 3)).unwrap(),
        ];
        let (readers, writers) = registries();
        let input = Cursor::new(encoded(&acqs, true));
        let mut conn = Connection::new(
            Duplex {
                input,
                output: Vec::new(),
            },
            readers,
            writers,
        );

        let mut received = Vec::new();
        let handled = conn
            .receive_until_close(|id, chain| {
                assert_eq!(id, 1008);
                received.push(Acquisition::try_from(chain).unwrap());
                Ok(())
            })
            .unwrap();

        assert_eq!(handled, 2);
        assert_eq!(received, acqs);
        assert_eq!(conn.stats().records_received, 2);
    }

    #[test]
    fn test_fatal_error_breaks_connection() {
        let acq = Acquisition::new(AcquisitionHeader::new(16, 2, 2)).unwrap();
        let mut wire = encoded(&[acq], false);
        wire.truncate(wire.len() - 1);

        let (readers, writers) = registries();
        let mut conn = Connection::new(
            Duplex {
                input: Cursor::new(wire),
                output: Vec::new(),
            },
            readers,
            writers,
        );

        match conn.receive() {
            Err(NetworkError::Wire(WireError::ConnectionIo {
                section: Section::Samples,
                ..
            })) => {}
            other => panic!("expected sample read failure, got {other:?}"),
        }
        assert!(conn.is_broken());
        assert!(matches!(conn.receive(), Err(NetworkError::Broken { .. })));
        assert!(matches!(conn.send_close(), Err(NetworkError::Broken { .. })));
    }

    #[test]
    fn test_rejected_payload_keeps_connection_usable() {
        let (readers, writers) = registries();
        let mut conn = Connection::new(Vec::new(), readers, writers);

        let err = conn
            .send(MessageId::IsmrmrdAcquisition, &MessageChain::new(Payload::Raw(vec![1])))
            .unwrap_err();
        assert!(matches!(
            err,
            NetworkError::Wire(WireError::InvalidPayloadType { .. })
        ));
        assert!(!err.is_fatal());
        assert!(!conn.is_broken());

        conn.send_close().unwrap();
        assert_eq!(conn.into_inner(), 4u16.to_ne_bytes());
    }

    #[test]
    fn test_unregistered_writer_keeps_connection_usable() {
        let (readers, writers) = registries();
        let mut conn = Connection::new(Vec::new(), readers, writers);

        let chain = MessageChain::from(Acquisition::new(AcquisitionHeader::new(4, 1, 0)).unwrap());
        let err = conn.send(MessageId::ImageComplexFloat, &chain).unwrap_err();
        assert!(matches!(
            err,
            NetworkError::Wire(WireError::NoWriter { id: 1004 })
        ));
        assert!(!conn.is_broken());
        assert_eq!(conn.stats().bytes_sent, 0);

        conn.send(MessageId::IsmrmrdAcquisition, &chain).unwrap();
        assert_eq!(conn.stats().records_sent, 1);
        assert_eq!(conn.into_inner().len(), 2 + AcquisitionHeader::SIZE + 4 * 8);
    }

    #[test]
    fn test_close_counted_on_both_sides() {
        let acq = Acquisition::new(AcquisitionHeader::new(8, 2, 1)).unwrap();
        let (readers, writers) = registries();

        let mut sender = Connection::new(Vec::new(), Arc::clone(&readers), Arc::clone(&writers));
        sender.send_acquisition(acq).unwrap();
        sender.send_close().unwrap();
        let sent = sender.stats().bytes_sent;
        assert!(sender.stats().age() <= sender.stats().opened_at.elapsed());

        let wire = sender.into_inner();
        assert_eq!(sent, wire.len() as u64);

        let mut receiver = Connection::new(Cursor::new(wire), readers, writers);
        assert_eq!(receiver.receive_until_close(|_, _| Ok(())).unwrap(), 1);
        assert_eq!(receiver.stats().bytes_received, sent);
    }

    /// Accepts `limit` bytes, then refuses everything
    struct ShortWriter {
        written: Vec<u8>,
        limit: usize,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.limit - self.written.len();
            if room == 0 {
                return Err(io::ErrorKind::BrokenPipe.into());
            }
            let n = room.min(buf.len());
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_partial_send_is_counted() {
        let (readers, writers) = registries();
        let stream = ShortWriter {
            written: Vec::new(),
            limit: 100,
        };
        let mut conn = Connection::new(stream, readers, writers);

        let err = conn
            .send_acquisition(Acquisition::new(AcquisitionHeader::new(16, 2, 0)).unwrap())
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(conn.is_broken());
        assert_eq!(conn.stats().bytes_sent, 100);
        assert_eq!(conn.stats().records_sent, 0);
    }
}
