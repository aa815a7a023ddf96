//! Byte sinks for exported messages

use std::io::{self, Write};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// UDP sink: every write leaves as one datagram.
///
/// A [`MessageStream`](crate::MessageStream) flushes each message with a
/// single write, so messages map one-to-one onto datagrams, the transport
/// RFC 7011 section 10.3 expects. Pick an MTU below the path MTU (1472 for
/// plain Ethernet) to keep datagrams from fragmenting.
#[derive(Debug)]
pub struct UdpSink {
    socket: UdpSocket,
}

impl UdpSink {
    /// Bind an ephemeral local socket and connect it to the collector
    pub fn connect<A: ToSocketAddrs>(collector: A) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(collector)?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl Write for UdpSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.socket.send(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_arrive_as_datagrams() {
        // Create a test receiver
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let receiver_addr = receiver.local_addr().unwrap();

        let mut sink = UdpSink::connect(receiver_addr).unwrap();
        let message = [0x00, 0x0a, 0x00, 0x10, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];
        sink.write_all(&message).unwrap();

        // Receive and verify
        let mut buf = [0u8; 1024];
        let (size, _) = receiver.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..size], &message[..]);
    }
}
