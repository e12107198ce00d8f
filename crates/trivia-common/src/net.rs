use std::io;
use std::net::SocketAddr;

use futures::stream::{SplitSink, SplitStream};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};

// -- Framing --

pub const MAX_LINE_LENGTH: usize = 64 * 1024;

pub type Transport = Framed<TcpStream, LinesCodec>;
pub type LineSink = SplitSink<Transport, String>;
pub type LineStream = SplitStream<Transport>;

pub fn framed_transport(stream: TcpStream) -> Transport {
    Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH))
}

/// Frame a stream and split it so reads and writes can live in different tasks.
/// The socket is closed once both halves are dropped.
pub fn split_transport(stream: TcpStream) -> (LineSink, LineStream) {
    framed_transport(stream).split()
}

// -- Transport helpers --

pub async fn send_line<S>(sink: &mut S, line: impl Into<String>) -> Result<(), LinesCodecError>
where
    S: Sink<String, Error = LinesCodecError> + Unpin,
{
    sink.send(line.into()).await
}

/// Read one line. `Ok(None)` means the peer closed the connection.
pub async fn recv_line<S>(stream: &mut S) -> Result<Option<String>, LinesCodecError>
where
    S: Stream<Item = Result<String, LinesCodecError>> + Unpin,
{
    stream.next().await.transpose()
}

// -- Connecting --

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("could not resolve host '{host}'")]
    Resolve { host: String },
    #[error("could not connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
}

/// Resolve `host` and connect to the first address that accepts.
pub async fn connect(host: &str, port: u16) -> Result<TcpStream, ConnectError> {
    let addrs: Vec<SocketAddr> = match tokio::net::lookup_host((host, port)).await {
        Ok(addrs) => addrs.collect(),
        Err(_) => Vec::new(),
    };
    if addrs.is_empty() {
        return Err(ConnectError::Resolve {
            host: host.to_string(),
        });
    }

    let mut last_error = io::Error::new(io::ErrorKind::AddrNotAvailable, "no usable address");
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = e,
        }
    }

    Err(ConnectError::Connect {
        host: host.to_string(),
        port,
        source: last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_line_round_trip_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut transport = framed_transport(stream);
            let line = recv_line(&mut transport).await.unwrap();
            send_line(&mut transport, "pong").await.unwrap();
            line
        });

        let stream = connect("127.0.0.1", port).await.unwrap();
        let (mut sink, mut stream) = split_transport(stream);
        send_line(&mut sink, "ping").await.unwrap();
        assert_eq!(recv_line(&mut stream).await.unwrap().as_deref(), Some("pong"));
        assert_eq!(server.await.unwrap().as_deref(), Some("ping"));
    }

    #[tokio::test]
    async fn test_recv_line_reports_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let stream = connect("127.0.0.1", port).await.unwrap();
        let mut transport = framed_transport(stream);
        server.await.unwrap();
        assert!(recv_line(&mut transport).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = connect("127.0.0.1", port).await.unwrap_err();
        assert!(matches!(err, ConnectError::Connect { .. }));
    }
}
