//! Graphite pickle-protocol wire format and delivery.
//!
//! A message to carbon's pickle receiver is a 4-byte big-endian length
//! header followed by exactly that many bytes of pickled payload. Delivery
//! is fire-and-forget over one TCP connection per send: connect, write the
//! framed message in full, shut down. No retry on failure.

pub mod pickle;

use crate::core::{MetricBatch, RelayError, Result};
use bytes::{BufMut, Bytes, BytesMut};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// Prefix a payload with its length as a big-endian u32.
pub fn frame(payload: &[u8]) -> Bytes {
    let mut message = BytesMut::with_capacity(4 + payload.len());
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);
    message.freeze()
}

/// Client for carbon's pickle receiver.
#[derive(Debug, Clone)]
pub struct GraphiteClient {
    host: String,
    port: u16,
    connect_timeout: Duration,
}

impl GraphiteClient {
    /// Create a client for the given collector endpoint.
    pub fn new(host: impl Into<String>, port: u16, connect_timeout: Duration) -> Self {
        GraphiteClient {
            host: host.into(),
            port,
            connect_timeout,
        }
    }

    /// Encode, frame, and deliver a batch.
    ///
    /// An empty batch still produces a valid framed message of an empty
    /// list; the collector treats it as a no-op.
    pub async fn send(&self, batch: &MetricBatch) -> Result<()> {
        let payload = pickle::encode(batch);
        self.deliver(&frame(&payload)).await?;
        tracing::debug!(samples = batch.len(), "metrics sent to graphite");
        Ok(())
    }

    /// Write one framed message over a fresh connection.
    ///
    /// `write_all` loops over partial writes until every byte is out. The
    /// stream is dropped on every exit path, so the connection never leaks.
    async fn deliver(&self, message: &[u8]) -> Result<()> {
        let mut stream =
            match tokio::time::timeout(self.connect_timeout, TcpStream::connect((self.host.as_str(), self.port)))
                .await
            {
                Ok(Ok(stream)) => stream,
                Ok(Err(source)) => {
                    return Err(RelayError::Connect {
                        host: self.host.clone(),
                        port: self.port,
                        source,
                    })
                }
                Err(_) => {
                    return Err(RelayError::Connect {
                        host: self.host.clone(),
                        port: self.port,
                        source: std::io::Error::new(
                            std::io::ErrorKind::TimedOut,
                            format!("connect timed out after {:?}", self.connect_timeout),
                        ),
                    })
                }
            };

        stream
            .write_all(message)
            .await
            .map_err(|source| RelayError::Write {
                host: self.host.clone(),
                port: self.port,
                source,
            })?;
        stream
            .shutdown()
            .await
            .map_err(|source| RelayError::Write {
                host: self.host.clone(),
                port: self.port,
                source,
            })?;
        Ok(())
    }
}
