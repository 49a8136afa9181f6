//! Listener abstraction + the UDP ingestion socket.
//! -----------------------------------------------------------------------------
//! A **listener** receives raw records from one transport, decodes them into
//! `RawRecord`s and hands each one to the mission registry, which routes it
//! into the ring buffer of its mission. Nothing here waits on the database.

use async_trait::async_trait;
use log::Level;
use metrics::counter;
use std::{io, net::SocketAddr, sync::Arc};
use tokio::{net::UdpSocket, sync::watch, task, task::JoinHandle};

use super::record::RawRecord;
use crate::config::ListenerConfig;
use crate::mission::{MissionRegistry, Offer};

// ============================================================================
// 1 ▸ Listener trait – uniform way to spawn them
// ============================================================================

#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Display name for logs.
    fn name(&self) -> &'static str;

    /// Receive loop; returns once `shutdown` flips to `true` or its sender
    /// is dropped.
    async fn ingest(self: Arc<Self>, registry: Arc<MissionRegistry>, shutdown: watch::Receiver<bool>);

    /// Convenience helper: runs *ingest* on its own task.
    fn spawn(self: Arc<Self>, registry: Arc<MissionRegistry>, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let name = self.name();
        task::spawn(async move {
            okra_log!(Level::Info, "listener", "listener '{}' started", name);
            self.ingest(registry, shutdown).await;
            okra_log!(Level::Info, "listener", "listener '{}' exited", name);
        })
    }
}

// ============================================================================
// 2 ▸ UDP – one datagram per record
// ============================================================================

pub struct UdpListener {
    socket: UdpSocket,
    separator: char,
    max_datagram: usize,
}

impl UdpListener {
    pub async fn bind(cfg: &ListenerConfig) -> io::Result<Self> {
        let socket = UdpSocket::bind(cfg.addr()).await?;
        okra_log!(Level::Info, "listener", "UDP listener bound to {}", socket.local_addr()?);
        Ok(Self { socket, separator: cfg.separator, max_datagram: cfg.max_datagram })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Decode one datagram and route it. `None` when the record was dropped.
    pub fn handle(&self, registry: &MissionRegistry, datagram: &[u8], peer: SocketAddr) -> Option<Offer> {
        let record = match RawRecord::decode(datagram, self.separator) {
            Ok(record) => record,
            Err(e) => {
                okra_log!(Level::Debug, "listener", "undecodable datagram from {}: {}", peer, e);
                counter!("okra_records_dropped_total", "reason" => "decode").increment(1);
                return None;
            }
        };
        match registry.dispatch(record) {
            Ok(Offer::Rejected) => {
                okra_log!(Level::Debug, "listener", "record from {} rejected, ring full", peer);
                None
            }
            Ok(offer) => Some(offer),
            Err(e) => {
                okra_log!(Level::Debug, "listener", "record from {} dropped: {}", peer, e);
                None
            }
        }
    }
}

#[async_trait]
impl Listener for UdpListener {
    fn name(&self) -> &'static str {
        "udp"
    }

    async fn ingest(self: Arc<Self>, registry: Arc<MissionRegistry>, mut shutdown: watch::Receiver<bool>) {
        let mut buf = vec![0u8; self.max_datagram];
        loop {
            tokio::select! {
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, peer)) => {
                        self.handle(&registry, &buf[..len], peer);
                    }
                    Err(e) => {
                        okra_log!(Level::Warn, "listener", "UDP receive failed: {}", e);
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}
