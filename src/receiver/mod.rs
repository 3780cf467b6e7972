use std::net::SocketAddr;
use std::sync::Arc;
use async_trait::async_trait;
use bytes::Bytes;
use rustc_hash::FxHashMap;
use tokio::net::UdpSocket;
use tracing::{debug, error, info, trace, warn};
use crate::receiver::receiver_config::ReceiverConfig;
use crate::voxel::datagram::DecodedDatagram;

pub mod receiver_config;

/// This trait decouples receiving and decoding voxel datagrams from what is done with the
///  voxels, e.g. inserting them into a voxel tree.
///
/// Datagrams are passed on as they arrive: there is no re-ordering and no recovery of lost
///  datagrams. A datagram may have no records at all.
#[async_trait]
pub trait DatagramHandler: Sync + Send {
    async fn on_datagram(&self, sender: SocketAddr, datagram: DecodedDatagram);
}

pub struct VoxelReceiver {
    socket: UdpSocket,
    config: Arc<ReceiverConfig>,
    handler: Arc<dyn DatagramHandler>,
}

impl VoxelReceiver {
    pub async fn new(config: Arc<ReceiverConfig>, handler: Arc<dyn DatagramHandler>) -> anyhow::Result<VoxelReceiver> {
        config.validate()?;

        let socket = UdpSocket::bind(config.bind_addr).await?;
        info!("bound voxel receive socket to {:?}", socket.local_addr()?);

        Ok(VoxelReceiver {
            socket,
            config,
            handler,
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    pub async fn recv_loop(&self) {
        info!("starting voxel receive loop");

        let mut last_sequence_numbers: FxHashMap<SocketAddr, u16> = FxHashMap::default();
        let mut buf = vec![0u8; self.config.receive_buffer_len];
        loop {
            let (num_read, from) = match self.socket.recv_from(&mut buf).await {
                Ok(x) => x,
                Err(e) => {
                    error!("socket error: {}", e);
                    continue;
                }
            };

            if num_read == buf.len() {
                warn!("received a datagram from {:?} filling the entire receive buffer of {} bytes - dropping", from, buf.len());
                continue;
            }
            trace!("received datagram from {:?}: {:?}", from, &buf[..num_read]);

            let datagram = match DecodedDatagram::decode(Bytes::copy_from_slice(&buf[..num_read])) {
                Ok(datagram) => datagram,
                Err(e) => {
                    warn!("received an invalid voxel datagram from {:?} - dropping: {}", from, e);
                    continue;
                }
            };

            track_sequence_number(&mut last_sequence_numbers, from, datagram.header.sequence_number);
            self.handler.on_datagram(from, datagram).await;
        }
    }
}

/// Returns the number of datagrams that went missing between the previous datagram from the
///  same sender and this one. A datagram that arrives late or a sender that starts over looks
///  like a (large) gap as well - this is for diagnostics only.
fn track_sequence_number(last_sequence_numbers: &mut FxHashMap<SocketAddr, u16>, from: SocketAddr, sequence_number: u16) -> u16 {
    match last_sequence_numbers.insert(from, sequence_number) {
        None => {
            debug!("first voxel datagram from {:?}: #{}", from, sequence_number);
            0
        }
        Some(prev) => {
            let num_missing = sequence_number.wrapping_sub(prev.wrapping_add(1));
            if num_missing != 0 {
                debug!("datagrams from {:?} out of sequence: #{} after #{}", from, sequence_number, prev);
            }
            num_missing
        }
    }
}
