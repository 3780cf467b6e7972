use std::net::SocketAddr;
use crate::sender::sender_config::SenderConfig;
use crate::voxel::datagram::MAX_UDP_PAYLOAD;

#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    pub bind_addr: SocketAddr,

    /// Datagrams that fill the entire receive buffer are assumed to be truncated by the OS and
    ///  are dropped.
    pub receive_buffer_len: usize,
}

impl ReceiverConfig {
    pub fn new(bind_addr: SocketAddr) -> ReceiverConfig {
        ReceiverConfig {
            bind_addr,
            receive_buffer_len: MAX_UDP_PAYLOAD + 1,
        }
    }

    /// all interfaces, default voxel port
    pub fn default_ipv4() -> ReceiverConfig {
        Self::new(SocketAddr::from(([0, 0, 0, 0], SenderConfig::DEFAULT_PORT)))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.receive_buffer_len < 4 {
            anyhow::bail!("receive buffer of {} bytes is too small", self.receive_buffer_len);
        }
        Ok(())
    }
}
