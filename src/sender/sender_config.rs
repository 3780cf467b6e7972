use std::net::SocketAddr;
use std::time::Duration;
use anyhow::{anyhow, bail};
use tokio::net::lookup_host;
use tracing::debug;
use crate::voxel::command::Command;
use crate::voxel::datagram::{DatagramHeader, DEFAULT_SOFT_CAP, MAX_UDP_PAYLOAD};
use crate::voxel::record::MAX_FRAMED_RECORD_LEN;

#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// host name or IP address of the voxel server
    pub server: String,
    pub port: u16,

    pub command: Command,

    /// Records are added to a datagram as long as the datagram is smaller than this. The last
    ///  record may take the datagram past this size, see
    ///  [DatagramBuilder](crate::voxel::datagram::DatagramBuilder).
    pub soft_cap: usize,

    /// pause after each datagram - this is the only flow control there is
    pub send_interval: Duration,
}

impl SenderConfig {
    pub const DEFAULT_PORT: u16 = 40106;

    pub fn new(server: impl Into<String>) -> SenderConfig {
        SenderConfig {
            server: server.into(),
            port: Self::DEFAULT_PORT,
            command: Command::Insert,
            soft_cap: DEFAULT_SOFT_CAP,
            send_interval: Duration::from_micros(20_000),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.is_empty() {
            bail!("no server address");
        }
        if self.soft_cap <= DatagramHeader::SERIALIZED_LEN {
            bail!("soft cap of {} bytes leaves no room for records", self.soft_cap);
        }
        if self.soft_cap > MAX_UDP_PAYLOAD - MAX_FRAMED_RECORD_LEN {
            bail!("soft cap of {} bytes can produce datagrams exceeding the maximum UDP payload", self.soft_cap);
        }
        Ok(())
    }

    pub async fn resolve_destination(&self) -> anyhow::Result<SocketAddr> {
        let destination = lookup_host((self.server.as_str(), self.port)).await?
            .next()
            .ok_or_else(|| anyhow!("server {:?} did not resolve to any address", self.server))?;
        debug!("resolved {}:{} to {:?}", self.server, self.port, destination);
        Ok(destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = SenderConfig::new("localhost");
        assert_eq!(config.port, 40106);
        assert_eq!(config.command, Command::Insert);
        assert_eq!(config.soft_cap, 800);
        assert_eq!(config.send_interval, Duration::from_millis(20));
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case::no_room(3, false)]
    #[case::single_byte(4, true)]
    #[case::max(65507 - 97, true)]
    #[case::too_big(65507 - 96, false)]
    fn test_validate_soft_cap(#[case] soft_cap: usize, #[case] expected_valid: bool) {
        let mut config = SenderConfig::new("127.0.0.1");
        config.soft_cap = soft_cap;
        assert_eq!(config.validate().is_ok(), expected_valid);
    }

    #[test]
    fn test_validate_empty_server() {
        assert!(SenderConfig::new("").validate().is_err());
    }

    #[tokio::test]
    async fn test_resolve_ip_literal() {
        let mut config = SenderConfig::new("127.0.0.1");
        config.port = 1234;
        assert_eq!(config.resolve_destination().await.unwrap(), SocketAddr::from(([127, 0, 0, 1], 1234)));
    }
}
