use std::net::SocketAddr;
use async_trait::async_trait;
#[cfg(test)] use mockall::automock;
use tokio::net::UdpSocket;
use tracing::{info, trace};

/// This is an abstraction for sending a datagram on a UDP socket, introduced to facilitate
///  mocking the I/O part away for testing
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SendSocket: Send + Sync + 'static {
    /// Returns the number of bytes sent. Errors are left to the caller, there is no retry.
    async fn send_datagram(&self, to: SocketAddr, datagram: &[u8]) -> anyhow::Result<usize>;
}

#[async_trait]
impl SendSocket for UdpSocket {
    async fn send_datagram(&self, to: SocketAddr, datagram: &[u8]) -> anyhow::Result<usize> {
        trace!("UDP socket: sending {} bytes to {:?}", datagram.len(), to);
        Ok(self.send_to(datagram, to).await?)
    }
}

/// Binds an ephemeral local port for the destination's address family.
pub async fn bind_for(destination: SocketAddr) -> anyhow::Result<UdpSocket> {
    let socket = if destination.is_ipv4() {
        UdpSocket::bind("0.0.0.0:0").await?
    }
    else {
        UdpSocket::bind("[::]:0").await?
    };
    info!("bound send socket to {:?}", socket.local_addr()?);
    Ok(socket)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let sender = bind_for(receiver.local_addr().unwrap()).await.unwrap();

        let num_sent = sender.send_datagram(receiver.local_addr().unwrap(), &[b'I', 0, 0, 1, 9]).await.unwrap();
        assert_eq!(num_sent, 5);

        let mut buf = [0u8; 16];
        let (len, _) = receiver.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], &[b'I', 0, 0, 1, 9]);
    }
}
