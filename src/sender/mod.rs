use std::path::Path;
use std::sync::Arc;
use tracing::info;
use crate::sender::send_session::{SendSession, SendSummary};
use crate::sender::sender_config::SenderConfig;
use crate::voxel::record::RecordReader;

pub mod send_session;
pub mod send_socket;
pub mod sender_config;

/// Streams the voxel records of a file to the configured server.
///
/// Everything that can prevent the run from starting (invalid configuration, unreadable input
///  file, unresolvable server, socket setup) is reported as an error before the first datagram
///  is sent. Once the run has started, it only ends when the input is exhausted.
pub async fn send_voxels(input: impl AsRef<Path>, config: Arc<SenderConfig>) -> anyhow::Result<SendSummary> {
    config.validate()?;

    let destination = config.resolve_destination().await?;
    let reader = RecordReader::open(input.as_ref()).await?;
    let socket = send_socket::bind_for(destination).await?;

    info!("sending voxel file {:?} to {}:{} ({:?})", input.as_ref(), config.server, config.port, destination);
    let session = SendSession::new(reader, Arc::new(socket), destination, config);
    Ok(session.run().await)
}
