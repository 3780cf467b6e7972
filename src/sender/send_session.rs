use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncBufRead;
use tokio::time::sleep;
use tracing::{debug, error, info, trace};
use crate::sender::send_socket::SendSocket;
use crate::sender::sender_config::SenderConfig;
use crate::voxel::datagram::{DatagramBuilder, DatagramHeader};
use crate::voxel::record::RecordReader;

/// What happened during a run. Send failures are counted here rather than aborting the run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SendSummary {
    pub num_datagrams: u64,
    pub num_records: u64,
    pub num_bytes: u64,
    pub num_send_failures: u64,
    pub num_truncated_records: u64,
}

/// A SendSession owns everything a single run needs - input, socket and sequence counter. It
///  is consumed by [SendSession::run], so input and socket are released when the run ends,
///  regardless of how much input there was.
pub struct SendSession<R> {
    reader: RecordReader<R>,
    socket: Arc<dyn SendSocket>,
    destination: SocketAddr,
    config: Arc<SenderConfig>,
    sequence_number: u16,
    summary: SendSummary,
}

impl<R: AsyncBufRead + Unpin> SendSession<R> {
    pub fn new(reader: RecordReader<R>, socket: Arc<dyn SendSocket>, destination: SocketAddr, config: Arc<SenderConfig>) -> SendSession<R> {
        SendSession {
            reader,
            socket,
            destination,
            config,
            sequence_number: 0,
            summary: SendSummary::default(),
        }
    }

    /// Sends datagrams until the input is exhausted. At least one datagram is sent, so empty
    ///  input results in a single datagram consisting only of the header.
    //TODO is the header-only datagram for empty input part of the protocol? Receivers need to handle it either way.
    pub async fn run(mut self) -> SendSummary {
        info!(destination = ?self.destination, command = ?self.config.command, "sending voxels");

        loop {
            let header = DatagramHeader {
                command: self.config.command,
                sequence_number: self.sequence_number,
            };
            let mut datagram = DatagramBuilder::new(header, self.config.soft_cap);

            let end_of_input = self.fill(&mut datagram).await;
            self.send(datagram).await;

            sleep(self.config.send_interval).await;
            // no special handling for overflow: u16::MAX is followed by 0
            self.sequence_number = self.sequence_number.wrapping_add(1);

            if end_of_input {
                break;
            }
        }

        info!(
            num_datagrams = self.summary.num_datagrams,
            num_records = self.summary.num_records,
            num_send_failures = self.summary.num_send_failures,
            "finished sending voxels"
        );
        self.summary
    }

    /// Adds records while the datagram is still below the soft cap. Returns `true` if the
    ///  input is exhausted.
    ///
    /// NB: The cap is checked before a record is read, never after it is added. A record that
    ///  starts below the cap is always added in full, so the datagram can end up bigger than
    ///  the cap.
    async fn fill(&mut self, datagram: &mut DatagramBuilder) -> bool {
        while datagram.has_room() {
            match self.reader.read_record().await {
                Ok(Some(record)) => {
                    if record.is_truncated() {
                        self.summary.num_truncated_records += 1;
                    }
                    datagram.push(&record);
                    self.summary.num_records += 1;
                    trace!(length_code = record.length_code, framed_len = record.framed_len(), datagram_len = datagram.len(), "added record to datagram #{}", self.sequence_number);
                }
                Ok(None) => return true,
                Err(e) => {
                    error!("error reading voxel input - treating it as end of input: {}", e);
                    return true;
                }
            }
        }

        match self.reader.is_exhausted().await {
            Ok(exhausted) => exhausted,
            Err(e) => {
                error!("error reading voxel input - treating it as end of input: {}", e);
                true
            }
        }
    }

    async fn send(&mut self, datagram: DatagramBuilder) {
        let num_records = datagram.num_records();
        if datagram.is_empty() {
            debug!("datagram #{} has no records, sending the header only", self.sequence_number);
        }
        let datagram = datagram.finish();

        self.summary.num_datagrams += 1;
        match self.socket.send_datagram(self.destination, &datagram).await {
            Ok(num_sent) => {
                self.summary.num_bytes += num_sent as u64;
                debug!(num_records, len = datagram.len(), "sent datagram #{} to {:?}", self.sequence_number, self.destination);
            }
            Err(e) => {
                self.summary.num_send_failures += 1;
                error!("error sending datagram #{} to {:?}: {}", self.sequence_number, self.destination, e);
            }
        }
    }
}
