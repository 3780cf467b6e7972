//! Streams a file of voxel records to a voxel server over UDP.
//!
//! The input is a plain sequence of records, each a length code byte followed by
//!  `ceil(length_code * 3 / 8)` payload bytes. Records are packed into datagrams of roughly 800
//!  bytes behind a 3 byte header (command code and sequence number), and datagrams are sent at
//!  a fixed pace. Delivery is fire-and-forget: there is no acknowledgement, no retransmission
//!  and no congestion control.
//!
//! See [voxel::datagram] for the wire format, [sender] for the sending side and [receiver]
//!  for decoding datagrams on the server side.

pub mod voxel;
pub mod sender;
pub mod receiver;

#[cfg(test)]
pub mod test_util;


#[cfg(test)]
mod test {
    use tracing::Level;

    #[ctor::ctor]
    fn init_test_logging() {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(Level::TRACE)
            .try_init()
            .ok();
    }
}
