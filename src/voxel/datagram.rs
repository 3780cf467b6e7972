//! Voxel datagram layout:
//!
//! ```ascii
//! 0: command code (u8): 'I' (insert) or 'R' (replace)
//! 1: sequence number (u16 LE): 0 for the first datagram of a run, wrapping on overflow
//! 3: (repeated) record: length code (u8) followed by ceil(length_code * 3 / 8) payload bytes
//! ```
//!
//! There is no record count and no terminator: a receiver infers the records from the
//!  datagram length. A datagram may contain no records at all.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use anyhow::{anyhow, bail};
use crate::voxel::command::Command;
use crate::voxel::record::{payload_len, Record, MAX_FRAMED_RECORD_LEN};

/// The default soft cap for a datagram's size.
pub const DEFAULT_SOFT_CAP: usize = 800;

/// The largest UDP payload for IPv4
pub const MAX_UDP_PAYLOAD: usize = 65507;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DatagramHeader {
    pub command: Command,
    pub sequence_number: u16,
}

impl DatagramHeader {
    pub const SERIALIZED_LEN: usize = 3;

    pub fn ser(&self, buf: &mut BytesMut) {
        buf.put_u8(self.command.code());
        buf.put_u16_le(self.sequence_number);
    }

    pub fn deser(buf: &mut impl Buf) -> anyhow::Result<DatagramHeader> {
        if buf.remaining() < Self::SERIALIZED_LEN {
            bail!("datagram too short for header: {} bytes", buf.remaining());
        }
        let raw_command = buf.get_u8();
        let command = Command::try_from(raw_command)
            .map_err(|_| anyhow!("unknown command code {:#04x}", raw_command))?;
        let sequence_number = buf.get_u16_le();

        Ok(DatagramHeader {
            command,
            sequence_number,
        })
    }
}

/// Accumulates records into a single datagram.
///
/// The soft cap only decides whether another record may be *started*: as long as the datagram
///  is smaller than the cap, the next record is appended in full, even if that takes the
///  datagram past the cap. A datagram can therefore exceed the cap by up to one record
///  minus one byte. Receivers rely on the exact packing, so this must not be turned into a
///  hard limit.
pub struct DatagramBuilder {
    buf: BytesMut,
    soft_cap: usize,
    num_records: usize,
}

impl DatagramBuilder {
    pub fn new(header: DatagramHeader, soft_cap: usize) -> DatagramBuilder {
        let mut buf = BytesMut::with_capacity(soft_cap + MAX_FRAMED_RECORD_LEN);
        header.ser(&mut buf);
        DatagramBuilder {
            buf,
            soft_cap,
            num_records: 0,
        }
    }

    /// Checked *before* reading the next record.
    pub fn has_room(&self) -> bool {
        self.buf.len() < self.soft_cap
    }

    pub fn push(&mut self, record: &Record) {
        record.ser(&mut self.buf);
        self.num_records += 1;
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn num_records(&self) -> usize {
        self.num_records
    }

    pub fn is_empty(&self) -> bool {
        self.num_records == 0
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedDatagram {
    pub header: DatagramHeader,
    pub records: Vec<Record>,
}

impl DecodedDatagram {
    /// Splits a received datagram into its header and records. A last record that is shorter
    ///  than its length code implies is returned as it is, the same way a sender passes on a
    ///  record truncated by the end of its input.
    pub fn decode(mut buf: Bytes) -> anyhow::Result<DecodedDatagram> {
        let header = DatagramHeader::deser(&mut buf)?;

        let mut records = Vec::new();
        while buf.has_remaining() {
            let length_code = buf.get_u8();
            let available = payload_len(length_code).min(buf.remaining());
            records.push(Record::new(length_code, buf.split_to(available)));
        }

        Ok(DecodedDatagram {
            header,
            records,
        })
    }
}
