use std::io::ErrorKind;
use std::path::Path;
use bytes::{BufMut, Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::{debug, trace};

/// Number of payload bytes that follow a given length code: three bits per octet, rounded up
///  to full bytes.
pub const fn payload_len(length_code: u8) -> usize {
    (length_code as usize * 3).div_ceil(8)
}

/// The largest framed record (length byte plus payload) the format can express
pub const MAX_FRAMED_RECORD_LEN: usize = 1 + payload_len(u8::MAX);

/// A single length-prefixed voxel entry. Records are the unit of packing: they are never split
///  across datagrams.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub length_code: u8,
    pub payload: Bytes,
}

impl Record {
    pub fn new(length_code: u8, payload: impl Into<Bytes>) -> Record {
        Record {
            length_code,
            payload: payload.into(),
        }
    }

    pub fn expected_payload_len(&self) -> usize {
        payload_len(self.length_code)
    }

    /// A record is truncated if the input ended before its payload was complete. Truncated
    ///  records are passed on as they are.
    pub fn is_truncated(&self) -> bool {
        self.payload.len() < self.expected_payload_len()
    }

    /// the number of bytes this record occupies in a datagram
    pub fn framed_len(&self) -> usize {
        1 + self.payload.len()
    }

    pub fn ser(&self, buf: &mut BytesMut) {
        buf.put_u8(self.length_code);
        buf.put_slice(&self.payload);
    }
}

/// Reads [Record]s one at a time from a buffered byte stream.
///
/// There is no framing beyond the length byte, so the reader cannot recover from corrupt
///  input - it relies on the stream being well-formed. The one irregularity it tolerates is a
///  stream ending in the middle of a payload: the record is returned with the bytes that
///  were available.
pub struct RecordReader<R> {
    inner: R,
    num_read: u64,
}

impl RecordReader<BufReader<File>> {
    pub async fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).await
            .map_err(|e| anyhow::anyhow!("cannot open voxel file {:?}: {}", path, e))?;
        debug!("opened voxel file {:?}", path);
        Ok(RecordReader::new(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin> RecordReader<R> {
    pub fn new(inner: R) -> RecordReader<R> {
        RecordReader {
            inner,
            num_read: 0,
        }
    }

    /// Checks if there is any more input, without consuming anything.
    pub async fn is_exhausted(&mut self) -> anyhow::Result<bool> {
        Ok(self.inner.fill_buf().await?.is_empty())
    }

    /// Returns the next record, or `None` if the stream was exhausted before its length byte.
    pub async fn read_record(&mut self) -> anyhow::Result<Option<Record>> {
        let length_code = match self.inner.read_u8().await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let expected_len = payload_len(length_code);
        let mut payload = Vec::with_capacity(expected_len);
        (&mut self.inner).take(expected_len as u64)
            .read_to_end(&mut payload).await?;

        let record = Record::new(length_code, payload);
        self.num_read += 1;

        if record.is_truncated() {
            debug!("record #{} is truncated: expected {} payload bytes, got {}", self.num_read, expected_len, record.payload.len());
        }
        trace!(length_code, payload_len = record.payload.len(), "read record #{}", self.num_read);
        Ok(Some(record))
    }

    pub fn num_read(&self) -> u64 {
        self.num_read
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(2, 1)]
    #[case(3, 2)]
    #[case(8, 3)]
    #[case(9, 4)]
    #[case(16, 6)]
    #[case(254, 96)]
    #[case(255, 96)]
    fn test_payload_len(#[case] length_code: u8, #[case] expected: usize) {
        assert_eq!(payload_len(length_code), expected);
    }

    #[test]
    fn test_max_framed_record_len() {
        assert_eq!(MAX_FRAMED_RECORD_LEN, 97);
    }

    #[tokio::test]
    async fn test_read_records() {
        let input: &[u8] = &[
            3, 10, 11,
            0,
            8, 20, 21, 22,
        ];
        let mut reader = RecordReader::new(input);

        assert!(!reader.is_exhausted().await.unwrap());
        assert_eq!(reader.read_record().await.unwrap(), Some(Record::new(3, vec![10, 11])));
        assert_eq!(reader.read_record().await.unwrap(), Some(Record::new(0, Bytes::new())));
        assert!(!reader.is_exhausted().await.unwrap());
        assert_eq!(reader.read_record().await.unwrap(), Some(Record::new(8, vec![20, 21, 22])));
        assert!(reader.is_exhausted().await.unwrap());
        assert_eq!(reader.read_record().await.unwrap(), None);
        assert_eq!(reader.read_record().await.unwrap(), None);
        assert_eq!(reader.num_read(), 3);
    }

    #[tokio::test]
    async fn test_read_empty() {
        let mut reader = RecordReader::new(&b""[..]);
        assert!(reader.is_exhausted().await.unwrap());
        assert_eq!(reader.read_record().await.unwrap(), None);
        assert_eq!(reader.num_read(), 0);
    }

    #[rstest]
    #[case::no_payload(vec![8], 0)]
    #[case::partial_payload(vec![8, 1, 2], 2)]
    #[case::long_code(vec![255, 1, 2, 3, 4, 5], 5)]
    #[tokio::test]
    async fn test_truncated_payload(#[case] input: Vec<u8>, #[case] expected_payload_len: usize) {
        let mut reader = RecordReader::new(input.as_slice());

        let record = reader.read_record().await.unwrap().unwrap();
        assert_eq!(record.length_code, input[0]);
        assert_eq!(record.payload.as_ref(), &input[1..]);
        assert_eq!(record.payload.len(), expected_payload_len);
        assert!(record.is_truncated());

        assert_eq!(reader.read_record().await.unwrap(), None);
    }

    #[test]
    fn test_ser() {
        let mut buf = BytesMut::new();
        Record::new(9, vec![1, 2, 3, 4]).ser(&mut buf);
        Record::new(0, Bytes::new()).ser(&mut buf);
        assert_eq!(buf.as_ref(), &[9, 1, 2, 3, 4, 0]);
    }

    #[test]
    fn test_framed_len() {
        let record = Record::new(255, vec![0; 96]);
        assert_eq!(record.framed_len(), 97);
        assert!(!record.is_truncated());
    }
}
