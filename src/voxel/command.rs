use num_enum::{IntoPrimitive, TryFromPrimitive};
use tracing::warn;

/// The command tag in the first byte of every voxel datagram. The receiver decides what
///  'insert' and 'replace' mean for its voxel tree; the sender only transports the tag.
#[repr(u8)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive, IntoPrimitive)]
pub enum Command {
    Insert = 0x49, // 'I'
    Replace = 0x52, // 'R'
}

impl Command {
    /// Normalizes a user supplied command code: anything other than 'I' or 'R' falls back to
    ///  [Command::Insert].
    pub fn from_code(code: &str) -> Command {
        let mut chars = code.chars();
        match (chars.next(), chars.next()) {
            (Some('I'), None) => Command::Insert,
            (Some('R'), None) => Command::Replace,
            (None, _) => Command::Insert,
            _ => {
                warn!("unrecognized command code {:?} - falling back to insert", code);
                Command::Insert
            }
        }
    }

    pub fn code(self) -> u8 {
        self.into()
    }
}
