pub mod command;
pub mod datagram;
pub mod record;
