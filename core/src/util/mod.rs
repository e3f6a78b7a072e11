mod paths;
mod ring_bytes;
mod time;

pub use paths::absolutize;
pub use ring_bytes::RingBytes;
pub use time::format_duration;
