//! The instrument bus transport as seen by a [`Session`](crate::Session).
//!
//! Implementations move bytes and report raw VISA status codes. Turning those
//! codes into [`Error`](crate::Error) values is the session's job.

pub use benchvisa_protocol::status::ViStatus;

pub mod mock;
pub mod visa;

pub type ViSession = u32;

pub const VI_NULL: ViSession = 0;

/// A failed transport call yields the raw (negative) status code.
pub type RawResult<T> = std::result::Result<T, ViStatus>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    TimeoutValue,
    TermChar,
    TermCharEnabled,
    SendEndEnabled,
}

impl Attribute {
    pub fn code(self) -> u32 {
        match self {
            Attribute::TimeoutValue => 0x3FFF001A,
            Attribute::TermChar => 0x3FFF0018,
            Attribute::TermCharEnabled => 0x3FFF0038,
            Attribute::SendEndEnabled => 0x3FFF0016,
        }
    }
}

pub trait Transport: Send + Sync {
    fn open_default_rm(&self) -> RawResult<ViSession>;

    fn open(&self, rm: ViSession, resource: &str) -> RawResult<ViSession>;

    fn close(&self, handle: ViSession) -> RawResult<()>;

    /// Returns the number of bytes actually written.
    fn write(&self, instr: ViSession, data: &[u8]) -> RawResult<usize>;

    fn read(&self, instr: ViSession, max_len: usize) -> RawResult<Vec<u8>>;

    fn set_attribute(&self, instr: ViSession, attr: Attribute, value: u64) -> RawResult<()>;

    /// Human readable text for a status code. Never fails.
    fn status_desc(&self, handle: ViSession, status: ViStatus) -> String;

    fn find_resources(&self, rm: ViSession, pattern: &str) -> RawResult<Vec<String>>;

    /// Bus level device clear.
    fn clear(&self, instr: ViSession) -> RawResult<()>;

    /// Serial poll.
    fn read_stb(&self, instr: ViSession) -> RawResult<u16>;
}
