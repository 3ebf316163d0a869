//! Session and command engine for SCPI instruments on a VISA bus.
//!
//! A [`Session`] owns the connection to one instrument. Commands are described
//! declaratively with [`CommandSpec`] and run through the engine methods on
//! `Session` (`execute`, `query_and_parse`, `execute_command_chain`, ...).

#![allow(non_snake_case)]

#[macro_use]
extern crate dlopen_derive;
#[macro_use]
extern crate lazy_static;

pub use benchvisa_protocol::{
    CommandKind, CommandSpec, Error, ErrorKind, Reason, ResponseShape, Result, Value, VisaStatus,
};

pub use asynced::PendingQuery;
pub use logging::{LogCrateSink, LogSink, MemorySink};
pub use parse::FromResponse;
pub use session::{BufferedConfig, ConnectionState, ReadTermination, Session, SessionOptions};

pub mod asynced;
pub mod common;
pub mod drivers;
mod engine;
mod error;
pub mod format;
pub mod logging;
pub mod parse;
pub mod session;
pub mod transport;

pub use engine::CHAIN_DELIMITER;
