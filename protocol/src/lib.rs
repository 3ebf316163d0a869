//! Value types shared between the session engine and instrument drivers:
//! command specifications, coerced responses, status codes and the error
//! taxonomy.

pub use command::{CommandKind, CommandSpec, ResponseShape, Value};
pub use error::{Error, ErrorKind, Reason, Result, VisaStatus};

pub mod command;
pub mod error;
pub mod status;
