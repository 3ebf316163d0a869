use serde::{self, Deserializer, Serializer};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::status::{self, ViStatus};

#[derive(Serialize, Deserialize)]
struct AnyHowError {
    description: String,
    backtrace: String,
}

fn serialize_anyhow_error<S>(error: &Arc<anyhow::Error>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let to_serialize = AnyHowError {
        description: error.to_string(),
        backtrace: format!("{:?}", error.backtrace()),
    };
    to_serialize.serialize(serializer)
}

fn deserialize_anyhow_error<'de, D>(deserializer: D) -> std::result::Result<Arc<anyhow::Error>, D::Error>
where
    D: Deserializer<'de>,
{
    let ret = AnyHowError::deserialize(deserializer)?;
    let ret = anyhow::Error::msg(ret.description);
    Ok(Arc::new(ret))
}

/// A failed call into the instrument bus transport.
///
/// Carries the name of the failing operation, the raw status code and the
/// description the transport itself reports for that code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisaStatus {
    pub function: String,
    pub code: ViStatus,
    pub description: String,
}

impl VisaStatus {
    pub fn new<F: Into<String>, D: Into<String>>(function: F, code: ViStatus, description: D) -> Self {
        Self {
            function: function.into(),
            code,
            description: description.into(),
        }
    }
}

impl Display for VisaStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VISA error in {}: {} (Status: {})",
            self.function, self.description, self.code
        )
    }
}

/// Why a connection or command failed: either a transport status or a plain message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reason {
    Status(VisaStatus),
    Message(String),
}

impl Display for Reason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Status(status) => status.fmt(f),
            Reason::Message(msg) => f.write_str(msg),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Visa,
    Connection,
    Command,
    Timeout,
    Instrument,
    Argument,
    Internal,
}

/// Error taxonomy shared by the session, the command engine and the drivers.
///
/// `Visa` is the base kind. `Connection`, `Command`, `Timeout` and `Instrument`
/// refine it. `Argument` marks incorrect use of the engine and is never produced
/// from a transport status.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum Error {
    #[error("{0}")]
    Visa(VisaStatus),
    #[error("Connection Error: {0}")]
    Connection(Reason),
    #[error("Command Error: {0}")]
    Command(Reason),
    #[error("Timeout: {0}")]
    Timeout(VisaStatus),
    #[error("Instrument Error: {0}")]
    Instrument(String),
    #[error("Argument Error: {0}")]
    Argument(
        #[serde(
            serialize_with = "serialize_anyhow_error",
            deserialize_with = "deserialize_anyhow_error"
        )]
        Arc<anyhow::Error>,
    ),
    #[error("Internal Error: {0}")]
    Internal(
        #[serde(
            serialize_with = "serialize_anyhow_error",
            deserialize_with = "deserialize_anyhow_error"
        )]
        Arc<anyhow::Error>,
    ),
}

impl Error {
    /// Turn a failed transport status into its taxonomy member.
    pub fn from_status(status: VisaStatus) -> Self {
        match status::classify(status.code) {
            ErrorKind::Timeout => Error::Timeout(status),
            ErrorKind::Connection => Error::Connection(Reason::Status(status)),
            ErrorKind::Command => Error::Command(Reason::Status(status)),
            _ => Error::Visa(status),
        }
    }

    pub fn connection<T: Into<String>>(msg: T) -> Self {
        Error::Connection(Reason::Message(msg.into()))
    }

    pub fn command<T: Into<String>>(msg: T) -> Self {
        Error::Command(Reason::Message(msg.into()))
    }

    pub fn instrument<T: Into<String>>(msg: T) -> Self {
        Error::Instrument(msg.into())
    }

    pub fn argument<T: Into<anyhow::Error>>(err: T) -> Self {
        Error::Argument(Arc::new(err.into()))
    }

    pub fn internal<T: Into<anyhow::Error>>(err: T) -> Self {
        Error::Internal(Arc::new(err.into()))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Visa(_) => ErrorKind::Visa,
            Error::Connection(_) => ErrorKind::Connection,
            Error::Command(_) => ErrorKind::Command,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Instrument(_) => ErrorKind::Instrument,
            Error::Argument(_) => ErrorKind::Argument,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The transport status this error was raised from, if any.
    pub fn status(&self) -> Option<&VisaStatus> {
        match self {
            Error::Visa(status) | Error::Timeout(status) => Some(status),
            Error::Connection(Reason::Status(status)) | Error::Command(Reason::Status(status)) => Some(status),
            _ => None,
        }
    }

    pub fn should_retry(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
