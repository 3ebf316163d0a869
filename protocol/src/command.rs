use std::borrow::Cow;
use std::convert::TryFrom;
use std::fmt::{self, Display, Formatter};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    /// Send only, nothing is read back.
    Write,
    /// Send, then read a response.
    Query,
}

/// How the raw response of a query is coerced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseShape {
    None,
    Text,
    Real,
    Integer,
    Boolean,
}

impl Default for ResponseShape {
    fn default() -> Self {
        ResponseShape::None
    }
}

/// Declarative description of one instrument command.
///
/// Templates use `{}` placeholders for positional arguments, `{{` and `}}` for
/// literal braces. A write never declares a response shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCommandSpec")]
pub struct CommandSpec {
    pub template: Cow<'static, str>,
    pub kind: CommandKind,
    pub response: ResponseShape,
    /// Settle time between writing the command and reading the response.
    pub delay_ms: u32,
    pub description: Cow<'static, str>,
}

impl CommandSpec {
    pub const fn write(template: &'static str, description: &'static str) -> Self {
        Self {
            template: Cow::Borrowed(template),
            kind: CommandKind::Write,
            response: ResponseShape::None,
            delay_ms: 0,
            description: Cow::Borrowed(description),
        }
    }

    pub const fn query(template: &'static str, response: ResponseShape, description: &'static str) -> Self {
        Self::query_delayed(template, response, 0, description)
    }

    pub const fn query_delayed(
        template: &'static str,
        response: ResponseShape,
        delay_ms: u32,
        description: &'static str,
    ) -> Self {
        Self {
            template: Cow::Borrowed(template),
            kind: CommandKind::Query,
            response,
            delay_ms,
            description: Cow::Borrowed(description),
        }
    }

    pub fn new<T, D>(template: T, kind: CommandKind, response: ResponseShape, delay_ms: u32, description: D) -> Result<Self>
    where
        T: Into<Cow<'static, str>>,
        D: Into<Cow<'static, str>>,
    {
        let template = template.into();
        if kind == CommandKind::Write && response != ResponseShape::None {
            return Err(Error::argument(anyhow!(
                "Write command `{}` cannot declare a {:?} response.",
                template,
                response
            )));
        }
        Ok(Self {
            template,
            kind,
            response,
            delay_ms,
            description: description.into(),
        })
    }

    pub fn is_query(&self) -> bool {
        self.kind == CommandKind::Query
    }
}

impl Display for CommandSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

#[derive(Deserialize)]
struct RawCommandSpec {
    template: String,
    kind: CommandKind,
    #[serde(default)]
    response: ResponseShape,
    #[serde(default)]
    delay_ms: u32,
    #[serde(default)]
    description: String,
}

impl TryFrom<RawCommandSpec> for CommandSpec {
    type Error = Error;

    fn try_from(raw: RawCommandSpec) -> Result<Self> {
        CommandSpec::new(raw.template, raw.kind, raw.response, raw.delay_ms, raw.description)
    }
}

/// A coerced instrument response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    None,
    Text(String),
    Real(f64),
    Integer(i64),
    Boolean(bool),
}

impl Value {
    pub fn shape(&self) -> ResponseShape {
        match self {
            Value::None => ResponseShape::None,
            Value::Text(_) => ResponseShape::Text,
            Value::Real(_) => ResponseShape::Real,
            Value::Integer(_) => ResponseShape::Integer,
            Value::Boolean(_) => ResponseShape::Boolean,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(x) => Some(*x),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => Ok(()),
            Value::Text(x) => f.write_str(x),
            Value::Real(x) => write!(f, "{}", x),
            Value::Integer(x) => write!(f, "{}", x),
            Value::Boolean(x) => f.write_str(if *x { "1" } else { "0" }),
        }
    }
}
