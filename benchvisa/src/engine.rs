//! Turning [`CommandSpec`]s into traffic on a [`Session`].

use std::fmt::Display;

use anyhow::anyhow;
use log::Level;

use crate::asynced::PendingQuery;
use crate::common::commands::SYSTEM_ERROR;
use crate::format::{format_command, placeholder_count};
use crate::parse::{parse_as, parse_response, trim_line_ending, FromResponse};
use crate::session::{Io, DEFAULT_READ_LEN};
use crate::{CommandKind, CommandSpec, Error, Result, Session, Value};

pub const CHAIN_DELIMITER: &str = ";";

fn lossy(data: Vec<u8>) -> String {
    match String::from_utf8(data) {
        Ok(x) => x,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}

/// Whether a reply of the device error queue reports a fault.
///
/// The first comma separated token is the error number, `0` means empty queue.
fn is_device_error(reply: &str) -> bool {
    let code = reply.split(',').next().unwrap_or("").trim();
    !matches!(code.parse::<i64>(), Ok(0))
}

impl Session {
    /// Format `spec` with `args` and run it.
    ///
    /// Writes return an empty string, queries their raw response.
    pub fn execute(&self, spec: &CommandSpec, args: &[&dyn Display]) -> Result<String> {
        let command = format_command(&spec.template, args)?;
        self.logger
            .log(Level::Info, format_args!("Executing command: {}", command));
        let io = self.io("execute a command")?;
        let ret = match spec.kind {
            CommandKind::Write => {
                io.write(command.as_bytes())?;
                String::new()
            }
            CommandKind::Query => lossy(io.query(command.as_bytes(), DEFAULT_READ_LEN, spec.delay_ms)?),
        };
        if self.auto_error_check() {
            check_error_queue(&io)?;
        }
        Ok(ret)
    }

    /// Run a query on a worker thread.
    ///
    /// Fails right away if `spec` is a write. The device error queue is not
    /// checked for asynchronous queries.
    pub fn execute_async(&self, spec: &CommandSpec, args: &[&dyn Display]) -> Result<PendingQuery<String>> {
        if !spec.is_query() {
            return Err(Error::argument(anyhow!(
                "`{}` is a write command and cannot be executed asynchronously.",
                spec.template
            )));
        }
        let command = format_command(&spec.template, args)?;
        self.logger
            .log(Level::Info, format_args!("Executing command asynchronously: {}", command));
        let io = self.io("execute a command")?;
        let delay_ms = spec.delay_ms;
        Ok(PendingQuery::spawn(move || {
            io.query(command.as_bytes(), DEFAULT_READ_LEN, delay_ms).map(lossy)
        }))
    }

    pub fn query_and_parse<T: FromResponse>(&self, spec: &CommandSpec, args: &[&dyn Display]) -> Result<T> {
        let response = self.execute(spec, args)?;
        parse_as(&response)
    }

    /// Run `spec` and coerce the response by its declared shape.
    pub fn query_value(&self, spec: &CommandSpec, args: &[&dyn Display]) -> Result<Value> {
        let response = self.execute(spec, args)?;
        if spec.is_query() {
            parse_response(spec.response, &response)
        } else {
            Ok(Value::None)
        }
    }

    pub fn execute_command_chain(&self, specs: &[&CommandSpec]) -> Result<()> {
        self.execute_command_chain_with(specs, CHAIN_DELIMITER)
    }

    /// Send several argument-less writes as a single message.
    ///
    /// An empty chain sends nothing.
    pub fn execute_command_chain_with(&self, specs: &[&CommandSpec], delimiter: &str) -> Result<()> {
        if specs.is_empty() {
            return Ok(());
        }
        for spec in specs {
            if spec.is_query() {
                return Err(Error::argument(anyhow!(
                    "Command chain contains the query `{}`.",
                    spec.template
                )));
            }
            if placeholder_count(&spec.template)? > 0 {
                return Err(Error::argument(anyhow!(
                    "Command chain contains `{}` which takes arguments.",
                    spec.template
                )));
            }
        }
        let command = specs
            .iter()
            .map(|x| format_command(&x.template, &[]))
            .collect::<Result<Vec<_>>>()?
            .join(delimiter);
        self.logger
            .log(Level::Info, format_args!("Executing command chain: {}", command));
        let io = self.io("execute a command chain")?;
        io.write(command.as_bytes())?;
        if self.auto_error_check() {
            check_error_queue(&io)?;
        }
        Ok(())
    }
}

fn check_error_queue(io: &Io) -> Result<()> {
    let reply = lossy(io.query(SYSTEM_ERROR.template.as_bytes(), DEFAULT_READ_LEN, 0)?);
    let reply = trim_line_ending(&reply).trim();
    if is_device_error(reply) {
        return Err(Error::instrument(reply));
    }
    Ok(())
}
