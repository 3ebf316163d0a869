use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use log::{Level, LevelFilter};
use serde::{Deserialize, Serialize};

use crate::asynced::PendingQuery;
use crate::error::status_error;
use crate::logging::{LogCrateSink, LogSink, Logger};
use crate::transport::{Attribute, Transport, ViSession, ViStatus, VI_NULL};
use crate::{Error, Result};
use benchvisa_protocol::status::VI_ERROR_RSRC_NFOUND;

/// Size of the read buffer used when the caller does not pick one.
pub const DEFAULT_READ_LEN: usize = 2048;

pub const DEFAULT_FIND_PATTERN: &str = "?*INSTR";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadTermination {
    pub character: char,
    pub enabled: bool,
}

/// Settings that survive a disconnect and are applied again on every connect.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferedConfig {
    pub timeout_ms: Option<u32>,
    pub read_termination: Option<ReadTermination>,
    pub write_termination: Option<char>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    pub timeout_ms: Option<u32>,
    pub read_termination: Option<ReadTermination>,
    pub write_termination: Option<char>,
    pub log_level: LevelFilter,
    pub auto_error_check: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            read_termination: None,
            write_termination: None,
            log_level: LevelFilter::Warn,
            auto_error_check: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Link {
    rm: ViSession,
    instr: ViSession,
}

fn check_termination(character: char) -> Result<u8> {
    if character.is_ascii() {
        Ok(character as u8)
    } else {
        Err(Error::argument(anyhow!(
            "Termination character {:?} is not an ASCII character.",
            character
        )))
    }
}

fn terminate(data: &[u8], termination: Option<char>) -> Cow<'_, [u8]> {
    match termination {
        Some(x) if !data.ends_with(&[x as u8]) => {
            let mut ret = Vec::with_capacity(data.len() + 1);
            ret.extend_from_slice(data);
            ret.push(x as u8);
            Cow::Owned(ret)
        }
        _ => Cow::Borrowed(data),
    }
}

/// Everything an I/O operation needs, detached from the session so it can be
/// moved onto a worker thread.
pub(crate) struct Io {
    transport: Arc<dyn Transport>,
    link: Link,
    write_termination: Option<char>,
    logger: Logger,
}

impl Io {
    fn fail(&self, function: &str, code: ViStatus) -> Error {
        status_error(&*self.transport, self.link.instr, &self.logger, function, code)
    }

    pub(crate) fn write(&self, data: &[u8]) -> Result<()> {
        let data = terminate(data, self.write_termination);
        self.logger.log(
            Level::Debug,
            format_args!("Writing command: {:?}", String::from_utf8_lossy(&data)),
        );
        self.transport
            .write(self.link.instr, &data)
            .map_err(|code| self.fail("viWrite", code))?;
        Ok(())
    }

    pub(crate) fn read(&self, max_len: usize) -> Result<Vec<u8>> {
        self.logger
            .log(Level::Debug, format_args!("Reading data (buffer size: {})", max_len));
        let ret = self
            .transport
            .read(self.link.instr, max_len)
            .map_err(|code| self.fail("viRead", code))?;
        self.logger.log(
            Level::Debug,
            format_args!("Read: {:?}", String::from_utf8_lossy(&ret)),
        );
        Ok(ret)
    }

    pub(crate) fn query(&self, data: &[u8], max_len: usize, delay_ms: u32) -> Result<Vec<u8>> {
        self.write(data)?;
        if delay_ms > 0 {
            thread::sleep(Duration::from_millis(delay_ms as u64));
        }
        self.read(max_len)
    }
}

/// One connection to one instrument.
///
/// A session starts disconnected. Configuration may be changed at any time and
/// is replayed on every [`Session::connect`]. Dropping a session disconnects it.
pub struct Session {
    transport: Arc<dyn Transport>,
    resource: String,
    config: BufferedConfig,
    link: Option<Link>,
    pub(crate) logger: Logger,
    auto_error_check: bool,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_sink(transport, Arc::new(LogCrateSink))
    }

    pub fn with_sink(transport: Arc<dyn Transport>, sink: Arc<dyn LogSink>) -> Self {
        let ret = Session {
            transport,
            resource: String::new(),
            config: BufferedConfig::default(),
            link: None,
            logger: Logger::new(sink),
            auto_error_check: false,
        };
        ret.logger.log(Level::Debug, "Session created.");
        ret
    }

    /// Create a session for `resource` and connect right away.
    pub fn open<T: Into<String>>(transport: Arc<dyn Transport>, resource: T) -> Result<Self> {
        Self::open_with(transport, resource, &SessionOptions::default())
    }

    pub fn open_with<T: Into<String>>(
        transport: Arc<dyn Transport>,
        resource: T,
        options: &SessionOptions,
    ) -> Result<Self> {
        let mut ret = Self::new(transport);
        ret.set_resource(resource)?;
        ret.configure(options)?;
        ret.connect()?;
        Ok(ret)
    }

    /// A disconnected session on the system VISA library.
    pub fn system() -> Result<Self> {
        let transport: Arc<dyn Transport> = crate::transport::visa::system()?;
        Ok(Self::new(transport))
    }

    fn status_error(&self, handle: ViSession, function: &str, code: ViStatus) -> Error {
        status_error(&*self.transport, handle, &self.logger, function, code)
    }

    pub fn set_resource<T: Into<String>>(&mut self, resource: T) -> Result<()> {
        if self.is_connected() {
            self.logger
                .log(Level::Error, "Attempted to set resource while already connected.");
            return Err(Error::connection("Cannot set resource while connected."));
        }
        self.resource = resource.into();
        self.logger.source = self.resource.clone();
        self.logger
            .log(Level::Info, format_args!("Setting resource to: {}", self.resource));
        Ok(())
    }

    pub fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            self.logger.log(Level::Info, "Connect called but already connected.");
            return Ok(());
        }
        if self.resource.is_empty() {
            self.logger
                .log(Level::Error, "Connection failed: resource name is empty.");
            return Err(Error::connection("Cannot connect: VISA resource name is not set."));
        }
        self.logger.log(Level::Info, "Attempting to connect...");
        let rm = self
            .transport
            .open_default_rm()
            .map_err(|code| self.status_error(VI_NULL, "viOpenDefaultRM", code))?;
        let instr = match self.transport.open(rm, &self.resource) {
            Ok(instr) => instr,
            Err(code) => {
                let err = self.status_error(rm, "viOpen", code);
                let _ = self.transport.close(rm);
                return Err(err);
            }
        };
        self.link = Some(Link { rm, instr });
        self.logger
            .log(Level::Info, format_args!("Successfully connected to {}", self.resource));
        self.apply_configuration()
    }

    fn set_attribute(&self, attr: Attribute, value: u64) -> Result<()> {
        let link = match self.link {
            Some(link) => link,
            None => return Ok(()),
        };
        self.logger
            .log(Level::Debug, format_args!("Setting {:?} to {}", attr, value));
        self.transport
            .set_attribute(link.instr, attr, value)
            .map_err(|code| self.status_error(link.instr, "viSetAttribute", code))
    }

    fn apply_timeout(&self, timeout_ms: u32) -> Result<()> {
        self.set_attribute(Attribute::TimeoutValue, timeout_ms as u64)
    }

    fn apply_read_termination(&self, termination: ReadTermination) -> Result<()> {
        self.set_attribute(Attribute::TermChar, termination.character as u64)?;
        self.set_attribute(Attribute::TermCharEnabled, termination.enabled as u64)
    }

    fn apply_write_termination(&self) -> Result<()> {
        self.set_attribute(Attribute::SendEndEnabled, 1)
    }

    fn apply_configuration(&self) -> Result<()> {
        if let Some(timeout_ms) = self.config.timeout_ms {
            self.apply_timeout(timeout_ms)?;
        }
        if let Some(termination) = self.config.read_termination {
            self.apply_read_termination(termination)?;
        }
        if self.config.write_termination.is_some() {
            self.apply_write_termination()?;
        }
        Ok(())
    }

    /// Close the instrument and the resource manager. Close failures are only logged.
    pub fn disconnect(&mut self) {
        let link = match self.link.take() {
            Some(link) => link,
            None => return,
        };
        self.logger
            .log(Level::Info, format_args!("Disconnecting from {}", self.resource));
        if let Err(code) = self.transport.close(link.instr) {
            self.logger
                .log(Level::Warn, format_args!("Closing instrument handle failed: {}", code));
        }
        if let Err(code) = self.transport.close(link.rm) {
            self.logger.log(
                Level::Warn,
                format_args!("Closing resource manager handle failed: {}", code),
            );
        }
        self.logger.log(Level::Info, "Disconnection complete.");
    }

    pub fn set_timeout(&mut self, timeout_ms: u32) -> Result<()> {
        self.config.timeout_ms = Some(timeout_ms);
        self.apply_timeout(timeout_ms)
    }

    pub fn set_read_termination(&mut self, character: char, enabled: bool) -> Result<()> {
        check_termination(character)?;
        let termination = ReadTermination { character, enabled };
        self.config.read_termination = Some(termination);
        self.apply_read_termination(termination)
    }

    /// Terminate every outgoing message with `character` and assert END with the last byte.
    pub fn set_write_termination(&mut self, character: char) -> Result<()> {
        check_termination(character)?;
        self.config.write_termination = Some(character);
        self.apply_write_termination()
    }

    pub fn set_verbose(&mut self, level: LevelFilter) {
        self.logger.threshold = level;
    }

    pub fn enable_auto_error_check(&mut self, enable: bool) {
        self.auto_error_check = enable;
    }

    pub fn configure(&mut self, options: &SessionOptions) -> Result<()> {
        self.set_verbose(options.log_level);
        self.enable_auto_error_check(options.auto_error_check);
        if let Some(timeout_ms) = options.timeout_ms {
            self.set_timeout(timeout_ms)?;
        }
        if let Some(termination) = options.read_termination {
            self.set_read_termination(termination.character, termination.enabled)?;
        }
        if let Some(character) = options.write_termination {
            self.set_write_termination(character)?;
        }
        Ok(())
    }

    pub(crate) fn io(&self, op: &str) -> Result<Io> {
        let link = self
            .link
            .ok_or_else(|| Error::connection(format!("Not connected to an instrument. Cannot {}.", op)))?;
        Ok(Io {
            transport: self.transport.clone(),
            link,
            write_termination: self.config.write_termination,
            logger: self.logger.clone(),
        })
    }

    pub fn write<T: AsRef<[u8]>>(&self, data: T) -> Result<()> {
        self.io("write")?.write(data.as_ref())
    }

    pub fn read(&self, max_len: usize) -> Result<Vec<u8>> {
        self.io("read")?.read(max_len)
    }

    pub fn read_string(&self, max_len: usize) -> Result<String> {
        let data = self.read(max_len)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Write `data`, wait `delay_ms` and read back at most `max_len` bytes.
    pub fn query<T: AsRef<[u8]>>(&self, data: T, max_len: usize, delay_ms: u32) -> Result<Vec<u8>> {
        self.io("query")?.query(data.as_ref(), max_len, delay_ms)
    }

    pub fn query_string(&self, command: &str) -> Result<String> {
        let data = self.query(command, DEFAULT_READ_LEN, 0)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Run [`Session::query`] on a worker thread.
    ///
    /// The session must not be used for other I/O until the returned handle
    /// resolved, otherwise bytes of both exchanges may interleave. The handle
    /// does not keep the connection alive: do not drop, disconnect or
    /// [`Session::take`] the session before it resolved, the worker would
    /// talk through closed handles.
    pub fn query_async<T: Into<Vec<u8>>>(&self, data: T, max_len: usize, delay_ms: u32) -> PendingQuery<Vec<u8>> {
        let io = match self.io("query") {
            Ok(io) => io,
            Err(err) => return PendingQuery::ready(Err(err)),
        };
        let data = data.into();
        PendingQuery::spawn(move || io.query(&data, max_len, delay_ms))
    }

    /// Device clear on the bus.
    pub fn clear(&self) -> Result<()> {
        let io = self.io("clear")?;
        self.transport
            .clear(io.link.instr)
            .map_err(|code| io.fail("viClear", code))
    }

    /// Serial poll.
    pub fn read_status_byte(&self) -> Result<u8> {
        let io = self.io("read the status byte")?;
        let stb = self
            .transport
            .read_stb(io.link.instr)
            .map_err(|code| io.fail("viReadSTB", code))?;
        Ok((stb & 0xFF) as u8)
    }

    /// List the resources matching `pattern` with a private resource manager.
    pub fn find_resources(transport: &dyn Transport, pattern: &str) -> Result<Vec<String>> {
        let logger = Logger::new(Arc::new(LogCrateSink));
        let rm = transport
            .open_default_rm()
            .map_err(|code| status_error(transport, VI_NULL, &logger, "viOpenDefaultRM", code))?;
        let ret = match transport.find_resources(rm, pattern) {
            Ok(found) => Ok(found),
            Err(VI_ERROR_RSRC_NFOUND) => Ok(Vec::new()),
            Err(code) => Err(status_error(transport, rm, &logger, "viFindRsrc", code)),
        };
        let _ = transport.close(rm);
        ret
    }

    /// Move the connection and its configuration into a new session.
    ///
    /// `self` is left disconnected with no resource and default configuration.
    pub fn take(&mut self) -> Session {
        let mut logger = self.logger.clone();
        logger.source = String::new();
        let fresh = Session {
            transport: self.transport.clone(),
            resource: String::new(),
            config: BufferedConfig::default(),
            link: None,
            logger,
            auto_error_check: false,
        };
        std::mem::replace(self, fresh)
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    pub fn state(&self) -> ConnectionState {
        if self.is_connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn config(&self) -> &BufferedConfig {
        &self.config
    }

    pub fn log_level(&self) -> LevelFilter {
        self.logger.threshold
    }

    pub fn auto_error_check(&self) -> bool {
        self.auto_error_check
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("resource", &self.resource)
            .field("state", &self.state())
            .field("config", &self.config)
            .field("log_level", &self.logger.threshold)
            .field("auto_error_check", &self.auto_error_check)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use crate::transport::mock::{MockTransport, Operation};
    use crate::ErrorKind;
    use benchvisa_protocol::status::{VI_ERROR_IO, VI_ERROR_NSUP_ATTR, VI_ERROR_RSRC_LOCKED, VI_ERROR_TMO};

    const RESOURCE: &str = "TCPIP0::192.168.1.10::INSTR";

    fn session() -> (MockTransport, Session) {
        let mock = MockTransport::new();
        let session = Session::new(Arc::new(mock.clone()));
        (mock, session)
    }

    #[test]
    fn connect_requires_resource() {
        let (mock, mut session) = session();
        let err = session.connect().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert!(mock.opened().is_empty());
    }

    #[test]
    fn resource_is_fixed_while_connected() {
        let (_mock, mut session) = session();
        session.set_resource(RESOURCE).unwrap();
        session.connect().unwrap();
        let err = session.set_resource("GPIB0::1::INSTR").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(session.resource(), RESOURCE);
    }

    #[test]
    fn connect_twice_is_noop() {
        let (mock, mut session) = session();
        session.set_resource(RESOURCE).unwrap();
        session.connect().unwrap();
        session.connect().unwrap();
        assert_eq!(mock.opened(), vec![RESOURCE.to_string()]);
    }

    #[test]
    fn disconnect_is_idempotent() {
        let (mock, mut session) = session();
        session.set_resource(RESOURCE).unwrap();
        session.connect().unwrap();
        session.disconnect();
        session.disconnect();
        assert!(!session.is_connected());
        // instrument first, then resource manager
        assert_eq!(mock.closed(), vec![2, 1]);
        assert_eq!(mock.live_handles(), 0);
    }

    #[test]
    fn close_failures_are_swallowed() {
        let (mock, mut session) = session();
        session.set_resource(RESOURCE).unwrap();
        session.connect().unwrap();
        mock.fail(Operation::Close, VI_ERROR_IO);
        session.disconnect();
        assert!(!session.is_connected());
        assert_eq!(mock.closed().len(), 2);
    }

    #[test]
    fn deferred_configuration_matches_live() {
        let (deferred, mut session) = session();
        session.set_resource(RESOURCE).unwrap();
        session.set_timeout(5000).unwrap();
        session.set_read_termination('\n', true).unwrap();
        assert!(deferred.attributes().is_empty());
        session.connect().unwrap();

        let (live, mut other) = self::session();
        other.set_resource(RESOURCE).unwrap();
        other.connect().unwrap();
        other.set_timeout(5000).unwrap();
        other.set_read_termination('\n', true).unwrap();

        assert_eq!(deferred.attributes(), live.attributes());
        assert_eq!(
            deferred.attributes(),
            vec![
                (Attribute::TimeoutValue, 5000),
                (Attribute::TermChar, b'\n' as u64),
                (Attribute::TermCharEnabled, 1),
            ]
        );
        assert_eq!(session.config(), other.config());
    }

    #[test]
    fn configuration_is_replayed_on_reconnect() {
        let (mock, mut session) = session();
        session.set_resource(RESOURCE).unwrap();
        session.connect().unwrap();
        session.set_timeout(2000).unwrap();
        session.set_write_termination('\n').unwrap();
        session.disconnect();
        session.connect().unwrap();
        let attributes = mock.attributes();
        assert_eq!(attributes.len(), 4);
        assert_eq!(attributes[..2], attributes[2..]);
    }

    #[test]
    fn open_failure_releases_resource_manager() {
        let (mock, mut session) = session();
        session.set_resource(RESOURCE).unwrap();
        mock.fail(Operation::Open, VI_ERROR_RSRC_LOCKED);
        let err = session.connect().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(err.status().map(|x| x.function.as_str()), Some("viOpen"));
        assert!(!session.is_connected());
        assert_eq!(mock.closed(), vec![1]);
        assert_eq!(mock.live_handles(), 0);
    }

    #[test]
    fn configuration_failure_leaves_session_connected() {
        let (mock, mut session) = session();
        session.set_resource(RESOURCE).unwrap();
        session.set_timeout(1000).unwrap();
        mock.fail(Operation::SetAttribute, VI_ERROR_NSUP_ATTR);
        let err = session.connect().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Visa);
        assert!(session.is_connected());
    }

    #[test]
    fn io_requires_connection() {
        let (_mock, session) = session();
        assert_eq!(session.write("*RST").unwrap_err().kind(), ErrorKind::Connection);
        assert_eq!(session.read(16).unwrap_err().kind(), ErrorKind::Connection);
        assert_eq!(session.query("*IDN?", 16, 0).unwrap_err().kind(), ErrorKind::Connection);
        assert_eq!(session.clear().unwrap_err().kind(), ErrorKind::Connection);
    }

    #[test]
    fn write_termination_is_appended_once() {
        let (mock, mut session) = session();
        session.set_resource(RESOURCE).unwrap();
        session.set_write_termination('\n').unwrap();
        session.connect().unwrap();
        session.write("*RST").unwrap();
        session.write("*CLS\n").unwrap();
        assert_eq!(mock.writes(), vec!["*RST\n".to_string(), "*CLS\n".to_string()]);
        assert_eq!(mock.attributes(), vec![(Attribute::SendEndEnabled, 1)]);
    }

    #[test]
    fn non_ascii_termination_is_rejected() {
        let (_mock, mut session) = session();
        let err = session.set_read_termination('µ', true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
        assert!(session.config().read_termination.is_none());
    }

    #[test]
    fn query_reads_reply() {
        let (mock, mut session) = session();
        mock.reply("MEAS:VOLT?", "+5.000E+00\n");
        session.set_resource(RESOURCE).unwrap();
        session.connect().unwrap();
        let ret = session.query("MEAS:VOLT?", DEFAULT_READ_LEN, 5).unwrap();
        assert_eq!(ret, b"+5.000E+00\n".to_vec());
    }

    #[test]
    fn read_timeout_maps_to_timeout() {
        let (_mock, mut session) = session();
        session.set_resource(RESOURCE).unwrap();
        session.connect().unwrap();
        let err = session.read(DEFAULT_READ_LEN).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.should_retry());
        assert!(err.to_string().contains("viRead"));
        assert!(err.to_string().contains(&VI_ERROR_TMO.to_string()));
    }

    #[tokio::test]
    async fn query_async_resolves() {
        let (mock, mut session) = session();
        mock.reply("*IDN?", "ACME,PSU,42,1.0\n");
        session.set_resource(RESOURCE).unwrap();
        session.connect().unwrap();
        let ret = session.query_async("*IDN?", DEFAULT_READ_LEN, 0).await.unwrap();
        assert_eq!(ret, b"ACME,PSU,42,1.0\n".to_vec());
    }

    #[test]
    fn query_async_resolves_before_disconnect() {
        let (mock, mut session) = session();
        mock.reply("*IDN?", "ACME\n");
        session.set_resource(RESOURCE).unwrap();
        session.connect().unwrap();
        let pending = session.query_async("*IDN?", DEFAULT_READ_LEN, 20);
        assert_eq!(pending.wait().unwrap(), b"ACME\n".to_vec());
        assert_eq!(mock.live_handles(), 2);
        session.disconnect();
        assert_eq!(mock.live_handles(), 0);
        assert_eq!(mock.writes(), vec!["*IDN?"]);
    }

    #[test]
    fn query_async_while_disconnected() {
        let (_mock, session) = session();
        let err = session.query_async("*IDN?", DEFAULT_READ_LEN, 0).wait().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[test]
    fn take_transfers_handles() {
        let (mock, mut source) = session();
        source.set_resource(RESOURCE).unwrap();
        source.set_timeout(3000).unwrap();
        source.connect().unwrap();

        let target = source.take();
        assert!(!source.is_connected());
        assert!(source.resource().is_empty());
        assert_eq!(source.config(), &BufferedConfig::default());
        assert!(target.is_connected());
        assert_eq!(target.config().timeout_ms, Some(3000));

        drop(source);
        assert!(mock.closed().is_empty());
        drop(target);
        assert_eq!(mock.closed(), vec![2, 1]);
    }

    #[test]
    fn drop_disconnects() {
        let mock = MockTransport::new();
        {
            let _session = Session::open(Arc::new(mock.clone()), RESOURCE).unwrap();
            assert_eq!(mock.live_handles(), 2);
        }
        assert_eq!(mock.live_handles(), 0);
    }

    #[test]
    fn find_resources_lists_or_returns_empty() {
        let mock = MockTransport::new();
        assert!(Session::find_resources(&mock, DEFAULT_FIND_PATTERN).unwrap().is_empty());
        mock.set_resources(vec!["GPIB0::5::INSTR", "USB0::1::2::3::INSTR"]);
        let found = Session::find_resources(&mock, DEFAULT_FIND_PATTERN).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(mock.live_handles(), 0);
    }

    #[test]
    fn status_byte_and_clear() {
        let (mock, mut session) = session();
        session.set_resource(RESOURCE).unwrap();
        session.connect().unwrap();
        mock.set_status_byte(0x0150);
        assert_eq!(session.read_status_byte().unwrap(), 0x50);
        session.clear().unwrap();
        assert_eq!(mock.clears(), 1);
    }

    #[test]
    fn options_from_json() {
        let options: SessionOptions =
            serde_json::from_str(r#"{"timeout_ms": 2500, "log_level": "DEBUG", "auto_error_check": true}"#).unwrap();
        let (mock, mut session) = session();
        session.set_resource(RESOURCE).unwrap();
        session.configure(&options).unwrap();
        session.connect().unwrap();
        assert_eq!(session.log_level(), LevelFilter::Debug);
        assert!(session.auto_error_check());
        assert_eq!(mock.attributes(), vec![(Attribute::TimeoutValue, 2500)]);
    }

    #[test]
    fn verbose_session_logs_traffic() {
        let mock = MockTransport::new();
        let sink = MemorySink::new();
        let mut session = Session::with_sink(Arc::new(mock), Arc::new(sink.clone()));
        session.set_verbose(LevelFilter::Debug);
        session.set_resource(RESOURCE).unwrap();
        session.connect().unwrap();
        session.write("*CLS").unwrap();
        assert!(sink.contains(Level::Debug, "*CLS"));
        assert!(sink.records().iter().all(|x| x.source == RESOURCE));
    }
}
