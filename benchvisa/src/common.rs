//! The IEEE 488.2 common commands every SCPI instrument understands.

use crate::parse::trim_line_ending;
use crate::{Result, Session};

pub mod commands {
    use crate::{CommandSpec, ResponseShape};

    pub const IDENTIFY: CommandSpec = CommandSpec::query("*IDN?", ResponseShape::Text, "Identification query.");
    pub const RESET: CommandSpec = CommandSpec::write("*RST", "Reset the instrument.");
    pub const CLEAR_STATUS: CommandSpec = CommandSpec::write("*CLS", "Clear status registers and error queue.");
    pub const WAIT: CommandSpec = CommandSpec::write("*WAI", "Wait until pending operations complete.");
    pub const OPERATION_COMPLETE: CommandSpec =
        CommandSpec::query("*OPC?", ResponseShape::Boolean, "Operation complete query.");
    pub const SELF_TEST: CommandSpec = CommandSpec::query("*TST?", ResponseShape::Integer, "Run the self-test.");
    pub const STATUS_BYTE: CommandSpec = CommandSpec::query("*STB?", ResponseShape::Integer, "Read the status byte.");
    pub const EVENT_STATUS_REGISTER: CommandSpec =
        CommandSpec::query("*ESR?", ResponseShape::Integer, "Read the standard event status register.");
    pub const SET_EVENT_STATUS_ENABLE: CommandSpec =
        CommandSpec::write("*ESE {}", "Set the standard event status enable mask.");
    pub const EVENT_STATUS_ENABLE: CommandSpec =
        CommandSpec::query("*ESE?", ResponseShape::Integer, "Read the standard event status enable mask.");
    pub const SET_SERVICE_REQUEST_ENABLE: CommandSpec =
        CommandSpec::write("*SRE {}", "Set the service request enable mask.");
    pub const SERVICE_REQUEST_ENABLE: CommandSpec =
        CommandSpec::query("*SRE?", ResponseShape::Integer, "Read the service request enable mask.");
    pub const SYSTEM_ERROR: CommandSpec =
        CommandSpec::query("SYST:ERR?", ResponseShape::Text, "Pop one entry of the device error queue.");
}

impl Session {
    pub fn identify(&self) -> Result<String> {
        let ret = self.execute(&commands::IDENTIFY, &[])?;
        Ok(trim_line_ending(&ret).trim().to_string())
    }

    pub fn reset(&self) -> Result<()> {
        self.execute(&commands::RESET, &[]).map(|_| ())
    }

    pub fn clear_status(&self) -> Result<()> {
        self.execute(&commands::CLEAR_STATUS, &[]).map(|_| ())
    }

    pub fn wait_to_continue(&self) -> Result<()> {
        self.execute(&commands::WAIT, &[]).map(|_| ())
    }

    pub fn is_operation_complete(&self) -> Result<bool> {
        self.query_and_parse(&commands::OPERATION_COMPLETE, &[])
    }

    /// `0` means the self-test passed.
    pub fn self_test(&self) -> Result<i32> {
        self.query_and_parse(&commands::SELF_TEST, &[])
    }

    pub fn status_byte(&self) -> Result<u8> {
        self.query_and_parse(&commands::STATUS_BYTE, &[])
    }

    pub fn event_status_register(&self) -> Result<u8> {
        self.query_and_parse(&commands::EVENT_STATUS_REGISTER, &[])
    }

    pub fn set_event_status_enable(&self, mask: u8) -> Result<()> {
        self.execute(&commands::SET_EVENT_STATUS_ENABLE, &[&mask]).map(|_| ())
    }

    pub fn event_status_enable(&self) -> Result<u8> {
        self.query_and_parse(&commands::EVENT_STATUS_ENABLE, &[])
    }

    pub fn set_service_request_enable(&self, mask: u8) -> Result<()> {
        self.execute(&commands::SET_SERVICE_REQUEST_ENABLE, &[&mask]).map(|_| ())
    }

    pub fn service_request_enable(&self) -> Result<u8> {
        self.query_and_parse(&commands::SERVICE_REQUEST_ENABLE, &[])
    }

    /// Pop one entry off the device error queue, e.g. `+0,"No error"`.
    pub fn system_error(&self) -> Result<String> {
        let ret = self.execute(&commands::SYSTEM_ERROR, &[])?;
        Ok(trim_line_ending(&ret).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use crate::ErrorKind;
    use std::sync::Arc;

    fn connected() -> (MockTransport, Session) {
        let mock = MockTransport::new();
        let session = Session::open(Arc::new(mock.clone()), "USB0::0x0957::0x0807::MY123::INSTR").unwrap();
        (mock, session)
    }

    #[test]
    fn identification_is_trimmed() {
        let (mock, session) = connected();
        mock.reply("*IDN?", "Agilent Technologies,6632B,0,A.01.02\r\n");
        assert_eq!(session.identify().unwrap(), "Agilent Technologies,6632B,0,A.01.02");
    }

    #[test]
    fn writes() {
        let (mock, session) = connected();
        session.reset().unwrap();
        session.clear_status().unwrap();
        session.wait_to_continue().unwrap();
        session.set_event_status_enable(0x3C).unwrap();
        session.set_service_request_enable(32).unwrap();
        assert_eq!(mock.writes(), vec!["*RST", "*CLS", "*WAI", "*ESE 60", "*SRE 32"]);
    }

    #[test]
    fn registers() {
        let (mock, session) = connected();
        mock.reply("*STB?", "+64\n")
            .reply("*ESR?", "32\n")
            .reply("*ESE?", "60\n")
            .reply("*SRE?", "0\n")
            .reply("*OPC?", "1\n");
        assert_eq!(session.status_byte().unwrap(), 64);
        assert_eq!(session.event_status_register().unwrap(), 32);
        assert_eq!(session.event_status_enable().unwrap(), 60);
        assert_eq!(session.service_request_enable().unwrap(), 0);
        assert!(session.is_operation_complete().unwrap());
    }

    #[test]
    fn register_out_of_range() {
        let (mock, session) = connected();
        mock.reply("*STB?", "512\n");
        assert_eq!(session.status_byte().unwrap_err().kind(), ErrorKind::Command);
    }

    #[test]
    fn self_test() {
        let (mock, session) = connected();
        mock.reply("*TST?", "0\n");
        assert_eq!(session.self_test().unwrap(), 0);
        mock.reply("*TST?", "FAIL\n");
        assert_eq!(session.self_test().unwrap_err().kind(), ErrorKind::Command);
    }

    #[test]
    fn system_error() {
        let (mock, session) = connected();
        mock.reply("SYST:ERR?", "-113,\"Undefined header\"\n");
        assert_eq!(session.system_error().unwrap(), "-113,\"Undefined header\"");
    }
}
