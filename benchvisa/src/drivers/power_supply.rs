use super::session_driver;
use crate::{Result, Session};

mod commands {
    use crate::{CommandSpec, ResponseShape};

    pub const SET_VOLTAGE: CommandSpec = CommandSpec::write("VOLT {}", "Set output voltage.");
    pub const SET_CURRENT: CommandSpec = CommandSpec::write("CURR {}", "Set output current.");
    pub const VOLTAGE: CommandSpec = CommandSpec::query("VOLT?", ResponseShape::Real, "Get output voltage.");
    pub const CURRENT: CommandSpec = CommandSpec::query("CURR?", ResponseShape::Real, "Get output current.");
    pub const SET_OUTPUT: CommandSpec = CommandSpec::write("OUTP {}", "Set output state.");
    pub const OUTPUT: CommandSpec = CommandSpec::query("OUTP?", ResponseShape::Boolean, "Get output state.");
}

/// A generic SCPI programmable power supply.
#[derive(Debug)]
pub struct PowerSupply {
    session: Session,
}

session_driver!(PowerSupply);

impl PowerSupply {
    pub fn set_voltage(&self, volts: f64) -> Result<()> {
        self.session.execute(&commands::SET_VOLTAGE, &[&volts]).map(|_| ())
    }

    pub fn set_current(&self, amps: f64) -> Result<()> {
        self.session.execute(&commands::SET_CURRENT, &[&amps]).map(|_| ())
    }

    pub fn voltage(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::VOLTAGE, &[])
    }

    pub fn current(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::CURRENT, &[])
    }

    /// Sent as `1`/`0`.
    pub fn set_output(&self, enabled: bool) -> Result<()> {
        let state = if enabled { 1 } else { 0 };
        self.session.execute(&commands::SET_OUTPUT, &[&state]).map(|_| ())
    }

    pub fn is_output_enabled(&self) -> Result<bool> {
        self.session.query_and_parse(&commands::OUTPUT, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::testing::connected;

    #[test]
    fn setpoints_and_output() {
        let (mock, session) = connected();
        let psu = PowerSupply::new(session);
        psu.set_voltage(5.0).unwrap();
        psu.set_current(0.25).unwrap();
        psu.set_output(true).unwrap();
        psu.set_output(false).unwrap();
        assert_eq!(mock.writes(), vec!["VOLT 5", "CURR 0.25", "OUTP 1", "OUTP 0"]);
    }

    #[test]
    fn readback() {
        let (mock, session) = connected();
        mock.reply("VOLT?", "+5.000000E+00\n")
            .reply("CURR?", "0.1\n")
            .reply("OUTP?", "1\n")
            .reply("*IDN?", "ACME,PSU-1,0,1.0\n");
        let psu = PowerSupply::new(session);
        assert_eq!(psu.voltage().unwrap(), 5.0);
        assert_eq!(psu.current().unwrap(), 0.1);
        assert!(psu.is_output_enabled().unwrap());
        assert_eq!(psu.identify().unwrap(), "ACME,PSU-1,0,1.0");
    }

    #[test]
    fn into_session_keeps_connection() {
        let (mock, session) = connected();
        let psu = PowerSupply::new(session);
        let session = psu.into_session();
        assert!(session.is_connected());
        drop(session);
        assert_eq!(mock.live_handles(), 0);
    }
}
