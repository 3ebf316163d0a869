use super::session_driver;
use crate::{Result, Session};

mod commands {
    use crate::{CommandSpec, ResponseShape};

    pub const SET_VOLTAGE: CommandSpec =
        CommandSpec::write("SOURCE:VOLTAGE:LEVEL:IMMEDIATE:AMPLITUDE {}", "Set output voltage.");
    pub const VOLTAGE_SETTING: CommandSpec = CommandSpec::query(
        "SOURCE:VOLTAGE:LEVEL:IMMEDIATE:AMPLITUDE?",
        ResponseShape::Real,
        "Get output voltage setting.",
    );
    pub const MEASURE_VOLTAGE: CommandSpec =
        CommandSpec::query_delayed("MEASURE:VOLTAGE:DC?", ResponseShape::Real, 50, "Measure voltage.");
    pub const SET_CURRENT: CommandSpec =
        CommandSpec::write("SOURCE:CURRENT:LEVEL:IMMEDIATE:AMPLITUDE {}", "Set output current.");
    pub const CURRENT_SETTING: CommandSpec = CommandSpec::query(
        "SOURCE:CURRENT:LEVEL:IMMEDIATE:AMPLITUDE?",
        ResponseShape::Real,
        "Get output current setting.",
    );
    pub const MEASURE_CURRENT: CommandSpec =
        CommandSpec::query_delayed("MEASURE:CURRENT:DC?", ResponseShape::Real, 50, "Measure current.");
    pub const SET_OUTPUT: CommandSpec = CommandSpec::write("OUTPUT:STATE {}", "Set output state.");
    pub const OUTPUT: CommandSpec = CommandSpec::query("OUTPUT:STATE?", ResponseShape::Boolean, "Get output state.");
    pub const CLEAR_PROTECTION: CommandSpec = CommandSpec::write("OUTPUT:PROTECTION:CLEAR", "Clear tripped protection.");

    pub const SET_OVP: CommandSpec = CommandSpec::write("SOURCE:VOLTAGE:PROTECTION:LEVEL {}", "Set OVP level.");
    pub const OVP: CommandSpec =
        CommandSpec::query("SOURCE:VOLTAGE:PROTECTION:LEVEL?", ResponseShape::Real, "Get OVP level.");
    pub const SET_OCP: CommandSpec = CommandSpec::write("SOURCE:CURRENT:PROTECTION:STATE {}", "Set OCP state.");
    pub const OCP: CommandSpec =
        CommandSpec::query("SOURCE:CURRENT:PROTECTION:STATE?", ResponseShape::Boolean, "Get OCP state.");

    pub const SET_DISPLAY: CommandSpec = CommandSpec::write("DISPLAY:WINDOW:STATE {}", "Set display state.");
    pub const DISPLAY: CommandSpec =
        CommandSpec::query("DISPLAY:WINDOW:STATE?", ResponseShape::Boolean, "Get display state.");
    pub const SET_DISPLAY_TEXT: CommandSpec = CommandSpec::write("DISPLAY:WINDOW:TEXT:DATA \"{}\"", "Display text.");
    pub const DISPLAY_TEXT: CommandSpec =
        CommandSpec::query("DISPLAY:WINDOW:TEXT:DATA?", ResponseShape::Text, "Get displayed text.");

    pub const INITIATE: CommandSpec = CommandSpec::write("INITIATE:IMMEDIATE", "Initiate trigger system.");
    pub const ABORT: CommandSpec = CommandSpec::write("ABORT", "Abort trigger action.");
    pub const TRIGGER_SOURCE_BUS: CommandSpec = CommandSpec::write("TRIGGER:SOURCE BUS", "Set trigger source to bus.");
    pub const TRIGGER: CommandSpec = CommandSpec::write("TRIGGER:IMMEDIATE", "Generate a trigger.");
    pub const SET_TRIGGERED_VOLTAGE: CommandSpec =
        CommandSpec::write("SOURCE:VOLTAGE:LEVEL:TRIGGERED:AMPLITUDE {}", "Set triggered voltage level.");
    pub const TRIGGERED_VOLTAGE: CommandSpec = CommandSpec::query(
        "SOURCE:VOLTAGE:LEVEL:TRIGGERED:AMPLITUDE?",
        ResponseShape::Real,
        "Get triggered voltage level.",
    );
    pub const SET_TRIGGERED_CURRENT: CommandSpec =
        CommandSpec::write("SOURCE:CURRENT:LEVEL:TRIGGERED:AMPLITUDE {}", "Set triggered current level.");
    pub const TRIGGERED_CURRENT: CommandSpec = CommandSpec::query(
        "SOURCE:CURRENT:LEVEL:TRIGGERED:AMPLITUDE?",
        ResponseShape::Real,
        "Get triggered current level.",
    );
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "ON"
    } else {
        "OFF"
    }
}

/// Agilent/Keysight 664xA, 665xA, 667xA, 668xA and 669xA power supplies.
///
/// Boolean settings are sent as `ON`/`OFF`. Measurements wait 50 ms before
/// reading the result.
#[derive(Debug)]
pub struct Agilent66xxA {
    session: Session,
}

session_driver!(Agilent66xxA);

impl Agilent66xxA {
    pub fn set_voltage(&self, volts: f64) -> Result<()> {
        self.session.execute(&commands::SET_VOLTAGE, &[&volts]).map(|_| ())
    }

    pub fn voltage_setting(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::VOLTAGE_SETTING, &[])
    }

    pub fn measure_voltage(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::MEASURE_VOLTAGE, &[])
    }

    pub fn set_current(&self, amps: f64) -> Result<()> {
        self.session.execute(&commands::SET_CURRENT, &[&amps]).map(|_| ())
    }

    pub fn current_setting(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::CURRENT_SETTING, &[])
    }

    pub fn measure_current(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::MEASURE_CURRENT, &[])
    }

    pub fn set_output(&self, enabled: bool) -> Result<()> {
        self.session
            .execute(&commands::SET_OUTPUT, &[&on_off(enabled)])
            .map(|_| ())
    }

    pub fn is_output_enabled(&self) -> Result<bool> {
        self.session.query_and_parse(&commands::OUTPUT, &[])
    }

    /// Clear tripped OV, OC, OT or RI protection.
    pub fn clear_protection(&self) -> Result<()> {
        self.session.execute(&commands::CLEAR_PROTECTION, &[]).map(|_| ())
    }

    pub fn set_over_voltage_protection(&self, volts: f64) -> Result<()> {
        self.session.execute(&commands::SET_OVP, &[&volts]).map(|_| ())
    }

    pub fn over_voltage_protection(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::OVP, &[])
    }

    pub fn set_over_current_protection(&self, enabled: bool) -> Result<()> {
        self.session.execute(&commands::SET_OCP, &[&on_off(enabled)]).map(|_| ())
    }

    pub fn is_over_current_protection_enabled(&self) -> Result<bool> {
        self.session.query_and_parse(&commands::OCP, &[])
    }

    pub fn set_display_enabled(&self, enabled: bool) -> Result<()> {
        self.session
            .execute(&commands::SET_DISPLAY, &[&on_off(enabled)])
            .map(|_| ())
    }

    pub fn is_display_enabled(&self) -> Result<bool> {
        self.session.query_and_parse(&commands::DISPLAY, &[])
    }

    pub fn display_text(&self, text: &str) -> Result<()> {
        self.session.execute(&commands::SET_DISPLAY_TEXT, &[&text]).map(|_| ())
    }

    pub fn displayed_text(&self) -> Result<String> {
        self.session.query_and_parse(&commands::DISPLAY_TEXT, &[])
    }

    pub fn initiate(&self) -> Result<()> {
        self.session.execute(&commands::INITIATE, &[]).map(|_| ())
    }

    pub fn abort(&self) -> Result<()> {
        self.session.execute(&commands::ABORT, &[]).map(|_| ())
    }

    pub fn set_trigger_source_bus(&self) -> Result<()> {
        self.session.execute(&commands::TRIGGER_SOURCE_BUS, &[]).map(|_| ())
    }

    pub fn trigger(&self) -> Result<()> {
        self.session.execute(&commands::TRIGGER, &[]).map(|_| ())
    }

    pub fn set_triggered_voltage(&self, volts: f64) -> Result<()> {
        self.session
            .execute(&commands::SET_TRIGGERED_VOLTAGE, &[&volts])
            .map(|_| ())
    }

    pub fn triggered_voltage(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::TRIGGERED_VOLTAGE, &[])
    }

    pub fn set_triggered_current(&self, amps: f64) -> Result<()> {
        self.session
            .execute(&commands::SET_TRIGGERED_CURRENT, &[&amps])
            .map(|_| ())
    }

    pub fn triggered_current(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::TRIGGERED_CURRENT, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::testing::connected;

    #[test]
    fn booleans_are_on_off() {
        let (mock, session) = connected();
        let psu = Agilent66xxA::new(session);
        psu.set_output(true).unwrap();
        psu.set_over_current_protection(false).unwrap();
        psu.set_display_enabled(true).unwrap();
        assert_eq!(
            mock.writes(),
            vec![
                "OUTPUT:STATE ON",
                "SOURCE:CURRENT:PROTECTION:STATE OFF",
                "DISPLAY:WINDOW:STATE ON",
            ]
        );
    }

    #[test]
    fn measurements() {
        let (mock, session) = connected();
        mock.reply("MEASURE:VOLTAGE:DC?", "+1.19990E+01\n")
            .reply("MEASURE:CURRENT:DC?", "+2.00000E-03\n")
            .reply("OUTPUT:STATE?", "1\n");
        let psu = Agilent66xxA::new(session);
        assert_eq!(psu.measure_voltage().unwrap(), 11.999);
        assert_eq!(psu.measure_current().unwrap(), 0.002);
        assert!(psu.is_output_enabled().unwrap());
    }

    #[test]
    fn trigger_sequence_as_chain() {
        let (mock, session) = connected();
        let psu = Agilent66xxA::new(session);
        psu.set_triggered_voltage(3.3).unwrap();
        psu.session()
            .execute_command_chain(&[&commands::TRIGGER_SOURCE_BUS, &commands::INITIATE])
            .unwrap();
        psu.trigger().unwrap();
        assert_eq!(
            mock.writes(),
            vec![
                "SOURCE:VOLTAGE:LEVEL:TRIGGERED:AMPLITUDE 3.3",
                "TRIGGER:SOURCE BUS;INITIATE:IMMEDIATE",
                "TRIGGER:IMMEDIATE",
            ]
        );
    }

    #[test]
    fn display_text_is_quoted() {
        let (mock, session) = connected();
        mock.reply("DISPLAY:WINDOW:TEXT:DATA?", "\"HELLO\"\n");
        let psu = Agilent66xxA::new(session);
        psu.display_text("HELLO").unwrap();
        assert_eq!(mock.writes(), vec!["DISPLAY:WINDOW:TEXT:DATA \"HELLO\""]);
        assert_eq!(psu.displayed_text().unwrap(), "\"HELLO\"");
    }
}
