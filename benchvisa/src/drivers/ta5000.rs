use super::session_driver;
use crate::{Result, Session};

mod commands {
    use crate::{CommandSpec, ResponseShape};

    pub const TEMPERATURE: CommandSpec = CommandSpec::query("TEMP?", ResponseShape::Real, "Read main temperature.");
    pub const AIR_TEMPERATURE: CommandSpec = CommandSpec::query("TMPA?", ResponseShape::Real, "Read air temperature.");
    pub const DUT_TEMPERATURE: CommandSpec = CommandSpec::query("TMPD?", ResponseShape::Real, "Read DUT temperature.");
    pub const SET_SETPOINT: CommandSpec = CommandSpec::write("SETP {}", "Set temperature setpoint.");
    pub const SETPOINT: CommandSpec = CommandSpec::query("SETP?", ResponseShape::Real, "Read temperature setpoint.");
    pub const SET_SOAK_TIME: CommandSpec = CommandSpec::write("SOAK {}", "Set soak time.");
    pub const SOAK_TIME: CommandSpec = CommandSpec::query("SOAK?", ResponseShape::Integer, "Read soak time.");
    pub const SET_WINDOW: CommandSpec = CommandSpec::write("WNDW {}", "Set temperature window.");
    pub const WINDOW: CommandSpec = CommandSpec::query("WNDW?", ResponseShape::Real, "Read temperature window.");

    pub const HEAD_DOWN: CommandSpec = CommandSpec::write("HEAD 1", "Put thermal head down.");
    pub const HEAD_UP: CommandSpec = CommandSpec::write("HEAD 0", "Put thermal head up.");
    pub const HEAD_STATE: CommandSpec = CommandSpec::query("HEAD?", ResponseShape::Integer, "Read head state.");
    pub const LOCK_HEAD: CommandSpec = CommandSpec::write("HDLK 1", "Lock test head.");
    pub const UNLOCK_HEAD: CommandSpec = CommandSpec::write("HDLK 0", "Unlock test head.");

    pub const FLOW_ON: CommandSpec = CommandSpec::write("FLOW 1", "Turn air flow on.");
    pub const FLOW_OFF: CommandSpec = CommandSpec::write("FLOW 0", "Turn air flow off.");
    pub const SET_FLOW_RATE: CommandSpec = CommandSpec::write("FLSE {}", "Set air flow rate.");
    pub const FLOW_RATE_SETTING: CommandSpec =
        CommandSpec::query("FLSE?", ResponseShape::Integer, "Read air flow rate setting.");
    pub const FLOW_RATE_MEASURED: CommandSpec =
        CommandSpec::query("FLWR?", ResponseShape::Integer, "Read measured air flow rate.");
    pub const FLOW_RATE_LITERS: CommandSpec =
        CommandSpec::query("FLRL?", ResponseShape::Real, "Read measured flow rate in l/min.");
    pub const TRICKLE_ON: CommandSpec = CommandSpec::write("TRKL 1", "Turn trickle flow on.");
    pub const TRICKLE_OFF: CommandSpec = CommandSpec::write("TRKL 0", "Turn trickle flow off.");
    pub const TRICKLE_STATE: CommandSpec = CommandSpec::query("TRKL?", ResponseShape::Integer, "Read trickle flow setting.");

    pub const DUT_MODE_ON: CommandSpec = CommandSpec::write("DUTM 1", "Control on DUT temperature.");
    pub const DUT_MODE_OFF: CommandSpec = CommandSpec::write("DUTM 0", "Control on air temperature.");
    pub const DUT_MODE: CommandSpec = CommandSpec::query("DUTM?", ResponseShape::Integer, "Read DUT mode state.");
    pub const SET_DUT_SENSOR: CommandSpec = CommandSpec::write("DSNS {}", "Set DUT sensor type.");
    pub const DUT_SENSOR: CommandSpec = CommandSpec::query("DSNS?", ResponseShape::Integer, "Read DUT sensor type.");
    pub const SET_DUT_AUTO_TUNE: CommandSpec = CommandSpec::write("DUTN {}", "Set DUT auto tune mode.");
    pub const DUT_AUTO_TUNE: CommandSpec = CommandSpec::query("DUTN?", ResponseShape::Integer, "Get DUT auto tune mode.");
    pub const SET_AIR_TO_DUT_MAX: CommandSpec = CommandSpec::write("ADMD {}", "Set air-to-DUT max difference.");
    pub const AIR_TO_DUT_MAX: CommandSpec =
        CommandSpec::query("ADMD?", ResponseShape::Integer, "Get air-to-DUT max difference.");

    pub const SET_LOWER_LIMIT: CommandSpec = CommandSpec::write("LLIM {}", "Set lower air temperature limit.");
    pub const LOWER_LIMIT: CommandSpec = CommandSpec::query("LLIM?", ResponseShape::Real, "Get lower air temperature limit.");
    pub const SET_UPPER_LIMIT: CommandSpec = CommandSpec::write("ULIM {}", "Set upper air temperature limit.");
    pub const UPPER_LIMIT: CommandSpec =
        CommandSpec::query("ULIM?", ResponseShape::Integer, "Get upper air temperature limit.");

    pub const ERROR_STATE: CommandSpec = CommandSpec::query("EROR?", ResponseShape::Integer, "Read system error state.");
    pub const AUXILIARY_CONDITION: CommandSpec =
        CommandSpec::query("AUXC?", ResponseShape::Integer, "Get auxiliary condition data.");
    pub const TEMPERATURE_EVENT: CommandSpec =
        CommandSpec::query("TECR?", ResponseShape::Integer, "Get temperature event condition.");

    pub const COMPRESSOR_ON: CommandSpec = CommandSpec::write("COOL 1", "Turn compressor on.");
    pub const COMPRESSOR_OFF: CommandSpec = CommandSpec::write("COOL 0", "Turn compressor off.");
    pub const COMPRESSOR: CommandSpec = CommandSpec::query("COOL?", ResponseShape::Integer, "Get compressor state.");

    pub const SET_CYCLE_COUNT: CommandSpec = CommandSpec::write("CYCC {}", "Set cycle count.");
    pub const CYCLE_COUNT: CommandSpec = CommandSpec::query("CYCC?", ResponseShape::Integer, "Get cycle count.");
    pub const START_CYCLING: CommandSpec = CommandSpec::write("CYCL 1", "Start cycling.");
    pub const STOP_CYCLING: CommandSpec = CommandSpec::write("CYCL 0", "Stop cycling.");
    pub const CYCLING: CommandSpec = CommandSpec::query("CYCP?", ResponseShape::Integer, "Get cycling state.");
    pub const NEXT_SETPOINT: CommandSpec = CommandSpec::write("NEXT", "Step to next setpoint.");
    pub const SELECT_SETPOINT: CommandSpec = CommandSpec::write("SETN {}", "Select setpoint.");
    pub const SELECTED_SETPOINT: CommandSpec = CommandSpec::query("SETN?", ResponseShape::Integer, "Get selected setpoint.");
    pub const DYNAMIC_SETPOINT: CommandSpec = CommandSpec::query("SETD?", ResponseShape::Real, "Get dynamic setpoint.");
    pub const SET_RAMP_RATE: CommandSpec = CommandSpec::write("RAMP {}", "Set ramp rate.");
    pub const RAMP_RATE: CommandSpec = CommandSpec::query("RAMP?", ResponseShape::Real, "Get ramp rate.");
    pub const SET_MAX_TEST_TIME: CommandSpec = CommandSpec::write("TTIM {}", "Set max test time.");
    pub const MAX_TEST_TIME: CommandSpec = CommandSpec::query("TTIM?", ResponseShape::Integer, "Get max test time.");
}

/// inTEST ThermoStream / ThermalAir TA-5000 temperature forcing system.
///
/// On/off commands are fixed `1`/`0` writes, states read back as integers.
#[derive(Debug)]
pub struct ThermalAirTA5000 {
    session: Session,
}

session_driver!(ThermalAirTA5000);

impl ThermalAirTA5000 {
    fn run(&self, spec: &crate::CommandSpec) -> Result<()> {
        self.session.execute(spec, &[]).map(|_| ())
    }

    pub fn temperature(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::TEMPERATURE, &[])
    }

    pub fn air_temperature(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::AIR_TEMPERATURE, &[])
    }

    pub fn dut_temperature(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::DUT_TEMPERATURE, &[])
    }

    pub fn set_setpoint(&self, celsius: f64) -> Result<()> {
        self.session.execute(&commands::SET_SETPOINT, &[&celsius]).map(|_| ())
    }

    pub fn setpoint(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::SETPOINT, &[])
    }

    pub fn set_soak_time(&self, seconds: i32) -> Result<()> {
        self.session.execute(&commands::SET_SOAK_TIME, &[&seconds]).map(|_| ())
    }

    pub fn soak_time(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::SOAK_TIME, &[])
    }

    pub fn set_temperature_window(&self, window: f64) -> Result<()> {
        self.session.execute(&commands::SET_WINDOW, &[&window]).map(|_| ())
    }

    pub fn temperature_window(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::WINDOW, &[])
    }

    pub fn set_head_down(&self) -> Result<()> {
        self.run(&commands::HEAD_DOWN)
    }

    pub fn set_head_up(&self) -> Result<()> {
        self.run(&commands::HEAD_UP)
    }

    pub fn head_state(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::HEAD_STATE, &[])
    }

    pub fn lock_head(&self) -> Result<()> {
        self.run(&commands::LOCK_HEAD)
    }

    pub fn unlock_head(&self) -> Result<()> {
        self.run(&commands::UNLOCK_HEAD)
    }

    pub fn set_flow(&self, on: bool) -> Result<()> {
        if on {
            self.run(&commands::FLOW_ON)
        } else {
            self.run(&commands::FLOW_OFF)
        }
    }

    pub fn set_flow_rate(&self, scfm: i32) -> Result<()> {
        self.session.execute(&commands::SET_FLOW_RATE, &[&scfm]).map(|_| ())
    }

    pub fn flow_rate_setting(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::FLOW_RATE_SETTING, &[])
    }

    pub fn flow_rate_measured(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::FLOW_RATE_MEASURED, &[])
    }

    pub fn flow_rate_liters_per_min(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::FLOW_RATE_LITERS, &[])
    }

    pub fn set_trickle_flow(&self, on: bool) -> Result<()> {
        if on {
            self.run(&commands::TRICKLE_ON)
        } else {
            self.run(&commands::TRICKLE_OFF)
        }
    }

    pub fn trickle_flow_state(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::TRICKLE_STATE, &[])
    }

    /// `true` controls on the DUT sensor, `false` on the air temperature.
    pub fn set_dut_control_mode(&self, on: bool) -> Result<()> {
        if on {
            self.run(&commands::DUT_MODE_ON)
        } else {
            self.run(&commands::DUT_MODE_OFF)
        }
    }

    pub fn dut_control_mode(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::DUT_MODE, &[])
    }

    pub fn set_dut_sensor_type(&self, sensor: i32) -> Result<()> {
        self.session.execute(&commands::SET_DUT_SENSOR, &[&sensor]).map(|_| ())
    }

    pub fn dut_sensor_type(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::DUT_SENSOR, &[])
    }

    pub fn set_dut_auto_tune_mode(&self, mode: i32) -> Result<()> {
        self.session.execute(&commands::SET_DUT_AUTO_TUNE, &[&mode]).map(|_| ())
    }

    pub fn dut_auto_tune_mode(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::DUT_AUTO_TUNE, &[])
    }

    pub fn set_air_to_dut_max_difference(&self, difference: i32) -> Result<()> {
        self.session
            .execute(&commands::SET_AIR_TO_DUT_MAX, &[&difference])
            .map(|_| ())
    }

    pub fn air_to_dut_max_difference(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::AIR_TO_DUT_MAX, &[])
    }

    pub fn set_lower_temperature_limit(&self, celsius: f64) -> Result<()> {
        self.session.execute(&commands::SET_LOWER_LIMIT, &[&celsius]).map(|_| ())
    }

    pub fn lower_temperature_limit(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::LOWER_LIMIT, &[])
    }

    pub fn set_upper_temperature_limit(&self, celsius: i32) -> Result<()> {
        self.session.execute(&commands::SET_UPPER_LIMIT, &[&celsius]).map(|_| ())
    }

    pub fn upper_temperature_limit(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::UPPER_LIMIT, &[])
    }

    pub fn error_state(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::ERROR_STATE, &[])
    }

    pub fn auxiliary_condition(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::AUXILIARY_CONDITION, &[])
    }

    pub fn temperature_event_condition(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::TEMPERATURE_EVENT, &[])
    }

    pub fn set_compressor(&self, on: bool) -> Result<()> {
        if on {
            self.run(&commands::COMPRESSOR_ON)
        } else {
            self.run(&commands::COMPRESSOR_OFF)
        }
    }

    pub fn compressor_state(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::COMPRESSOR, &[])
    }

    pub fn set_cycle_count(&self, count: i32) -> Result<()> {
        self.session.execute(&commands::SET_CYCLE_COUNT, &[&count]).map(|_| ())
    }

    pub fn cycle_count(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::CYCLE_COUNT, &[])
    }

    pub fn start_cycling(&self) -> Result<()> {
        self.run(&commands::START_CYCLING)
    }

    pub fn stop_cycling(&self) -> Result<()> {
        self.run(&commands::STOP_CYCLING)
    }

    pub fn cycling_state(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::CYCLING, &[])
    }

    pub fn next_setpoint(&self) -> Result<()> {
        self.run(&commands::NEXT_SETPOINT)
    }

    pub fn select_setpoint(&self, index: i32) -> Result<()> {
        self.session.execute(&commands::SELECT_SETPOINT, &[&index]).map(|_| ())
    }

    pub fn selected_setpoint(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::SELECTED_SETPOINT, &[])
    }

    pub fn dynamic_setpoint(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::DYNAMIC_SETPOINT, &[])
    }

    /// Degrees per minute.
    pub fn set_ramp_rate(&self, rate: f64) -> Result<()> {
        self.session.execute(&commands::SET_RAMP_RATE, &[&rate]).map(|_| ())
    }

    pub fn ramp_rate(&self) -> Result<f64> {
        self.session.query_and_parse(&commands::RAMP_RATE, &[])
    }

    pub fn set_max_test_time(&self, seconds: i32) -> Result<()> {
        self.session.execute(&commands::SET_MAX_TEST_TIME, &[&seconds]).map(|_| ())
    }

    pub fn max_test_time(&self) -> Result<i32> {
        self.session.query_and_parse(&commands::MAX_TEST_TIME, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::testing::connected;
    use crate::ErrorKind;

    #[test]
    fn temperature_cycle() {
        let (mock, session) = connected();
        let ts = ThermalAirTA5000::new(session);
        ts.set_head_down().unwrap();
        ts.set_flow(true).unwrap();
        ts.set_setpoint(-40.0).unwrap();
        ts.set_soak_time(30).unwrap();
        ts.set_compressor(false).unwrap();
        ts.set_head_up().unwrap();
        assert_eq!(
            mock.writes(),
            vec!["HEAD 1", "FLOW 1", "SETP -40", "SOAK 30", "COOL 0", "HEAD 0"]
        );
    }

    #[test]
    fn switches_send_fixed_commands() {
        let (mock, session) = connected();
        let ts = ThermalAirTA5000::new(session);
        for on in [true, false].iter().copied() {
            ts.set_flow(on).unwrap();
            ts.set_trickle_flow(on).unwrap();
            ts.set_dut_control_mode(on).unwrap();
            ts.set_compressor(on).unwrap();
        }
        assert_eq!(
            mock.writes(),
            vec!["FLOW 1", "TRKL 1", "DUTM 1", "COOL 1", "FLOW 0", "TRKL 0", "DUTM 0", "COOL 0"]
        );
    }

    #[test]
    fn readback() {
        let (mock, session) = connected();
        mock.reply("TEMP?", "25.3\n")
            .reply("HEAD?", "1\n")
            .reply("FLWR?", "12\n");
        let ts = ThermalAirTA5000::new(session);
        assert_eq!(ts.temperature().unwrap(), 25.3);
        assert_eq!(ts.head_state().unwrap(), 1);
        assert_eq!(ts.flow_rate_measured().unwrap(), 12);
    }

    #[test]
    fn garbled_temperature() {
        let (mock, session) = connected();
        mock.reply("TMPD?", "--.-\n");
        let ts = ThermalAirTA5000::new(session);
        assert_eq!(ts.dut_temperature().unwrap_err().kind(), ErrorKind::Command);
    }
}
