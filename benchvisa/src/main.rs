use std::process::exit;
use std::sync::Arc;

use anyhow::anyhow;
use clap::{crate_authors, crate_version, App as ClapApp, Arg, ArgMatches};
use env_logger::Env;
use log::LevelFilter;

use benchvisa::session::DEFAULT_FIND_PATTERN;
use benchvisa::transport::{visa, Transport};
use benchvisa::{CommandKind, CommandSpec, Error, ReadTermination, ResponseShape, Result, Session, SessionOptions};

/// Command line text is sent verbatim, so braces must not act as placeholders.
fn literal(command: &str) -> String {
    command.replace('{', "{{").replace('}', "}}")
}

fn options(matches: &ArgMatches) -> Result<SessionOptions> {
    let mut ret = match matches.value_of("config") {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|err| Error::argument(anyhow!("Cannot read `{}`: {}", path, err)))?;
            serde_json::from_str(&text).map_err(|err| Error::argument(anyhow!("Invalid config `{}`: {}", path, err)))?
        }
        None => SessionOptions::default(),
    };
    if let Some(timeout) = matches.value_of("timeout") {
        let timeout = timeout
            .parse::<u32>()
            .map_err(|_| Error::argument(anyhow!("Cannot parse `{}` as a timeout in ms.", timeout)))?;
        ret.timeout_ms = Some(timeout);
    }
    let termination = match matches.value_of("termination") {
        Some("lf") => Some('\n'),
        Some("cr") => Some('\r'),
        _ => None,
    };
    if let Some(character) = termination {
        ret.read_termination = Some(ReadTermination {
            character,
            enabled: true,
        });
        ret.write_termination = Some(character);
    }
    if matches.is_present("check-errors") {
        ret.auto_error_check = true;
    }
    if matches.is_present("verbose") {
        ret.log_level = LevelFilter::Debug;
    }
    Ok(ret)
}

fn open(transport: Arc<dyn Transport>, matches: &ArgMatches, options: &SessionOptions) -> Result<Session> {
    let resource = matches.value_of("resource").unwrap_or_default();
    Session::open_with(transport, resource, options)
}

fn run(matches: &ArgMatches) -> Result<()> {
    let transport: Arc<dyn Transport> = visa::system()?;
    match matches.subcommand() {
        Some(("list", sub)) => {
            let pattern = sub.value_of("pattern").unwrap_or(DEFAULT_FIND_PATTERN);
            for resource in Session::find_resources(&*transport, pattern)? {
                println!("{}", resource);
            }
        }
        Some(("idn", sub)) => {
            let session = open(transport, sub, &options(sub)?)?;
            println!("{}", session.identify()?);
        }
        Some(("write", sub)) => {
            let session = open(transport, sub, &options(sub)?)?;
            let command = literal(sub.value_of("command").unwrap_or_default());
            let spec = CommandSpec::new(command, CommandKind::Write, ResponseShape::None, 0, "")?;
            session.execute(&spec, &[])?;
        }
        Some(("query", sub)) => {
            let session = open(transport, sub, &options(sub)?)?;
            let command = literal(sub.value_of("command").unwrap_or_default());
            let spec = CommandSpec::new(command, CommandKind::Query, ResponseShape::Text, 0, "")?;
            let value = session.query_value(&spec, &[])?;
            println!("{}", value);
        }
        Some(("chain", sub)) => {
            let session = open(transport, sub, &options(sub)?)?;
            let specs = sub
                .values_of("commands")
                .into_iter()
                .flatten()
                .map(|x| CommandSpec::new(literal(x), CommandKind::Write, ResponseShape::None, 0, ""))
                .collect::<Result<Vec<_>>>()?;
            let specs: Vec<&CommandSpec> = specs.iter().collect();
            session.execute_command_chain(&specs)?;
        }
        _ => return Err(Error::argument(anyhow!("No subcommand given, see --help."))),
    }
    Ok(())
}

/// Filter used when `RUST_LOG` is not set.
fn log_filter(verbose: bool) -> &'static str {
    if verbose {
        "benchvisa=debug"
    } else {
        "warn"
    }
}

fn resource_arg() -> Arg<'static> {
    Arg::new("resource")
        .required(true)
        .index(1)
        .help("VISA resource string, e.g. TCPIP0::192.168.1.10::INSTR")
}

fn main() {
    let matches = ClapApp::new("benchvisa")
        .author(crate_authors!())
        .version(crate_version!())
        .about("Talk to SCPI instruments through VISA")
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .short('t')
                .takes_value(true)
                .global(true)
                .help("I/O timeout in milliseconds."),
        )
        .arg(
            Arg::new("termination")
                .long("termination")
                .takes_value(true)
                .possible_values(["lf", "cr", "none"])
                .global(true)
                .help("Line termination for reads and writes."),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .takes_value(true)
                .global(true)
                .help("JSON file with session options."),
        )
        .arg(
            Arg::new("check-errors")
                .long("check-errors")
                .short('e')
                .global(true)
                .help("Query the device error queue after every command."),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .help("Log verbose output"),
        )
        .subcommand(
            ClapApp::new("list")
                .about("List connected instruments.")
                .arg(Arg::new("pattern").index(1).help("Resource search expression.")),
        )
        .subcommand(
            ClapApp::new("idn")
                .about("Print the identification string.")
                .arg(resource_arg()),
        )
        .subcommand(
            ClapApp::new("write")
                .about("Send a command.")
                .arg(resource_arg())
                .arg(Arg::new("command").required(true).index(2)),
        )
        .subcommand(
            ClapApp::new("query")
                .about("Send a query and print the response.")
                .arg(resource_arg())
                .arg(Arg::new("command").required(true).index(2)),
        )
        .subcommand(
            ClapApp::new("chain")
                .about("Send several commands as one message.")
                .arg(resource_arg())
                .arg(
                    Arg::new("commands")
                        .required(true)
                        .index(2)
                        .multiple_values(true),
                ),
        )
        .get_matches();

    // global flags are propagated into the subcommand
    let verbose = match matches.subcommand() {
        Some((_, sub)) => sub.is_present("verbose"),
        None => matches.is_present("verbose"),
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_filter(verbose))).init();

    if let Err(err) = run(&matches) {
        println!("{}", err);
        exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_log_filter() {
        assert_eq!(log_filter(false), "warn");
        assert_eq!(log_filter(true), "benchvisa=debug");
    }

    #[test]
    fn braces_are_sent_literally() {
        assert_eq!(literal("DISP:TEXT \"{a}\""), "DISP:TEXT \"{{a}}\"");
    }
}
