use std::process::ExitCode;

use clap::Parser;

mod channel;
mod error;
mod iface;
mod mac;
mod wol;

use channel::Channel;
use error::Error;
use iface::InterfaceName;

/// Wakes hosts on the local Ethernet segment with layer-2 magic packets.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Send from this interface instead of the first Ethernet-like one.
    #[arg(short, long, value_name = "INTERFACE")]
    interface: Option<String>,

    /// Address every frame to ff:ff:ff:ff:ff:ff rather than the target.
    #[arg(short, long)]
    broadcast: bool,

    /// MAC addresses to wake.
    #[arg(value_name = "DESTINATION", required = true)]
    destinations: Vec<String>,
}

fn run(args: Args) -> Result<(), Error> {
    let requested = args
        .interface
        .as_deref()
        .map(InterfaceName::new)
        .transpose()?;
    let selection = iface::resolve(requested.as_ref())?;

    let mut channel = channel::Platform::open(&selection.name)?;
    let summary = wol::wake(
        &mut channel,
        selection.address,
        &args.destinations,
        args.broadcast,
    )?;
    channel.close();

    log::info!(
        "sent {} of {} magic packets via {} ({} skipped)",
        summary.sent,
        args.destinations.len(),
        selection.name,
        summary.skipped.len()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {err}", clap::crate_name!());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_args_destinations_required() {
        let err = Args::try_parse_from(["l2wol"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert!(err.use_stderr());
    }

    #[test]
    fn test_args_options() {
        let args = Args::try_parse_from([
            "l2wol",
            "-b",
            "-i",
            "em0",
            "AA:BB:CC:DD:EE:01",
            "AA:BB:CC:DD:EE:02",
        ])
        .unwrap();
        assert!(args.broadcast);
        assert_eq!(args.interface.as_deref(), Some("em0"));
        assert_eq!(args.destinations, ["AA:BB:CC:DD:EE:01", "AA:BB:CC:DD:EE:02"]);
    }

    #[test]
    fn test_args_unknown_option() {
        assert!(Args::try_parse_from(["l2wol", "-x", "AA:BB:CC:DD:EE:01"]).is_err());
    }

    #[test]
    fn test_long_interface_fails_before_resolution() {
        let args = Args::try_parse_from([
            "l2wol",
            "-i",
            "an-interface-name-far-too-long",
            "AA:BB:CC:DD:EE:01",
        ])
        .unwrap();
        let err = run(args).unwrap_err();
        assert!(matches!(err, Error::InterfaceNameTooLong(_)));
        assert_eq!(
            err.to_string(),
            "an-interface-name-far-too-long: interface name too long"
        );
    }
}
