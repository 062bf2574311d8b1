//! Simple command that prints one or '-n count' COMB GUID strings

use std::{env, io, io::Write, process::ExitCode};

use combguid::{CombGenerator, Config, Resolution};

fn main() -> io::Result<ExitCode> {
    let opts = {
        let mut args = env::args();
        let program = args.next();
        match parse_args(args) {
            Ok(opts) => opts,
            Err(message) => {
                eprintln!("Error: {}", message);
                eprintln!(
                    "Usage: {} [-n count] [-u]",
                    program.as_deref().unwrap_or("combguid")
                );
                return Ok(ExitCode::FAILURE);
            }
        }
    };

    let config = if opts.micros {
        match Config::default().with_resolution(Resolution::Microseconds) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Error: {}", err);
                return Ok(ExitCode::FAILURE);
            }
        }
    } else {
        Config::default()
    };

    let mut buf = io::BufWriter::new(io::stdout());
    for e in CombGenerator::new(config).take(opts.count) {
        writeln!(buf, "{}", e)?;
    }

    Ok(ExitCode::SUCCESS)
}

struct Opts {
    count: usize,
    micros: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Opts, String> {
    let mut count = None;
    let mut micros = false;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-u" => micros = true,
            "-n" => {
                if count.is_some() {
                    return Err("option 'n' given more than once".to_owned());
                }
                let Some(n_arg) = args.next() else {
                    return Err("argument to option 'n' missing".to_owned());
                };
                let Ok(c) = n_arg.parse() else {
                    return Err(format!("invalid argument to option 'n': '{}'", n_arg));
                };
                count.replace(c);
            }
            _ => return Err(format!("unrecognized argument '{}'", arg)),
        }
    }
    Ok(Opts {
        count: count.unwrap_or(1),
        micros,
    })
}
