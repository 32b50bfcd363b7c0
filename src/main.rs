// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use log::LevelFilter;

use vcd_query::{Handle, LoadMode, LoadOptions, Module, SignalKind, VcdError};

#[derive(Parser, Debug)]
#[command(name = "vcd_query", version, about = "Load a VCD file and query its signals")]
struct Cli {
    /// The path to the file to read
    path: PathBuf,

    /// Scan the body on a single thread.
    #[arg(long)]
    sequential: bool,

    /// Number of body scanning workers, picked from the file size if omitted.
    #[arg(long, conflicts_with = "sequential")]
    workers: Option<usize>,

    /// Value of a signal at a time, written as ALIAS@TIME. Repeatable.
    #[arg(short, long = "query", value_parser = parse_query)]
    queries: Vec<Query>,

    /// Print the module tree.
    #[arg(long)]
    tree: bool,

    /// Enable debug level logging. RUST_LOG still takes precedence.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone)]
struct Query {
    alias: String,
    timestamp: u64,
}

fn parse_query(arg: &str) -> Result<Query, String> {
    let (alias, timestamp) = arg
        .rsplit_once('@')
        .ok_or_else(|| format!("`{arg}` is not of the form ALIAS@TIME"))?;
    if alias.is_empty() {
        return Err(format!("`{arg}` names no alias"));
    }
    let timestamp = timestamp
        .parse::<u64>()
        .map_err(|err| format!("bad time in `{arg}`: {err}"))?;
    Ok(Query {
        alias: alias.to_string(),
        timestamp,
    })
}

fn print_module(handle: &Handle, module: &Module, depth: usize) {
    let indent = "  ".repeat(depth);
    println!("{indent}{}", module.name());
    for pin in handle.pins_of(module) {
        let kind = match pin.kind() {
            SignalKind::Simple => "wire".to_string(),
            SignalKind::Bus => format!("bus[{}]", pin.width()),
            SignalKind::Parameter => format!("parameter = {}", pin.init_state()),
        };
        println!("{indent}  {} ({}) {kind}", pin.name(), pin.alias());
    }
    for child in handle.child_modules_of(module) {
        print_module(handle, child, depth + 1);
    }
}

fn run(args: &Cli) -> Result<(), VcdError> {
    let mode = if args.sequential {
        LoadMode::Sequential
    } else {
        LoadMode::Parallel
    };
    let mut options = LoadOptions::default().with_mode(mode);
    if let Some(workers) = args.workers {
        options = options.with_workers(workers);
    }

    let now = Instant::now();
    let handle = vcd_query::parse_vcd(&args.path, options)?;
    let elapsed = now.elapsed();

    println!("Parsed VCD file {} : {:.2?}", args.path.display(), elapsed);
    println!("date      : {}", handle.date());
    println!("version   : {}", handle.version());
    println!("timescale : {}", handle.timescale());
    println!("end time  : {}", handle.max_timestamp());
    println!(
        "signals   : {} ({} changes, {} workers)",
        handle.pins().len(),
        handle.load_stats().recorded_changes,
        handle.load_stats().workers
    );
    if handle.unknown_alias_count() > 0 {
        println!("undeclared: {} changes", handle.unknown_alias_count());
    }
    for interval in handle.dumpoff_intervals() {
        println!("dump off  : [{}, {})", interval.start, interval.end);
    }

    if args.tree {
        for root in handle.root_modules() {
            print_module(&handle, root, 0);
        }
    }

    for query in &args.queries {
        match handle.pin_by_alias(&query.alias) {
            Some(pin) => {
                let value = handle.bus_at(query.timestamp, &query.alias);
                let name = handle.full_name(pin.idx());
                match pin.kind() {
                    SignalKind::Simple => println!("{name} @ {} = {value}", query.timestamp),
                    SignalKind::Bus | SignalKind::Parameter => println!(
                        "{name} @ {} = {value} (0x{})",
                        query.timestamp,
                        vcd_query::bin_to_hex(&value)
                    ),
                }
            }
            None => log::warn!("no signal with alias {}", query.alias),
        }
    }

    Ok(())
}

fn main() {
    let args = Cli::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .init();

    if let Err(err) = run(&args) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_arguments() {
        let query = parse_query("\"@25").unwrap();
        assert_eq!(query.alias, "\"");
        assert_eq!(query.timestamp, 25);
        // the alias itself may hold an @
        let query = parse_query("a@b@7").unwrap();
        assert_eq!(query.alias, "a@b");
        assert!(parse_query("!").is_err());
        assert!(parse_query("@3").is_err());
        assert!(parse_query("!@soon").is_err());
    }

    #[test]
    fn cli_flags() {
        let cli = Cli::try_parse_from(["vcd_query", "dump.vcd", "--workers", "3", "-q", "!@4"]).unwrap();
        assert_eq!(cli.workers, Some(3));
        assert_eq!(cli.queries.len(), 1);
        assert!(Cli::try_parse_from(["vcd_query", "dump.vcd", "--sequential", "--workers", "3"]).is_err());
    }
}
