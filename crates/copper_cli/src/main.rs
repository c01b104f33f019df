//! Copper CLI: the command-line driver for the copper netlist generator.
//!
//! Provides `copper check` to elaborate and validate a design, `copper
//! netlist` to generate, number and place a netlist, and `copper sim` to run
//! the design on the tick simulator with configured stimulus.

#![warn(missing_docs)]

mod check;
mod netlist;
mod pipeline;
mod sim;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Copper: netlists and simulation from elaborated HDL designs.
#[derive(Parser, Debug)]
#[command(name = "copper", version, about = "Copper netlist generator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Project directory, or the path of its `copper.toml`.
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Elaborate and validate the design.
    Check,
    /// Generate the netlist.
    Netlist(NetlistArgs),
    /// Simulate the design.
    Sim(SimArgs),
}

/// Arguments for the `copper netlist` subcommand.
#[derive(Parser, Debug)]
pub struct NetlistArgs {
    /// Write the listing here instead of the configured output.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Ignore the configured legacy netlist.
    #[arg(long)]
    pub fresh: bool,
}

/// Arguments for the `copper sim` subcommand.
#[derive(Parser, Debug)]
pub struct SimArgs {
    /// Number of ticks to run (overrides `sim.ticks`).
    #[arg(short, long)]
    pub ticks: Option<u32>,

    /// Write a VCD waveform here (overrides `sim.vcd`).
    #[arg(long)]
    pub vcd: Option<String>,

    /// Operands to watch (overrides `sim.watch`).
    #[arg(short, long, num_args = 1..)]
    pub watch: Vec<String>,

    /// After the run, explain how this operand got its value.
    #[arg(long)]
    pub explain: Option<String>,

    /// Bit of the explained operand, counted from its low end.
    #[arg(long, default_value_t = 0, requires = "explain")]
    pub bit: u32,

    /// Tick to explain. Defaults to the last simulated tick.
    #[arg(long, requires = "explain")]
    pub at: Option<u32>,

    /// Maximum depth of the explanation tree.
    #[arg(long, default_value_t = 16, requires = "explain")]
    pub depth: usize,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional project directory or config path.
    pub project: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        project: cli.project,
    };

    if let Err(e) = init_logging(&global) {
        eprintln!("warning: {e}");
    }

    let result = match cli.command {
        Command::Check => check::run(&global),
        Command::Netlist(ref args) => netlist::run(args, &global),
        Command::Sim(ref args) => sim::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Level of the stderr logger for the given flags.
fn log_level(global: &GlobalArgs) -> log::LevelFilter {
    if global.quiet {
        log::LevelFilter::Error
    } else if global.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    }
}

fn init_logging(global: &GlobalArgs) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log_level(global))
        .chain(std::io::stderr())
        .apply()
}

/// Rough terminal detection from the `TERM` variable.
fn is_terminal() -> bool {
    std::env::var("TERM").is_ok_and(|term| term != "dumb")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn global(quiet: bool, verbose: bool) -> GlobalArgs {
        GlobalArgs {
            quiet,
            verbose,
            color: false,
            project: None,
        }
    }

    #[test]
    fn parse_check() {
        let cli = Cli::parse_from(["copper", "check"]);
        assert!(matches!(cli.command, Command::Check));
        assert_eq!(cli.color, ColorChoice::Auto);
        assert!(cli.project.is_none());
    }

    #[test]
    fn parse_netlist_with_output() {
        let cli = Cli::parse_from(["copper", "netlist", "-o", "board.net", "--fresh"]);
        match cli.command {
            Command::Netlist(ref args) => {
                assert_eq!(args.output.as_deref(), Some("board.net"));
                assert!(args.fresh);
            }
            _ => panic!("expected Netlist command"),
        }
    }

    #[test]
    fn parse_sim_defaults() {
        let cli = Cli::parse_from(["copper", "sim"]);
        match cli.command {
            Command::Sim(ref args) => {
                assert!(args.ticks.is_none());
                assert!(args.vcd.is_none());
                assert!(args.watch.is_empty());
                assert!(args.explain.is_none());
                assert_eq!(args.depth, 16);
            }
            _ => panic!("expected Sim command"),
        }
    }

    #[test]
    fn parse_sim_with_explain() {
        let cli = Cli::parse_from([
            "copper", "sim", "--ticks", "8", "-w", "q", "clk", "--explain", "q", "--bit", "1",
            "--at", "3",
        ]);
        match cli.command {
            Command::Sim(ref args) => {
                assert_eq!(args.ticks, Some(8));
                assert_eq!(args.watch, vec!["q", "clk"]);
                assert_eq!(args.explain.as_deref(), Some("q"));
                assert_eq!((args.bit, args.at), (1, Some(3)));
            }
            _ => panic!("expected Sim command"),
        }
    }

    #[test]
    fn bit_requires_explain() {
        assert!(Cli::try_parse_from(["copper", "sim", "--bit", "1"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "copper", "sim", "--quiet", "--color", "never", "--project", "boards/clock",
        ]);
        assert!(cli.quiet);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.project.as_deref(), Some("boards/clock"));
    }

    #[test]
    fn log_levels() {
        assert_eq!(log_level(&global(true, true)), log::LevelFilter::Error);
        assert_eq!(log_level(&global(false, true)), log::LevelFilter::Debug);
        assert_eq!(log_level(&global(false, false)), log::LevelFilter::Warn);
    }
}
