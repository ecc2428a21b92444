//! CLI argument definitions for `reel`.

use clap::{value_parser, Arg, ArgAction, Command};

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("reel")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Render mastered demo reels from a list of recordings")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Suppress progress and all output except errors"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .short('d')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Show debug output"),
        )
        .subcommand(
            with_reel_args(Command::new("render").about("Render a mastered reel to WAV"))
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .value_name("PATH")
                        .required(true)
                        .help("Path of the mastered 16-bit WAV"),
                )
                .arg(
                    Arg::new("delivery")
                        .long("delivery")
                        .value_name("PATH")
                        .help("Also write the delivery copy to this path"),
                ),
        )
        .subcommand(with_reel_args(
            Command::new("plan").about("Print track analysis and the reel timeline as JSON"),
        ))
        .subcommand(
            Command::new("info")
                .about("Decode one file and print its properties")
                .arg(
                    Arg::new("INPUT")
                        .help("The input file path")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("create")
                .about("Emit default JSON payloads")
                .subcommand_required(true)
                .subcommand(
                    Command::new("settings-json").about("Print the default render settings"),
                ),
        )
}

/// Inputs and settings overrides shared by `render` and `plan`.
fn with_reel_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("INPUT")
                .help("Input recordings, in reel order")
                .required(true)
                .num_args(1..)
                .index(1),
        )
        .arg(
            Arg::new("settings")
                .long("settings")
                .short('S')
                .value_name("PATH")
                .help("JSON file with render settings; flags override its values"),
        )
        .arg(
            Arg::new("normalize")
                .long("normalize")
                .short('n')
                .action(ArgAction::SetTrue)
                .help("Match track loudness before mixing"),
        )
        .arg(
            Arg::new("segment")
                .long("segment")
                .value_name("SECONDS")
                .value_parser(value_parser!(f64))
                .help("Maximum seconds taken from each track"),
        )
        .arg(
            Arg::new("fade")
                .long("fade")
                .value_name("SECONDS")
                .value_parser(value_parser!(f64))
                .help("Fade-out length at the end of each track"),
        )
        .arg(
            Arg::new("gap")
                .long("gap")
                .value_name("SECONDS")
                .value_parser(value_parser!(f64))
                .help("Silence between tracks"),
        )
        .arg(
            Arg::new("tag")
                .long("tag")
                .value_name("PATH")
                .help("Watermark clip mixed over the reel"),
        )
        .arg(
            Arg::new("tag-interval")
                .long("tag-interval")
                .value_name("SECONDS")
                .value_parser(value_parser!(f64))
                .help("Seconds between watermark occurrences (0 disables)"),
        )
}
