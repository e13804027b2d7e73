//! CLI command definitions.

use clap::builder::styling::{AnsiColor, Color, Style, Styles};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

//--------------------------------------------------------------------------------------------------
// Macros
//--------------------------------------------------------------------------------------------------

/// A styled help section from `"command" # "description"` pairs.
macro_rules! examples_section {
    ($title:literal; $($cmd:literal # $desc:literal),* $(,)?) => {
        concat!(
            "\x1b[1;4m", $title, "\x1b[0m",
            $("\n  \x1b[32m", $cmd, "\x1b[0m  ", $desc,)*
        )
    };
}

/// Build a styled `Examples:` help block from `"command" # "description"` pairs.
macro_rules! examples {
    ($($cmd:literal # $desc:literal),* $(,)?) => {
        examples_section!["Examples:"; $($cmd # $desc),*]
    };
}

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const BUILD_EXAMPLES: &str = examples![
    "lovepack build                        " # "Build and deploy the current project",
    "lovepack build ./my-mod               " # "Build a specific project",
    "lovepack build --deploy-dir ./out     " # "Deploy somewhere other than the Mods folder",
    "lovepack build --compiler-timeout 300 " # "Give the Lua compiler more time",
    "lovepack build --strict               " # "Exit non-zero if any step failed",
    "lovepack build --json                 " # "Print the run report as JSON",
];

const SCAN_EXAMPLES: &str = examples![
    "lovepack scan                         " # "Print the patch manifest for this project",
    "lovepack scan ./my-mod --json         " # "Print patch descriptors as JSON",
];

const PATH_EXAMPLES: &str = examples![
    "lovepack path                         " # "Print where the mod will be deployed",
    "lovepack path --deploy-dir ./out      " # "Check an explicit deploy directory",
];

const CLI_EXAMPLES: &str = concat!(
    examples![
        "lovepack build                        " # "Scan, render and deploy the mod",
        "lovepack scan                         " # "Preview the generated patches",
        "lovepack path                         " # "Show the deploy directory",
    ],
    "\n\n",
    examples_section!["Annotating a hook:";
        "/** @lovelyType pattern               " # "Patch strategy (required)",
        " *  @lovelyTarget game.lua            " # "Host file to patch",
        " *  @lovelyPattern function love.load " # "Where to insert",
        " *  @lovelyPosition after */          " # "before, after or at",
    ],
);

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// lovepack - Package TypeScript mods for the Lovely loader.
#[derive(Debug, Parser)]
#[command(name = "lovepack", author, version, styles = styles())]
#[command(
    about = "Package TypeScript mods for the Lovely loader",
    after_help = CLI_EXAMPLES
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan annotations, write manifests and deploy the mod.
    #[command(after_help = BUILD_EXAMPLES)]
    Build {
        /// Project directory (defaults to current directory).
        path: Option<String>,

        /// Deploy into this directory instead of the platform Mods folder.
        #[arg(long, value_name = "DIR")]
        deploy_dir: Option<PathBuf>,

        /// Bound on each auxiliary compiler run, in seconds.
        #[arg(long, value_name = "SECS")]
        compiler_timeout: Option<u64>,

        /// Exit with an error if any deployment step failed.
        #[arg(long)]
        strict: bool,

        /// Output the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the patch manifest without deploying anything.
    #[command(after_help = SCAN_EXAMPLES)]
    Scan {
        /// Project directory (defaults to current directory).
        path: Option<String>,

        /// Output descriptors as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the resolved deploy directory.
    #[command(after_help = PATH_EXAMPLES)]
    Path {
        /// Project directory (defaults to current directory).
        path: Option<String>,

        /// Explicit deploy directory.
        #[arg(long, value_name = "DIR")]
        deploy_dir: Option<PathBuf>,
    },
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Help styles.
pub fn styles() -> Styles {
    Styles::styled()
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Magenta))),
        )
        .usage(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Magenta))),
        )
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
