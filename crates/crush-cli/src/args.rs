use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for the crush binary.
#[derive(Parser, Debug)]
#[command(name = "crush", version, about = "Squeeze ESTree syntax trees")]
pub struct CliArgs {
    /// ESTree JSON file to optimize, or `-` for standard input.
    #[arg(default_value = "-")]
    pub input: PathBuf,

    /// Write the optimized tree here instead of standard output.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Assume a production build: `process.env.NODE_ENV` folds to
    /// "production" and dev-only branches disappear.
    #[arg(short = 'p', long)]
    pub production: bool,

    /// Rename identifiers to short generated names. Unsafe for programs
    /// that rely on globals or cross-file bindings.
    #[arg(short = 'm', long)]
    pub mangle: bool,

    /// Emit the output JSON on one line instead of pretty-printed.
    #[arg(long)]
    pub compact: bool,
}
