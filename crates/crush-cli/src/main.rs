//! The `crush` binary: ESTree JSON in, optimized ESTree JSON out.

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use crush_ast::{NodeArena, estree};
use crush_optimizer::{OptimizeOptions, optimize};
use std::io::Read;
use std::path::Path;

use crate::args::CliArgs;

fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    let source = read_input(&args.input)?;
    let tree: serde_json::Value =
        serde_json::from_str(&source).context("input is not valid JSON")?;

    let mut arena = NodeArena::new();
    let root = estree::from_json(&tree, &mut arena)
        .context("input is not a supported ESTree document")?;
    tracing::debug!(nodes = arena.len(), "parsed input tree");

    let options = OptimizeOptions {
        production: args.production,
        mangle: args.mangle,
    };
    let root = optimize(&mut arena, root, &options);

    let out = estree::to_json(&arena, root);
    let rendered = if args.compact {
        serde_json::to_string(&out)?
    } else {
        serde_json::to_string_pretty(&out)?
    };

    match &args.output {
        Some(path) => std::fs::write(path, rendered + "\n")
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}

/// Initialize tracing if CRUSH_LOG or RUST_LOG is set (zero cost otherwise).
fn init_tracing() {
    let filter = std::env::var("CRUSH_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok();
    if let Some(filter) = filter {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read standard input")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))
    }
}
