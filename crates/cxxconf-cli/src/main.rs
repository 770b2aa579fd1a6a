//! cxxconf - C++ build-configuration probe
//!
//! The `cxxconf` command drives the configure phase: it probes the active
//! C++ toolchain for language capabilities and persists the resulting
//! defines into generated build artifacts.
//!
//! ## Commands
//!
//! - `configure`: run the compiler feature probes and write artifacts
//! - `toolchain`: show the active C++ toolchain identity

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::Level;

use cxxconf_core::{configure, ConfigureContext, Toolchain};

#[derive(Parser)]
#[command(name = "cxxconf")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "C++ build-configuration probe", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configure phase: probe the toolchain and write artifacts
    Configure {
        /// C++ compiler to use (default: $CXX, then c++/g++/clang++)
        #[arg(long)]
        cxx: Option<PathBuf>,

        /// Extra compiler flag for every check (repeatable)
        #[arg(long)]
        cxxflag: Vec<String>,

        /// Output directory for generated artifacts
        #[arg(short, long, default_value = "build")]
        out_dir: PathBuf,

        /// Generated config header file name
        #[arg(long, default_value = "config.h")]
        header: String,

        /// JSON configuration store file name
        #[arg(long, default_value = "cxxconf.json")]
        store: String,
    },

    /// Show the active C++ toolchain
    Toolchain {
        /// C++ compiler to inspect (default: discovery order)
        #[arg(long)]
        cxx: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    cxxconf_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Configure {
            cxx,
            cxxflag,
            out_dir,
            header,
            store,
        } => cmd_configure(cxx.as_deref(), &cxxflag, &out_dir, &header, &store).await,
        Commands::Toolchain { cxx } => cmd_toolchain(cxx.as_deref()),
    }
}

fn resolve_toolchain(cxx: Option<&Path>, flags: &[String]) -> Toolchain {
    let toolchain = match cxx {
        Some(path) => Toolchain::with_compiler(path),
        None => Toolchain::discover(),
    };
    toolchain.with_flags(flags.iter().cloned())
}

/// Run the configure phase and write generated artifacts.
///
/// A negative probe result is a normal outcome: it changes the generated
/// artifacts, never the exit code. Only driver-level I/O failures are fatal.
async fn cmd_configure(
    cxx: Option<&Path>,
    flags: &[String],
    out_dir: &Path,
    header: &str,
    store: &str,
) -> Result<()> {
    let toolchain = resolve_toolchain(cxx, flags);

    println!("Configuring with compiler: {}", toolchain.compiler.display());
    if let Some(version) = toolchain.version() {
        println!("Compiler version: {}", version);
    }
    println!();

    let mut ctx = ConfigureContext::new(toolchain);
    configure(&mut ctx).await.context("configure phase failed")?;

    for check in ctx.checks() {
        println!(
            "{} : {}",
            check.message,
            if check.success { "yes" } else { "no" }
        );
    }

    let header_path = out_dir.join(header);
    let store_path = out_dir.join(store);
    cxxconf_core::write_config_header(&ctx, &header_path)
        .with_context(|| format!("Failed to write config header: {:?}", header_path))?;
    cxxconf_core::write_store(&ctx, &store_path)
        .with_context(|| format!("Failed to write configuration store: {:?}", store_path))?;

    println!();
    if ctx.defines().is_empty() {
        println!("No defines recorded");
    } else {
        println!("Defines:");
        for (name, value) in ctx.defines() {
            println!("  {} = {}", name, value.render());
        }
    }
    println!("Wrote {:?}", header_path);
    println!("Wrote {:?}", store_path);

    Ok(())
}

/// Show the active toolchain identity.
fn cmd_toolchain(cxx: Option<&Path>) -> Result<()> {
    let toolchain = resolve_toolchain(cxx, &[]);

    println!("Compiler: {}", toolchain.compiler.display());
    match toolchain.version() {
        Some(version) => println!("Version:  {}", version),
        None => println!("Version:  (compiler did not respond)"),
    }
    println!("Digest:   {}", toolchain.identity_digest());

    Ok(())
}
