//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`validate`], or [`parse`]. Each handler
//! lives in its own submodule.

pub mod parse;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::RequestDebugError;

pub async fn dispatch(cli: Cli) -> Result<(), RequestDebugError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Validate(ref args)) => validate::execute(args),
        Some(Commands::Parse(ref args)) => parse::execute(args),
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  request-debug v{version}: HTTP request/response introspection middleware\n\n  \
         No command provided. To get started:\n\n    \
         request-debug run                   Serve ./request-debug.yaml\n    \
         request-debug run -c routes.yaml    Serve a specific config file\n    \
         request-debug parse tag=api         Check a debug directive\n    \
         request-debug --help                See all commands and options\n"
    );
}
