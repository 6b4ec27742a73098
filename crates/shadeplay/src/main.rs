mod bindings;
mod cli;
mod report;
mod run;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Check(args)) => report::check(args),
        Some(Command::Uniforms(args)) => report::uniforms(args),
        None => run::run(cli.run),
    }
}
