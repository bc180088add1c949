use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io;

/// Generate a shell completion script on stdout.
pub fn run<C: CommandFactory>(shell: Shell) -> Result<()> {
    let mut cmd = C::command();
    let bin_name = cmd.get_name().to_string();

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
