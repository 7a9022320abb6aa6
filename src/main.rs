//! `gpio` front end: runs one command, or a small prompt that keeps pin state between commands.
//!
//! ```bash
//! gpio status -a GPIO4_
//! gpio --board board.toml toggle GPIO4_11
//! gpio --shell
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use gpio_cmd::{board_registry, Dispatcher, Registry, EXIT_SUCCESS};
use log::debug;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gpio")]
#[command(about = "query and control gpio pins")]
struct Cli {
    /// Board description (TOML). The built-in i.MX6 SoloLite board is used when omitted.
    #[arg(long)]
    board: Option<PathBuf>,

    /// Read `gpio ...` commands from stdin until `exit` or end of input.
    #[arg(long, conflicts_with = "command")]
    shell: bool,

    /// Verb and operands, e.g. `set GPIO4_11` or `status -a`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut registry =
        board_registry(cli.board.as_deref()).context("failed to set up the gpio registry")?;
    debug!("{:?}", registry);

    let code = if cli.shell {
        shell(&mut registry)?
    } else {
        let stdout = io::stdout();
        Dispatcher::new(&mut registry, stdout.lock()).run(cli.command.as_slice())
    };

    std::process::exit(code)
}

/// Runs commands line by line. Returns the exit code of the last command.
fn shell(registry: &mut Registry) -> Result<i32> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut dispatcher = Dispatcher::new(registry, io::stdout());
    let mut code = EXIT_SUCCESS;

    loop {
        prompt()?;
        let mut line = String::new();
        if input.read_line(&mut line).context("failed to read command")? == 0 {
            break;
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        match words.split_first() {
            None => continue,
            Some((&"exit", _)) => break,
            Some((&"gpio", args)) => code = dispatcher.run(args),
            Some((other, _)) => println!("Unknown command '{}' - try 'gpio'", other),
        }
    }

    Ok(code)
}

fn prompt() -> Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "=> ")?;
    stdout.flush()?;
    Ok(())
}
