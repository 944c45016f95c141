//! Interactive kiosk session
//!
//! Reads one command per line (same syntax as the subcommands, without the
//! `mediqueue` prefix) and keeps the queue service and speech announcer alive
//! between commands. Errors are reported and the loop carries on.

use crate::{Commands, Session};
use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::debug;

const PROMPT: &str = "mediqueue> ";

#[derive(Parser, Debug)]
#[command(no_binary_name = true, name = "kiosk", disable_version_flag = true)]
struct KioskLine {
    #[command(subcommand)]
    command: Commands,
}

/// What a line of input asks for
#[derive(Debug, PartialEq)]
enum Input {
    Blank,
    Quit,
    Run(Commands),
}

fn parse_line(line: &str) -> std::result::Result<Input, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Blank);
    }
    if matches!(line, "exit" | "quit") {
        return Ok(Input::Quit);
    }

    let words = shlex::split(line).ok_or_else(|| "Unbalanced quotes".to_string())?;
    match KioskLine::try_parse_from(words) {
        Ok(KioskLine {
            command: Commands::Kiosk,
        }) => Err("Already in kiosk mode".to_string()),
        Ok(parsed) => Ok(Input::Run(parsed.command)),
        Err(e) => Err(e.render().to_string()),
    }
}

pub(crate) async fn run(session: &mut Session) -> Result<()> {
    println!("{}", "MediQueue kiosk".cyan().bold());
    println!("Type `help` for commands, `exit` to quit.");

    loop {
        let Some(line) = session.read_line(PROMPT).await? else {
            // EOF
            println!();
            break;
        };

        match parse_line(&line) {
            Ok(Input::Blank) => {}
            Ok(Input::Quit) => break,
            Ok(Input::Run(command)) => {
                debug!(?command, "Kiosk command");
                if let Err(e) = session.execute(command).await {
                    println!("{} {:#}", "✗".red().bold(), e);
                }
            }
            Err(message) => println!("{}", message.trim_end()),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_counter() {
        let input = parse_line(r#"call-next --counter "Counter 2""#).unwrap();
        assert_eq!(
            input,
            Input::Run(Commands::CallNext {
                counter: Some("Counter 2".to_string())
            })
        );
    }

    #[test]
    fn test_blank_and_quit() {
        assert_eq!(parse_line("   ").unwrap(), Input::Blank);
        assert_eq!(parse_line("exit").unwrap(), Input::Quit);
        assert_eq!(parse_line(" quit ").unwrap(), Input::Quit);
    }

    #[test]
    fn test_errors() {
        assert!(parse_line("call 'A001").is_err());
        assert!(parse_line("frobnicate").is_err());
        assert!(parse_line("kiosk").is_err());
    }
}
