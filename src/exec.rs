// src/exec.rs

//! Running external commands
//!
//! Every system mutation goes through a [`CommandRunner`], which lets the
//! commands honour `--dry-run` and lets tests record what would have run.

use crate::error::{Error, Result};
use crate::output;
use std::io::{self, BufRead, Write};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// Executes pacman command lines and include conditions
pub trait CommandRunner {
    /// Run `argv`, failing if the command exits unsuccessfully
    fn run(&self, argv: &[String]) -> Result<()>;

    /// Evaluate a shell condition; `true` when it exits 0
    fn probe(&self, condition: &str) -> Result<bool>;
}

/// Runner that spawns real processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner {
    /// Print commands instead of running them
    pub dry_run: bool,
    /// Print commands before running them
    pub verbose: bool,
}

impl SystemRunner {
    pub fn new(dry_run: bool, verbose: bool) -> Self {
        Self { dry_run, verbose }
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String]) -> Result<()> {
        let Some((program, args)) = argv.split_first() else {
            return Ok(());
        };
        let command_line = shell_join(argv);

        if self.dry_run || self.verbose {
            println!("Running command: {}", output::italic(&command_line));
        }
        if self.dry_run {
            return Ok(());
        }

        debug!("Executing: {}", command_line);
        let status = Command::new(program).args(args).status()?;
        check_status(&command_line, status)
    }

    fn probe(&self, condition: &str) -> Result<bool> {
        debug!("Evaluating include condition: {}", condition);
        // Condition output must not mix with the command's report on stdout
        let status = Command::new("sh")
            .arg("-c")
            .arg(condition)
            .stdout(Stdio::from(io::stderr()))
            .status()?;
        debug!("Condition `{}` exited with {}", condition, status);
        Ok(status.success())
    }
}

/// Turn a non-zero exit status into [`Error::CommandFailed`]
pub fn check_status(command_line: &str, status: ExitStatus) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(Error::CommandFailed {
            command: command_line.to_string(),
            status: status.to_string(),
        })
    }
}

/// Join argv into a single POSIX shell command line
pub fn shell_join<S: AsRef<str>>(argv: &[S]) -> String {
    argv.iter()
        .map(|arg| shell_quote(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quote one word for a POSIX shell, leaving safe words untouched
pub fn shell_quote(word: &str) -> String {
    let is_safe = |c: char| c.is_alphanumeric() || "_@%+=:,./-".contains(c);
    if !word.is_empty() && word.chars().all(is_safe) {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r#"'"'"'"#))
}

/// Ask a yes/no question on stdin; anything but `y`/`yes` aborts
pub fn confirm(prompt: &str) -> Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "{} [y/N]: ", prompt)?;
    stdout.flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    if is_affirmative(&answer) {
        Ok(())
    } else {
        Err(Error::Aborted)
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
