// src/pacman/mod.rs

//! Installed-package queries
//!
//! Two backends answer the same three questions (which groups exist, which
//! packages are explicitly installed, which are installed at all):
//! - [`Pacman`]: asks the `pacman` binary (`-Qg`, `-Qe`, `-Q`)
//! - [`LocalDatabase`]: reads pacman's local database from disk
//!
//! Each answer is computed at most once per backend instance.

pub mod local;

use crate::config::{Backend, Settings};
use crate::error::{Error, Result};
use crate::exec::shell_join;
use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet};
use std::process::Command;
use tracing::debug;

pub use local::LocalDatabase;

/// Group name to member package names
pub type GroupMap = BTreeMap<String, BTreeSet<String>>;

/// Read-only view of the packages installed on the system
pub trait PackageDatabase {
    /// Groups of installed packages and their members
    fn groups(&self) -> Result<&GroupMap>;

    /// Packages installed with reason "explicit"
    fn explicit_packages(&self) -> Result<&BTreeSet<String>>;

    /// All installed packages
    fn installed_packages(&self) -> Result<&BTreeSet<String>>;
}

/// Build the backend selected in the settings
pub fn open(settings: &Settings) -> Box<dyn PackageDatabase> {
    match settings.backend {
        Backend::Pacman => Box::new(Pacman::new()),
        Backend::Local => Box::new(LocalDatabase::new(&settings.db_path)),
    }
}

/// Return the cached value, loading it on first use
pub(crate) fn cached<T>(cell: &OnceCell<T>, load: impl FnOnce() -> Result<T>) -> Result<&T> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = load()?;
    Ok(cell.get_or_init(|| value))
}

/// Backend that shells out to `pacman`
#[derive(Debug, Default)]
pub struct Pacman {
    groups: OnceCell<GroupMap>,
    explicit: OnceCell<BTreeSet<String>>,
    installed: OnceCell<BTreeSet<String>>,
}

impl Pacman {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `pacman <args>` and return its non-empty output lines
    fn query(&self, args: &[&str]) -> Result<Vec<String>> {
        let mut argv = vec!["pacman"];
        argv.extend_from_slice(args);
        let command_line = shell_join(&argv);
        debug!("Querying: {}", command_line);

        let output = Command::new("pacman").args(args).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            return Err(Error::CommandFailed {
                command: command_line,
                status: if stderr.is_empty() {
                    output.status.to_string()
                } else {
                    stderr
                },
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(non_empty_lines(&stdout))
    }
}

impl PackageDatabase for Pacman {
    fn groups(&self) -> Result<&GroupMap> {
        cached(&self.groups, || Ok(parse_group_lines(&self.query(&["-Qg"])?)))
    }

    fn explicit_packages(&self) -> Result<&BTreeSet<String>> {
        cached(&self.explicit, || {
            Ok(parse_package_lines(&self.query(&["-Qe"])?))
        })
    }

    fn installed_packages(&self) -> Result<&BTreeSet<String>> {
        cached(&self.installed, || Ok(parse_package_lines(&self.query(&["-Q"])?)))
    }
}

fn non_empty_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `pacman -Qg` output: one `<group> <package>` pair per line
pub fn parse_group_lines<S: AsRef<str>>(lines: &[S]) -> GroupMap {
    let mut groups = GroupMap::new();
    for line in lines {
        let mut fields = line.as_ref().split_whitespace();
        if let (Some(group), Some(package)) = (fields.next(), fields.next()) {
            groups
                .entry(group.to_string())
                .or_default()
                .insert(package.to_string());
        }
    }
    groups
}

/// Parse `pacman -Q`/`-Qe` output: the package name is the first field
pub fn parse_package_lines<S: AsRef<str>>(lines: &[S]) -> BTreeSet<String> {
    lines
        .iter()
        .filter_map(|line| line.as_ref().split_whitespace().next())
        .map(str::to_string)
        .collect()
}
