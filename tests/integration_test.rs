// tests/integration_test.rs

//! Integration tests for pacbundle
//!
//! These tests drive the commands end to end against an in-memory package
//! database and a runner that records command lines instead of running them.

use pacbundle::Error;
use pacbundle::commands::{Outcome, Session};
use pacbundle::config::Config;
use pacbundle::exec::CommandRunner;
use pacbundle::pacman::{GroupMap, PackageDatabase};
use std::cell::RefCell;
use std::collections::BTreeSet;

const MANIFEST: &str = r##"
[bundles.base]
members = ["base", "linux", "#cli"]
include = "true"

[bundles.cli]
members = ["vim", "g#base-devel"]

[bundles.desktop]
members = ["plasma-meta", "firefox"]
include = "false"
"##;

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

struct FakeDb {
    groups: GroupMap,
    explicit: BTreeSet<String>,
    installed: BTreeSet<String>,
}

impl FakeDb {
    fn new() -> Self {
        let mut groups = GroupMap::new();
        groups.insert("base-devel".to_string(), set(&["gcc", "make"]));
        Self {
            groups,
            explicit: set(&["base", "linux", "gcc", "emacs"]),
            installed: set(&["base", "linux", "gcc", "make", "emacs", "firefox"]),
        }
    }

    fn in_sync() -> Self {
        let mut db = Self::new();
        db.explicit = set(&["base", "linux", "vim", "gcc", "make"]);
        db.installed = db.explicit.clone();
        db
    }
}

impl PackageDatabase for FakeDb {
    fn groups(&self) -> pacbundle::Result<&GroupMap> {
        Ok(&self.groups)
    }

    fn explicit_packages(&self) -> pacbundle::Result<&BTreeSet<String>> {
        Ok(&self.explicit)
    }

    fn installed_packages(&self) -> pacbundle::Result<&BTreeSet<String>> {
        Ok(&self.installed)
    }
}

/// Records command lines; a condition succeeds when its text is `true`
#[derive(Default)]
struct RecordingRunner {
    commands: RefCell<Vec<Vec<String>>>,
}

impl CommandRunner for RecordingRunner {
    fn run(&self, argv: &[String]) -> pacbundle::Result<()> {
        self.commands.borrow_mut().push(argv.to_vec());
        Ok(())
    }

    fn probe(&self, condition: &str) -> pacbundle::Result<bool> {
        Ok(condition == "true")
    }
}

fn accept(_prompt: &str) -> pacbundle::Result<()> {
    Ok(())
}

fn decline(_prompt: &str) -> pacbundle::Result<()> {
    Err(Error::Aborted)
}

fn session<'a>(
    config: &'a Config,
    db: &'a FakeDb,
    runner: &'a RecordingRunner,
    confirm: &'a dyn Fn(&str) -> pacbundle::Result<()>,
) -> Session<'a> {
    Session {
        config,
        db,
        runner,
        confirm,
        no_confirm: false,
        width: 80,
    }
}

fn recorded(runner: &RecordingRunner) -> Vec<String> {
    runner
        .commands
        .borrow()
        .iter()
        .map(|argv| argv.join(" "))
        .collect()
}

#[test]
fn test_compare_reports_drift() {
    let config = Config::from_toml(MANIFEST).unwrap();
    let db = FakeDb::new();
    let runner = RecordingRunner::default();
    let session = session(&config, &db, &runner, &accept);

    let mut out = Vec::new();
    let outcome = session.compare(&mut out, false).unwrap();

    assert_eq!(outcome, Outcome::Drift);
    assert_eq!(outcome.exit_code(), 10);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "There are 1 packages are explicitly installed but not specified in included bundles\n\
         emacs\n\
         There are 2 packages are specified in included bundles but not explicitly installed\n\
         make  vim\n"
    );
    assert!(runner.commands.borrow().is_empty());
}

#[test]
fn test_compare_json() {
    let config = Config::from_toml(MANIFEST).unwrap();
    let db = FakeDb::new();
    let runner = RecordingRunner::default();
    let session = session(&config, &db, &runner, &accept);

    let mut out = Vec::new();
    let outcome = session.compare(&mut out, true).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(outcome, Outcome::Drift);
    assert_eq!(value["unspecified"], serde_json::json!(["emacs"]));
    assert_eq!(value["missing"], serde_json::json!(["make", "vim"]));
}

#[test]
fn test_compare_in_sync() {
    let config = Config::from_toml(MANIFEST).unwrap();
    let db = FakeDb::in_sync();
    let runner = RecordingRunner::default();
    let session = session(&config, &db, &runner, &accept);

    let mut out = Vec::new();
    assert_eq!(session.compare(&mut out, false).unwrap(), Outcome::Success);
    assert!(out.is_empty());
}

#[test]
fn test_sync_applies_changes() {
    let config = Config::from_toml(MANIFEST).unwrap();
    let db = FakeDb::new();
    let runner = RecordingRunner::default();
    let session = session(&config, &db, &runner, &accept);

    let mut out = Vec::new();
    assert_eq!(session.sync(&mut out).unwrap(), Outcome::Success);

    assert_eq!(
        recorded(&runner),
        vec![
            "sudo pacman -D --asdeps emacs",
            "sudo pacman -S vim",
            "sudo pacman -D --asexplicit make",
        ]
    );
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("The following 1 packages will be unmarked as explicitly installed."));
    assert!(text.contains("The following 2 packages will be installed"));
    assert!(text.contains("Remember to run pacman -Rsn $(pacman -Qdtq) to clean up unused dependencies"));
}

#[test]
fn test_sync_declined_changes_nothing() {
    let config = Config::from_toml(MANIFEST).unwrap();
    let db = FakeDb::new();
    let runner = RecordingRunner::default();
    let session = session(&config, &db, &runner, &decline);

    let mut out = Vec::new();
    let err = session.sync(&mut out).unwrap_err();

    assert!(matches!(err, Error::Aborted));
    assert!(runner.commands.borrow().is_empty());
}

#[test]
fn test_sync_no_confirm_skips_prompt() {
    let config = Config::from_toml(MANIFEST).unwrap();
    let db = FakeDb::new();
    let runner = RecordingRunner::default();
    let mut session = session(&config, &db, &runner, &decline);
    session.no_confirm = true;

    let mut out = Vec::new();
    assert!(session.sync(&mut out).is_ok());
    assert_eq!(runner.commands.borrow().len(), 3);
}

#[test]
fn test_sync_nothing_to_do() {
    let config = Config::from_toml(MANIFEST).unwrap();
    let db = FakeDb::in_sync();
    let runner = RecordingRunner::default();
    let session = session(&config, &db, &runner, &decline);

    let mut out = Vec::new();
    assert_eq!(session.sync(&mut out).unwrap(), Outcome::Success);
    assert_eq!(String::from_utf8(out).unwrap(), "Nothing to do\n");
    assert!(runner.commands.borrow().is_empty());
}

#[test]
fn test_install_bundle() {
    let config = Config::from_toml(MANIFEST).unwrap();
    let db = FakeDb::new();
    let runner = RecordingRunner::default();
    let session = session(&config, &db, &runner, &accept);

    let mut out = Vec::new();
    assert_eq!(session.install("desktop", &mut out).unwrap(), Outcome::Success);

    assert_eq!(
        recorded(&runner),
        vec![
            "sudo pacman -S plasma-meta",
            "sudo pacman -D --asexplicit firefox",
        ]
    );
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with(
        "The following packages will be installed or marked as explicitly installed.\n"
    ));
    assert!(text.contains("firefox      plasma-meta"));
}

#[test]
fn test_install_follows_child_bundles() {
    let config = Config::from_toml(MANIFEST).unwrap();
    let db = FakeDb::new();
    let runner = RecordingRunner::default();
    let session = session(&config, &db, &runner, &accept);

    let mut out = Vec::new();
    session.install("base", &mut out).unwrap();

    assert_eq!(
        recorded(&runner),
        vec!["sudo pacman -S vim", "sudo pacman -D --asexplicit make"]
    );
}

#[test]
fn test_install_already_installed() {
    let config = Config::from_toml(MANIFEST).unwrap();
    let db = FakeDb::in_sync();
    let runner = RecordingRunner::default();
    let session = session(&config, &db, &runner, &decline);

    let mut out = Vec::new();
    assert_eq!(session.install("cli", &mut out).unwrap(), Outcome::Success);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "All packages in the bundle are already installed.\n"
    );
}

#[test]
fn test_install_unknown_bundle() {
    let config = Config::from_toml(MANIFEST).unwrap();
    let db = FakeDb::new();
    let runner = RecordingRunner::default();
    let session = session(&config, &db, &runner, &accept);

    let mut out = Vec::new();
    let err = session.install("gaming", &mut out).unwrap_err();
    assert_eq!(err.to_string(), "Bundle gaming does not exist in config.");
}

#[test]
fn test_list_table() {
    let config = Config::from_toml(MANIFEST).unwrap();
    let db = FakeDb::new();
    let runner = RecordingRunner::default();
    let session = session(&config, &db, &runner, &accept);

    let mut out = Vec::new();
    session.list(&mut out, false).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(
        lines[0],
        "✓: directly included, ○: transitively included, ✖: not included"
    );
    assert_eq!(lines[2], "┃ Bundle  ┃ Child Bundles ┃ Packages   ┃ Included ┃");
    assert_eq!(lines[4], "│ base    │ cli           │ 2 packages │ ✓        │");
    assert_eq!(lines[5], "│ cli     │               │ 1 packages │ ○        │");
    assert_eq!(lines[6], "│         │               │ 1 groups   │          │");
    assert_eq!(lines[7], "│ desktop │               │ 2 packages │ ✖        │");
}

#[test]
fn test_list_json() {
    let config = Config::from_toml(MANIFEST).unwrap();
    let db = FakeDb::new();
    let runner = RecordingRunner::default();
    let session = session(&config, &db, &runner, &accept);

    let mut out = Vec::new();
    session.list(&mut out, true).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(value.as_array().unwrap().len(), 3);
    assert_eq!(value[0]["name"], "base");
    assert_eq!(value[0]["children"], serde_json::json!(["cli"]));
    assert_eq!(value[0]["included"], "direct");
    assert_eq!(value[1]["groups"], 1);
    assert_eq!(value[1]["included"], "transitive");
    assert_eq!(value[2]["included"], "excluded");
}

#[test]
fn test_unknown_child_bundle_is_an_error() {
    let config = Config::from_toml(
        r##"
[bundles.base]
members = ["base", "#ghost"]
include = "true"
"##,
    )
    .unwrap();
    let db = FakeDb::new();
    let runner = RecordingRunner::default();
    let session = session(&config, &db, &runner, &accept);

    let mut out = Vec::new();
    let err = session.compare(&mut out, false).unwrap_err();
    assert_eq!(err.to_string(), "There is no bundle called ghost");
}

#[test]
fn test_unknown_group_is_an_error() {
    let config = Config::from_toml(
        r##"
[bundles.base]
members = ["g#gnome"]
include = "true"
"##,
    )
    .unwrap();
    let db = FakeDb::new();
    let runner = RecordingRunner::default();
    let session = session(&config, &db, &runner, &accept);

    let mut out = Vec::new();
    let err = session.sync(&mut out).unwrap_err();
    assert!(matches!(err, Error::UnknownGroup(name) if name == "gnome"));
}
