// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn json_arg(what: &'static str) -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help(what)
}

fn build_cli() -> Command {
    Command::new("pacbundle")
        .version(env!("CARGO_PKG_VERSION"))
        .author("pacbundle Contributors")
        .about("A declarative pacman wrapper")
        .subcommand_required(false)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print every command before running it"),
        )
        .arg(
            Arg::new("dry_run")
                .short('n')
                .long("dry-run")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print commands instead of running them"),
        )
        .arg(
            Arg::new("no_confirm")
                .long("no-confirm")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Do not ask for confirmation"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("PATH")
                .help("Config file (default: $PACBUNDLE_CONFIG or ~/.config/pacbundle/config.toml)"),
        )
        .subcommand(
            Command::new("list")
                .about("List the bundles in the configuration file")
                .arg(json_arg("Print JSON instead of a table")),
        )
        .subcommand(
            Command::new("compare")
                .about("Compare the packages of included bundles with those installed on the system")
                .arg(json_arg("Print JSON instead of text")),
        )
        .subcommand(
            Command::new("sync").about("Sync the system installation with the included bundles"),
        )
        .subcommand(
            Command::new("install")
                .about("Install a bundle")
                .arg(Arg::new("name").required(true).help("Name of the bundle")),
        )
        .subcommand(Command::new("config").about("Edit the config file"))
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Man pages go to OUT_DIR so the source tree stays untouched
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("pacbundle.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}
