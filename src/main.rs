//! Tally - an embeddable formula engine with an interactive shell

mod default_config;
mod repl;

use std::env;
use std::io;
use std::path::PathBuf;
use tally_core::{Document, Outcome};

fn print_usage() {
    eprintln!("Usage: tally [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -f, --file <FILE>         Load definitions (name = formula per line, can be repeated)");
    eprintln!("  -c, --command <STMT>      Run a statement and print the result (can be repeated)");
    eprintln!("  --operators <FILE>        Load the operator table from a TOML file");
    eprintln!("  --no-default-config       Ignore the user's default operators.toml");
    eprintln!("  -h, --help                Print help");
    eprintln!();
    eprintln!("Without --command, statements are read from stdin (:help for commands).");
}

fn require_value(args: &[String], i: usize, flag: &str) -> String {
    match args.get(i) {
        Some(value) => value.clone(),
        None => {
            eprintln!("Error: {} requires a value", flag);
            std::process::exit(1);
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    let mut files: Vec<PathBuf> = Vec::new();
    let mut commands: Vec<String> = Vec::new();
    let mut operators_file: Option<PathBuf> = None;
    let mut no_default_config = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-f" | "--file" => {
                i += 1;
                files.push(PathBuf::from(require_value(&args, i, "--file")));
            }
            "-c" | "--command" => {
                i += 1;
                commands.push(require_value(&args, i, "--command"));
            }
            "--operators" => {
                i += 1;
                operators_file = Some(PathBuf::from(require_value(&args, i, "--operators")));
            }
            "--no-default-config" => no_default_config = true,
            arg => {
                eprintln!("Error: Unknown argument: {}", arg);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = match default_config::resolve_config(operators_file.as_ref(), no_default_config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut doc = Document::with_config(config);
    for path in &files {
        if let Err(e) = doc.load_file(path) {
            eprintln!("Error: {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }

    if commands.is_empty() {
        let stdin = io::stdin();
        if let Err(e) = repl::run(&mut doc, stdin.lock(), io::stdout()) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // Command mode: stop at the first failure with exit code 1.
    for command in &commands {
        match doc.execute(command) {
            Ok(outcome) => {
                println!("{}", repl::describe_outcome(&doc, &outcome));
                if let Outcome::Defined(name) = &outcome {
                    if doc.value_of(name).is_err() {
                        std::process::exit(1);
                    }
                }
            }
            Err(e) => {
                println!("#ERR {}", e);
                std::process::exit(1);
            }
        }
    }
}
