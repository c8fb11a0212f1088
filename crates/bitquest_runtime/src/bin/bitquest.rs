//! BitQuest CLI entry point.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use bitquest_foundation::{Builtin, VmConfig};
use bitquest_language::Builtins;
use bitquest_runtime::{ConsoleHost, Outcome, Repl, Session, init_logging};

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    files: Vec<PathBuf>,
    batch_mode: bool,
    show_help: bool,
    show_version: bool,
    disassemble: bool,
    no_input: bool,
    // Debug flags
    trace_vm: bool,
    max_steps: Option<u64>,
    unbounded: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "-b" | "--batch" => config.batch_mode = true,
            "--dis" => config.disassemble = true,
            "--no-input" => config.no_input = true,
            "--trace-vm" => config.trace_vm = true,
            "--unbounded" => config.unbounded = true,
            "--max-steps" => {
                i += 1;
                if i >= args.len() {
                    return Err("--max-steps requires a value".into());
                }
                config.max_steps = Some(
                    args[i]
                        .parse()
                        .map_err(|_| format!("invalid --max-steps value: {}", args[i]))?,
                );
            }
            arg if arg.starts_with('-') => {
                return Err(format!("unknown option: {arg}").into());
            }
            path => config.files.push(PathBuf::from(path)),
        }
        i += 1;
    }

    Ok(config)
}

fn run(args: Vec<String>) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(ExitCode::SUCCESS);
    }

    if config.show_version {
        println!("bitquest {}", env!("CARGO_PKG_VERSION"));
        return Ok(ExitCode::SUCCESS);
    }

    init_logging(config.trace_vm);

    let mut vm_config = if config.unbounded {
        VmConfig::unbounded()
    } else {
        VmConfig::default()
    };
    if let Some(max) = config.max_steps {
        vm_config = vm_config.with_max_steps(Some(max));
    }
    vm_config = vm_config.with_trace(config.trace_vm);

    let builtins = if config.no_input {
        Builtins::standard().without(Builtin::Input)
    } else {
        Builtins::standard()
    };
    let session = || {
        Session::new()
            .with_config(vm_config.clone())
            .with_builtins(builtins)
    };

    // Run any specified files, each from a fresh state
    let mut failed = false;
    for file in &config.files {
        let mut session = session();
        session.load_file(file)?;

        if config.disassemble {
            match session.compile() {
                Ok(program) => println!("{program}"),
                Err(e) => {
                    eprintln!("\x1b[31m{}: {}\x1b[0m", file.display(), Outcome::Rejected(e));
                    failed = true;
                }
            }
            continue;
        }

        let mut host = ConsoleHost::stdio();
        let outcome = session.run(&mut host);
        if !outcome.is_success() {
            eprintln!("\x1b[31m{}: {outcome}\x1b[0m", file.display());
            failed = true;
        }
    }

    // If batch mode, exit now
    if config.batch_mode || config.disassemble {
        return Ok(if failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    // If files were run, suppress banner since context is established
    let mut repl = Repl::new()?.with_session(session());
    if !config.files.is_empty() {
        repl = repl.without_banner();
    }

    repl.run()?;
    Ok(ExitCode::SUCCESS)
}

fn print_help() {
    println!(
        "\x1b[1mBitQuest\x1b[0m - Script interpreter for BIT the robot dog

\x1b[1mUSAGE:\x1b[0m
    bitquest [OPTIONS] [FILES...]

\x1b[1mARGUMENTS:\x1b[0m
    [FILES...]    Scripts to run before starting the editor

\x1b[1mOPTIONS:\x1b[0m
    -h, --help         Print help information
    -V, --version      Print version information
    -b, --batch        Run files and exit (no editor)
    --dis              Print the bytecode for each file instead of running it
    --no-input         Disable the input() builtin
    --max-steps N      Step budget for each run (default 100000)
    --unbounded        No step budget

\x1b[1mDEBUG OPTIONS:\x1b[0m
    --trace-vm         Log every dispatched instruction (to stderr)

\x1b[1mEXAMPLES:\x1b[0m
    bitquest                      Start the script editor
    bitquest fetch.bq             Run fetch.bq, then start the editor
    bitquest -b fetch.bq          Run fetch.bq and exit
    bitquest --dis fetch.bq       Show the compiled bytecode

\x1b[1mEDITOR COMMANDS:\x1b[0m
    :run                 Tokenize and run the script
    :list                Show the script with line numbers
    :dis                 Show the compiled bytecode
    :undo / :clear       Remove the last line / every line
    :load PATH           Replace the script with a file
    :quit                Exit (or Ctrl+D)

Set RUST_LOG (e.g. RUST_LOG=debug) for interpreter logging."
    );
}
