//! The CLI driver: an external collaborator (spec §1 "Out of scope"), not
//! part of the interpreter core. Talks to [`pickle::Interp`] only through
//! its embedding API — `new`, `eval`, `command-register`, `var-set`,
//! `result-get` — exactly as any other embedder would.

use clap::Parser;
use std::io::{IsTerminal, Read};
use std::time::{SystemTime, UNIX_EPOCH};

use pickle::commands::PrivateData;
use pickle::error::{PickleError, Signal};
use pickle::Interp;

#[derive(Parser)]
#[command(name = "pickle")]
#[command(about = "A tiny embeddable TCL-style command language interpreter")]
#[command(version)]
struct Cli {
    /// Execute the script from a command-line argument
    #[arg(short = 'c')]
    script: Option<String>,

    /// Script file to execute
    #[arg()]
    script_file: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let script = if let Some(s) = cli.script {
        s
    } else if let Some(ref file) = cli.script_file {
        match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error: cannot read script file: {file}: {e}");
                std::process::exit(1);
            }
        }
    } else {
        if std::io::stdin().is_terminal() {
            eprintln!("Error: no script provided. Use -c 'script', a script file, or pipe via stdin.");
            std::process::exit(1);
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_default();
        buf
    };

    let mut interp = Interp::new();
    register_driver_commands(&mut interp);

    let argv: Vec<String> = std::env::args().skip(1).collect();
    interp.var_set("argv", pickle::parser::join_list(&argv));

    let outcome = interp.eval(&script);
    match outcome {
        Ok(s) => {
            if !s.is_empty() {
                println!("{s}");
            }
            std::process::exit(0);
        }
        Err(Signal::Return) => {
            println!("{}", interp.result());
            std::process::exit(0);
        }
        Err(Signal::Error(msg)) => {
            eprintln!("{msg}");
            std::process::exit(1);
        }
        Err(other) => {
            eprintln!("Error: unhandled {other} at top level");
            std::process::exit(1);
        }
    }
}

/// Registers the driver-owned commands spec §1 calls out as external
/// collaborators (`puts`, `gets`, `source`, `clock`, `getenv`, `exit`),
/// plus `heap` as a thin window onto the allocator contract (spec §6). An
/// embedder that doesn't want a shell-like I/O surface simply never calls
/// this; the core works identically without it.
fn register_driver_commands(interp: &mut Interp) {
    interp.register_command("puts", cmd_puts).expect("built-in name collision");
    interp.register_command("gets", cmd_gets).expect("built-in name collision");
    interp.register_command("source", cmd_source).expect("built-in name collision");
    interp.register_command("clock", cmd_clock).expect("built-in name collision");
    interp.register_command("getenv", cmd_getenv).expect("built-in name collision");
    interp.register_command("exit", cmd_exit).expect("built-in name collision");
    interp.register_command("heap", cmd_heap).expect("built-in name collision");
}

type R = Result<String, Signal>;

fn cmd_puts(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    let (nonewline, text) = match argv.len() {
        2 => (false, argv[1].as_str()),
        3 if argv[1] == "-nonewline" => (true, argv[2].as_str()),
        _ => return Err(PickleError::WrongArgs("puts ?-nonewline? string".to_string()).into()),
    };
    if nonewline {
        print!("{text}");
    } else {
        println!("{text}");
    }
    Ok(String::new())
}

fn cmd_gets(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 1 {
        return Err(PickleError::WrongArgs("gets".to_string()).into());
    }
    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(0) => Ok(String::new()),
        Ok(_) => Ok(line.trim_end_matches(['\n', '\r']).to_string()),
        Err(e) => Err(Signal::Error(format!("Error: {e}"))),
    }
}

fn cmd_source(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 2 {
        return Err(PickleError::WrongArgs("source filename".to_string()).into());
    }
    let content = std::fs::read_to_string(&argv[1])
        .map_err(|e| Signal::Error(format!("Error: cannot read \"{}\": {e}", argv[1])))?;
    interp.eval_script(&content)
}

fn cmd_clock(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 2 || argv[1] != "seconds" {
        return Err(PickleError::WrongArgs("clock seconds".to_string()).into());
    }
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    Ok(now.as_secs().to_string())
}

fn cmd_getenv(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 2 {
        return Err(PickleError::WrongArgs("getenv name".to_string()).into());
    }
    Ok(std::env::var(&argv[1]).unwrap_or_default())
}

fn cmd_exit(_: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    let code = match argv.len() {
        1 => 0,
        2 => argv[1].parse::<i32>().map_err(|_| Signal::from(PickleError::BadInteger(argv[1].clone())))?,
        _ => return Err(PickleError::WrongArgs("exit ?code?".to_string()).into()),
    };
    std::process::exit(code);
}

/// `heap` reports a trivial process-memory figure. The real allocator
/// sample (spec §1 "Out of scope": "the block/pool allocator sample") is
/// not part of the core; this just proves the allocator contract (§6) is
/// reachable from driver-registered commands.
fn cmd_heap(interp: &mut Interp, argv: &[String], _: Option<&PrivateData>) -> R {
    if argv.len() != 1 {
        return Err(PickleError::WrongArgs("heap".to_string()).into());
    }
    let _ = interp.allocator();
    Ok("0".to_string())
}
