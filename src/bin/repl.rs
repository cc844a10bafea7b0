//! Interactive front end.
//!
//! Reads one complete source form per line, parses and evaluates it
//! against the single persistent [`Environment`] of the session, and
//! prints the integer result or the error text. Every failure is terminal
//! for the expression but never for the session.

use parfun::evaluator::{self, Environment};
use parfun::parser::{ParseConfig, Parser};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::panic;
use std::process;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let result = panic::catch_unwind(run_repl);

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");
        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: Unknown panic occurred");
        }
        process::exit(1);
    }
}

fn run_repl() {
    println!("parfun - parenthesized prefix expressions over integers");
    println!("Enter forms like: (* (+ 1 1) 4) or (def :kto 100)");
    println!("Type :help for commands, or Ctrl+D to exit.");
    println!();

    let Ok(mut rl) = DefaultEditor::new() else {
        eprintln!("Could not initialize the line editor.");
        process::exit(1);
    };
    let mut env = Environment::new();

    loop {
        match rl.readline("parfun> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    ":help" => {
                        print_help();
                        continue;
                    }
                    ":env" => {
                        print_environment(&env);
                        continue;
                    }
                    ":quit" | ":exit" => {
                        println!("Bye~");
                        break;
                    }
                    _ => {}
                }

                let config = ParseConfig {
                    handle_comments: true,
                };
                let result = Parser::with_config(line, config)
                    .parse()
                    .map_err(parfun::Error::from)
                    .and_then(|expr| {
                        evaluator::eval(&expr, &mut env).map_err(parfun::Error::from)
                    });

                match result {
                    Ok(value) => println!(">>> {value}"),
                    Err(err) => println!("<stdin>: {err}"),
                }
            }

            Err(ReadlineError::Interrupted) => {
                // user canceled the current line
            }
            Err(ReadlineError::Eof) => {
                println!("Bye~");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  :help  - show this help message");
    println!("  :env   - show the global bindings of this session");
    println!("  :quit  - exit the interpreter (also :exit, Ctrl+D)");
    println!();
    println!("Language:");
    println!("  Arithmetic:  (+ 1 2 3), (- 10 3), (* 2 2), (/ 9 3)");
    println!("  Comparison:  (= 1 1), (> 2 1), (< 1 2)   ; 1 is true, 0 is false");
    println!("  Logic:       (and 1 1), (or 0 1), (not 0)");
    println!("  Variables:   (def :kto 100)      ; lazy");
    println!("               (def :kto (* 2 2) !) ; evaluated now");
    println!("  Functions:   (def :addTwo (args :a :b) (+ :a :b))");
    println!("               (:addTwo 1 2)");
    println!("  Conditionals: (if (< :n 2) 1 0)");
    println!("  Sequencing:  (do (def :n 4) (* :n :n))");
    println!();
    println!("Definitions accumulate for the lifetime of the session.");
}

fn print_environment(env: &Environment) {
    let bindings = env.global_bindings();
    println!("Global bindings ({} total):", bindings.len());
    for (name, binding) in bindings {
        println!("  :{name} = {binding}");
    }
}
