use std::process::ExitCode;

use monkey::{Environment, Object, eval, parse};

const DEMO: &str = "let fib = fn(n) { if (n < 2) { return n; } fib(n - 1) + fib(n - 2); };
fib(20);
";

fn run(input: &str) -> ExitCode {
    let program = match parse(input) {
        Ok(program) => program,
        Err(errors) => {
            for error in &errors {
                error.pretty_print(input);
            }
            return ExitCode::FAILURE;
        }
    };

    match eval(&program, &Environment::new()) {
        Object::Error(message) => {
            eprintln!("ERROR: {}", message);
            ExitCode::FAILURE
        }
        Object::Null => ExitCode::SUCCESS,
        result => {
            println!("{}", result);
            ExitCode::SUCCESS
        }
    }
}

fn main() -> ExitCode {
    match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(source) => run(&source),
            Err(err) => {
                eprintln!("could not read {}: {}", path, err);
                ExitCode::FAILURE
            }
        },
        None => {
            println!("No script given, running the demo program:\n{}", DEMO);
            run(DEMO)
        }
    }
}
