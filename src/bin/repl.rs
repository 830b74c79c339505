use std::cell::RefCell;
use std::rc::Rc;

use monkey::{Environment, Evaluator, TokenKind, lexer, parser::parse};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};

const MONKEY_FACE: &str = r#"            __,__
   .--.  .-"     "-.  .--.
  / .. \/  .-. .-.  \/ .. \
 | |  '|  /   Y   \  |'  | |
 | \   \  \ 0 | 0 /  /   / |
  \ '- ,\.-"""""""-./, -' /
   ''-' /_   ^ ^   _\ '-''
       |  \._   _./  |
       \   \ '~' /   /
        '._ '-=-' _.'
           '-----'
"#;

struct MonkeyCompleter {
    env: Rc<RefCell<Environment>>,
}

impl MonkeyCompleter {
    fn new(env: Rc<RefCell<Environment>>) -> Self {
        MonkeyCompleter { env }
    }
}

impl rustyline::completion::Completer for MonkeyCompleter {
    type Candidate = String;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let tokens = lexer::tokenize(&line[..pos]);
        // The token stream always ends with EOF, so the token under the
        // cursor is the one before it.
        let candidates = match tokens.len().checked_sub(2).and_then(|i| tokens.get(i)) {
            Some(token)
                if token.kind == TokenKind::Ident && token.span.to_range().end == pos =>
            {
                let prefix = &token.literal;
                self.env
                    .borrow()
                    .get_identifiers()
                    .union(&lexer::keyword_identifiers())
                    .filter_map(|id| {
                        if id.starts_with(prefix.as_str()) {
                            Some(id[prefix.len()..].to_string())
                        } else {
                            None
                        }
                    })
                    .collect()
            }
            _ => vec![],
        };
        Ok((pos, candidates))
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct InputValidator {
    #[rustyline(Validator)]
    validator: MonkeyValidator,
    #[rustyline(Highlighter)]
    highlighter: MonkeyHighlighter,
    #[rustyline(Completer)]
    completer: MonkeyCompleter,
}

struct MonkeyValidator;

impl Validator for MonkeyValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();
        let mut stack = Vec::new();

        for (i, c) in input.chars().enumerate() {
            match c {
                '(' | '{' => {
                    stack.push((c, i));
                }
                ')' | '}' => {
                    if let Some((opening, _)) = stack.pop() {
                        if !((opening == '(' && c == ')') || (opening == '{' && c == '}')) {
                            return Ok(ValidationResult::Invalid(Some(format!(
                                "  - Unmatched '{}' at position {}",
                                c, i
                            ))));
                        }
                    } else {
                        return Ok(ValidationResult::Invalid(Some(format!(
                            "  - Unmatched '{}' at position {}",
                            c, i
                        ))));
                    }
                }
                _ => {}
            }
        }

        if stack.is_empty() {
            Ok(ValidationResult::Valid(None))
        } else {
            Ok(ValidationResult::Incomplete)
        }
    }
}

struct MonkeyHighlighter;

impl Highlighter for MonkeyHighlighter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> std::borrow::Cow<'l, str> {
        let mut stack: Vec<(char, usize)> = Vec::new();
        let mut highlighted = String::new();

        for (i, c) in line.chars().enumerate() {
            match c {
                '(' | '{' => {
                    stack.push((c, highlighted.len()));
                    highlighted.push(c);
                }
                ')' | '}' => {
                    if let Some((opening, matching_pos)) = stack.pop() {
                        if (opening == '(' && c == ')') || (opening == '{' && c == '}') {
                            if matching_pos == pos - 1 || i == pos - 1 {
                                highlighted.push_str(&format!("\x1b[34m{}\x1b[0m", c)); // Blue for matching brackets
                                highlighted.replace_range(
                                    matching_pos..=matching_pos,
                                    &format!("\x1b[1;34m{}\x1b[0m", opening as char),
                                );
                            } else {
                                highlighted.push(c);
                            }
                        } else {
                            highlighted.push_str(&format!("\x1b[31m{}\x1b[0m", c)); // Red for unmatched closing brackets
                            highlighted.replace_range(
                                matching_pos..=matching_pos,
                                &format!("\x1b[1;31m{}\x1b[0m", opening as char),
                            );
                        }
                    } else {
                        highlighted.push_str(&format!("\x1b[31m{}\x1b[0m", c)); // Red for unmatched closing brackets
                    }
                }
                _ => {
                    highlighted.push(c);
                }
            }
        }

        std::borrow::Cow::Owned(highlighted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn main() -> rustyline::Result<()> {
    println!("{}", MONKEY_FACE);
    println!("Hello! This is the Monkey programming language!");
    println!("Type 'exit' or press Ctrl-D to quit.");

    let global_env = Environment::new();
    let mut evaluator = Evaluator::new();
    let h = InputValidator {
        highlighter: MonkeyHighlighter,
        validator: MonkeyValidator,
        completer: MonkeyCompleter::new(global_env.clone()),
    };
    let config = rustyline::config::Config::builder()
        .edit_mode(rustyline::EditMode::Vi)
        .build();
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(h));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history("monkey_history.txt").is_err() {
        println!("No previous history.");
    }

    loop {
        let readline = rl.readline("monkey> ");
        match readline {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let trimmed_input = line.trim();
                if trimmed_input.is_empty() {
                    continue;
                }
                if trimmed_input.eq_ignore_ascii_case("exit") {
                    break;
                }

                match parse(trimmed_input) {
                    Ok(program) => {
                        let result = evaluator.eval_program(&program, &global_env);
                        println!("{}", result);
                    }
                    Err(parse_errors) => {
                        for parse_error in &parse_errors {
                            parse_error.pretty_print(trimmed_input);
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history("monkey_history.txt")
}
