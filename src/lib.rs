// Declare modules publicly so they are part of the library interface
pub mod ast;
pub mod environment;
pub mod evaluator;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod pretty_print;
pub mod source;

pub use ast::Program;
pub use environment::Environment;
pub use evaluator::{Evaluator, eval};
pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use object::Object;
pub use parser::{ParseError, Parser, parse};
pub use source::Span;
