use crate::ParseError;
use ariadne::{Label, Report, ReportKind, Source};

impl ParseError {
    pub fn pretty_print(&self, input: &str) {
        let report = match self {
            ParseError::UnexpectedToken { expected, found } => {
                Report::build(ReportKind::Error, ("REPL", found.span.to_range()))
                    .with_message(format!(
                        "expected next token to be {}, got {} instead",
                        expected, found.kind
                    ))
                    .with_label(
                        Label::new(("REPL", found.span.to_range()))
                            .with_message(format!("Expected {} here", expected)),
                    )
            }
            ParseError::NoPrefixParse(token) => {
                Report::build(ReportKind::Error, ("REPL", token.span.to_range()))
                    .with_message(format!("no prefix parse function for {} found", token.kind))
                    .with_label(
                        Label::new(("REPL", token.span.to_range()))
                            .with_message("An expression cannot start with this token"),
                    )
            }
            ParseError::InvalidIntegerLiteral(token) => {
                Report::build(ReportKind::Error, ("REPL", token.span.to_range()))
                    .with_message(format!("could not parse {} as integer", token.literal))
                    .with_label(
                        Label::new(("REPL", token.span.to_range()))
                            .with_message("This literal does not fit in a 64-bit integer"),
                    )
            }
        };
        report
            .finish()
            .print(("REPL", Source::from(input)))
            .unwrap();
    }
}
