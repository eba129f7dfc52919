use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use crate::error::Error;
use crate::Session;

const PROMPT: &str = "> ";

/// Reads lines until Ctrl-C or Ctrl-D. Errors in a line are reported and the session goes on.
pub fn run_repl(session: &mut Session) -> Result<(), Error> {
    let mut editor = DefaultEditor::new()?;

    if session.is_debug() {
        println!("Feebl v0.1. AST print mode on.");
    } else {
        println!("Feebl v0.1.");
    }

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }

                let _ = editor.add_history_entry(line.as_str());

                match session.run_line(&line) {
                    Ok(Some(value)) => println!("-> {}", value),
                    Ok(None) => {},
                    Err(err) => eprintln!("{}", err),
                }
            },
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
