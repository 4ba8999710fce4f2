use crate::mreg::commands::Registry;
use crate::mreg::context::Context;
use crate::mreg::util::split_words;
use std::io::{self, BufRead, Write};

pub const PROMPT: &str = "mreg> ";

pub enum Flow {
    Continue,
    Quit,
}

/// Runs one command line. Failures are reported and never end the session.
pub fn run_line(registry: &Registry, ctx: &mut Context, line: &str) -> Flow {
    let words = split_words(line);
    match words.first().map(|w| w.as_str()) {
        Some("quit") | Some("exit") => return Flow::Quit,
        None => return Flow::Continue,
        _ => {}
    }
    if let Err(e) = registry.dispatch(ctx, &words) {
        tracing::warn!(line, "{}", e);
        eprintln!("WARNING: {}", e);
    }
    Flow::Continue
}

/// Reads commands from `input` until `quit`, `exit` or end of input.
pub fn run<R: BufRead>(registry: &Registry, ctx: &mut Context, mut input: R) -> io::Result<()> {
    let mut line = String::new();
    loop {
        print!("{}", PROMPT);
        io::stdout().flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            println!();
            return Ok(());
        }
        if let Flow::Quit = run_line(registry, ctx, line.trim_end()) {
            return Ok(());
        }
    }
}
