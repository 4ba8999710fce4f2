use super::{arg, confirm, Command, CommandOption};
use crate::mreg::context::Context;
use crate::mreg::error::{CliError, Result};

pub fn command() -> Command {
    Command {
        name: "history",
        description: "Show history or redo/undo actions.",
        options: vec![
            CommandOption {
                name: "print",
                usage: "print",
                help: "Print the history.",
                handler: print,
            },
            CommandOption {
                name: "undo",
                usage: "undo <history-number>",
                help: "Undo the request given by <history-number> (GET requests cannot be undone)",
                handler: undo,
            },
            CommandOption {
                name: "redo",
                usage: "redo <history-number>",
                help: "Redo an undone request given by <history-number> (GET requests are not redone)",
                handler: redo,
            },
        ],
    }
}

fn seq_arg(args: &[String], usage: &str) -> Result<usize> {
    let n = arg(args, 0, usage)?;
    n.parse()
        .map_err(|_| CliError::warning(format!("invalid input: \"{}\" is not a history number", n)))
}

fn print(ctx: &mut Context, _args: &[String]) -> Result<()> {
    ctx.history.print();
    Ok(())
}

fn undo(ctx: &mut Context, args: &[String]) -> Result<()> {
    let seq = seq_arg(args, "history undo <history-number>")?;
    ctx.history.undo(seq, ctx.transport.as_ref())?;
    confirm(format!("undid history entry {}", seq));
    Ok(())
}

fn redo(ctx: &mut Context, args: &[String]) -> Result<()> {
    let seq = seq_arg(args, "history redo <history-number>")?;
    ctx.history.redo(seq, ctx.transport.as_ref())?;
    confirm(format!("redid history entry {}", seq));
    Ok(())
}
