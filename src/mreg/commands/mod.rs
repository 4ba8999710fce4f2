//! Command registry. A command line reads `<command> <option> [args...]`.

pub mod history;
pub mod host;
pub mod permission;

use crate::mreg::context::Context;
use crate::mreg::error::{CliError, Result};
use std::collections::BTreeMap;
use std::fmt::Write;

pub type Handler = fn(&mut Context, &[String]) -> Result<()>;

pub struct CommandOption {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: Handler,
}

pub struct Command {
    pub name: &'static str,
    pub description: &'static str,
    pub options: Vec<CommandOption>,
}

impl Command {
    pub fn option(&self, name: &str) -> Option<&CommandOption> {
        self.options.iter().find(|o| o.name == name)
    }

    pub fn help(&self) -> String {
        let mut out = format!("{}\n\nOptions:\n", self.description);
        for o in &self.options {
            let _ = writeln!(out, "   {}\n       {}", o.usage, o.help);
        }
        out
    }
}

pub struct Registry {
    commands: BTreeMap<&'static str, Command>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut r = Registry {
            commands: BTreeMap::new(),
        };
        r.register(history::command());
        r.register(host::command());
        r.register(permission::command());
        r
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Command) {
        self.commands.insert(command.name, command);
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn help(&self) -> String {
        let mut out = String::from("Commands:\n");
        for c in self.commands.values() {
            let summary = c.description.lines().next().unwrap_or_default();
            let _ = writeln!(out, "   {:<12} {}", c.name, summary);
        }
        out.push_str("   help         Show this message, or `<command> help [option]`\n");
        out
    }

    pub fn dispatch(&self, ctx: &mut Context, words: &[String]) -> Result<()> {
        let name = match words.first() {
            Some(n) => n.as_str(),
            None => return Ok(()),
        };
        if name == "help" {
            match words.get(1).and_then(|n| self.get(n)) {
                Some(c) => print!("{}", c.help()),
                None => print!("{}", self.help()),
            }
            return Ok(());
        }
        let command = self
            .get(name)
            .ok_or_else(|| CliError::UnknownCommand(String::from(name)))?;
        let option = match words.get(1) {
            Some(o) => o.as_str(),
            None => {
                print!("{}", command.help());
                return Ok(());
            }
        };
        if option == "help" {
            match words.get(2) {
                Some(o) => match command.option(o) {
                    Some(opt) => println!("{}\n    {}", opt.usage, opt.help),
                    None => println!("No documentation of \"{}\"", o),
                },
                None => print!("{}", command.help()),
            }
            return Ok(());
        }
        let opt = command.option(option).ok_or_else(|| CliError::UnknownOption {
            command: String::from(name),
            option: String::from(option),
        })?;
        tracing::debug!(command = name, option, "dispatching");
        (opt.handler)(ctx, &words[2..])
    }
}

/// Returns positional argument `i`, or a usage error.
pub(crate) fn arg<'a>(args: &'a [String], i: usize, usage: &str) -> Result<&'a str> {
    args.get(i)
        .map(|s| s.as_str())
        .ok_or_else(|| CliError::Usage(String::from(usage)))
}

/// Prints a confirmation to the user and keeps it in the log.
pub(crate) fn confirm(msg: impl AsRef<str>) {
    let msg = msg.as_ref();
    tracing::info!("{}", msg);
    println!("{}", msg);
}
