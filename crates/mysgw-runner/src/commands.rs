//! Line-oriented host command bus.
//!
//! Each input line is one of:
//!
//! ```text
//! <item> <value>    send a command, e.g. `Strip 255,0,0` or `Lamp ON`
//! show              print the current value of every item
//! help              print this summary
//! ```

use std::sync::Arc;

use mysgw_bridge::{
    BindingTable, CommandError, ConversionError, Dispatcher, ItemRegistry, MemoryStateStore, StateStore,
    Value,
};
use thiserror::Error;

/// Usage summary printed by `help`.
pub const USAGE: &str = "commands: <item> <value> | show | help";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send `text`, parsed for the item, to `item`.
    Send {
        /// Item name as bound in the configuration.
        item: String,
        /// Value text, trimmed.
        text: String,
    },
    /// List item states.
    Show,
    /// Print usage.
    Help,
}

/// Why an input line produced no command.
#[derive(Debug, Error)]
pub enum InputError {
    /// A single word that is not `show` or `help`.
    #[error("commands: <item> <value> | show | help")]
    Usage,

    /// The value text fits none of the item's kinds.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The dispatcher refused the command.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Parse one line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Command>, InputError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let command = match line.split_once(char::is_whitespace) {
        None if line.eq_ignore_ascii_case("show") => Command::Show,
        None if line.eq_ignore_ascii_case("help") => Command::Help,
        None => return Err(InputError::Usage),
        Some((item, text)) => Command::Send { item: item.to_string(), text: text.trim().to_string() },
    };
    Ok(Some(command))
}

/// Executes parsed commands against a running dispatcher.
pub struct CommandBus {
    dispatcher: Arc<Dispatcher>,
    items: Arc<BindingTable>,
    state: Arc<MemoryStateStore>,
}

impl CommandBus {
    /// A bus sending through `dispatcher`. `show` reads from `items` and `state`.
    pub fn new(dispatcher: Arc<Dispatcher>, items: Arc<BindingTable>, state: Arc<MemoryStateStore>) -> Self {
        CommandBus { dispatcher, items, state }
    }

    /// Run one input line and return the text to print.
    pub fn execute_line(&self, line: &str) -> Result<Option<String>, InputError> {
        match parse_line(line)? {
            Some(command) => self.execute(command).map(Some),
            None => Ok(None),
        }
    }

    /// Run `command` and return the text to print.
    pub fn execute(&self, command: Command) -> Result<String, InputError> {
        match command {
            Command::Send { item, text } => {
                let kinds = self.items.accepted_kinds(&item);
                if kinds.is_empty() {
                    return Err(CommandError::NotBound(item).into());
                }
                let value = Value::parse_any(&text, &kinds)?;
                self.dispatcher.receive_command(&item, &value)?;
                Ok(format!("{item} <- {value}"))
            }
            Command::Show => Ok(self.show()),
            Command::Help => Ok(USAGE.to_string()),
        }
    }

    fn show(&self) -> String {
        let mut lines = Vec::new();
        for item in self.items.item_names() {
            let binding = self.items.binding(item).map(|b| b.to_string()).unwrap_or_default();
            let value = match self.state.current(item) {
                Some(value) => value.to_string(),
                None => "-".to_string(),
            };
            lines.push(format!("{item:<20} {binding:<24} {value}"));
        }
        if lines.is_empty() {
            lines.push("no items configured".to_string());
        }
        lines.join("\n")
    }
}
