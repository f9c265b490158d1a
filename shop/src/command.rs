//! Shell commands for the `cartflow` binary.

use crate::types::ProductId;
use std::str::FromStr;
use thiserror::Error;

/// Usage text printed by `help`
pub const HELP: &str = "\
Commands:
  login <email>      identify yourself
  logout             end the session (clears the cart)
  products           list the catalog
  add <id>           add one of a product to the cart
  remove <id>        remove a product from the cart
  qty <id> <n>       set a product's quantity (0 removes it)
  cart               show the cart
  checkout           go to the checkout page
  confirm            place the order (again to retry)
  back               return to the catalog
  suggest            ask the assistant for shopping tips
  metrics            print collected metrics
  help               show this text
  quit               exit";

/// A parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `login <email>`
    Login(String),
    /// `logout`
    Logout,
    /// `products`
    Products,
    /// `add <id>`
    Add(ProductId),
    /// `remove <id>`
    Remove(ProductId),
    /// `qty <id> <n>`
    Quantity(ProductId, i64),
    /// `cart`
    Cart,
    /// `checkout`
    Checkout,
    /// `confirm`
    Confirm,
    /// `back`
    Back,
    /// `suggest`
    Suggest,
    /// `metrics`
    Metrics,
    /// `help`
    Help,
    /// `quit` or `exit`
    Quit,
}

/// Shell parse errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Blank line
    #[error("empty command")]
    Empty,

    /// First word is not a command
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),

    /// Required argument missing
    #[error("usage: {0}")]
    MissingArgument(&'static str),

    /// Argument present but unusable
    #[error("invalid {what}: '{value}'")]
    InvalidArgument {
        /// Which argument
        what: &'static str,
        /// What was typed
        value: String,
    },
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CommandError::Empty);
        };

        let command = match name.to_ascii_lowercase().as_str() {
            // Emails have no spaces, but keep whatever was typed and let the
            // session decide.
            "login" => Self::Login(words.collect::<Vec<_>>().join(" ")),
            "logout" => Self::Logout,
            "products" | "ls" => Self::Products,
            "add" => Self::Add(product_id(words.next(), "add <id>")?),
            "remove" | "rm" => Self::Remove(product_id(words.next(), "remove <id>")?),
            "qty" => {
                let id = product_id(words.next(), "qty <id> <n>")?;
                let raw = words.next().ok_or(CommandError::MissingArgument("qty <id> <n>"))?;
                let quantity = raw.parse().map_err(|_| CommandError::InvalidArgument {
                    what: "quantity",
                    value: raw.to_string(),
                })?;
                Self::Quantity(id, quantity)
            },
            "cart" => Self::Cart,
            "checkout" => Self::Checkout,
            "confirm" | "retry" => Self::Confirm,
            "back" => Self::Back,
            "suggest" => Self::Suggest,
            "metrics" => Self::Metrics,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(command)
    }
}

fn product_id(word: Option<&str>, usage: &'static str) -> Result<ProductId, CommandError> {
    word.map(ProductId::from)
        .ok_or(CommandError::MissingArgument(usage))
}
