//! Command Handlers module
//!
//! Commands and the facade that runs each of them as one unit of work
//! against the state store.

mod commands;
mod facade;


pub use commands::*;
pub use facade::LedgerFacade;
