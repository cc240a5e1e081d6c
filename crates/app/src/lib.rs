//! The Lovent client's root object, cold-start routing and the `lovent`
//! command-line front end.

pub mod bootstrap;
pub mod cli;
pub mod startup;
pub mod state;
