//! Command-line front end for the nsredis facade.
//!
//! The binary only parses arguments and connects; [`run::execute`] works
//! against any [`nsredis::Store`] so commands can be exercised with the
//! in-memory backend.

pub mod cli;
pub mod output;
pub mod run;
