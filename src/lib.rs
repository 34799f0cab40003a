//! # polyconv
//!
//! This is both an application and a library, the library can be used to achieve the same
//! functionalities of the polyconv binary, inside your application. The conversion itself lives in
//! the `polyconv-format` crate.

#[macro_use]
extern crate log;

pub mod error;
pub mod local;
pub mod opt;
pub mod prompt;

pub use local::*;
pub use opt::*;
