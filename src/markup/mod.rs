//! Reader for interface markup documents

mod grammar;
pub mod lexer;
pub mod tree;

pub use grammar::parse;
pub use tree::*;
