//! reader and writer for the S-expression configuration dialect used by
//! every hand-authored and generated data file in the game.

pub mod atoms;
pub mod errors;
pub mod reader;
pub mod symbol;
pub mod token;
pub mod writer;

pub use atoms::Atoms;
pub use errors::Errors;
pub use reader::Reader;
pub use symbol::{Symbol, SYMBOL_CAP};
pub use token::Token;
pub use writer::Writer;
