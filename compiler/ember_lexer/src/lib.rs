//! Preprocessor and tokenizer for Ember scripts.
//!
//! Loading a program runs two passes over its text before parsing:
//!
//! 1. [`preprocess`] strips comments, evaluates conditional blocks and
//!    expands `#define` macros. The output has exactly as many lines as the
//!    input, so every later line number refers to the original source.
//! 2. [`tokenize`] splits the preprocessed text into a flat vector of
//!    [`Token`](ember_ir::Token)s that borrow nothing: each token is a
//!    `(start, len)` window into the preprocessed buffer.
//!
//! Literal decoding helpers used by the parser live in [`escape`] and
//! [`number`].

mod condition;
mod cursor;
pub mod escape;
pub mod number;
mod preprocessor;
mod tokenizer;

pub use preprocessor::{preprocess, Macro, MacroTable};
pub use tokenizer::tokenize;
