//! Grammar productions, one module per family.
//!
//! All productions are `impl Parser` blocks; they share the cursor, the
//! parsing context and the registry through `self`.

mod decl;
mod expr;
mod literal;
mod stmt;
mod ty;
