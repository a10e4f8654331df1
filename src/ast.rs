//! # Condition Language - Abstract Syntax Tree
//!
//! A condition is a flat sequence of operands joined by binary operators,
//! with parentheses for explicit grouping:
//!
//! ```text
//! [user][age] >= 18 AND [user][country] IN ["DE", "FR"] OR admin == TRUE
//! ```
//!
//! ## Submodules
//!
//! - **[tokens]** - Tokens produced by the tokenizer
//! - **[expressions]** - Expression nodes and sub-query references
//! - **[operators]** - Binary operators
//!
//! ## Operands
//!
//! - Strings: `"text"`, `'text'` or `/pattern/`
//! - Numbers: `42`, `-1.5`, `2e3`
//! - Booleans: `TRUE`, `FALSE`, `NOT TRUE`, `NOT FALSE`
//! - Arrays (right side of `IN` / `NOT IN` only): `["a", "b"]`, `[1.5, 2]`
//! - Variables: `name`, `$0`, `[user][name]` (looked up as `user.name`)
//! - Sub-queries: `$jq(.user.age)`, `$jq[last](.items[])`, `$jq[array](.tags[])`
//!
//! ## Precedence
//!
//! From loosest to tightest: `OR`/`XOR`, then `AND`/`NAND`, then every
//! comparison and membership operator. Operators of equal precedence group
//! left to right.
//!
//! ## Immutability
//!
//! A parsed [`Expr`] is never modified by evaluation. Compiled sub-queries are
//! shared through `Arc`, so one tree can be evaluated from many threads.
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{Expr, Pattern, SubQuery, SubQueryMode};
pub use operators::BinOp;
pub use tokens::{SubQuerySource, Token};
