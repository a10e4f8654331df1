//! Parser configuration.
//!
//! Operator precedence is chosen per parser through [`ParserConfig`] rather
//! than through process-wide state, so parsers with different settings can run
//! side by side.

use crate::ast::BinOp;

/// Operator groups from loosest to tightest binding. The level of a group is
/// its position in this table plus one.
const LEVELS: [&[BinOp]; 3] = [
    &[BinOp::Or, BinOp::Xor],
    &[BinOp::And, BinOp::Nand],
    &[
        BinOp::Equal,
        BinOp::NotEqual,
        BinOp::LessThan,
        BinOp::LessEqual,
        BinOp::GreaterThan,
        BinOp::GreaterEqual,
        BinOp::Match,
        BinOp::NotMatch,
        BinOp::In,
        BinOp::NotIn,
    ],
];

/// Strategy used to compute an operator's precedence level.
///
/// Both strategies produce the same three levels; they differ only in how the
/// level is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrecedenceVersion {
    /// Version 1: explicit match per operator
    #[default]
    Direct,
    /// Version 0: lookup in the table of operator groups
    Ranged,
}

impl PrecedenceVersion {
    /// Maps a numeric version to a strategy. Unknown versions fall back to
    /// the default.
    pub fn from_version(version: i64) -> Self {
        match version {
            0 => PrecedenceVersion::Ranged,
            1 => PrecedenceVersion::Direct,
            other => {
                log::warn!("unknown precedence version {other}, using the default");
                PrecedenceVersion::default()
            }
        }
    }

    pub fn version(self) -> i64 {
        match self {
            PrecedenceVersion::Ranged => 0,
            PrecedenceVersion::Direct => 1,
        }
    }

    /// Precedence level of `op`; a higher level binds tighter.
    pub fn precedence(self, op: BinOp) -> u8 {
        match self {
            PrecedenceVersion::Direct => direct_precedence(op),
            PrecedenceVersion::Ranged => ranged_precedence(op),
        }
    }
}

fn direct_precedence(op: BinOp) -> u8 {
    use BinOp::*;
    match op {
        Or | Xor => 1,
        And | Nand => 2,
        Equal | NotEqual | LessThan | LessEqual | GreaterThan | GreaterEqual | Match
        | NotMatch | In | NotIn => 3,
    }
}

fn ranged_precedence(op: BinOp) -> u8 {
    LEVELS
        .iter()
        .zip(1u8..)
        .find_map(|(group, level)| group.contains(&op).then_some(level))
        .unwrap_or(0)
}

/// Default limit on nested parentheses.
pub const DEFAULT_MAX_NESTING: usize = 64;

/// Settings that influence how conditions are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    pub precedence: PrecedenceVersion,

    /// Deepest allowed parenthesis nesting. Chains of operators are not
    /// limited, only groups opened inside groups.
    pub max_nesting: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            precedence: PrecedenceVersion::default(),
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

impl ParserConfig {
    pub fn with_precedence(mut self, precedence: PrecedenceVersion) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }
}
