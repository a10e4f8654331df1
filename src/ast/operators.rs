use std::fmt;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    // Logical, loosest
    /// Logical OR (`OR`)
    Or,
    /// Exclusive OR (`XOR`)
    Xor,

    // Logical
    /// Logical AND (`AND`)
    And,
    /// Negated AND (`NAND`)
    Nand,

    // Comparison and membership, tightest
    /// Equal (`==`)
    Equal,
    /// Not equal (`!=`)
    NotEqual,
    /// Less than (`<`)
    LessThan,
    /// Less than or equal (`<=`)
    LessEqual,
    /// Greater than (`>`)
    GreaterThan,
    /// Greater than or equal (`>=`)
    GreaterEqual,
    /// Regular expression match (`=~`)
    Match,
    /// Negated regular expression match (`!~`)
    NotMatch,
    /// Membership (`IN`)
    In,
    /// Negated membership (`NOT IN`)
    NotIn,
}

impl BinOp {
    /// Surface spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Or => "OR",
            BinOp::Xor => "XOR",
            BinOp::And => "AND",
            BinOp::Nand => "NAND",
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::LessThan => "<",
            BinOp::LessEqual => "<=",
            BinOp::GreaterThan => ">",
            BinOp::GreaterEqual => ">=",
            BinOp::Match => "=~",
            BinOp::NotMatch => "!~",
            BinOp::In => "IN",
            BinOp::NotIn => "NOT IN",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
