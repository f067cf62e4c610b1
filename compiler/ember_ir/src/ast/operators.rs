//! Operator enums shared by the parser and the evaluator.

/// Binary operators (arithmetic, bitwise, comparison, logical).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinaryOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Mod,
            "<<" => Self::Shl,
            ">>" => Self::Shr,
            "&" => Self::BitAnd,
            "|" => Self::BitOr,
            "^" => Self::BitXor,
            "==" => Self::Eq,
            "!=" => Self::NotEq,
            "<" => Self::Lt,
            "<=" => Self::LtEq,
            ">" => Self::Gt,
            ">=" => Self::GtEq,
            "&&" => Self::And,
            "||" => Self::Or,
            _ => return None,
        })
    }

    /// Operator of a compound assignment (`+=` → `Add`).
    pub fn from_compound_assignment(symbol: &str) -> Option<Self> {
        symbol
            .strip_suffix('=')
            .filter(|base| !base.is_empty() && !matches!(*base, "=" | "!" | "<" | ">"))
            .and_then(Self::from_symbol)
    }

    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    /// Name of the overloadable function (`operator+`).
    pub fn operator_name(self) -> String {
        format!("operator{}", self.as_symbol())
    }

    #[inline]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq
        )
    }

    #[inline]
    pub const fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    /// Operators only defined on integral operands.
    #[inline]
    pub const fn is_integral_only(self) -> bool {
        matches!(
            self,
            Self::Mod | Self::Shl | Self::Shr | Self::BitAnd | Self::BitOr | Self::BitXor
        )
    }
}

/// Prefix and postfix unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    Plus,
    Negate,
    Not,
    BitNot,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
    Dereference,
    AddressOf,
}

impl UnaryOp {
    pub fn from_prefix(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => Self::Plus,
            "-" => Self::Negate,
            "!" => Self::Not,
            "~" => Self::BitNot,
            "++" => Self::PreIncrement,
            "--" => Self::PreDecrement,
            "*" => Self::Dereference,
            "&" => Self::AddressOf,
            _ => return None,
        })
    }

    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Negate => "-",
            Self::Not => "!",
            Self::BitNot => "~",
            Self::PreIncrement | Self::PostIncrement => "++",
            Self::PreDecrement | Self::PostDecrement => "--",
            Self::Dereference => "*",
            Self::AddressOf => "&",
        }
    }

    /// Operators that modify their operand in place.
    #[inline]
    pub const fn is_increment(self) -> bool {
        matches!(
            self,
            Self::PreIncrement | Self::PreDecrement | Self::PostIncrement | Self::PostDecrement
        )
    }
}

/// The four cast spellings.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CastKind {
    /// `(T)expr`
    CStyle,
    /// `static_cast<T>(expr)`
    Static,
    /// `dynamic_cast<T>(expr)`
    Dynamic,
    /// `reinterpret_cast<T>(expr)`
    Reinterpret,
    /// `const_cast<T>(expr)`
    Const,
}

impl CastKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "static_cast" => Self::Static,
            "dynamic_cast" => Self::Dynamic,
            "reinterpret_cast" => Self::Reinterpret,
            "const_cast" => Self::Const,
            _ => return None,
        })
    }
}
