use std::fmt;
use std::str::FromStr;

/// Which balanced-tree algorithm a tree follows.
///
/// - `B`: values may live in internal nodes; a match anywhere ends a search.
/// - `BPlus`: internal nodes only route; values live in leaves, which are
///   chained in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    B,
    BPlus,
}

impl Variant {
    /// Minimum key count of a non-root node for a tree of the given order.
    #[must_use]
    pub const fn min_keys(self, order: usize, leaf: bool) -> usize {
        match (self, leaf) {
            (Self::BPlus, true) => order.div_ceil(2),
            _ => (order + 1).div_ceil(2) - 1,
        }
    }

    /// Whether leaves carry a next-leaf link.
    #[must_use]
    pub const fn links_leaves(self) -> bool {
        matches!(self, Self::BPlus)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::B => "b",
            Self::BPlus => "bplus",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "b" | "btree" => Ok(Self::B),
            "bplus" | "b+" | "bptree" => Ok(Self::BPlus),
            other => Err(format!("unknown tree variant '{other}' (expected b or bplus)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_keys_b() {
        assert_eq!(Variant::B.min_keys(3, true), 1);
        assert_eq!(Variant::B.min_keys(4, false), 2);
        assert_eq!(Variant::B.min_keys(5, true), 2);
        assert_eq!(Variant::B.min_keys(6, true), 3);
    }

    #[test]
    fn test_min_keys_bplus() {
        // Leaves follow ceil(order / 2); routing nodes follow the B formula.
        assert_eq!(Variant::BPlus.min_keys(3, true), 2);
        assert_eq!(Variant::BPlus.min_keys(3, false), 1);
        assert_eq!(Variant::BPlus.min_keys(4, true), 2);
        assert_eq!(Variant::BPlus.min_keys(5, true), 3);
        assert_eq!(Variant::BPlus.min_keys(5, false), 2);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("B".parse::<Variant>(), Ok(Variant::B));
        assert_eq!("b+".parse::<Variant>(), Ok(Variant::BPlus));
        assert!("avl".parse::<Variant>().is_err());
    }
}
