use crate::types::ValueDomain;

/// Errors surfaced by tree creation and engine entry points.
///
/// Duplicate inserts and removals of absent values are not errors; they are
/// `false` outcomes of the step sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The requested order is below the minimum of 3.
    InvalidConfiguration { order: usize },
    /// The value does not belong to the tree's domain.
    InvalidValue { input: String, domain: ValueDomain },
}

impl std::fmt::Display for TreeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfiguration { order } => {
                write!(f, "invalid order {order}: a tree needs an order of at least 3")
            }
            Self::InvalidValue { input, domain } => {
                write!(f, "invalid value '{input}' for a {domain} tree")
            }
        }
    }
}

impl std::error::Error for TreeError {}

/// A broken structural invariant, found by [`Tree::validate`].
///
/// Seeing one of these means an engine has a bug.
///
/// [`Tree::validate`]: crate::tree::Tree::validate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureError {
    pub node: Option<super::NodeId>,
    pub message: String,
}

impl StructureError {
    pub(crate) fn at(node: super::NodeId, message: impl Into<String>) -> Self {
        Self {
            node: Some(node),
            message: message.into(),
        }
    }

    pub(crate) fn tree(message: impl Into<String>) -> Self {
        Self {
            node: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StructureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.node {
            Some(node) => write!(f, "node {node}: {}", self.message),
            None => write!(f, "tree: {}", self.message),
        }
    }
}

impl std::error::Error for StructureError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeId;

    #[test]
    fn test_tree_error_display() {
        let error = TreeError::InvalidConfiguration { order: 2 };
        assert_eq!(
            error.to_string(),
            "invalid order 2: a tree needs an order of at least 3"
        );

        let error = TreeError::InvalidValue {
            input: "abc".to_string(),
            domain: ValueDomain::Numeric,
        };
        assert_eq!(error.to_string(), "invalid value 'abc' for a number tree");
    }

    #[test]
    fn test_structure_error_display() {
        assert_eq!(
            StructureError::at(NodeId(4), "keys out of order").to_string(),
            "node #4: keys out of order"
        );
        assert_eq!(
            StructureError::tree("leaked node").to_string(),
            "tree: leaked node"
        );
    }
}
