//! The abstract syntax tree for the supported XPath 1.0 subset.

/// The top-level expression that can be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(String),
    Number(f64),
    LocationPath(LocationPath),
    FunctionCall {
        name: String,
        args: Vec<Expression>,
    },
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    UnaryOp {
        op: UnaryOperator,
        expr: Box<Expression>,
    },
}

impl Expression {
    pub fn is_location_path(&self) -> bool {
        matches!(self, Expression::LocationPath(_))
    }

    pub fn is_binary_op(&self) -> bool {
        matches!(self, Expression::BinaryOp { .. })
    }
}

/// A unary operator used in an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
}

/// A binary operator used in an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Logical
    Or,
    And,
    // Equality
    Equals,
    NotEquals,
    // Relational
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    // Additive
    Plus,
    Minus,
    // Multiplicative
    Multiply,
    Divide,
    Modulo,
    // Set
    Union,
}

/// A full location path, like `/catalog/book[1]` or `ancestor::section`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    /// True if the path starts from the document root (`/foo`, `//foo`).
    pub is_absolute: bool,
    pub steps: Vec<Step>,
}

/// A single step in a location path.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expression>,
    /// True when the axis was written out (`child::foo`) or implied by an
    /// abbreviation other than a bare name (`.`, `..`, `@foo`). A bare name
    /// step additionally matches the context elements themselves, which is
    /// what makes `/root/child` root-match.
    pub explicit_axis: bool,
}

impl Step {
    pub fn bare(node_test: NodeTest) -> Self {
        Step {
            axis: Axis::Child,
            node_test,
            predicates: Vec::new(),
            explicit_axis: false,
        }
    }

    pub fn with_axis(axis: Axis, node_test: NodeTest) -> Self {
        Step {
            axis,
            node_test,
            predicates: Vec::new(),
            explicit_axis: true,
        }
    }

    /// The implicit `descendant-or-self::node()` step inserted for `//`.
    pub fn descend() -> Self {
        Step::with_axis(Axis::DescendantOrSelf, NodeTest::Node)
    }
}

/// The axis of movement from the context node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Attribute,
    Parent,
    Ancestor,
    AncestorOrSelf,
    SelfAxis,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
}

/// A test applied to nodes on an axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// A name test, matched against the qualified or the local name.
    Name(String),
    /// `*`: any element.
    Wildcard,
    /// `prefix:*`: any element carrying that prefix.
    PrefixWildcard(String),
    /// `node()`-style any-node test; only produced internally for `//`.
    Node,
}
