//! Expression tree definitions.

use std::fmt;

use crate::catalog::OperatorId;
use crate::diagnostics::Position;
use crate::types::{CollationId, DataTypeDescriptor, Domain, TypeTag};
use crate::value::Value;

/// Column reference in an expression
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    /// Column name for display
    pub name: String,
    /// Declared type of the column
    pub domain: Domain,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>, domain: Domain) -> Self {
        Self {
            name: name.into(),
            domain,
        }
    }
}

/// Kind of a collection constructor (`{1, 2}` and friends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Set,
    Multiset,
    Sequence,
}

impl CollectionKind {
    pub fn tag(self) -> TypeTag {
        match self {
            CollectionKind::Set => TypeTag::Set,
            CollectionKind::Multiset => TypeTag::Multiset,
            CollectionKind::Sequence => TypeTag::Sequence,
        }
    }

    pub fn from_tag(tag: TypeTag) -> Option<Self> {
        match tag {
            TypeTag::Set => Some(CollectionKind::Set),
            TypeTag::Multiset => Some(CollectionKind::Multiset),
            TypeTag::Sequence => Some(CollectionKind::Sequence),
            _ => None,
        }
    }
}

/// Shape of an expression node
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Literal constant value
    Literal(Value),

    /// Column reference
    Column(ColumnRef),

    /// Host parameter (`?`), bound after compilation
    HostParameter { index: usize },

    /// Scalar or row-set subquery; a correlated one is typed at run time
    Subquery { correlated: bool },

    /// Operator or function application with up to three arguments
    Operation { op: OperatorId, args: Vec<Expr> },

    /// Collection constructor
    Collection { kind: CollectionKind, items: Vec<Expr> },

    /// Conversion of the operand to the node's own type
    Cast { operand: Box<Expr> },
}

/// Expression tree node
///
/// Nodes are built untyped (`resolved_type == NONE`) except for leaves whose
/// type is known up front, and are typed in place by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub resolved_type: TypeTag,
    pub descriptor: Option<DataTypeDescriptor>,
    /// Target for a late-bound value, applied when the value is bound
    pub expected_domain: Option<Domain>,
    pub position: Position,
    pub alias: Option<String>,
    /// Collation named by an explicit COLLATE clause
    pub collate_modifier: Option<CollationId>,
}

impl Default for Expr {
    /// A NULL literal; used as a placeholder while a slot is rebound.
    fn default() -> Self {
        Self::new(ExprKind::Literal(Value::Null), TypeTag::Null, None)
    }
}

impl Expr {
    fn new(kind: ExprKind, resolved_type: TypeTag, descriptor: Option<DataTypeDescriptor>) -> Self {
        Self {
            kind,
            resolved_type,
            descriptor,
            expected_domain: None,
            position: Position::default(),
            alias: None,
            collate_modifier: None,
        }
    }

    /// Create a literal expression typed by its value
    pub fn literal(value: Value) -> Self {
        let tag = value.tag();
        Self::new(ExprKind::Literal(value), tag, None)
    }

    /// Create a literal expression with an explicit type
    pub fn typed_literal(value: Value, domain: Domain) -> Self {
        Self::new(ExprKind::Literal(value), domain.tag, domain.descriptor)
    }

    pub fn null() -> Self {
        Self::literal(Value::Null)
    }

    /// Create a column reference expression
    pub fn column(name: impl Into<String>, domain: Domain) -> Self {
        let tag = domain.tag;
        let descriptor = domain.descriptor.clone();
        Self::new(ExprKind::Column(ColumnRef::new(name, domain)), tag, descriptor)
    }

    /// Create an unbound host parameter
    pub fn parameter(index: usize) -> Self {
        Self::new(ExprKind::HostParameter { index }, TypeTag::Maybe, None)
    }

    /// Create a subquery producing values of `domain`
    pub fn subquery(domain: Domain, correlated: bool) -> Self {
        if correlated {
            return Self::new(ExprKind::Subquery { correlated }, TypeTag::Maybe, None);
        }
        Self::new(ExprKind::Subquery { correlated }, domain.tag, domain.descriptor)
    }

    /// Create an operator application
    pub fn operation(op: OperatorId, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Operation { op, args }, TypeTag::None, None)
    }

    pub fn unary(op: OperatorId, operand: Expr) -> Self {
        Self::operation(op, vec![operand])
    }

    pub fn binary(op: OperatorId, left: Expr, right: Expr) -> Self {
        Self::operation(op, vec![left, right])
    }

    pub fn ternary(op: OperatorId, first: Expr, second: Expr, third: Expr) -> Self {
        Self::operation(op, vec![first, second, third])
    }

    /// Nest an n-ary call as a left-deep chain of binary nodes.
    ///
    /// Returns the single argument unchanged when only one is given.
    pub fn chain(op: OperatorId, args: Vec<Expr>) -> Option<Self> {
        let mut args = args.into_iter();
        let first = args.next()?;
        Some(args.fold(first, |acc, next| Self::binary(op, acc, next)))
    }

    /// Create a collection constructor
    pub fn collection(kind: CollectionKind, items: Vec<Expr>) -> Self {
        Self::new(ExprKind::Collection { kind, items }, kind.tag(), None)
    }

    /// Create a conversion of `operand` to `target`
    pub fn cast(operand: Expr, target: Domain) -> Self {
        let position = operand.position;
        let mut cast = Self::new(
            ExprKind::Cast {
                operand: Box::new(operand),
            },
            target.tag,
            target.descriptor,
        );
        cast.position = position;
        cast
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Attach a COLLATE clause
    pub fn with_collate(mut self, collation: CollationId) -> Self {
        self.collate_modifier = Some(collation);
        self
    }

    pub fn with_descriptor(mut self, descriptor: DataTypeDescriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    /// The node's type and descriptor as a domain
    pub fn domain(&self) -> Domain {
        Domain {
            tag: self.resolved_type,
            descriptor: self.descriptor.clone(),
        }
    }

    pub fn op(&self) -> Option<OperatorId> {
        match &self.kind {
            ExprKind::Operation { op, .. } => Some(*op),
            _ => None,
        }
    }

    /// Arguments of an operation; empty for other kinds.
    pub fn args(&self) -> &[Expr] {
        match &self.kind {
            ExprKind::Operation { args, .. } => args,
            _ => &[],
        }
    }

    pub fn args_mut(&mut self) -> Option<&mut Vec<Expr>> {
        match &mut self.kind {
            ExprKind::Operation { args, .. } => Some(args),
            _ => None,
        }
    }

    /// Direct children in evaluation order
    pub fn children_mut(&mut self) -> Vec<&mut Expr> {
        match &mut self.kind {
            ExprKind::Operation { args, .. } => args.iter_mut().collect(),
            ExprKind::Collection { items, .. } => items.iter_mut().collect(),
            ExprKind::Cast { operand } => vec![operand.as_mut()],
            _ => Vec::new(),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(_))
    }

    pub fn literal_value(&self) -> Option<&Value> {
        match &self.kind {
            ExprKind::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Whether the node's value is only known once parameters are bound or
    /// the enclosing row is available.
    pub fn is_late_bound(&self) -> bool {
        self.resolved_type == TypeTag::Maybe
    }

    /// Whether the node is a column reference, possibly under casts.
    pub fn is_column(&self) -> bool {
        match &self.kind {
            ExprKind::Column(_) => true,
            ExprKind::Cast { operand } => operand.is_column(),
            _ => false,
        }
    }

    /// Whether the subtree contains only literals and operators over them.
    pub fn is_constant(&self) -> bool {
        match &self.kind {
            ExprKind::Literal(_) => true,
            ExprKind::Column(_) | ExprKind::HostParameter { .. } | ExprKind::Subquery { .. } => {
                false
            }
            ExprKind::Operation { args, .. } => args.iter().all(Expr::is_constant),
            ExprKind::Collection { items, .. } => items.iter().all(Expr::is_constant),
            ExprKind::Cast { operand } => operand.is_constant(),
        }
    }

    /// Number of nodes in the subtree
    pub fn node_count(&self) -> usize {
        let children = match &self.kind {
            ExprKind::Operation { args, .. } => args.iter().map(Expr::node_count).sum(),
            ExprKind::Collection { items, .. } => items.iter().map(Expr::node_count).sum(),
            ExprKind::Cast { operand } => operand.node_count(),
            _ => 0,
        };
        1 + children
    }
}

impl fmt::Display for Expr {
    /// SQL-like rendering used in messages.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(value) => write!(f, "{value}"),
            ExprKind::Column(column) => write!(f, "{}", column.name),
            ExprKind::HostParameter { index } => write!(f, "?{index}"),
            ExprKind::Subquery { .. } => write!(f, "(subquery)"),
            ExprKind::Collection { kind, items } => {
                let keyword = match kind {
                    CollectionKind::Set => "SET",
                    CollectionKind::Multiset => "MULTISET",
                    CollectionKind::Sequence => "SEQUENCE",
                };
                write!(f, "{keyword}{{{}}}", join(items))
            }
            ExprKind::Cast { operand } => write!(f, "CAST({operand} AS {})", self.domain()),
            ExprKind::Operation { op, args } => fmt_operation(f, *op, args),
        }?;
        if let Some(collation) = self.collate_modifier {
            write!(f, " COLLATE {collation}")?;
        }
        Ok(())
    }
}

fn fmt_operation(f: &mut fmt::Formatter<'_>, op: OperatorId, args: &[Expr]) -> fmt::Result {
    match (op, args) {
        (OperatorId::IsNull | OperatorId::IsNotNull, [operand]) => write!(f, "{operand} {op}"),
        (OperatorId::Between | OperatorId::NotBetween, [a, low, high]) => {
            write!(f, "({a} {op} {low} AND {high})")
        }
        (_, [operand]) if !op.is_function() => write!(f, "{op}{operand}"),
        (_, [left, right]) if !op.is_function() => write!(f, "({left} {op} {right})"),
        _ => write!(f, "{}({})", op.name(), join(args)),
    }
}

fn join(items: &[Expr]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
