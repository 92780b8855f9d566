// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Bound expressions
//!
//! Expressions reach the execution layer fully bound: every column reference
//! already points at a vector position of the pipeline's result set and every
//! node carries its resolved type. Evaluators are built from these by
//! [`ExpressionMapper`](crate::evaluator::ExpressionMapper).

use crate::functions::comparison::ComparisonKind;
use crate::functions::names;
use crate::storage::Value;
use crate::types::LogicalType;
use crate::vector::DataPos;
use std::fmt;

/// List lambda functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LambdaKind {
    /// `list_transform(list, x -> body)`
    Transform,
    /// `list_filter(list, x -> predicate)`
    Filter,
    /// `list_any(list, x -> predicate)`
    Any,
    /// `list_all(list, x -> predicate)`
    All,
}

impl LambdaKind {
    pub fn function_name(self) -> &'static str {
        match self {
            LambdaKind::Transform => "LIST_TRANSFORM",
            LambdaKind::Filter => "LIST_FILTER",
            LambdaKind::Any => "LIST_ANY",
            LambdaKind::All => "LIST_ALL",
        }
    }
}

/// One `WHEN ... THEN ...` pair
#[derive(Debug, Clone, PartialEq)]
pub struct CaseAlternative {
    pub when: Expression,
    pub then: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal {
        value: Value,
        data_type: LogicalType,
    },
    /// Vector produced by an upstream operator
    Column {
        name: String,
        pos: DataPos,
        data_type: LogicalType,
    },
    Function {
        name: String,
        children: Vec<Expression>,
        return_type: LogicalType,
    },
    Case {
        alternatives: Vec<CaseAlternative>,
        else_expr: Box<Expression>,
        data_type: LogicalType,
    },
    /// Node value assembled from its id, label and property expressions
    Node {
        name: String,
        id: Box<Expression>,
        label: Box<Expression>,
        properties: Vec<(String, Expression)>,
    },
    /// Relationship value assembled from id, label, endpoints and properties
    Rel {
        name: String,
        id: Box<Expression>,
        label: Box<Expression>,
        src: Box<Expression>,
        dst: Box<Expression>,
        properties: Vec<(String, Expression)>,
    },
    /// Path over node, relationship and recursive relationship children
    Path {
        name: String,
        children: Vec<Expression>,
    },
    /// Parameter of the enclosing list lambda
    LambdaParam {
        name: String,
        data_type: LogicalType,
    },
    ListLambda {
        kind: LambdaKind,
        list: Box<Expression>,
        param: String,
        body: Box<Expression>,
        data_type: LogicalType,
    },
}

impl Expression {
    /// Literal typed after its value; use [`Expression::null`] for NULL
    pub fn literal(value: impl Into<Value>) -> Self {
        let value = value.into();
        let data_type = value.logical_type().unwrap_or(LogicalType::Int64);
        Expression::Literal { value, data_type }
    }

    pub fn null(data_type: LogicalType) -> Self {
        Expression::Literal {
            value: Value::Null,
            data_type,
        }
    }

    pub fn column(name: impl Into<String>, pos: DataPos, data_type: LogicalType) -> Self {
        Expression::Column {
            name: name.into(),
            pos,
            data_type,
        }
    }

    pub fn function(
        name: impl Into<String>,
        children: Vec<Expression>,
        return_type: LogicalType,
    ) -> Self {
        Expression::Function {
            name: name.into(),
            children,
            return_type,
        }
    }

    pub fn comparison(kind: ComparisonKind, left: Expression, right: Expression) -> Self {
        Self::function(kind.function_name(), vec![left, right], LogicalType::Bool)
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::function(names::AND, vec![left, right], LogicalType::Bool)
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Self::function(names::OR, vec![left, right], LogicalType::Bool)
    }

    pub fn not(child: Expression) -> Self {
        Self::function(names::NOT, vec![child], LogicalType::Bool)
    }

    pub fn is_null(child: Expression) -> Self {
        Self::function(names::IS_NULL, vec![child], LogicalType::Bool)
    }

    pub fn is_not_null(child: Expression) -> Self {
        Self::function(names::IS_NOT_NULL, vec![child], LogicalType::Bool)
    }

    pub fn cast(child: Expression, target: LogicalType) -> Self {
        Self::function(names::CAST, vec![child], target)
    }

    pub fn case(
        alternatives: Vec<(Expression, Expression)>,
        else_expr: Expression,
        data_type: LogicalType,
    ) -> Self {
        Expression::Case {
            alternatives: alternatives
                .into_iter()
                .map(|(when, then)| CaseAlternative { when, then })
                .collect(),
            else_expr: Box::new(else_expr),
            data_type,
        }
    }

    pub fn list_lambda(
        kind: LambdaKind,
        list: Expression,
        param: impl Into<String>,
        body: Expression,
    ) -> Self {
        let data_type = match kind {
            LambdaKind::Transform => LogicalType::List(Box::new(body.data_type())),
            LambdaKind::Filter => list.data_type(),
            LambdaKind::Any | LambdaKind::All => LogicalType::Bool,
        };
        Expression::ListLambda {
            kind,
            list: Box::new(list),
            param: param.into(),
            body: Box::new(body),
            data_type,
        }
    }

    pub fn data_type(&self) -> LogicalType {
        match self {
            Expression::Literal { data_type, .. }
            | Expression::Column { data_type, .. }
            | Expression::Case { data_type, .. }
            | Expression::LambdaParam { data_type, .. }
            | Expression::ListLambda { data_type, .. } => data_type.clone(),
            Expression::Function { return_type, .. } => return_type.clone(),
            Expression::Node { .. } => LogicalType::Node,
            Expression::Rel { .. } => LogicalType::Rel,
            Expression::Path { .. } => LogicalType::RecursiveRel,
        }
    }

    /// Name of the function when this is a function call
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Expression::Function { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Literal { .. }
            | Expression::Column { .. }
            | Expression::LambdaParam { .. } => Vec::new(),
            Expression::Function { children, .. } | Expression::Path { children, .. } => {
                children.iter().collect()
            }
            Expression::Case {
                alternatives,
                else_expr,
                ..
            } => alternatives
                .iter()
                .flat_map(|alt| [&alt.when, &alt.then])
                .chain(std::iter::once(else_expr.as_ref()))
                .collect(),
            Expression::Node {
                id,
                label,
                properties,
                ..
            } => [id.as_ref(), label.as_ref()]
                .into_iter()
                .chain(properties.iter().map(|(_, e)| e))
                .collect(),
            Expression::Rel {
                id,
                label,
                src,
                dst,
                properties,
                ..
            } => [id.as_ref(), label.as_ref(), src.as_ref(), dst.as_ref()]
                .into_iter()
                .chain(properties.iter().map(|(_, e)| e))
                .collect(),
            Expression::ListLambda { list, body, .. } => vec![list.as_ref(), body.as_ref()],
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal { value, .. } => match value {
                Value::String(s) => write!(f, "'{}'", s),
                other => write!(f, "{}", other),
            },
            Expression::Column { name, .. } | Expression::LambdaParam { name, .. } => {
                write!(f, "{}", name)
            }
            Expression::Function { name, children, .. } => {
                write!(f, "{}(", name)?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            Expression::Case {
                alternatives,
                else_expr,
                ..
            } => {
                write!(f, "CASE")?;
                for alt in alternatives {
                    write!(f, " WHEN {} THEN {}", alt.when, alt.then)?;
                }
                write!(f, " ELSE {} END", else_expr)
            }
            Expression::Node { name, .. }
            | Expression::Rel { name, .. }
            | Expression::Path { name, .. } => write!(f, "{}", name),
            Expression::ListLambda {
                kind,
                list,
                param,
                body,
                ..
            } => write!(f, "{}({}, {} -> {})", kind.function_name(), list, param, body),
        }
    }
}
