// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Builds evaluator trees from bound expressions

use super::{
    CaseAlternativeEvaluator, CaseEvaluator, ExpressionEvaluator, FunctionEvaluator,
    LambdaParamEvaluator, ListLambdaEvaluator, LiteralEvaluator, NodeRelEvaluator, PathEvaluator,
    ReferenceEvaluator,
};
use crate::exec::{ExecutionError, ExecutionResult};
use crate::expression::Expression;
use crate::functions::FunctionRegistry;
use crate::storage::value::{DST_FIELD, ID_FIELD, LABEL_FIELD, SRC_FIELD};
use crate::types::LogicalType;

#[derive(Debug, Clone, Copy)]
pub struct ExpressionMapper<'a> {
    registry: &'a FunctionRegistry,
    /// Parameter name of the innermost enclosing lambda
    lambda_param: Option<&'a str>,
}

impl Default for ExpressionMapper<'static> {
    fn default() -> Self {
        Self::new(FunctionRegistry::global())
    }
}

impl<'a> ExpressionMapper<'a> {
    pub fn new(registry: &'a FunctionRegistry) -> Self {
        Self {
            registry,
            lambda_param: None,
        }
    }

    /// Map with the built-in function registry
    pub fn map_expression(expression: &Expression) -> ExecutionResult<ExpressionEvaluator> {
        ExpressionMapper::default().map(expression)
    }

    pub fn map(&self, expression: &Expression) -> ExecutionResult<ExpressionEvaluator> {
        match expression {
            Expression::Literal { value, data_type } => Ok(ExpressionEvaluator::Literal(
                LiteralEvaluator::new(value.clone(), data_type.clone()),
            )),
            Expression::Column {
                name,
                pos,
                data_type,
            } => {
                if self.lambda_param.is_some() {
                    return Err(ExecutionError::InvalidPlan(format!(
                        "lambda body references column {} outside the lambda",
                        name
                    )));
                }
                Ok(ExpressionEvaluator::Reference(ReferenceEvaluator::new(
                    *pos,
                    data_type.clone(),
                )))
            }
            Expression::Function {
                name,
                children,
                return_type,
            } => {
                let function = self.registry.resolve(name, children.len())?;
                let children = self.map_all(children)?;
                Ok(ExpressionEvaluator::Function(FunctionEvaluator::new(
                    function,
                    children,
                    return_type.clone(),
                )))
            }
            Expression::Case {
                alternatives,
                else_expr,
                data_type,
            } => {
                let alternatives = alternatives
                    .iter()
                    .map(|alt| {
                        Ok(CaseAlternativeEvaluator::new(
                            self.map(&alt.when)?,
                            self.map(&alt.then)?,
                        ))
                    })
                    .collect::<ExecutionResult<Vec<_>>>()?;
                Ok(ExpressionEvaluator::Case(CaseEvaluator::new(
                    alternatives,
                    self.map(else_expr)?,
                    data_type.clone(),
                )))
            }
            Expression::Node {
                id,
                label,
                properties,
                ..
            } => {
                let mut names = vec![ID_FIELD.to_string(), LABEL_FIELD.to_string()];
                let mut children = vec![self.map(id)?, self.map(label)?];
                for (name, property) in properties {
                    names.push(name.clone());
                    children.push(self.map(property)?);
                }
                Ok(ExpressionEvaluator::NodeRel(NodeRelEvaluator::new(
                    LogicalType::Node,
                    names,
                    children,
                )))
            }
            Expression::Rel {
                id,
                label,
                src,
                dst,
                properties,
                ..
            } => {
                let mut names = vec![
                    ID_FIELD.to_string(),
                    LABEL_FIELD.to_string(),
                    SRC_FIELD.to_string(),
                    DST_FIELD.to_string(),
                ];
                let mut children = vec![
                    self.map(id)?,
                    self.map(label)?,
                    self.map(src)?,
                    self.map(dst)?,
                ];
                for (name, property) in properties {
                    names.push(name.clone());
                    children.push(self.map(property)?);
                }
                Ok(ExpressionEvaluator::NodeRel(NodeRelEvaluator::new(
                    LogicalType::Rel,
                    names,
                    children,
                )))
            }
            Expression::Path { name, children } => {
                if let Some(child) = children.iter().find(|child| {
                    !matches!(
                        child.data_type(),
                        LogicalType::Node | LogicalType::Rel | LogicalType::RecursiveRel
                    )
                }) {
                    return Err(ExecutionError::InvalidPlan(format!(
                        "path {} has a {} child",
                        name,
                        child.data_type()
                    )));
                }
                Ok(ExpressionEvaluator::Path(PathEvaluator::new(
                    self.map_all(children)?,
                )))
            }
            Expression::LambdaParam { name, data_type } => match self.lambda_param {
                Some(param) if param == name => Ok(ExpressionEvaluator::LambdaParam(
                    LambdaParamEvaluator::new(name.clone(), data_type.clone()),
                )),
                _ => Err(ExecutionError::InvalidPlan(format!(
                    "lambda parameter {} used outside its lambda",
                    name
                ))),
            },
            Expression::ListLambda {
                kind,
                list,
                param,
                body,
                data_type,
            } => {
                let list = self.map(list)?;
                let body_mapper = ExpressionMapper {
                    registry: self.registry,
                    lambda_param: Some(param.as_str()),
                };
                let body = body_mapper.map(body)?;
                Ok(ExpressionEvaluator::ListLambda(ListLambdaEvaluator::new(
                    *kind,
                    list,
                    body,
                    data_type.clone(),
                )?))
            }
        }
    }

    fn map_all(&self, expressions: &[Expression]) -> ExecutionResult<Vec<ExpressionEvaluator>> {
        expressions.iter().map(|e| self.map(e)).collect()
    }
}
