// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Scalar functions invoked by function evaluators
//!
//! Add a function by implementing [`ScalarFunction`] and registering it in
//! [`FunctionRegistry::new`]. Lookups are case-insensitive.

mod arithmetic_functions;
mod boolean;
pub mod cast_functions;
pub mod comparison;
mod function_trait;
mod list_functions;
mod null_functions;
mod string_functions;

pub use comparison::ComparisonKind;
pub use function_trait::{
    execute_function, Arity, FunctionError, FunctionInput, FunctionResult, NullHandling,
    ScalarFunction,
};

use arithmetic_functions::ArithmeticOp;
use boolean::BooleanOp;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use string_functions::{CaseConversion, StringMatch};

/// Canonical function names
pub mod names {
    pub const EQUALS: &str = "EQUALS";
    pub const NOT_EQUALS: &str = "NOT_EQUALS";
    pub const GREATER_THAN: &str = "GREATER_THAN";
    pub const GREATER_THAN_EQUALS: &str = "GREATER_THAN_EQUALS";
    pub const LESS_THAN: &str = "LESS_THAN";
    pub const LESS_THAN_EQUALS: &str = "LESS_THAN_EQUALS";

    pub const AND: &str = "AND";
    pub const OR: &str = "OR";
    pub const XOR: &str = "XOR";
    pub const NOT: &str = "NOT";

    pub const IS_NULL: &str = "IS_NULL";
    pub const IS_NOT_NULL: &str = "IS_NOT_NULL";
    pub const COALESCE: &str = "COALESCE";
    pub const CAST: &str = "CAST";

    pub const ADD: &str = "ADD";
    pub const SUBTRACT: &str = "SUBTRACT";
    pub const MULTIPLY: &str = "MULTIPLY";
    pub const DIVIDE: &str = "DIVIDE";
    pub const MODULO: &str = "MODULO";
    pub const NEGATE: &str = "NEGATE";
    pub const ABS: &str = "ABS";

    pub const LOWER: &str = "LOWER";
    pub const UPPER: &str = "UPPER";
    pub const CONCAT: &str = "CONCAT";
    pub const CONTAINS: &str = "CONTAINS";
    pub const STARTS_WITH: &str = "STARTS_WITH";
    pub const ENDS_WITH: &str = "ENDS_WITH";
    pub const REGEXP_MATCHES: &str = "REGEXP_MATCHES";

    pub const SIZE: &str = "SIZE";
    pub const LIST_CREATION: &str = "LIST_CREATION";
    pub const LIST_EXTRACT: &str = "LIST_EXTRACT";
    pub const LIST_CONTAINS: &str = "LIST_CONTAINS";
}

static GLOBAL_REGISTRY: Lazy<FunctionRegistry> = Lazy::new(FunctionRegistry::new);

/// Registry of all available scalar functions
#[derive(Debug)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn ScalarFunction>>,
}

impl FunctionRegistry {
    /// Create a registry holding the built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };

        for kind in ComparisonKind::ALL {
            registry.register(Arc::new(comparison::ComparisonFunction::new(kind)));
        }
        for op in [BooleanOp::And, BooleanOp::Or, BooleanOp::Xor, BooleanOp::Not] {
            registry.register(Arc::new(boolean::BooleanFunction::new(op)));
        }

        registry.register(Arc::new(null_functions::NullCheckFunction::is_null()));
        registry.register(Arc::new(null_functions::NullCheckFunction::is_not_null()));
        registry.register(Arc::new(null_functions::CoalesceFunction));
        registry.register(Arc::new(cast_functions::CastFunction));

        for op in [
            ArithmeticOp::Add,
            ArithmeticOp::Subtract,
            ArithmeticOp::Multiply,
            ArithmeticOp::Divide,
            ArithmeticOp::Modulo,
        ] {
            registry.register(Arc::new(arithmetic_functions::ArithmeticFunction::new(op)));
        }
        registry.register(Arc::new(arithmetic_functions::NegateFunction));
        registry.register(Arc::new(arithmetic_functions::AbsFunction));

        // String functions
        registry.register(Arc::new(string_functions::CaseConversionFunction::new(
            CaseConversion::Lower,
        )));
        registry.register(Arc::new(string_functions::CaseConversionFunction::new(
            CaseConversion::Upper,
        )));
        registry.register(Arc::new(string_functions::ConcatFunction));
        for kind in [
            StringMatch::Contains,
            StringMatch::StartsWith,
            StringMatch::EndsWith,
            StringMatch::Regex,
        ] {
            registry.register(Arc::new(string_functions::StringMatchFunction::new(kind)));
        }

        // List functions
        registry.register(Arc::new(list_functions::SizeFunction));
        registry.register(Arc::new(list_functions::ListCreationFunction));
        registry.register(Arc::new(list_functions::ListExtractFunction));
        registry.register(Arc::new(list_functions::ListContainsFunction));

        registry
    }

    /// Shared registry with the built-in functions
    pub fn global() -> &'static FunctionRegistry {
        &GLOBAL_REGISTRY
    }

    /// Register a function under its own name, replacing any previous entry
    pub fn register(&mut self, function: Arc<dyn ScalarFunction>) {
        self.functions
            .insert(function.name().to_uppercase(), function);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ScalarFunction>> {
        self.functions.get(&name.to_uppercase()).cloned()
    }

    /// Look up a function and check it accepts `num_args` arguments
    pub fn resolve(&self, name: &str, num_args: usize) -> FunctionResult<Arc<dyn ScalarFunction>> {
        let function = self.get(name).ok_or_else(|| FunctionError::UnknownFunction {
            name: name.to_string(),
        })?;
        function.arity().check(function.name(), num_args)?;
        Ok(function)
    }

    pub fn function_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
