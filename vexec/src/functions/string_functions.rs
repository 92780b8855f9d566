// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! String functions

use super::function_trait::{Arity, FunctionError, FunctionResult, ScalarFunction};
use super::names;
use crate::storage::Value;
use crate::types::LogicalType;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Compiled patterns shared by all workers
static REGEX_CACHE: Lazy<Mutex<HashMap<String, Arc<Regex>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn compile(pattern: &str) -> FunctionResult<Arc<Regex>> {
    let mut cache = REGEX_CACHE.lock();
    if let Some(regex) = cache.get(pattern) {
        return Ok(regex.clone());
    }
    let regex = Regex::new(pattern).map_err(|e| FunctionError::InvalidArgumentType {
        message: format!("invalid regular expression '{}': {}", pattern, e),
    })?;
    let regex = Arc::new(regex);
    cache.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

fn string_arg<'a>(function: &str, value: &'a Value) -> FunctionResult<&'a str> {
    value
        .as_str()
        .ok_or_else(|| FunctionError::InvalidArgumentType {
            message: format!("{} expects a string argument, got {}", function, value),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseConversion {
    Lower,
    Upper,
}

#[derive(Debug)]
pub struct CaseConversionFunction {
    conversion: CaseConversion,
}

impl CaseConversionFunction {
    pub fn new(conversion: CaseConversion) -> Self {
        Self { conversion }
    }
}

impl ScalarFunction for CaseConversionFunction {
    fn name(&self) -> &str {
        match self.conversion {
            CaseConversion::Lower => names::LOWER,
            CaseConversion::Upper => names::UPPER,
        }
    }

    fn description(&self) -> &str {
        "Converts a string to lower or upper case"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, args: &[Value], _return_type: &LogicalType) -> FunctionResult<Value> {
        let s = string_arg(self.name(), &args[0])?;
        Ok(Value::String(match self.conversion {
            CaseConversion::Lower => s.to_lowercase(),
            CaseConversion::Upper => s.to_uppercase(),
        }))
    }
}

/// CONCAT over any number of arguments; non-string arguments are rendered
#[derive(Debug)]
pub struct ConcatFunction;

impl ScalarFunction for ConcatFunction {
    fn name(&self) -> &str {
        names::CONCAT
    }

    fn description(&self) -> &str {
        "Concatenates its arguments"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn execute(&self, args: &[Value], _return_type: &LogicalType) -> FunctionResult<Value> {
        let mut out = String::new();
        for arg in args {
            match arg {
                Value::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            }
        }
        Ok(Value::String(out))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMatch {
    Contains,
    StartsWith,
    EndsWith,
    Regex,
}

#[derive(Debug)]
pub struct StringMatchFunction {
    kind: StringMatch,
}

impl StringMatchFunction {
    pub fn new(kind: StringMatch) -> Self {
        Self { kind }
    }
}

impl ScalarFunction for StringMatchFunction {
    fn name(&self) -> &str {
        match self.kind {
            StringMatch::Contains => names::CONTAINS,
            StringMatch::StartsWith => names::STARTS_WITH,
            StringMatch::EndsWith => names::ENDS_WITH,
            StringMatch::Regex => names::REGEXP_MATCHES,
        }
    }

    fn description(&self) -> &str {
        "Tests a string against a pattern"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn execute(&self, args: &[Value], _return_type: &LogicalType) -> FunctionResult<Value> {
        let s = string_arg(self.name(), &args[0])?;
        let pattern = string_arg(self.name(), &args[1])?;
        let matched = match self.kind {
            StringMatch::Contains => s.contains(pattern),
            StringMatch::StartsWith => s.starts_with(pattern),
            StringMatch::EndsWith => s.ends_with(pattern),
            StringMatch::Regex => compile(pattern)?.is_match(s),
        };
        Ok(Value::Bool(matched))
    }
}
