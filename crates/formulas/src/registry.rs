//! Function registry: uppercase name to arity, metadata and implementation.

use crate::context::EvaluationContext;
use crate::functions::{aggregate, arithmetic, logical, math, text};
use gridcalc_primitives::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Built-in implementation. Arguments arrive already evaluated, left to right.
pub type FunctionImpl = fn(&EvaluationContext<'_>, &[Value]) -> Value;

static STANDARD: LazyLock<Arc<FunctionRegistry>> =
    LazyLock::new(|| Arc::new(FunctionRegistry::default()));

/// The shared table of built-in functions, built once per process.
pub fn standard_registry() -> Arc<FunctionRegistry> {
    Arc::clone(&STANDARD)
}

/// Registry of available functions
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDefinition>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register_standard_functions();
        registry
    }
}

impl FunctionRegistry {
    /// A registry with no functions; use [`FunctionRegistry::register`] to fill it.
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Register (or replace) a function under its uppercase name
    pub fn register(&mut self, name: &str, def: FunctionDefinition) {
        self.functions.insert(name.to_uppercase(), def);
    }

    /// Check if a function exists
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_uppercase())
    }

    /// Get a function definition by name
    pub fn get(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.get(&name.to_uppercase())
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Call signature text for tooling, e.g. `ROUND(number, [digits])`
    pub fn signature(&self, name: &str) -> Option<String> {
        self.get(name).map(|def| def.signature(&name.to_uppercase()))
    }

    fn register_standard_functions(&mut self) {
        use ParamType::{Any, Logical, Number, Range, Text};

        // Arithmetic helpers
        self.register(
            "ADD",
            FunctionDefinition::fixed(vec![Number, Number], ReturnType::Number, arithmetic::add_fn)
                .describe("Sum of two numbers", &["number1", "number2"]),
        );
        self.register(
            "MINUS",
            FunctionDefinition::fixed(
                vec![Number, Number],
                ReturnType::Number,
                arithmetic::minus_fn,
            )
            .describe("Difference of two numbers", &["number1", "number2"]),
        );
        self.register(
            "MULTIPLY",
            FunctionDefinition::fixed(
                vec![Number, Number],
                ReturnType::Number,
                arithmetic::multiply_fn,
            )
            .describe("Product of two numbers", &["number1", "number2"]),
        );
        self.register(
            "DIVIDE",
            FunctionDefinition::fixed(
                vec![Number, Number],
                ReturnType::Number,
                arithmetic::divide_fn,
            )
            .describe("Quotient of two numbers", &["dividend", "divisor"]),
        );
        self.register(
            "POW",
            FunctionDefinition::fixed(vec![Number, Number], ReturnType::Number, arithmetic::pow_fn)
                .describe("Number raised to a power", &["base", "exponent"]),
        );

        // Aggregations
        self.register(
            "SUM",
            FunctionDefinition::variadic(1, Range, ReturnType::Number, aggregate::sum)
                .describe("Sum of the numeric arguments", &["value"]),
        );
        self.register(
            "AVERAGE",
            FunctionDefinition::variadic(1, Range, ReturnType::Number, aggregate::average)
                .describe("Arithmetic mean of the numeric arguments", &["value"]),
        );
        self.register(
            "COUNT",
            FunctionDefinition::variadic(1, Range, ReturnType::Number, aggregate::count)
                .describe("Number of numeric arguments", &["value"]),
        );
        self.register(
            "COUNTA",
            FunctionDefinition::variadic(1, Range, ReturnType::Number, aggregate::counta)
                .describe("Number of non-empty arguments", &["value"]),
        );
        self.register(
            "MIN",
            FunctionDefinition::variadic(1, Range, ReturnType::Number, aggregate::min)
                .describe("Smallest numeric argument", &["value"]),
        );
        self.register(
            "MAX",
            FunctionDefinition::variadic(1, Range, ReturnType::Number, aggregate::max)
                .describe("Largest numeric argument", &["value"]),
        );
        self.register(
            "PRODUCT",
            FunctionDefinition::variadic(1, Range, ReturnType::Number, aggregate::product)
                .describe("Product of the numeric arguments", &["value"]),
        );

        // Single-value math
        self.register_unary_math("ABS", "Absolute value", math::abs);
        self.register_unary_math("SQRT", "Square root", math::sqrt);
        self.register_unary_math("INT", "Round down to the nearest integer", math::int);
        self.register_unary_math("SIGN", "Sign of a number", math::sign);
        self.register_unary_math("EXP", "e raised to a power", math::exp);
        self.register_unary_math("LN", "Natural logarithm", math::ln);
        self.register_unary_math("LOG10", "Base-10 logarithm", math::log10);
        self.register_unary_math("SIN", "Sine of an angle in radians", math::sin);
        self.register_unary_math("COS", "Cosine of an angle in radians", math::cos);
        self.register_unary_math("TAN", "Tangent of an angle in radians", math::tan);
        self.register_unary_math("ASIN", "Arcsine in radians", math::asin);
        self.register_unary_math("ACOS", "Arccosine in radians", math::acos);
        self.register_unary_math("ATAN", "Arctangent in radians", math::atan);
        self.register_unary_math("DEGREES", "Radians to degrees", math::degrees);
        self.register_unary_math("RADIANS", "Degrees to radians", math::radians);
        self.register_unary_math("FACT", "Factorial", math::fact);
        let rounding: [(&str, &'static str, FunctionImpl); 4] = [
            ("ROUND", "Round half away from zero", math::round),
            ("ROUNDUP", "Round away from zero", math::roundup),
            ("ROUNDDOWN", "Round toward zero", math::rounddown),
            ("TRUNC", "Truncate toward zero", math::trunc),
        ];
        for (name, description, eval) in rounding {
            self.register(
                name,
                FunctionDefinition::range(1, 2, vec![Number, Number], ReturnType::Number, eval)
                    .describe(description, &["number", "digits"]),
            );
        }
        self.register(
            "FLOOR",
            FunctionDefinition::range(1, 2, vec![Number, Number], ReturnType::Number, math::floor)
                .describe("Round down to a multiple of significance", &["number", "significance"]),
        );
        self.register(
            "CEILING",
            FunctionDefinition::range(
                1,
                2,
                vec![Number, Number],
                ReturnType::Number,
                math::ceiling,
            )
            .describe("Round up to a multiple of significance", &["number", "significance"]),
        );
        self.register(
            "POWER",
            FunctionDefinition::fixed(vec![Number, Number], ReturnType::Number, math::power)
                .describe("Number raised to a power", &["number", "power"]),
        );
        self.register(
            "MOD",
            FunctionDefinition::fixed(vec![Number, Number], ReturnType::Number, math::mod_fn)
                .describe("Remainder with the sign of the divisor", &["number", "divisor"]),
        );
        self.register(
            "LOG",
            FunctionDefinition::range(1, 2, vec![Number, Number], ReturnType::Number, math::log)
                .describe("Logarithm to a base (default 10)", &["number", "base"]),
        );
        self.register(
            "ATAN2",
            FunctionDefinition::fixed(vec![Number, Number], ReturnType::Number, math::atan2)
                .describe("Arctangent of the point (x, y)", &["x", "y"]),
        );
        self.register(
            "PI",
            FunctionDefinition::fixed(vec![], ReturnType::Number, math::pi)
                .describe("The constant pi", &[]),
        );

        // Text
        self.register(
            "LEN",
            FunctionDefinition::fixed(vec![Text], ReturnType::Number, text::len)
                .describe("Number of characters", &["text"]),
        );
        self.register(
            "LEFT",
            FunctionDefinition::range(1, 2, vec![Text, Number], ReturnType::Text, text::left)
                .describe("Leading characters", &["text", "count"]),
        );
        self.register(
            "RIGHT",
            FunctionDefinition::range(1, 2, vec![Text, Number], ReturnType::Text, text::right)
                .describe("Trailing characters", &["text", "count"]),
        );
        self.register(
            "MID",
            FunctionDefinition::fixed(vec![Text, Number, Number], ReturnType::Text, text::mid)
                .describe("Characters from a 1-based position", &["text", "start", "count"]),
        );
        self.register(
            "REPLACE",
            FunctionDefinition::fixed(
                vec![Text, Number, Number, Text],
                ReturnType::Text,
                text::replace,
            )
            .describe(
                "Replace characters at a 1-based position",
                &["text", "start", "count", "new_text"],
            ),
        );
        self.register(
            "SUBSTITUTE",
            FunctionDefinition::range(
                3,
                4,
                vec![Text, Text, Text, Number],
                ReturnType::Text,
                text::substitute,
            )
            .describe(
                "Replace occurrences of a substring",
                &["text", "old_text", "new_text", "instance"],
            ),
        );
        self.register(
            "UPPER",
            FunctionDefinition::fixed(vec![Text], ReturnType::Text, text::upper)
                .describe("Convert to uppercase", &["text"]),
        );
        self.register(
            "LOWER",
            FunctionDefinition::fixed(vec![Text], ReturnType::Text, text::lower)
                .describe("Convert to lowercase", &["text"]),
        );
        self.register(
            "TRIM",
            FunctionDefinition::fixed(vec![Text], ReturnType::Text, text::trim)
                .describe("Strip surrounding spaces and collapse inner runs", &["text"]),
        );
        self.register(
            "REPT",
            FunctionDefinition::fixed(vec![Text, Number], ReturnType::Text, text::rept)
                .describe("Repeat text a number of times", &["text", "times"]),
        );
        for name in ["CONCAT", "CONCATENATE"] {
            self.register(
                name,
                FunctionDefinition::variadic(1, Any, ReturnType::Text, text::concat)
                    .describe("Join values end to end", &["text"]),
            );
        }
        self.register(
            "TEXTJOIN",
            FunctionDefinition::variadic(3, Any, ReturnType::Text, text::textjoin).describe(
                "Join values with a delimiter",
                &["delimiter", "ignore_empty", "text"],
            ),
        );

        // Logical
        self.register(
            "IF",
            FunctionDefinition::range(
                2,
                3,
                vec![Logical, Any, Any],
                ReturnType::Any,
                logical::if_fn,
            )
            .describe(
                "Choose between two values",
                &["condition", "value_if_true", "value_if_false"],
            ),
        );
        self.register(
            "AND",
            FunctionDefinition::variadic(1, Logical, ReturnType::Logical, logical::and_fn)
                .describe("TRUE when every argument is true", &["logical"]),
        );
        self.register(
            "OR",
            FunctionDefinition::variadic(1, Logical, ReturnType::Logical, logical::or_fn)
                .describe("TRUE when any argument is true", &["logical"]),
        );
        self.register(
            "NOT",
            FunctionDefinition::fixed(vec![Logical], ReturnType::Logical, logical::not_fn)
                .describe("Logical negation", &["logical"]),
        );
    }

    fn register_unary_math(&mut self, name: &str, description: &'static str, eval: FunctionImpl) {
        self.register(
            name,
            FunctionDefinition::fixed(vec![ParamType::Number], ReturnType::Number, eval)
                .describe(description, &["number"]),
        );
    }
}

/// Function definition
pub struct FunctionDefinition {
    pub min_args: usize,
    pub max_args: Option<usize>,
    pub metadata: FunctionMetadata,
    pub eval: FunctionImpl,
}

impl FunctionDefinition {
    /// Fixed number of arguments
    pub fn fixed(params: Vec<ParamType>, return_type: ReturnType, eval: FunctionImpl) -> Self {
        let args = params.len();
        Self {
            min_args: args,
            max_args: Some(args),
            metadata: FunctionMetadata::new(params, None, return_type),
            eval,
        }
    }

    /// Variable number of arguments
    pub fn variadic(
        min: usize,
        variadic: ParamType,
        return_type: ReturnType,
        eval: FunctionImpl,
    ) -> Self {
        Self {
            min_args: min,
            max_args: None,
            metadata: FunctionMetadata::new(Vec::new(), Some(variadic), return_type),
            eval,
        }
    }

    /// Range of arguments
    pub fn range(
        min: usize,
        max: usize,
        params: Vec<ParamType>,
        return_type: ReturnType,
        eval: FunctionImpl,
    ) -> Self {
        Self {
            min_args: min,
            max_args: Some(max),
            metadata: FunctionMetadata::new(params, None, return_type),
            eval,
        }
    }

    /// Attach a description and argument names for tooling
    #[must_use]
    pub fn describe(mut self, description: &'static str, arg_names: &[&'static str]) -> Self {
        self.metadata.description = description;
        self.metadata.arg_names = arg_names.to_vec();
        self
    }

    pub(crate) fn validate_arg_count(&self, provided: usize) -> Result<(), String> {
        if provided < self.min_args {
            return Err(self.expected_args_label());
        }
        if let Some(max) = self.max_args {
            if provided > max {
                return Err(self.expected_args_label());
            }
        }
        Ok(())
    }

    pub(crate) fn expected_args_label(&self) -> String {
        match self.max_args {
            Some(max) if max == self.min_args => format!("{}", self.min_args),
            Some(max) => format!("{}..{}", self.min_args, max),
            None => format!("{}+", self.min_args),
        }
    }

    /// Render `NAME(arg, [optional], ...)` from the argument names.
    pub fn signature(&self, name: &str) -> String {
        let mut parts: Vec<String> = Vec::new();
        for (idx, arg) in self.metadata.arg_names.iter().enumerate() {
            if idx < self.min_args || self.max_args.is_none() {
                parts.push((*arg).to_string());
            } else {
                parts.push(format!("[{arg}]"));
            }
        }
        if self.max_args.is_none() {
            parts.push("...".to_string());
        }
        format!("{}({})", name, parts.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamType {
    Any,
    Number,
    Logical,
    Text,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnType {
    Any,
    Number,
    Logical,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionMetadata {
    pub params: Vec<ParamType>,
    pub variadic: Option<ParamType>,
    pub return_type: ReturnType,
    pub description: &'static str,
    pub arg_names: Vec<&'static str>,
}

impl FunctionMetadata {
    fn new(params: Vec<ParamType>, variadic: Option<ParamType>, return_type: ReturnType) -> Self {
        Self {
            params,
            variadic,
            return_type,
            description: "",
            arg_names: Vec::new(),
        }
    }
}
