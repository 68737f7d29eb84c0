//! Structured tool descriptions.
//!
//! A `ToolSpec` renders purpose, usage guidance, examples and
//! disambiguation notes into the single description string the model sees,
//! so every built-in tool describes itself in the same shape.

use serde_json::{Value, json};

use crate::ToolDef;

/// Structured description of one tool.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    /// One imperative sentence, e.g. "Run a shell command".
    pub purpose: String,
    pub when_to_use: String,
    /// Steers the model away from a similar tool.
    pub when_not_to_use: String,
    /// JSON Schema for the parameters object.
    pub parameters: Value,
    pub examples: Vec<UsageExample>,
    pub output_format: String,
    pub disambiguation: Vec<DisambiguationExample>,
}

/// A situation where this tool is easily confused with another one.
#[derive(Debug, Clone)]
pub struct DisambiguationExample {
    pub scenario: String,
    pub correct_tool: String,
    pub reason: String,
}

/// An example call and what it produces.
#[derive(Debug, Clone)]
pub struct UsageExample {
    pub input: String,
    pub output: String,
}

/// Schema used when a spec declares no parameters.
fn empty_object_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

impl ToolSpec {
    pub fn builder(name: impl Into<String>) -> ToolSpecBuilder {
        ToolSpecBuilder {
            name: name.into(),
            purpose: None,
            when_to_use: None,
            when_not_to_use: None,
            parameters: None,
            examples: Vec::new(),
            output_format: None,
            disambiguation: Vec::new(),
        }
    }

    /// Render the description string. Empty sections are left out.
    pub fn to_description(&self) -> String {
        let mut desc = self.purpose.trim_end_matches('.').to_string();
        desc.push('.');
        if !self.when_to_use.is_empty() {
            desc.push_str(&format!("\nWhen to use: {}", self.when_to_use));
        }
        if !self.when_not_to_use.is_empty() {
            desc.push_str(&format!("\nWhen NOT to use: {}", self.when_not_to_use));
        }

        if !self.examples.is_empty() {
            desc.push_str("\nExamples:");
            for ex in &self.examples {
                desc.push_str(&format!("\n  - {} -> {}", ex.input, ex.output));
            }
        }

        if !self.output_format.is_empty() {
            desc.push_str(&format!("\nOutput format: {}", self.output_format));
        }

        if !self.disambiguation.is_empty() {
            desc.push_str("\nDisambiguation:");
            for d in &self.disambiguation {
                desc.push_str(&format!(
                    "\n  - {}: use '{}' ({})",
                    d.scenario, d.correct_tool, d.reason
                ));
            }
        }

        desc
    }

    pub fn to_tool_def(&self) -> ToolDef {
        ToolDef::new(
            self.name.clone(),
            self.to_description(),
            self.parameters.clone(),
        )
    }
}

/// Builder for [`ToolSpec`]. Missing fields fall back to empty text and an
/// empty object schema.
pub struct ToolSpecBuilder {
    name: String,
    purpose: Option<String>,
    when_to_use: Option<String>,
    when_not_to_use: Option<String>,
    parameters: Option<Value>,
    examples: Vec<UsageExample>,
    output_format: Option<String>,
    disambiguation: Vec<DisambiguationExample>,
}

impl ToolSpecBuilder {
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    pub fn when_to_use(mut self, when: impl Into<String>) -> Self {
        self.when_to_use = Some(when.into());
        self
    }

    pub fn when_not_to_use(mut self, when_not: impl Into<String>) -> Self {
        self.when_not_to_use = Some(when_not.into());
        self
    }

    pub fn parameters(mut self, params: Value) -> Self {
        self.parameters = Some(params);
        self
    }

    /// Derive the parameter schema from the argument type the tool
    /// deserializes, so schema and parsing cannot drift apart.
    pub fn parameters_for<T: schemars::JsonSchema>(self) -> Self {
        self.parameters(crate::json_schema_for::<T>())
    }

    pub fn example(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.examples.push(UsageExample {
            input: input.into(),
            output: output.into(),
        });
        self
    }

    pub fn output_format(mut self, format: impl Into<String>) -> Self {
        self.output_format = Some(format.into());
        self
    }

    pub fn disambiguate(
        mut self,
        scenario: impl Into<String>,
        correct_tool: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.disambiguation.push(DisambiguationExample {
            scenario: scenario.into(),
            correct_tool: correct_tool.into(),
            reason: reason.into(),
        });
        self
    }

    /// Shortcut for `.build().to_tool_def()`.
    pub fn to_tool_def(self) -> ToolDef {
        self.build().to_tool_def()
    }

    pub fn build(self) -> ToolSpec {
        ToolSpec {
            name: self.name,
            purpose: self.purpose.unwrap_or_default(),
            when_to_use: self.when_to_use.unwrap_or_default(),
            when_not_to_use: self.when_not_to_use.unwrap_or_default(),
            parameters: self.parameters.unwrap_or_else(empty_object_schema),
            examples: self.examples,
            output_format: self.output_format.unwrap_or_default(),
            disambiguation: self.disambiguation,
        }
    }
}
