//! Single-pass template resolver with caching
//!
//! Placeholders have the form `{{ step_id.output.field.path }}` and are
//! parsed into typed tokens exactly once per distinct template string
//! (cached in a DashMap). Malformed syntax is rejected at parse time with
//! the byte position of the offending marker; a reference to data that is
//! not in the shared state is *not* an error here - it surfaces as an
//! unresolved marker the step executor turns into a skip.

use std::ops::Range;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{Map, Value};

use crate::error::FlowError;
use crate::state::SharedState;

/// Token representing a parsed template fragment
#[derive(Debug, Clone)]
pub enum Token {
    /// Literal text (stores range in original string)
    Literal(Range<usize>),
    /// Reference to a prior step's output: {{step_id.output.field.path}}
    StepRef(StepRef),
}

/// Typed placeholder body: a step id plus a (possibly empty) field path
#[derive(Debug, Clone, PartialEq)]
pub struct StepRef {
    pub step_id: String,
    pub field_path: Vec<String>,
}

impl StepRef {
    /// Canonical expression text, used in skip reasons and logs
    pub fn expr(&self) -> String {
        let mut out = format!("{}.output", self.step_id);
        for segment in &self.field_path {
            out.push('.');
            out.push_str(segment);
        }
        out
    }
}

/// Outcome of resolving one input value against the shared state
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Value(Value),
    /// The referenced step/field does not exist (yet); the caller decides
    /// whether that is fatal for its step
    Unresolved { exprs: Vec<String> },
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn is_path_segment(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Parse a placeholder body: `<step_id>.output[.field...]`
fn parse_step_ref(body: &str, position: usize) -> Result<StepRef, FlowError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(FlowError::TemplateParse {
            position,
            details: "empty placeholder".into(),
        });
    }

    let mut segments = trimmed.split('.');
    let step_id = segments.next().unwrap_or_default();
    if !is_identifier(step_id) {
        return Err(FlowError::TemplateParse {
            position,
            details: format!("'{step_id}' is not a valid step id"),
        });
    }

    if segments.next() != Some("output") {
        return Err(FlowError::TemplateParse {
            position,
            details: format!("expected '{step_id}.output[.field]'"),
        });
    }

    let mut field_path = Vec::new();
    for segment in segments {
        if !is_path_segment(segment) {
            return Err(FlowError::TemplateParse {
                position,
                details: format!("'{segment}' is not a valid field segment"),
            });
        }
        field_path.push(segment.to_string());
    }

    Ok(StepRef {
        step_id: step_id.to_string(),
        field_path,
    })
}

/// Single-pass tokenizer. Rejects unbalanced markers outright.
fn tokenize(template: &str) -> Result<Vec<Token>, FlowError> {
    let bytes = template.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut literal_start = 0;

    while pos < bytes.len() {
        if bytes[pos] == b'{' && bytes.get(pos + 1) == Some(&b'{') {
            if pos > literal_start {
                tokens.push(Token::Literal(literal_start..pos));
            }
            let body_start = pos + 2;
            let close = template[body_start..]
                .find("}}")
                .map(|i| body_start + i)
                .ok_or_else(|| FlowError::TemplateParse {
                    position: pos,
                    details: "unclosed '{{' marker".into(),
                })?;
            let body = &template[body_start..close];
            tokens.push(Token::StepRef(parse_step_ref(body, body_start)?));
            pos = close + 2;
            literal_start = pos;
        } else if bytes[pos] == b'}' && bytes.get(pos + 1) == Some(&b'}') {
            return Err(FlowError::TemplateParse {
                position: pos,
                details: "'}}' without matching '{{'".into(),
            });
        } else {
            pos += 1;
        }
    }

    if literal_start < template.len() {
        tokens.push(Token::Literal(literal_start..template.len()));
    }

    Ok(tokens)
}

/// Template resolver with caching
pub struct TemplateResolver {
    /// Cache of parsed templates
    cache: DashMap<String, Arc<Vec<Token>>>,
}

impl Default for TemplateResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateResolver {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Parse a template into tokens (with caching)
    pub fn parse(&self, template: &str) -> Result<Arc<Vec<Token>>, FlowError> {
        if let Some(cached) = self.cache.get(template) {
            return Ok(Arc::clone(&cached));
        }
        let tokens = Arc::new(tokenize(template)?);
        self.cache.insert(template.to_string(), Arc::clone(&tokens));
        Ok(tokens)
    }

    /// Resolve one template string against the shared state.
    ///
    /// A placeholder spanning the whole string yields the referenced value
    /// with its native type; placeholders embedded in surrounding text are
    /// substituted by their string form. Strings without placeholders pass
    /// through unchanged.
    pub fn resolve(&self, template: &str, state: &SharedState) -> Result<Resolution, FlowError> {
        let tokens = self.parse(template)?;

        if let [Token::StepRef(step_ref)] = tokens.as_slice() {
            return Ok(match state.lookup(&step_ref.step_id, &step_ref.field_path) {
                Some(value) => Resolution::Value(value),
                None => Resolution::Unresolved {
                    exprs: vec![step_ref.expr()],
                },
            });
        }

        if !tokens.iter().any(|t| matches!(t, Token::StepRef(_))) {
            return Ok(Resolution::Value(Value::String(template.to_string())));
        }

        let mut result = String::with_capacity(template.len() * 2);
        let mut missing = Vec::new();
        for token in tokens.iter() {
            match token {
                Token::Literal(range) => result.push_str(&template[range.clone()]),
                Token::StepRef(step_ref) => {
                    match state.lookup(&step_ref.step_id, &step_ref.field_path) {
                        Some(Value::String(s)) => result.push_str(&s),
                        Some(other) => result.push_str(&other.to_string()),
                        None => missing.push(step_ref.expr()),
                    }
                }
            }
        }

        if missing.is_empty() {
            Ok(Resolution::Value(Value::String(result)))
        } else {
            Ok(Resolution::Unresolved { exprs: missing })
        }
    }

    /// Recursively resolve a nested input value, collecting unresolved
    /// references instead of failing on them.
    pub fn resolve_value(
        &self,
        value: &Value,
        state: &SharedState,
        unresolved: &mut Vec<String>,
    ) -> Result<Value, FlowError> {
        match value {
            Value::String(template) => match self.resolve(template, state)? {
                Resolution::Value(v) => Ok(v),
                Resolution::Unresolved { exprs } => {
                    unresolved.extend(exprs);
                    Ok(value.clone())
                }
            },
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, nested) in map {
                    out.insert(key.clone(), self.resolve_value(nested, state, unresolved)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.resolve_value(item, state, unresolved)?);
                }
                Ok(Value::Array(out))
            }
            other => Ok(other.clone()),
        }
    }

    /// Resolve a step's declared inputs into a concrete input mapping,
    /// returning the references that could not be resolved alongside.
    pub fn resolve_inputs(
        &self,
        inputs: &Map<String, Value>,
        state: &SharedState,
    ) -> Result<(Map<String, Value>, Vec<String>), FlowError> {
        let mut unresolved = Vec::new();
        let mut resolved = Map::with_capacity(inputs.len());
        for (name, value) in inputs {
            resolved.insert(name.clone(), self.resolve_value(value, state, &mut unresolved)?);
        }
        Ok((resolved, unresolved))
    }

    /// Parse every template in an input mapping without touching state.
    /// Used by pre-run validation to fail fast on malformed syntax.
    pub fn check_inputs(&self, inputs: &Map<String, Value>) -> Result<(), FlowError> {
        inputs.values().try_for_each(|v| self.check_value(v))
    }

    fn check_value(&self, value: &Value) -> Result<(), FlowError> {
        match value {
            Value::String(template) => self.parse(template).map(|_| ()),
            Value::Object(map) => map.values().try_for_each(|v| self.check_value(v)),
            Value::Array(items) => items.iter().try_for_each(|v| self.check_value(v)),
            _ => Ok(()),
        }
    }
}
