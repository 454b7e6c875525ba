// Macro variables and target expansion
use super::error::GraphError;
use super::graph::GraphConfig;
use regex::{NoExpand, Regex};
use serde_json::{Map, Value};

const LABEL_KEY: &str = "_label";
const FORMAT_KEY: &str = "_format";
const TRANSFORM_KEY: &str = "_transform";

/// One substitution context applied to every target of a graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableBinding {
    values: Map<String, Value>,
}

impl VariableBinding {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn label(&self) -> Option<&str> {
        self.values.get(LABEL_KEY).and_then(Value::as_str)
    }

    pub fn format(&self) -> Option<&str> {
        self.values.get(FORMAT_KEY).and_then(Value::as_str)
    }

    pub fn transform(&self) -> Option<&str> {
        self.values.get(TRANSFORM_KEY).and_then(Value::as_str)
    }

    /// Cell title for this binding: its label, or the pretty-printed binding
    pub fn title(&self) -> String {
        match self.label() {
            Some(label) => label.to_string(),
            None => serde_json::to_string_pretty(&self.values).unwrap_or_default(),
        }
    }

    /// Replace every `$name` in the template with its value. A placeholder
    /// only matches when the following character cannot continue the name,
    /// so `$host` leaves `$hostname` alone. Unknown placeholders stay as-is.
    pub fn substitute(&self, template: &str) -> String {
        self.values
            .iter()
            .filter(|(name, _)| !is_reserved(name))
            .filter_map(|(name, value)| scalar_text(value).map(|text| (name, text)))
            .fold(template.to_string(), |acc, (name, text)| {
                replace_variable(&acc, name, &text)
            })
    }
}

fn is_reserved(name: &str) -> bool {
    matches!(name, LABEL_KEY | FORMAT_KEY | TRANSFORM_KEY)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn replace_variable(template: &str, name: &str, value: &str) -> String {
    // a trailing word boundary keeps `$host` from matching inside `$hostname`
    let boundary = match name.chars().last() {
        Some(c) if c.is_alphanumeric() || c == '_' => r"\b",
        _ => "",
    };

    match Regex::new(&format!(r"\${}{}", regex::escape(name), boundary)) {
        Ok(pattern) => pattern.replace_all(template, NoExpand(value)).into_owned(),
        Err(_) => template.to_string(),
    }
}

/// Ordered list of bindings. Always holds at least one element so that a graph
/// without variables still expands every target once.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSet {
    bindings: Vec<VariableBinding>,
}

impl Default for VariableSet {
    fn default() -> Self {
        Self {
            bindings: vec![VariableBinding::default()],
        }
    }
}

impl VariableSet {
    /// Parse the serialized variables of a graph. A single object is treated as
    /// a one-element list; a missing or blank string yields one empty binding.
    pub fn parse(raw: Option<&str>) -> Result<Self, GraphError> {
        let raw = match raw.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(Self::default()),
        };

        let value: Value =
            serde_json::from_str(raw).map_err(|e| GraphError::ConfigParse(e.to_string()))?;

        let elements = match value {
            Value::Array(elements) => elements,
            other => vec![other],
        };

        let bindings = elements
            .into_iter()
            .enumerate()
            .map(|(i, element)| match element {
                Value::Object(values) => Ok(VariableBinding::new(values)),
                other => Err(GraphError::ConfigParse(format!(
                    "variable set {} must be an object, got {}",
                    i, other
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        if bindings.is_empty() {
            return Ok(Self::default());
        }

        Ok(Self { bindings })
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn get(&self, var_num: usize) -> Option<&VariableBinding> {
        self.bindings.get(var_num)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableBinding> {
        self.bindings.iter()
    }
}

/// A target with one binding applied
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedTarget {
    pub source: String,
    pub query: String,
    pub label: String,
    pub shift: Option<String>,
    pub target_num: usize,
    pub var_num: usize,
    pub index: usize,
}

/// Cross every active target with every binding, target-major.
pub fn expand_targets(graph: &GraphConfig, variables: &VariableSet) -> Vec<ExpandedTarget> {
    let mut expanded = Vec::new();

    for (target_num, target) in graph.active_targets().enumerate() {
        for (var_num, binding) in variables.iter().enumerate() {
            let mut query = binding.substitute(&target.query);
            if let Some(transform) = binding.transform() {
                query.push_str(transform);
            }

            let shift = target
                .shift
                .as_deref()
                .map(|shift| binding.substitute(shift))
                .filter(|shift| !shift.is_empty());

            let index = expanded.len();
            expanded.push(ExpandedTarget {
                source: binding.substitute(&target.source),
                query,
                label: binding.substitute(&target.label),
                shift,
                target_num,
                var_num,
                index,
            });
        }
    }

    expanded
}
