use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// questions per adaptive module
pub const MODULE_SIZE: usize = 22;

/// questions in a fixed (non-adaptive) exam
pub const FIXED_SIZE: usize = 44;

/// module 1 score above which a test-taker is routed to the hard module
pub const DEFAULT_THRESHOLD: i64 = 16;

pub const EXAM_ID_PATTERN: &str = r"^SAT_ORIGINAL_[0-9]{3}$";

pub const REQUIRED_QUESTION_FIELDS: [&str; 6] = [
    "topic",
    "subskill",
    "difficulty",
    "question",
    "correct_option",
    "format",
];

pub const MULTIPLE_CHOICE: &str = "multiple_choice";

#[derive(Error, Debug)]
pub enum ExamError {
    #[error("exam file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("exam file must contain a JSON object at the top level")]
    NotAnObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Adaptive,
    Fixed,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::Adaptive => write!(f, "ADAPTIVE"),
            Layout::Fixed => write!(f, "FIXED ({} questions)", FIXED_SIZE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Module {
    One,
    TwoEasy,
    TwoHard,
}

impl Module {
    pub const ALL: [Module; 3] = [Module::One, Module::TwoEasy, Module::TwoHard];

    pub fn field(&self) -> &'static str {
        match self {
            Module::One => "module_1",
            Module::TwoEasy => "module_2_easy",
            Module::TwoHard => "module_2_hard",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Module::One => "Módulo 1",
            Module::TwoEasy => "Módulo 2 Easy",
            Module::TwoHard => "Módulo 2 Hard",
        }
    }
}

/// A parsed exam file. Read-only: defaults are applied by producing a new
/// document, see [`crate::import::normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExamDocument(Map<String, Value>);

impl ExamDocument {
    pub fn parse(content: &str) -> Result<Self, ExamError> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ExamError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ExamError::NotAnObject),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn has(&self, field: &str) -> bool {
        is_truthy(self.0.get(field))
    }

    pub fn exam_id(&self) -> Option<String> {
        self.0.get("exam_id").filter(|v| is_truthy(Some(*v))).map(display_value)
    }

    pub fn name(&self) -> Option<String> {
        self.0.get("name").filter(|v| is_truthy(Some(*v))).map(display_value)
    }

    pub fn layout(&self) -> Layout {
        match self.0.get("is_adaptive") {
            Some(Value::Bool(true)) => Layout::Adaptive,
            _ => Layout::Fixed,
        }
    }

    pub fn metadata(&self) -> Option<&Value> {
        self.0.get("metadata").filter(|v| is_truthy(Some(*v)))
    }

    pub fn metadata_field(&self, field: &str) -> Option<&Value> {
        self.metadata().and_then(|m| m.get(field))
    }

    pub fn threshold(&self) -> i64 {
        self.metadata_field("threshold")
            .filter(|v| is_truthy(Some(*v)))
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_THRESHOLD)
    }

    /// The question list stored under `module`, if it is an array.
    pub fn module(&self, module: Module) -> Option<&Vec<Value>> {
        self.0.get(module.field()).and_then(Value::as_array)
    }

    pub fn questions(&self) -> Option<&Vec<Value>> {
        self.0.get("questions").and_then(Value::as_array)
    }

    pub fn summary(&self) -> ExamSummary {
        ExamSummary {
            exam_id: self.exam_id(),
            name: self.name(),
            active: self.has("is_active"),
            difficulty_level: self
                .0
                .get("difficulty_level")
                .filter(|v| is_truthy(Some(*v)))
                .map(display_value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamSummary {
    pub exam_id: Option<String>,
    pub name: Option<String>,
    pub active: bool,
    pub difficulty_level: Option<String>,
}

/// Missing keys, `null`, `false`, `0`, `NaN` and `""` are all "not set"
/// as far as the seed files are concerned.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
