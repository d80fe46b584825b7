//! Model configuration and the run-start payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Modeler web service used when a model config does not name one.
pub const DEFAULT_TARGET_ENDPOINT: &str = "http://examServer:8080/exam/ExamModelerService";

/// A model the runner can execute tests from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Name of the model.
    pub model_name: String,

    /// Runner version, without delimiters (e.g. 44 for 4.4).
    #[serde(default)]
    pub exam_version: u32,

    /// Modeler web service endpoint.
    #[serde(default = "default_target_endpoint")]
    pub target_endpoint: String,
}

fn default_target_endpoint() -> String {
    DEFAULT_TARGET_ENDPOINT.to_string()
}

/// Trim, and treat an empty result as absent.
fn non_empty_trimmed(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl ModelConfig {
    /// Create a new ModelConfig with the default endpoint.
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            name: None,
            model_name: model_name.into().trim().to_string(),
            exam_version: 0,
            target_endpoint: default_target_endpoint(),
        }
    }

    /// Builder method to set the display name. Blank names are dropped.
    pub fn with_name(mut self, name: impl AsRef<str>) -> Self {
        self.name = non_empty_trimmed(name.as_ref());
        self
    }

    /// Builder method to set the runner version.
    pub fn with_exam_version(mut self, version: u32) -> Self {
        self.exam_version = version;
        self
    }

    /// Builder method to set the endpoint. Blank falls back to the default.
    pub fn with_target_endpoint(mut self, endpoint: impl AsRef<str>) -> Self {
        self.target_endpoint =
            non_empty_trimmed(endpoint.as_ref()).unwrap_or_else(default_target_endpoint);
        self
    }

    /// Human readable label, e.g. `nightly (Powertrain @ http://host/svc)`.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({} @ {})", name, self.model_name, self.target_endpoint),
            None => format!("{} @ {}", self.model_name, self.target_endpoint),
        }
    }

    /// Check the config can be used to start a run.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.model_name.trim().is_empty() {
            return Err(CoreError::InvalidInput("model name is empty".to_string()));
        }
        if self.target_endpoint.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "target endpoint is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Selects which test cases of a model take part in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestrunFilter {
    /// Filter attribute name.
    #[serde(default)]
    pub name: String,

    /// Filter value.
    #[serde(default)]
    pub value: String,

    /// Include administrative test cases.
    #[serde(default)]
    pub admin_cases: bool,

    /// Activate matching test cases.
    #[serde(default)]
    pub activate_testcases: bool,
}

impl TestrunFilter {
    /// Create a filter matching `name == value`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            admin_cases: false,
            activate_testcases: false,
        }
    }

    /// Builder method to include administrative test cases.
    pub fn with_admin_cases(mut self, admin_cases: bool) -> Self {
        self.admin_cases = admin_cases;
        self
    }

    /// Builder method to activate matching test cases.
    pub fn with_activate_testcases(mut self, activate: bool) -> Self {
        self.activate_testcases = activate;
        self
    }

    fn into_value(self) -> Value {
        let mut fields = Map::new();
        fields.insert("name".to_string(), Value::String(self.name));
        fields.insert("value".to_string(), Value::String(self.value));
        fields.insert("adminCases".to_string(), Value::Bool(self.admin_cases));
        fields.insert(
            "activateTestcases".to_string(),
            Value::Bool(self.activate_testcases),
        );
        Value::Object(fields)
    }
}

/// Body of the run-start request.
///
/// A configuration read with [`RunConfiguration::from_json`] is forwarded to
/// the runner exactly as written: nested fields, nulls and values of any type
/// are kept. Only [`RunConfiguration::with_filter`] changes it, by appending
/// to `filters`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunConfiguration {
    fields: Map<String, Value>,
}

impl RunConfiguration {
    /// Build a run configuration for a model.
    pub fn for_model(model: &ModelConfig) -> Self {
        let mut fields = Map::new();
        fields.insert("modelName".to_string(), Value::from(model.model_name.as_str()));
        fields.insert("examVersion".to_string(), Value::from(model.exam_version));
        fields.insert(
            "targetEndpoint".to_string(),
            Value::from(model.target_endpoint.as_str()),
        );
        Self { fields }
    }

    /// Builder method to add a filter.
    ///
    /// A `filters` value that is not a list is replaced.
    pub fn with_filter(mut self, filter: TestrunFilter) -> Self {
        let filter = filter.into_value();
        match self.fields.get_mut("filters") {
            Some(Value::Array(filters)) => filters.push(filter),
            _ => {
                self.fields
                    .insert("filters".to_string(), Value::Array(vec![filter]));
            }
        }
        self
    }

    /// Parse a run configuration from JSON text. The text must hold an object.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        match serde_json::from_str(text)? {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(CoreError::InvalidInput(format!(
                "run configuration must be a JSON object, got {}",
                other
            ))),
        }
    }

    /// Model named by the configuration, if it names one as a string.
    pub fn model_name(&self) -> Option<&str> {
        self.fields.get("modelName").and_then(Value::as_str)
    }

    /// Look up a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}
