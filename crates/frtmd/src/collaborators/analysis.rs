use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured result of analysing a package.
///
/// The daemon treats the document as opaque JSON and stores it verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Analysis(Value);

impl Analysis {
    #[must_use]
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Analysis {
    fn from(document: Value) -> Self {
        Self::new(document)
    }
}
