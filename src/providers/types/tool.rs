use std::collections::HashMap;
use std::fmt::Debug;

/// A callable capability declared to the model.
///
/// The declaration (name, description, json schema) travels on the wire; the
/// boxed function stays local and is what dispatch invokes when the model
/// requests this tool by name.
pub struct Tool {
    /// The name of the tool
    pub name: String,
    /// A description of what the tool does
    pub description: String,
    /// A json schema of the function signature
    pub parameters: HashMap<String, serde_json::Value>,
    /// The local handler invoked with the model-supplied arguments
    pub function:
        Box<dyn Fn(&serde_json::Value) -> anyhow::Result<serde_json::Value> + Send + Sync>,
}

impl Tool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: HashMap<String, serde_json::Value>,
        function: impl Fn(&serde_json::Value) -> anyhow::Result<serde_json::Value>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Tool {
            name: name.into(),
            description: description.into(),
            parameters,
            function: Box::new(function),
        }
    }
}

impl Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("function", &"<function>")
            .finish()
    }
}
