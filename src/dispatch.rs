use anyhow::{anyhow, Result};

use crate::providers::types::{message::Message, tool::Tool};

/// Inspect a completion and either hand back its text or run the tool it
/// asked for.
///
/// Text content ends the interaction: the text is returned and no tool runs,
/// even if the message also carries tool calls. Otherwise each tool request is
/// matched by name against the declared tools and invoked with its parsed
/// arguments. A name with no matching tool is skipped with a warning. A tool
/// request whose argument text was unparseable is an error here; nothing was
/// invoked with bad arguments upstream, so the failure surfaces to the caller.
pub fn dispatch(message: &Message, tools: &[Tool]) -> Result<Option<String>> {
    let text = message.text();
    if !text.is_empty() {
        return Ok(Some(text));
    }

    for tool_use in message.tool_use() {
        if tool_use.is_error {
            return Err(anyhow!(
                "Cannot dispatch tool request '{}': {}",
                tool_use.name,
                tool_use
                    .error_message
                    .as_deref()
                    .unwrap_or("malformed arguments")
            ));
        }

        match tools.iter().find(|tool| tool.name == tool_use.name) {
            Some(tool) => {
                (tool.function)(&tool_use.parameters)?;
            }
            None => {
                eprintln!("warning: no tool registered for '{}'", tool_use.name);
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::types::content::{Content, ToolUse};
    use crate::providers::types::message::Role;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn recording_tool(name: &str) -> (Tool, Arc<Mutex<Vec<Value>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = calls.clone();
        let tool = Tool::new(
            name,
            "records the arguments it was invoked with",
            HashMap::new(),
            move |args| {
                recorded.lock().unwrap().push(args.clone());
                Ok(json!(null))
            },
        );
        (tool, calls)
    }

    fn tool_use_message(name: &str, parameters: Value) -> Message {
        Message::new(
            Role::Assistant,
            vec![Content::ToolUse(ToolUse {
                id: "call_1".to_string(),
                name: name.to_string(),
                parameters,
                is_error: false,
                error_message: None,
            })],
        )
        .unwrap()
    }

    #[test]
    fn test_dispatch_invokes_matching_tool() -> Result<()> {
        let (tool, calls) = recording_tool("lookupTime");
        let message = tool_use_message(
            "lookupTime",
            json!({"location": "Europe/London", "name": "London, England"}),
        );

        let result = dispatch(&message, &[tool])?;

        assert!(result.is_none());
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            json!({"location": "Europe/London", "name": "London, England"})
        );
        Ok(())
    }

    #[test]
    fn test_dispatch_returns_text_without_invoking() -> Result<()> {
        let (tool, calls) = recording_tool("lookupTime");
        let message = Message::assistant("Hello!")?;

        let result = dispatch(&message, &[tool])?;

        assert_eq!(result, Some("Hello!".to_string()));
        assert!(calls.lock().unwrap().is_empty());
        Ok(())
    }

    #[test]
    fn test_dispatch_ignores_unknown_tool_name() -> Result<()> {
        let (tool, calls) = recording_tool("lookupTime");
        let message = tool_use_message("getWeather", json!({"location": "London"}));

        let result = dispatch(&message, &[tool])?;

        assert!(result.is_none());
        assert!(calls.lock().unwrap().is_empty());
        Ok(())
    }

    #[test]
    fn test_dispatch_errors_on_malformed_arguments() {
        let (tool, calls) = recording_tool("lookupTime");
        let message = Message::new(
            Role::Assistant,
            vec![Content::ToolUse(ToolUse {
                id: "call_1".to_string(),
                name: "lookupTime".to_string(),
                parameters: json!("invalid json {"),
                is_error: true,
                error_message: Some("Could not interpret tool use parameters".to_string()),
            })],
        )
        .unwrap();

        let result = dispatch(&message, &[tool]);

        assert!(result.is_err());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_dispatch_propagates_tool_failure() {
        let tool = Tool::new("lookupTime", "always fails", HashMap::new(), |_| {
            Err(anyhow!("boom"))
        });
        let message = tool_use_message("lookupTime", json!({}));

        let result = dispatch(&message, &[tool]);
        assert!(result.is_err());
    }
}
