use anyhow::{anyhow, Result};
use reqwest::blocking::Client; // sync calls, one interaction per run
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;

use super::{
    base::{Provider, Usage},
    configs::{base::ProviderConfig, openai::OpenAiProviderConfig},
    types::{message::Message, tool::Tool},
    utils::{
        check_openai_context_length_error, messages_to_openai_spec, openai_response_to_message,
        tools_to_openai_spec,
    },
};

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn get_usage(data: &Value) -> Result<Usage> {
        let usage = data
            .get("usage")
            .ok_or_else(|| anyhow!("No usage data in response"))?;

        let input_tokens = usage
            .get("prompt_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let output_tokens = usage
            .get("completion_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let total_tokens = usage
            .get("total_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32)
            .or_else(|| match (input_tokens, output_tokens) {
                (Some(input), Some(output)) => Some(input + output),
                _ => None,
            });

        Ok(Usage::new(input_tokens, output_tokens, total_tokens))
    }

    fn post(&self, payload: Value) -> Result<Value> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()?;

        match response.status() {
            StatusCode::OK => Ok(response.json()?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            _ => Err(anyhow!("Request failed: {}", response.status())),
        }
    }
}

impl Provider for OpenAiProvider {
    fn from_env() -> Result<Self> {
        let config = OpenAiProviderConfig::from_env()?;
        Self::new(config)
    }

    fn complete(
        &self,
        model: &str,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
        temperature: Option<f32>,
        max_tokens: Option<i32>,
    ) -> Result<(Message, Usage)> {
        let system_message = json!({
            "role": "system",
            "content": system
        });

        // Convert messages and tools to OpenAI format
        let messages_spec = messages_to_openai_spec(messages);
        let tools_spec = if !tools.is_empty() {
            tools_to_openai_spec(tools)?
        } else {
            vec![]
        };

        // Build payload with the system message first
        let mut messages_array = vec![system_message];
        messages_array.extend(messages_spec);

        let mut payload = json!({
            "model": model,
            "messages": messages_array
        });

        // The model decides on its own whether to answer or request a tool
        if !tools_spec.is_empty() {
            payload
                .as_object_mut()
                .unwrap()
                .insert("tools".to_string(), json!(tools_spec));
            payload
                .as_object_mut()
                .unwrap()
                .insert("tool_choice".to_string(), json!("auto"));
        }
        if let Some(temp) = temperature {
            payload
                .as_object_mut()
                .unwrap()
                .insert("temperature".to_string(), json!(temp));
        }
        if let Some(tokens) = max_tokens {
            payload
                .as_object_mut()
                .unwrap()
                .insert("max_tokens".to_string(), json!(tokens));
        }

        // Make request
        let response = self.post(payload)?;

        // Raise specific error if context length is exceeded
        if let Some(error) = response.get("error") {
            if let Some(err) = check_openai_context_length_error(error) {
                return Err(err.into());
            }
            return Err(anyhow!("OpenAI API error: {}", error));
        }

        // Parse response
        let message = openai_response_to_message(response.clone())?;
        let usage = Self::get_usage(&response)?;

        Ok((message, usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setup_mock_server(body: &Value) -> (mockito::ServerGuard, mockito::Mock, OpenAiProvider) {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .create();

        let provider = OpenAiProvider::new(OpenAiProviderConfig {
            api_key: "test_api_key".to_string(),
            host: server.url(),
        })
        .unwrap();

        (server, mock, provider)
    }

    #[test]
    fn test_complete_basic() -> Result<()> {
        let response_body = json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Hello! How can I assist you today?",
                    "tool_calls": null
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 12,
                "completion_tokens": 15,
                "total_tokens": 27
            }
        });

        let (_server, _mock, provider) = setup_mock_server(&response_body);

        let messages = vec![Message::user("Hello?")?];
        let (message, usage) = provider.complete(
            "gpt-3.5-turbo",
            "You are a helpful assistant.",
            &messages,
            &[],
            None,
            None,
        )?;

        assert_eq!(message.text(), "Hello! How can I assist you today?");
        assert!(message.tool_use().is_empty());
        assert_eq!(usage.input_tokens, Some(12));
        assert_eq!(usage.output_tokens, Some(15));
        assert_eq!(usage.total_tokens, Some(27));
        Ok(())
    }

    #[test]
    fn test_complete_tool_request() -> Result<()> {
        let response_body = json!({
            "id": "chatcmpl-tool",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_123",
                        "type": "function",
                        "function": {
                            "name": "lookupTime",
                            "arguments": "{\"location\":\"Europe/London\",\"name\":\"London, England\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {
                "prompt_tokens": 20,
                "completion_tokens": 15,
                "total_tokens": 35
            }
        });

        let (_server, _mock, provider) = setup_mock_server(&response_body);

        let tools = vec![Tool::new(
            "lookupTime",
            "get the current time in a given location",
            std::collections::HashMap::from([("type".to_string(), json!("object"))]),
            |_| Ok(json!(null)),
        )];
        let messages = vec![Message::user("What time is it in London, England?")?];
        let (message, usage) = provider.complete(
            "gpt-3.5-turbo",
            "You are a helpful assistant.",
            &messages,
            &tools,
            None,
            None,
        )?;

        let tool_uses = message.tool_use();
        assert_eq!(tool_uses.len(), 1);
        assert_eq!(tool_uses[0].name, "lookupTime");
        assert_eq!(
            tool_uses[0].parameters,
            json!({"location": "Europe/London", "name": "London, England"})
        );
        assert_eq!(usage.total_tokens, Some(35));
        Ok(())
    }

    #[test]
    fn test_complete_server_error() -> Result<()> {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(500)
            .create();

        let provider = OpenAiProvider::new(OpenAiProviderConfig {
            api_key: "test_api_key".to_string(),
            host: server.url(),
        })?;

        let messages = vec![Message::user("Hello?")?];
        let result = provider.complete(
            "gpt-3.5-turbo",
            "You are a helpful assistant.",
            &messages,
            &[],
            None,
            None,
        );

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Server error"));
        Ok(())
    }

    #[test]
    fn test_complete_api_error_object() -> Result<()> {
        let response_body = json!({
            "error": {
                "code": "invalid_api_key",
                "message": "Incorrect API key provided"
            }
        });

        let (_server, _mock, provider) = setup_mock_server(&response_body);

        let messages = vec![Message::user("Hello?")?];
        let result = provider.complete(
            "gpt-3.5-turbo",
            "You are a helpful assistant.",
            &messages,
            &[],
            None,
            None,
        );

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("OpenAI API error"));
        Ok(())
    }
}
