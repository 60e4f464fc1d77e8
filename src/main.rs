use anyhow::Result;
use cliclack::spinner;
use console::style;
use serde_json::json;
use std::collections::HashMap;

use timebot::dispatch::dispatch;
use timebot::providers::base::Provider;
use timebot::providers::openai::OpenAiProvider;
use timebot::providers::types::message::Message;
use timebot::providers::types::tool::Tool;
use timebot::timeapi::{LookupTimeArgs, WorldTimeClient};

const MODEL: &str = "gpt-3.5-turbo";
const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const QUESTION: &str = "What time is it in London, England?";

/// Declare the lookupTime capability, backed by the World Time API.
fn lookup_time_tool(client: WorldTimeClient) -> Tool {
    let parameters = HashMap::from([
        ("type".to_string(), json!("object")),
        (
            "properties".to_string(),
            json!({
                "location": {
                    "type": "string",
                    "description": "The location, e.g. Beijing, China. But it should be written in a timezone name like Asia/Shanghai"
                },
                "name": {
                    "type": "string",
                    "description": "The location mentioned in the prompt. Example: Beijing, China."
                }
            }),
        ),
        ("required".to_string(), json!(["location", "name"])),
    ]);

    Tool::new(
        "lookupTime",
        "get the current time in a given location",
        parameters,
        move |args| {
            let args: LookupTimeArgs = serde_json::from_value(args.clone())?;
            client.lookup_time(&args.location, &args.name);
            Ok(json!(null))
        },
    )
}

fn main() -> Result<()> {
    let provider = OpenAiProvider::from_env()?;
    let tools = vec![lookup_time_tool(WorldTimeClient::new()?)];

    let question = Message::user(QUESTION)?;
    println!("{}", style(question.summary()).dim());

    let spin = spinner();
    spin.start("awaiting reply");
    let result = provider.complete(MODEL, SYSTEM_PROMPT, &[question], &tools, None, None);
    spin.stop("");

    let (reply, usage) = result?;
    println!("{}", style(reply.summary()).dim());
    if let Some(total) = usage.total_tokens {
        println!("{}", style(format!("tokens used: {}", total)).dim());
    }

    if let Some(content) = dispatch(&reply, &tools)? {
        println!("{}", content);
    }

    Ok(())
}
