use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "http://worldtimeapi.org";

/// Arguments the model supplies when it requests a time lookup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LookupTimeArgs {
    /// IANA timezone identifier, e.g. "Europe/London"
    pub location: String,
    /// Human-readable place name as mentioned in the prompt
    pub name: String,
}

/// Client for the World Time API.
pub struct WorldTimeClient {
    client: Client,
    host: String,
}

impl WorldTimeClient {
    pub fn new() -> Result<Self> {
        Self::with_host(DEFAULT_HOST)
    }

    pub fn with_host(host: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            host: host.into(),
        })
    }

    /// Fetch the current datetime for a timezone. The offset embedded in the
    /// response body is the source of truth, never the local clock.
    pub fn current_time(&self, location: &str) -> Result<DateTime<FixedOffset>> {
        let url = format!(
            "{}/api/timezone/{}",
            self.host.trim_end_matches('/'),
            location
        );
        let response = self.client.get(&url).send()?;

        match response.status() {
            StatusCode::OK => {}
            status => return Err(anyhow!("Time lookup failed for '{}': {}", location, status)),
        }

        let body: serde_json::Value = response.json()?;
        let datetime = body
            .get("datetime")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("No datetime field in response for '{}'", location))?;

        DateTime::parse_from_rfc3339(datetime)
            .map_err(|e| anyhow!("Could not parse datetime '{}': {}", datetime, e))
    }

    /// Look up the current time in a location and print one sentence with it.
    /// Failures are logged and swallowed; this never raises to the caller.
    pub fn lookup_time(&self, location: &str, name: &str) {
        match self.local_time_sentence(location, name) {
            Ok(sentence) => println!("{}", sentence),
            Err(e) => eprintln!("{:?}", e),
        }
    }

    fn local_time_sentence(&self, location: &str, name: &str) -> Result<String> {
        let datetime = self.current_time(location)?;
        let formatted = format_in_zone(datetime, location)?;
        Ok(format!("The current time in {} is {}.", name, formatted))
    }
}

/// Interpret a datetime in the named zone and render a 12-hour clock string
/// like "3:04PM".
pub fn format_in_zone(datetime: DateTime<FixedOffset>, location: &str) -> Result<String> {
    let tz: Tz = location
        .parse()
        .map_err(|e| anyhow!("Unknown timezone '{}': {}", location, e))?;
    Ok(datetime.with_timezone(&tz).format("%-l:%M%p").to_string())
}
