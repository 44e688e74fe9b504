//! `get_current_weather`: stub that returns mock weather data.
//!
//! Deterministic per location so agent runs can be exercised end-to-end
//! without network access.

use async_trait::async_trait;
use planloop_core::error::ToolError;
use planloop_core::tool::Tool;
use planloop_core::{Arguments, Value};

use crate::binding::Args;

pub struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_current_weather"
    }

    fn description(&self) -> &str {
        "Returns the current weather for a given location. Arguments: location (string)."
    }

    async fn execute(&self, arguments: &Arguments) -> Result<Value, ToolError> {
        let args = Args::bind(self.name(), arguments)?;
        let location = args.text("location")?;
        let location = location.trim();
        if location.is_empty() {
            return Err(ToolError::InvalidArguments(
                "get_current_weather: 'location' must not be empty".into(),
            ));
        }

        let (conditions, temperature) = mock_weather(location);
        Ok(Value::Str(format!(
            "The current weather in {location} is {conditions}, {temperature}°C."
        )))
    }
}

/// Deterministic conditions and temperature from a hash of the location name.
fn mock_weather(location: &str) -> (&'static str, i64) {
    let hash: u32 = location
        .to_lowercase()
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));

    let conditions = [
        "sunny",
        "partly cloudy",
        "overcast",
        "light rain",
        "heavy rain",
        "thundery",
        "snowy",
        "foggy",
    ];

    let temperature = i64::from(hash % 40) - 5; // -5 to 34°C
    (conditions[(hash as usize / 7) % conditions.len()], temperature)
}
