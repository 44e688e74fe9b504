//! `get_list_of_restaurants`: placeholder listing.

use async_trait::async_trait;
use planloop_core::error::ToolError;
use planloop_core::tool::Tool;
use planloop_core::{Arguments, Value};

use crate::binding::Args;

pub struct RestaurantsTool;

#[async_trait]
impl Tool for RestaurantsTool {
    fn name(&self) -> &str {
        "get_list_of_restaurants"
    }

    fn description(&self) -> &str {
        "Returns a list of restaurants in a given location. Arguments: location (string)."
    }

    async fn execute(&self, arguments: &Arguments) -> Result<Value, ToolError> {
        let args = Args::bind(self.name(), arguments)?;
        let location = args.text("location")?;
        Ok(Value::Str(format!(
            "Here are some restaurants in {}: Restaurant A, Restaurant B, Restaurant C.",
            location.trim()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_restaurants() {
        let args = Arguments::from([("location".to_string(), Value::from("Pune"))]);
        let result = RestaurantsTool.execute(&args).await.unwrap();
        assert_eq!(
            result.as_str().unwrap(),
            "Here are some restaurants in Pune: Restaurant A, Restaurant B, Restaurant C."
        );
    }
}
