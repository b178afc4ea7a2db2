// SPDX-License-Identifier: MIT

use crate::adk::tool::Tool;
use async_trait::async_trait;
use chrono::{DateTime, Local};

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reports the current local date and time; ignores its input.
pub struct CurrentTimeTool {
    clock: fn() -> DateTime<Local>,
}

impl CurrentTimeTool {
    pub fn new() -> Self {
        Self { clock: Local::now }
    }

    pub fn with_clock(clock: fn() -> DateTime<Local>) -> Self {
        Self { clock }
    }
}

impl Default for CurrentTimeTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "get_current_time"
    }

    fn description(&self) -> &str {
        "Useful to know the current date, the exact time, or what day it is today."
    }

    async fn invoke(&self, _input: &str) -> String {
        (self.clock)().format(TIME_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, TimeZone};

    #[tokio::test]
    async fn test_fixed_clock_format() {
        let tool = CurrentTimeTool::with_clock(|| {
            Local
                .with_ymd_and_hms(2024, 3, 9, 7, 5, 0)
                .earliest()
                .unwrap()
        });
        assert_eq!(tool.invoke("anything").await, "2024-03-09 07:05:00");
    }

    #[tokio::test]
    async fn test_system_clock_parses_back() {
        let out = CurrentTimeTool::new().invoke("").await;
        assert!(NaiveDateTime::parse_from_str(&out, TIME_FORMAT).is_ok());
    }
}
