//! Post-deploy checks: configuration and log inspection, and a direct smoke
//! invocation with a synthetic proxy event.

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{DeployError, DeployResult};
use crate::services::{ComputeService, FunctionConfiguration, LogService};

pub const LOG_FETCH_LIMIT: i32 = 50;
pub const LOG_DISPLAY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInspection {
    pub configuration: FunctionConfiguration,
    pub log_group: String,
    pub log_stream: Option<String>,
    /// Oldest first, at most [`LOG_DISPLAY_LIMIT`] entries.
    pub recent_events: Vec<String>,
    /// Set when logs could not be read; never fatal.
    pub log_error: Option<String>,
}

pub fn log_group_for(function_name: &str) -> String {
    format!("/aws/lambda/{function_name}")
}

pub fn inspect_function(
    compute: &dyn ComputeService,
    logs: &dyn LogService,
    function_name: &str,
) -> DeployResult<FunctionInspection> {
    let configuration = compute
        .function_configuration(function_name)
        .map_err(DeployError::Function)?;
    let log_group = log_group_for(function_name);

    let mut inspection = FunctionInspection {
        configuration,
        log_group: log_group.clone(),
        log_stream: None,
        recent_events: Vec::new(),
        log_error: None,
    };

    let logs_result = logs.latest_stream(&log_group).and_then(|stream| match stream {
        Some(stream) => {
            let events = logs.recent_events(&log_group, &stream, LOG_FETCH_LIMIT)?;
            Ok(Some((stream, events)))
        }
        None => Ok(None),
    });
    match logs_result {
        Ok(Some((stream, events))) => {
            let skip = events.len().saturating_sub(LOG_DISPLAY_LIMIT);
            inspection.recent_events = events.into_iter().skip(skip).collect();
            inspection.log_stream = Some(stream);
        }
        Ok(None) => info!(group = %log_group, "no log streams found"),
        Err(error) => {
            warn!(group = %log_group, %error, "could not fetch logs");
            inspection.log_error = Some(error.to_string());
        }
    }
    Ok(inspection)
}

/// API Gateway proxy event for `GET /`.
pub fn smoke_event() -> Value {
    json!({
        "httpMethod": "GET",
        "path": "/",
        "headers": {},
        "queryStringParameters": null,
        "body": null,
        "isBase64Encoded": false
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmokeOutcome {
    pub status_code: i32,
    /// Parsed payload, or the raw text as a JSON string when it is not JSON.
    pub payload: Value,
    pub function_error: Option<String>,
}

pub fn smoke_invoke(
    compute: &dyn ComputeService,
    function_name: &str,
) -> DeployResult<SmokeOutcome> {
    let event = smoke_event().to_string().into_bytes();
    let result = compute
        .invoke(function_name, &event)
        .map_err(DeployError::Function)?;

    let payload = serde_json::from_slice(&result.payload)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&result.payload).into_owned()));
    Ok(SmokeOutcome {
        status_code: result.status_code,
        payload,
        function_error: result.function_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FakeCloud;

    #[test]
    fn inspection_trims_to_latest_events() {
        let cloud = FakeCloud::new().with_deployed_function("EventsApiFunction");
        let events: Vec<String> = (0..30).map(|n| format!("line {n}")).collect();
        cloud.push_log_stream("/aws/lambda/EventsApiFunction", "2026/10/19/[$LATEST]abc", events);

        let inspection = inspect_function(&cloud, &cloud, "EventsApiFunction").expect("inspect");

        assert_eq!(inspection.recent_events.len(), LOG_DISPLAY_LIMIT);
        assert_eq!(inspection.recent_events.first().map(String::as_str), Some("line 10"));
        assert_eq!(inspection.recent_events.last().map(String::as_str), Some("line 29"));
        assert_eq!(inspection.configuration.runtime, "python3.11");
    }

    #[test]
    fn log_failures_do_not_fail_inspection() {
        let cloud = FakeCloud::new()
            .with_deployed_function("EventsApiFunction")
            .fail_operation("DescribeLogStreams");

        let inspection = inspect_function(&cloud, &cloud, "EventsApiFunction").expect("inspect");
        assert!(inspection.log_error.is_some());
        assert!(inspection.log_stream.is_none());
    }

    #[test]
    fn missing_function_is_fatal() {
        let cloud = FakeCloud::new();
        let error = inspect_function(&cloud, &cloud, "EventsApiFunction").expect_err("absent");
        assert!(matches!(error, DeployError::Function(_)));
    }

    #[test]
    fn smoke_invocation_sends_get_root_event() {
        let cloud = FakeCloud::new().with_deployed_function("EventsApiFunction");

        let outcome = smoke_invoke(&cloud, "EventsApiFunction").expect("invoke");

        assert_eq!(outcome.status_code, 200);
        assert_eq!(outcome.function_error, None);
        let sent = cloud.last_invocation_payload().expect("payload recorded");
        let sent: Value = serde_json::from_slice(&sent).expect("json");
        assert_eq!(sent["httpMethod"], "GET");
        assert_eq!(sent["path"], "/");
    }
}
