use aws_sdk_cloudwatchlogs::types::OrderBy;
use events_deploy_core::services::LogService;
use events_deploy_core::RemoteError;

use super::{block_on, remote_error, AwsCloud};

impl LogService for AwsCloud {
    fn latest_stream(&self, group: &str) -> Result<Option<String>, RemoteError> {
        let output = block_on(
            self.logs
                .describe_log_streams()
                .log_group_name(group)
                .order_by(OrderBy::LastEventTime)
                .descending(true)
                .limit(1)
                .send(),
        )
        .map_err(|error| remote_error("DescribeLogStreams", error))?;
        Ok(output
            .log_streams()
            .first()
            .and_then(|stream| stream.log_stream_name())
            .map(str::to_string))
    }

    fn recent_events(
        &self,
        group: &str,
        stream: &str,
        limit: i32,
    ) -> Result<Vec<String>, RemoteError> {
        let output = block_on(
            self.logs
                .get_log_events()
                .log_group_name(group)
                .log_stream_name(stream)
                .limit(limit)
                .send(),
        )
        .map_err(|error| remote_error("GetLogEvents", error))?;
        Ok(output
            .events()
            .iter()
            .filter_map(|event| event.message())
            .map(|message| message.trim_end().to_string())
            .collect())
    }
}
