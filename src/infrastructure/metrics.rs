//! Metrics for the orchestration core
//!
//! Recording goes through the `metrics` facade. Without an installed
//! recorder every call is a no-op, so the functions are safe to call from
//! tests.

use crate::domain::call::{Reason, UserMessage};
use crate::domain::message::MediaKind;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and describe every metric
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    Ok(handle)
}

pub fn describe_metrics() {
    describe_counter!(
        "callflow_events_processed_total",
        "Total number of events processed by the call state machine"
    );
    describe_counter!(
        "callflow_commands_executed_total",
        "Total number of commands executed successfully"
    );
    describe_counter!(
        "callflow_commands_failed_total",
        "Total number of commands that failed in the engine or a collaborator"
    );
    describe_counter!(
        "callflow_calls_declined_total",
        "Total number of incoming calls declined by policy"
    );
    describe_counter!(
        "callflow_auto_answers_total",
        "Total number of calls answered automatically"
    );
    describe_counter!(
        "callflow_call_errors_total",
        "Total number of calls that ended in error"
    );
    describe_counter!(
        "callflow_user_messages_total",
        "Total number of messages surfaced to the user"
    );
    describe_counter!(
        "callflow_exports_total",
        "Total number of attachment exports attempted"
    );
    describe_gauge!(
        "callflow_tracked_calls",
        "Number of calls currently tracked by the core"
    );
}

pub fn record_event_processed(event_type: &'static str) {
    counter!("callflow_events_processed_total", "type" => event_type).increment(1);
}

pub fn record_command_executed(command: &'static str) {
    counter!("callflow_commands_executed_total", "command" => command).increment(1);
}

pub fn record_command_failed(command: &'static str) {
    counter!("callflow_commands_failed_total", "command" => command).increment(1);
}

pub fn record_call_declined(reason: Reason) {
    counter!("callflow_calls_declined_total", "reason" => reason.as_str()).increment(1);
}

pub fn record_auto_answer() {
    counter!("callflow_auto_answers_total").increment(1);
}

pub fn record_call_error(reason: Reason) {
    counter!("callflow_call_errors_total", "reason" => reason.as_str()).increment(1);
}

pub fn record_user_message(message: &UserMessage) {
    counter!("callflow_user_messages_total", "key" => message.key()).increment(1);
}

pub fn record_export(kind: MediaKind, success: bool) {
    counter!(
        "callflow_exports_total",
        "kind" => format!("{:?}", kind).to_lowercase(),
        "success" => success.to_string()
    )
    .increment(1);
}

pub fn update_tracked_calls(count: usize) {
    gauge!("callflow_tracked_calls").set(count as f64);
}
