//! Prometheus metrics for the game.
//!
//! Every label value is drawn from a closed set; anything else is bucketed
//! as `"__unknown__"` so a misbehaving caller cannot blow up cardinality.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::HideSeekError;

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

const PHASES: [&str; 4] = ["inactive", "hiding", "seeking", "delay"];

const FAMILIES: [&str; 6] = [
    "matching",
    "measuring",
    "radar",
    "thermometer",
    "tentacles",
    "photo",
];

const QUESTION_OUTCOMES: [&str; 3] = ["asked", "answered", "expired"];

const CARD_ACTIONS: [&str; 5] = ["drawn", "kept", "returned", "played", "discarded"];

const TASK_KINDS: [&str; 5] = [
    "start_round",
    "release_seekers",
    "max_hiding_time",
    "check_question",
    "expire_condition",
];

const ERROR_CATEGORIES: [&str; 3] = ["game", "frontend", "task"];

/// Returns `value` if it is one of `known`, otherwise `"__unknown__"`.
#[must_use]
pub fn sanitize_label<'a>(value: &'a str, known: &[&str]) -> &'a str {
    if known.contains(&value) {
        value
    } else {
        "__unknown__"
    }
}

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. Repeated calls are no-ops.
///
/// # Errors
///
/// Returns `HideSeekError::Io` if the recorder or HTTP listener cannot be
/// installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), HideSeekError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| HideSeekError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!("hideseek_rounds_started_total", "Hiding rounds started");
    describe_counter!(
        "hideseek_questions_total",
        "Questions by family and outcome"
    );
    describe_counter!("hideseek_cards_total", "Card movements by action");
    describe_counter!(
        "hideseek_scheduled_tasks_total",
        "Scheduled tasks executed by kind and status"
    );
    describe_gauge!("hideseek_current_phase", "Current game phase (1 = active)");
    describe_gauge!("hideseek_hand_size", "Cards in the hider's hand");
    describe_counter!("hideseek_errors_total", "Errors by category");
}

/// Records the start of a hiding round.
pub fn record_round_started() {
    counter!("hideseek_rounds_started_total").increment(1);
}

/// Records a question event.
pub fn record_question(family: &str, outcome: &str) {
    counter!(
        "hideseek_questions_total",
        "family" => sanitize_label(family, &FAMILIES).to_owned(),
        "outcome" => sanitize_label(outcome, &QUESTION_OUTCOMES).to_owned(),
    )
    .increment(1);
}

/// Records `count` cards moved by `action`.
pub fn record_cards(action: &str, count: u64) {
    counter!(
        "hideseek_cards_total",
        "action" => sanitize_label(action, &CARD_ACTIONS).to_owned(),
    )
    .increment(count);
}

/// Records the execution of a scheduled task.
pub fn record_task(kind: &str, success: bool) {
    let status = if success { "ok" } else { "failed" };
    counter!(
        "hideseek_scheduled_tasks_total",
        "kind" => sanitize_label(kind, &TASK_KINDS).to_owned(),
        "status" => status,
    )
    .increment(1);
}

/// Sets the current phase gauge, zeroing the previous phase label.
pub fn set_current_phase(phase: &str, previous: Option<&str>) {
    if let Some(prev) = previous {
        gauge!("hideseek_current_phase", "phase" => sanitize_label(prev, &PHASES).to_owned())
            .set(0.0);
    }
    gauge!("hideseek_current_phase", "phase" => sanitize_label(phase, &PHASES).to_owned())
        .set(1.0);
}

/// Sets the hand size gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_hand_size(size: usize) {
    gauge!("hideseek_hand_size").set(size as f64);
}

/// Records an error by category.
pub fn record_error(category: &str) {
    counter!(
        "hideseek_errors_total",
        "category" => sanitize_label(category, &ERROR_CATEGORIES).to_owned(),
    )
    .increment(1);
}
