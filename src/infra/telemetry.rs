use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::posts::METRIC_LIKE_RACE_ABSORBED_TOTAL;
use crate::cache::{
    METRIC_CACHE_ERROR_TOTAL, METRIC_CACHE_HIT_TOTAL, METRIC_CACHE_INVALIDATION_FAILED_TOTAL,
    METRIC_CACHE_MISS_TOTAL,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Per-query and connection chatter from these crates is capped at `warn`.
const QUIET_DEPENDENCIES: &[&str] = &["sqlx::query=warn", "hyper=warn", "h2=warn", "redis=warn"];

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = QUIET_DEPENDENCIES.iter().fold(
        EnvFilter::builder()
            .with_default_directive(logging.level.into())
            .from_env_lossy(),
        |filter, directive| match directive.parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        },
    );

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })?;

    info!(
        target = "pictura::telemetry",
        level = %logging.level,
        json = matches!(logging.format, LogFormat::Json),
        "logging initialised"
    );
    Ok(())
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT_TOTAL,
            Unit::Count,
            "Listing reads answered from the read cache."
        );
        describe_counter!(
            METRIC_CACHE_MISS_TOTAL,
            Unit::Count,
            "Listing reads that found no cached entry."
        );
        describe_counter!(
            METRIC_CACHE_ERROR_TOTAL,
            Unit::Count,
            "Read cache operations that failed, timed out or returned undecodable data."
        );
        describe_counter!(
            METRIC_CACHE_INVALIDATION_FAILED_TOTAL,
            Unit::Count,
            "Listing invalidations that did not reach the read cache."
        );
        describe_counter!(
            METRIC_LIKE_RACE_ABSORBED_TOTAL,
            Unit::Count,
            "Like toggles that lost a race and left the counter untouched."
        );
    });
}
