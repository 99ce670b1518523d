use prometheus::{Encoder, TextEncoder};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to export metrics: {0}")]
    ExportError(String),
}

/// Renders every counter registered with the default prometheus registry in
/// text exposition format. Command counters register themselves lazily on
/// first use.
pub async fn metrics_handler() -> Result<String, MetricsError> {
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    encoder.encode(&metric_families, &mut buffer).map_err(|e| {
        error!("Failed to encode metrics: {}", e);
        MetricsError::ExportError(e.to_string())
    })?;

    String::from_utf8(buffer).map_err(|e| MetricsError::ExportError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn metrics_render_as_text() {
        let counter = prometheus::register_int_counter!(
            "metrics_render_test_total",
            "Test counter for exposition output"
        )
        .expect("metric can be created");
        counter.inc();

        let body = metrics_handler().await.expect("metrics should render");
        assert!(body.contains("metrics_render_test_total"));
    }
}
