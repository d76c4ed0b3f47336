//! Per-call diagnostic output.
//!
//! Each settled call gets one `network` span holding a one-line summary and,
//! at DEBUG, the full record.

use devtap_protocol::NetworkRecord;

pub(crate) fn report(record: &NetworkRecord) {
    let span = tracing::info_span!("network", id = %record.id, kind = %record.kind);
    let _enter = span.enter();

    let label = record.kind.label();
    match record.error.as_deref() {
        None => tracing::info!(
            "{label} {} {} [{}] ({}ms)",
            record.method,
            record.url,
            record.status.unwrap_or_default(),
            record.duration.unwrap_or_default(),
        ),
        Some(error) => {
            tracing::warn!("{label} {} {} [NO RESPONSE]", record.method, record.url);
            tracing::error!(error, "network error - no response from server");
        }
    }
    tracing::debug!(?record, "captured");
}
