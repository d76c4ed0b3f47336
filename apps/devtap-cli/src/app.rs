//! Runner orchestration: instrument the native host, issue the requests,
//! export the logs.

use std::path::PathBuf;
use std::time::Duration;

use devtap::{
    Debugger, FetchRequest, Host, RequestEvent, RequestKind, ResponseState, StatusFilter,
};
use serde_json::json;
use tokio::sync::oneshot;

use crate::config::{Config, RequestSpec};
use crate::export::JsonExport;

/// Runs every request once and returns the exported file paths.
pub async fn run(config: Config, urls: Vec<String>) -> anyhow::Result<Vec<PathBuf>> {
    let mut host = Host::native();
    let mut export = JsonExport::new(&config.export_dir);
    let debugger = Debugger::init(&mut host, config.options(), &mut export);
    let timeout = Duration::from_millis(config.request_timeout_ms);

    let specs = config
        .requests
        .iter()
        .cloned()
        .chain(urls.into_iter().map(RequestSpec::get));
    for spec in specs {
        match spec.kind {
            RequestKind::Fetch => fetch(&host, &spec).await,
            RequestKind::Xhr => xhr(&host, &spec, timeout).await,
        }
    }

    summarize(&host, &debugger);
    Ok(export.trigger()?)
}

async fn fetch(host: &Host, spec: &RequestSpec) {
    let mut request = FetchRequest::new(&spec.url).method(&spec.method);
    if let Some(body) = &spec.body {
        request = request
            .header("content-type", "application/json")
            .body(body.clone());
    }

    match host.fetch.fetch(request).await {
        Ok(response) => host.console.info(&[
            json!(format!("{} {}", spec.method, spec.url)),
            json!(response.status()),
        ]),
        Err(e) => host.console.error(&[
            json!(format!("{} {} failed", spec.method, spec.url)),
            json!(e.to_string()),
        ]),
    }
}

/// Issues an event-style request and waits for it to settle, aborting it
/// after `timeout`.
async fn xhr(host: &Host, spec: &RequestSpec, timeout: Duration) {
    let (tx, mut rx) = oneshot::channel::<Option<u16>>();
    let tx = std::sync::Arc::new(std::sync::Mutex::new(Some(tx)));

    let mut request = host.request();
    for (event, tx) in [
        (RequestEvent::Load, std::sync::Arc::clone(&tx)),
        (RequestEvent::Error, tx),
    ] {
        request.add_event_listener(
            event,
            Box::new(move |state: &dyn ResponseState| {
                let taken = tx.lock().ok().and_then(|mut slot| slot.take());
                if let Some(tx) = taken {
                    let status = (event == RequestEvent::Load).then(|| state.status());
                    let _ = tx.send(status);
                }
            }),
        );
    }

    request.open(&spec.method, &spec.url);
    if spec.body.is_some() {
        request.set_request_header("content-type", "application/json");
    }
    if let Err(e) = request.send(spec.body.clone()) {
        host.console
            .error(&[json!(format!("{} {} not sent", spec.method, spec.url)), json!(e.to_string())]);
        return;
    }

    let settled = match tokio::time::timeout(timeout, &mut rx).await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!(url = %spec.url, "request timed out, aborting");
            request.abort();
            // The abort settles through the error listener; wait for it so
            // the record is in the store before the export.
            rx.await
        }
    };

    match settled {
        Ok(Some(status)) => host.console.info(&[
            json!(format!("{} {}", spec.method, spec.url)),
            json!(status),
        ]),
        Ok(None) | Err(_) => host.console.error(&[json!(format!(
            "{} {} failed",
            spec.method, spec.url
        ))]),
    }
}

fn summarize(host: &Host, debugger: &Debugger) {
    let all = debugger.network_logs_by_status(StatusFilter::All).len();
    let failed = debugger.network_logs_by_status(StatusFilter::Failure).len();
    host.console.log(&[
        json!("run complete"),
        json!({ "requests": all, "failed": failed }),
    ]);
}
