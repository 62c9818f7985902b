//! Shared helpers for the ldkit-json-ld integration tests.
//!
//! `init_test_tracing` installs a thread-local subscriber that records the
//! spans opened by the processor, so tests can check which algorithm ran.

#![allow(dead_code)]

use ldkit_json_ld::{JsonLdOptions, StaticDocumentLoader};
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone)]
pub struct CapturedSpan {
    pub name: &'static str,
    pub level: tracing::Level,
    pub parent_name: Option<String>,
}

/// Spans captured by [`SpanCaptureLayer`], in creation order.
#[derive(Debug, Clone, Default)]
pub struct SpanStore(Arc<Mutex<Vec<CapturedSpan>>>);

impl SpanStore {
    pub fn has_span(&self, name: &str) -> bool {
        self.0.lock().unwrap().iter().any(|s| s.name == name)
    }

    pub fn find_span(&self, name: &str) -> Option<CapturedSpan> {
        self.0.lock().unwrap().iter().find(|s| s.name == name).cloned()
    }

    pub fn span_names(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().iter().map(|s| s.name).collect()
    }
}

pub struct SpanCaptureLayer {
    store: SpanStore,
}

impl<S> Layer<S> for SpanCaptureLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: Context<'_, S>,
    ) {
        let parent_name = attrs
            .parent()
            .and_then(|pid| ctx.span(pid))
            .map(|span| span.name().to_string())
            .or_else(|| ctx.lookup_current().map(|span| span.name().to_string()));
        if let Some(span) = ctx.span(id) {
            let meta = span.metadata();
            self.store.0.lock().unwrap().push(CapturedSpan {
                name: meta.name(),
                level: *meta.level(),
                parent_name,
            });
        }
    }
}

/// Install a capturing subscriber for the current thread. Log output goes
/// through the test writer, filtered by `RUST_LOG`.
pub fn init_test_tracing() -> (SpanStore, DefaultGuard) {
    let store = SpanStore::default();
    let subscriber = tracing_subscriber::registry()
        .with(SpanCaptureLayer {
            store: store.clone(),
        })
        .with(
            tracing_subscriber::fmt::layer()
                .with_test_writer()
                .with_filter(tracing_subscriber::EnvFilter::from_default_env()),
        );
    let guard = tracing::subscriber::set_default(subscriber);
    (store, guard)
}

/// Options whose document loader serves `documents` by URL.
pub fn options_with_documents(documents: &[(&str, serde_json::Value)]) -> JsonLdOptions {
    let loader = documents
        .iter()
        .fold(StaticDocumentLoader::new(), |loader, (url, doc)| {
            loader.with_document(*url, doc.clone())
        });
    JsonLdOptions::default().with_document_loader(Arc::new(loader))
}
