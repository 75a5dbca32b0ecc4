//! Custom tracing layers for Lineage
//!
//! This module provides the layer that attaches graph context to spans and
//! the JSONL formatting layer shared by console and file output.

use tracing::{Subscriber, span};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::{Format, Json, JsonFields};
use tracing_subscriber::{
    layer::{Context, Layer},
    registry::LookupSpan,
};

use crate::config::JsonlConfig;
use crate::context::{GraphContextData, GraphContextGuard};

/// Layer that attaches the active graph context to every new span
///
/// Spans opened while a [`GraphContextGuard`] is alive carry a
/// [`GraphContextExtension`], readable by later layers through the span's
/// extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphContextLayer;

impl GraphContextLayer {
    pub fn new() -> Self {
        Self
    }
}

/// Extension data stored on spans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphContextExtension {
    pub data: GraphContextData,
}

impl<S> Layer<S> for GraphContextLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, _attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            if let Some(data) = GraphContextGuard::current() {
                span.extensions_mut().insert(GraphContextExtension { data });
            }
        }
    }
}

/// JSONL formatting layer writing to `writer`
pub fn jsonl_layer<S, W>(
    writer: W,
    config: &JsonlConfig,
) -> tracing_subscriber::fmt::Layer<S, JsonFields, Format<Json>, W>
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(config.include_spans)
        .flatten_event(config.flatten_events)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_thread_ids(config.include_thread_info)
        .with_thread_names(config.include_thread_info)
        .with_writer(writer)
}
