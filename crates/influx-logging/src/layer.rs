// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `tracing` integration.
//!
//! [`InfluxLayer`] turns every `tracing` event into a [`LogRecord`] and hands
//! it to a handler:
//!
//! ```rust,ignore
//! use influx_logging::{BufferedInfluxHandler, HandlerConfig, InfluxLayer, LineProtocolClient};
//! use tracing_subscriber::prelude::*;
//!
//! let handler = BufferedInfluxHandler::new(HandlerConfig::new("logs"), LineProtocolClient::stdout())?;
//! tracing_subscriber::registry().with(InfluxLayer::new(handler)).init();
//!
//! tracing::info!(target: "shop::checkout", order = 42, "order placed");
//! ```
//!
//! The event target, with `::` turned into `.`, becomes the logger name, so
//! the event above lands in `shop` and `shop:checkout`.

use crate::handler::Emit;
use crate::record::{LogLevel, LogRecord, ATTR_EXCEPTION};
use crate::value::{ExceptionInfo, Value};
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Target prefix of this crate's own diagnostics.
const CRATE_TARGET: &str = "influx_logging";

/// Layer forwarding `tracing` events to a handler.
///
/// Events emitted by this crate are skipped, so a handler's own diagnostics
/// never loop back into it.
pub struct InfluxLayer<E> {
    emitter: E,
}

impl<E: Emit + 'static> InfluxLayer<E> {
    pub fn new(emitter: E) -> Self {
        Self { emitter }
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }
}

impl<S, E> Layer<S> for InfluxLayer<E>
where
    S: Subscriber,
    E: Emit + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if is_own_target(meta.target()) {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let mut record = LogRecord::new(
            meta.target().replace("::", "."),
            level_of(meta.level()),
            visitor.message.unwrap_or_default(),
        );
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            record = record.with_source(file, line);
        }
        if let Some(module) = meta.module_path() {
            record = record.with_module(module);
        }
        if let Some(thread) = std::thread::current().name() {
            record.set_attribute("thread_name", thread);
        }
        record.set_attribute("process_id", std::process::id());

        for (name, value) in visitor.attributes {
            record.set_attribute(name, value);
        }

        if let Err(e) = self.emitter.emit(record) {
            tracing::warn!(error = %e, "failed to emit log record");
        }
    }
}

fn is_own_target(target: &str) -> bool {
    target == CRATE_TARGET
        || target
            .strip_prefix(CRATE_TARGET)
            .is_some_and(|rest| rest.starts_with("::"))
}

fn level_of(level: &Level) -> LogLevel {
    match *level {
        Level::TRACE | Level::DEBUG => LogLevel::Debug,
        Level::INFO => LogLevel::Info,
        Level::WARN => LogLevel::Warning,
        Level::ERROR => LogLevel::Error,
    }
}

/// Collects event fields as record attributes.
#[derive(Default)]
struct RecordVisitor {
    message: Option<String>,
    attributes: Vec<(String, Value)>,
}

impl RecordVisitor {
    fn push(&mut self, field: &Field, value: Value) {
        self.attributes.push((field.name().to_string(), value));
    }
}

impl Visit for RecordVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.push(field, Value::from(value));
        }
    }

    fn record_error(&mut self, _field: &Field, value: &(dyn std::error::Error + 'static)) {
        let mut info = ExceptionInfo::from_error(value);
        info.type_name = debug_type_name(value).unwrap_or_else(|| "Error".to_string());
        self.attributes
            .push((ATTR_EXCEPTION.to_string(), Value::Exception(info)));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.push(field, Value::from(format!("{:?}", value)));
        }
    }
}

/// Leading identifier of an error's `Debug` output (`Os`, `Custom`,
/// `ParseIntError`, ...).
fn debug_type_name(err: &dyn std::error::Error) -> Option<String> {
    let text = format!("{:?}", err);
    let name: String = text
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == ':')
        .collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::value::Scalar;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Default)]
    struct Captured(Mutex<Vec<LogRecord>>);

    impl Emit for Captured {
        fn emit(&self, record: LogRecord) -> Result<()> {
            self.0.lock().push(record);
            Ok(())
        }
    }

    fn capture<F: FnOnce()>(f: F) -> Vec<LogRecord> {
        let captured = Arc::new(Captured::default());
        let subscriber = tracing_subscriber::registry().with(InfluxLayer::new(captured.clone()));
        tracing::subscriber::with_default(subscriber, f);
        let records = captured.0.lock().clone();
        records
    }

    #[test]
    fn test_event_becomes_record() {
        let records = capture(|| {
            tracing::warn!(target: "shop::checkout", order = 42, user = "alice", paid = true, "order stalled");
        });

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name(), "shop.checkout");
        assert_eq!(record.level(), LogLevel::Warning);
        assert_eq!(record.message(), "order stalled");
        assert_eq!(record.attribute("order"), Some(&Value::from(42i64)));
        assert_eq!(record.attribute("user"), Some(&Value::from("alice")));
        assert_eq!(record.attribute("paid"), Some(&Value::from(true)));
        assert!(record.attribute("file").is_some());
        assert!(matches!(
            record.attribute("line"),
            Some(Value::Scalar(Scalar::Integer(_)))
        ));
    }

    #[test]
    fn test_formatted_message() {
        let records = capture(|| {
            let attempt = 3;
            tracing::info!(target: "svc", "retry {} of 5", attempt);
        });

        assert_eq!(records[0].message(), "retry 3 of 5");
        assert_eq!(records[0].level(), LogLevel::Info);
    }

    #[test]
    fn test_error_field_becomes_exception() {
        let records = capture(|| {
            let err = std::io::Error::new(std::io::ErrorKind::NotFound, "config missing");
            tracing::error!(target: "svc", error = &err as &dyn std::error::Error, "startup failed");
        });

        match records[0].attribute(ATTR_EXCEPTION) {
            Some(Value::Exception(info)) => {
                assert_eq!(info.message, "config missing");
                assert_eq!(info.type_name, "Custom");
            }
            other => panic!("expected exception, got {:?}", other),
        }
    }

    #[test]
    fn test_own_events_are_skipped() {
        let records = capture(|| {
            tracing::info!(target: "influx_logging::buffered", "flushed");
            tracing::info!(target: "influx_logging", "flushed");
            tracing::info!(target: "influx_logging_app", "kept");
        });

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name(), "influx_logging_app");
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(level_of(&Level::TRACE), LogLevel::Debug);
        assert_eq!(level_of(&Level::DEBUG), LogLevel::Debug);
        assert_eq!(level_of(&Level::WARN), LogLevel::Warning);
        assert_eq!(level_of(&Level::ERROR), LogLevel::Error);
    }
}
