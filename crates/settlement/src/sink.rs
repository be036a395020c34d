//! Presentation sink - where a session pushes its view models

use common::{BusinessPartner, SettlementTarget};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use trading::{MethodDescriptor, TradingOption};

use crate::types::AppliedTrading;

/// Severity of a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A view model pushed by a session
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    BusinessPartner(BusinessPartner),
    Target(SettlementTarget),
    /// Methods that will be negotiated
    Methods(Vec<Arc<MethodDescriptor>>),
    /// One method's options, as they arrive
    TradingOptions(Vec<TradingOption>),
    /// The working sequence after an apply or remove
    AppliedTradings(Vec<AppliedTrading>),
    Message { level: MessageLevel, text: String },
}

/// Receives view models from a session
///
/// Pushes come from the session and from its negotiation task, so
/// implementations must be callable from any thread and must not block.
pub trait PresentationSink: Send + Sync {
    fn push(&self, event: ViewEvent);

    fn message(&self, level: MessageLevel, text: impl Into<String>)
    where
        Self: Sized,
    {
        self.push(ViewEvent::Message {
            level,
            text: text.into(),
        });
    }
}

/// Push a message through a trait object
pub(crate) fn push_message(sink: &dyn PresentationSink, level: MessageLevel, text: impl Into<String>) {
    sink.push(ViewEvent::Message {
        level,
        text: text.into(),
    });
}

// ==================== Recording Implementation ====================

/// Keeps every pushed event, for tests and the command line
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event in push order
    pub fn events(&self) -> Vec<ViewEvent> {
        self.events.lock().clone()
    }

    /// All trading options pushed so far
    pub fn options(&self) -> Vec<TradingOption> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ViewEvent::TradingOptions(options) => Some(options.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Messages of one level
    pub fn messages(&self, level: MessageLevel) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                ViewEvent::Message { level: l, text } if *l == level => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// The most recently pushed working sequence
    pub fn last_applied(&self) -> Option<Vec<AppliedTrading>> {
        self.events.lock().iter().rev().find_map(|event| match event {
            ViewEvent::AppliedTradings(applied) => Some(applied.clone()),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl PresentationSink for RecordingSink {
    fn push(&self, event: ViewEvent) {
        self.events.lock().push(event);
    }
}

// ==================== Channel Implementation ====================

/// Forwards events over an unbounded channel
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ViewEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiving end of its channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ViewEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PresentationSink for ChannelSink {
    fn push(&self, event: ViewEvent) {
        if self.tx.send(event).is_err() {
            debug!("Presentation channel closed, event dropped");
        }
    }
}

// ==================== Tracing Implementation ====================

/// Logs every event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl PresentationSink for TracingSink {
    fn push(&self, event: ViewEvent) {
        match event {
            ViewEvent::BusinessPartner(partner) => {
                info!(partner_type = %partner.partner_type, code = %partner.code, name = %partner.name, "Business partner")
            }
            ViewEvent::Target(target) => info!(
                document_type = %target.document_type,
                document_entry = target.document_entry,
                total = target.total,
                currency = %target.currency,
                "Target document"
            ),
            ViewEvent::Methods(methods) => {
                let names: Vec<_> = methods.iter().map(|method| method.name.as_str()).collect();
                info!(methods = ?names, "Trading methods")
            }
            ViewEvent::TradingOptions(options) => {
                for option in options {
                    info!(mode = %option.mode(), id = %option.id, amount = ?option.amount, "{}", option.description)
                }
            }
            ViewEvent::AppliedTradings(applied) => {
                let total: f64 = applied.iter().map(|entry| entry.amount).sum();
                info!(entries = applied.len(), total, "Applied tradings")
            }
            ViewEvent::Message { level, text } => match level {
                MessageLevel::Info | MessageLevel::Success => info!("{}", text),
                MessageLevel::Warning => warn!("{}", text),
                MessageLevel::Error => error!("{}", text),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::BusinessPartnerType;

    #[test]
    fn test_recording_sink_filters() {
        let sink = RecordingSink::new();
        sink.push(ViewEvent::BusinessPartner(BusinessPartner::new(
            BusinessPartnerType::Customer,
            "C001",
            "Acme",
        )));
        sink.message(MessageLevel::Warning, "lookup slow");
        sink.message(MessageLevel::Error, "disk full");

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.messages(MessageLevel::Warning), vec!["lookup slow".to_string()]);
        assert!(sink.options().is_empty());
        assert!(sink.last_applied().is_none());

        sink.clear();
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_channel_sink_forwards() {
        let (sink, mut rx) = ChannelSink::new();
        push_message(&sink, MessageLevel::Info, "saving");

        assert_eq!(
            rx.recv().await,
            Some(ViewEvent::Message {
                level: MessageLevel::Info,
                text: "saving".to_string()
            })
        );

        drop(rx);
        // Receiver gone; push must not panic
        sink.push(ViewEvent::Methods(Vec::new()));
    }
}
