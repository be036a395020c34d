//! Concurrent negotiation across trading methods
//!
//! Every enabled method is negotiated on its own task. Outcomes are handed
//! to the caller in completion order, so a slow or failing method never
//! holds back the others.

use common::TradingSide;
use futures::FutureExt;
use observability::{NegotiationOutcomeLabel, SettlementMetrics};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Result, TradingError};
use crate::method::{MethodDescriptor, TradingMethod};
use crate::types::{NegotiationContext, TradingOption};

/// What one method answered
#[derive(Debug, Clone)]
pub struct NegotiationOutcome {
    pub method: Arc<MethodDescriptor>,
    pub result: Result<Vec<TradingOption>>,
    pub elapsed: Duration,
}

impl NegotiationOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Options offered, empty on failure
    pub fn options(&self) -> &[TradingOption] {
        match &self.result {
            Ok(options) => options,
            Err(_) => &[],
        }
    }
}

/// Summary of a whole fan-out
#[derive(Debug, Clone, Default)]
pub struct NegotiationReport {
    /// Names of methods that answered
    pub succeeded: Vec<String>,
    /// One error per failed method
    pub failed: Vec<TradingError>,
    /// Options surfaced across all methods
    pub option_count: usize,
    /// True when the fan-out was cancelled before every method answered
    pub cancelled: bool,
}

impl NegotiationReport {
    fn record(&mut self, outcome: &NegotiationOutcome) {
        match &outcome.result {
            Ok(options) => {
                self.succeeded.push(outcome.method.name.clone());
                self.option_count += options.len();
            }
            Err(e) => self.failed.push(e.clone()),
        }
    }

    /// Number of methods that answered, successfully or not
    pub fn completed(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Drives the fan-out and records metrics per method
#[derive(Debug, Clone)]
pub struct Negotiator {
    metrics: SettlementMetrics,
}

impl Negotiator {
    pub fn new(metrics: SettlementMetrics) -> Self {
        Self { metrics }
    }

    /// Negotiator recording metrics under the given side
    pub fn for_side(side: TradingSide) -> Self {
        Self::new(SettlementMetrics::new(side.as_str()))
    }

    /// Negotiate every enabled method concurrently
    ///
    /// `on_outcome` is called once per method as soon as it answers.
    /// Disabled methods are skipped and options pointing at a disabled
    /// method are dropped. Cancelling `cancel` aborts outstanding tasks.
    pub async fn negotiate_all<F>(
        &self,
        methods: Vec<Arc<dyn TradingMethod>>,
        context: Arc<NegotiationContext>,
        cancel: CancellationToken,
        mut on_outcome: F,
    ) -> NegotiationReport
    where
        F: FnMut(NegotiationOutcome) + Send,
    {
        let mut report = NegotiationReport::default();
        let mut tasks = JoinSet::new();

        for method in methods.into_iter().filter(|method| method.is_enabled()) {
            let context = Arc::clone(&context);
            debug!(method = %method.name(), style = ?method.descriptor().style, "Negotiating");
            tasks.spawn(negotiate_one(method, context));
        }

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    report.cancelled = true;
                    debug!(pending = tasks.len(), "Negotiation cancelled");
                    break;
                }
                joined = tasks.join_next() => {
                    let Some(joined) = joined else { break };
                    match joined {
                        Ok(outcome) => {
                            let outcome = drop_disabled_options(outcome);
                            self.observe(&outcome);
                            report.record(&outcome);
                            on_outcome(outcome);
                        }
                        Err(e) => warn!(error = %e, "Negotiation task did not complete"),
                    }
                }
            }
        }

        report
    }

    fn observe(&self, outcome: &NegotiationOutcome) {
        let label = match &outcome.result {
            Ok(options) => {
                debug!(
                    method = %outcome.method.name,
                    options = options.len(),
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    "Negotiation succeeded"
                );
                NegotiationOutcomeLabel::Succeeded
            }
            Err(e) => {
                warn!(method = %outcome.method.name, error = %e, "Negotiation failed");
                NegotiationOutcomeLabel::Failed
            }
        };
        self.metrics.record_negotiation(
            &outcome.method.name,
            label,
            outcome.elapsed,
            outcome.options().len(),
        );
    }
}

async fn negotiate_one(method: Arc<dyn TradingMethod>, context: Arc<NegotiationContext>) -> NegotiationOutcome {
    let descriptor = Arc::clone(method.descriptor());
    let started = Instant::now();

    let result = match AssertUnwindSafe(method.negotiate(&context)).catch_unwind().await {
        Ok(result) => result.map_err(|e| scope_to_method(&descriptor, e)),
        Err(payload) => Err(TradingError::negotiation(
            descriptor.name.clone(),
            panic_message(payload),
        )),
    };

    NegotiationOutcome {
        method: descriptor,
        result,
        elapsed: started.elapsed(),
    }
}

fn scope_to_method(descriptor: &MethodDescriptor, error: TradingError) -> TradingError {
    match error {
        TradingError::Negotiation { .. } => error,
        other => TradingError::negotiation(descriptor.name.clone(), other.to_string()),
    }
}

fn drop_disabled_options(mut outcome: NegotiationOutcome) -> NegotiationOutcome {
    if let Ok(options) = &mut outcome.result {
        let before = options.len();
        options.retain(|option| option.method().enabled);
        if options.len() != before {
            warn!(
                method = %outcome.method.name,
                dropped = before - options.len(),
                "Dropped options of a disabled method"
            );
        }
    }
    outcome
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::ContributionStyle;
    use async_trait::async_trait;
    use common::BusinessPartnerType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        Offer(usize),
        Fail(&'static str),
        Panic,
        Sleep(Duration, usize),
        /// Offers options that point at a disabled descriptor
        Stray,
    }

    struct ScriptedMethod {
        descriptor: Arc<MethodDescriptor>,
        behaviour: Behaviour,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedMethod {
        fn new(name: &str, behaviour: Behaviour) -> Self {
            Self::with_enabled(name, behaviour, true)
        }

        fn with_enabled(name: &str, behaviour: Behaviour, enabled: bool) -> Self {
            let descriptor = MethodDescriptor::new(
                TradingSide::Receipt,
                format!("test.{}", name),
                name,
                ContributionStyle::NegotiatedLookup,
            )
            .with_enabled(enabled);
            Self {
                descriptor: Arc::new(descriptor),
                behaviour,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn options(&self, count: usize) -> Vec<TradingOption> {
            (0..count)
                .map(|i| TradingOption::new(self.descriptor.clone(), format!("T{}", i), "option").with_amount(10.0))
                .collect()
        }
    }

    #[async_trait]
    impl TradingMethod for ScriptedMethod {
        fn descriptor(&self) -> &Arc<MethodDescriptor> {
            &self.descriptor
        }

        async fn negotiate(&self, _context: &NegotiationContext) -> Result<Vec<TradingOption>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behaviour {
                Behaviour::Offer(count) => Ok(self.options(*count)),
                Behaviour::Fail(message) => Err(TradingError::negotiation(self.name(), *message)),
                Behaviour::Panic => panic!("provider exploded"),
                Behaviour::Sleep(delay, count) => {
                    tokio::time::sleep(*delay).await;
                    Ok(self.options(*count))
                }
                Behaviour::Stray => {
                    let disabled = Arc::new((*self.descriptor).clone().with_enabled(false));
                    Ok(vec![TradingOption::new(disabled, "X", "stray")])
                }
            }
        }
    }

    fn context() -> Arc<NegotiationContext> {
        Arc::new(NegotiationContext {
            business_partner_type: BusinessPartnerType::Customer,
            business_partner_code: "C001".to_string(),
            document_type: "SalesOrder".to_string(),
            document_entry: 100,
            document_line_id: None,
            document_total: 200.0,
            document_currency: "USD".to_string(),
        })
    }

    fn negotiator() -> Negotiator {
        Negotiator::for_side(TradingSide::Receipt)
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let methods: Vec<Arc<dyn TradingMethod>> = vec![
            Arc::new(ScriptedMethod::new("A", Behaviour::Fail("timeout"))),
            Arc::new(ScriptedMethod::new("B", Behaviour::Offer(2))),
        ];

        let mut delivered = Vec::new();
        let report = negotiator()
            .negotiate_all(methods, context(), CancellationToken::new(), |outcome| delivered.push(outcome))
            .await;

        assert_eq!(delivered.len(), 2);
        let b = delivered.iter().find(|o| o.method.name == "B").unwrap();
        assert_eq!(b.options().len(), 2);
        assert_eq!(report.succeeded, vec!["B".to_string()]);
        assert_eq!(report.failed, vec![TradingError::negotiation("A", "timeout")]);
        assert_eq!(report.option_count, 2);
        assert!(!report.cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_method_does_not_delay_fast_one() {
        let methods: Vec<Arc<dyn TradingMethod>> = vec![
            Arc::new(ScriptedMethod::new("SLOW", Behaviour::Sleep(Duration::from_secs(30), 1))),
            Arc::new(ScriptedMethod::new("FAST", Behaviour::Offer(1))),
        ];

        let mut order = Vec::new();
        negotiator()
            .negotiate_all(methods, context(), CancellationToken::new(), |outcome| {
                order.push(outcome.method.name.clone())
            })
            .await;

        assert_eq!(order, vec!["FAST".to_string(), "SLOW".to_string()]);
    }

    #[tokio::test]
    async fn test_disabled_methods_never_surface() {
        let disabled = ScriptedMethod::with_enabled("OFF", Behaviour::Offer(3), false);
        let disabled_calls = disabled.calls.clone();
        let methods: Vec<Arc<dyn TradingMethod>> = vec![
            Arc::new(disabled),
            Arc::new(ScriptedMethod::new("STRAY", Behaviour::Stray)),
            Arc::new(ScriptedMethod::new("ON", Behaviour::Offer(1))),
        ];

        let mut options = Vec::new();
        let report = negotiator()
            .negotiate_all(methods, context(), CancellationToken::new(), |outcome| {
                options.extend(outcome.options().to_vec())
            })
            .await;

        assert_eq!(disabled_calls.load(Ordering::SeqCst), 0);
        assert_eq!(options.len(), 1);
        assert!(options.iter().all(|option| option.method().enabled));
        assert_eq!(report.completed(), 2);
    }

    #[tokio::test]
    async fn test_panic_becomes_negotiation_error() {
        let methods: Vec<Arc<dyn TradingMethod>> = vec![
            Arc::new(ScriptedMethod::new("BOOM", Behaviour::Panic)),
            Arc::new(ScriptedMethod::new("OK", Behaviour::Offer(1))),
        ];

        let report = negotiator()
            .negotiate_all(methods, context(), CancellationToken::new(), |_| {})
            .await;

        assert_eq!(report.succeeded, vec!["OK".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(
            &report.failed[0],
            TradingError::Negotiation { method, message } if method == "BOOM" && message.contains("provider exploded")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_delivery() {
        let methods: Vec<Arc<dyn TradingMethod>> = vec![
            Arc::new(ScriptedMethod::new("FAST", Behaviour::Offer(1))),
            Arc::new(ScriptedMethod::new("SLOW", Behaviour::Sleep(Duration::from_secs(60), 1))),
        ];

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let mut delivered = Vec::new();
        let report = negotiator()
            .negotiate_all(methods, context(), cancel, |outcome| {
                delivered.push(outcome.method.name.clone());
                trigger.cancel();
            })
            .await;

        assert_eq!(delivered, vec!["FAST".to_string()]);
        assert!(report.cancelled);
        assert_eq!(report.completed(), 1);
    }

    #[tokio::test]
    async fn test_non_negotiation_errors_are_scoped() {
        let descriptor = MethodDescriptor::new(TradingSide::Receipt, "x", "TM_X", ContributionStyle::AssetBacked);
        let scoped = scope_to_method(&descriptor, TradingError::LookupUnavailable("down".to_string()));
        assert!(matches!(scoped, TradingError::Negotiation { method, .. } if method == "TM_X"));
    }
}
