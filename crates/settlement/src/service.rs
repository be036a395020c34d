//! Settlement service - opens sessions and drives them to a saved document
//!
//! A session resolves the business partner, fans negotiation out to every
//! enabled trading method, lets the user apply and remove tradings, and
//! persists the result on confirm.
//!
//! Flow:
//! 1. `open` resolves the partner (INIT); failure is fatal
//! 2. Negotiation is issued in the background and the session is READY
//! 3. Options are pushed to the presentation sink as each method answers
//! 4. `confirm` saves the document (CONFIRMING); success closes the
//!    session, failure returns it to READY with its entries intact

use common::{BusinessPartner, BusinessPartnerType, SettlementTarget, TradingSide};
use config::TradingConfig;
use observability::SettlementMetrics;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use trading::{MethodRegistry, NegotiationContext, NegotiationReport, Negotiator, TradingOption};
use uuid::Uuid;

use crate::composer::SettlementComposer;
use crate::error::{Result, SettlementError};
use crate::sink::{push_message, MessageLevel, PresentationSink, ViewEvent};
use crate::store::traits::SettlementRepository;
use crate::types::{AppliedTrading, SessionState, SettlementDocument, SettlementRequest, UserIntent};

/// Builder for [`SettlementService`]
pub struct SettlementServiceBuilder {
    side: TradingSide,
    registry: Option<Arc<MethodRegistry>>,
    repository: Option<Arc<dyn SettlementRepository>>,
    sink: Option<Arc<dyn PresentationSink>>,
    config: TradingConfig,
}

impl SettlementServiceBuilder {
    pub fn registry(mut self, registry: Arc<MethodRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn repository(mut self, repository: Arc<dyn SettlementRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn PresentationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(mut self, config: TradingConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the service, failing on missing or mismatched collaborators
    pub fn build(self) -> Result<SettlementService> {
        let registry = self
            .registry
            .ok_or_else(|| SettlementError::Wiring(format!("no method registry for the {} service", self.side)))?;
        if registry.side() != self.side {
            return Err(SettlementError::Wiring(format!(
                "{} registry handed to the {} service",
                registry.side(),
                self.side
            )));
        }
        let repository = self
            .repository
            .ok_or_else(|| SettlementError::Wiring(format!("no repository for the {} service", self.side)))?;
        let sink = self
            .sink
            .ok_or_else(|| SettlementError::Wiring(format!("no presentation sink for the {} service", self.side)))?;

        let metrics = SettlementMetrics::new(self.side.as_str());
        Ok(SettlementService {
            side: self.side,
            registry,
            repository,
            sink,
            config: self.config,
            negotiator: Negotiator::new(metrics.clone()),
            metrics,
        })
    }
}

/// Receipt or payment service
#[derive(Clone)]
pub struct SettlementService {
    side: TradingSide,
    registry: Arc<MethodRegistry>,
    repository: Arc<dyn SettlementRepository>,
    sink: Arc<dyn PresentationSink>,
    config: TradingConfig,
    negotiator: Negotiator,
    metrics: SettlementMetrics,
}

impl SettlementService {
    pub fn builder(side: TradingSide) -> SettlementServiceBuilder {
        SettlementServiceBuilder {
            side,
            registry: None,
            repository: None,
            sink: None,
            config: TradingConfig::default(),
        }
    }

    pub fn side(&self) -> TradingSide {
        self.side
    }

    pub fn registry(&self) -> &Arc<MethodRegistry> {
        &self.registry
    }

    /// Open a session for a request
    ///
    /// Returns `Ok(None)` after a warning when the request carries nothing
    /// to settle. Partner resolution failures are fatal and returned.
    pub async fn open(&self, request: SettlementRequest) -> Result<Option<SettlementSession>> {
        if !request.has_work() {
            warn!(
                side = %self.side,
                document_type = %request.document_type,
                document_entry = request.document_entry,
                "No work data for settlement"
            );
            push_message(
                self.sink.as_ref(),
                MessageLevel::Warning,
                format!("No work data for {}", self.side),
            );
            return Ok(None);
        }

        let partner = match self.resolve_partner(&request).await {
            Ok(partner) => partner,
            Err(e) => {
                error!(side = %self.side, partner = %request.business_partner_code, error = %e, "Session aborted");
                push_message(self.sink.as_ref(), MessageLevel::Error, e.user_message());
                return Err(e);
            }
        };

        Ok(Some(SettlementSession::start(self, partner, request.target())))
    }

    async fn resolve_partner(&self, request: &SettlementRequest) -> Result<BusinessPartner> {
        let raw_type = request.business_partner_type.as_deref().unwrap_or_default();
        let partner_type: BusinessPartnerType = raw_type.parse().map_err(|_| {
            SettlementError::UnsupportedOperation(format!(
                "business partner type '{}' is neither customer nor supplier",
                raw_type
            ))
        })?;
        let code = request.business_partner_code.trim();

        let partners = self
            .repository
            .fetch_business_partner(partner_type, code)
            .await
            .map_err(|e| SettlementError::Resolution(e.user_message()))?
            .into_result()
            .map_err(SettlementError::Resolution)?;

        partners
            .into_iter()
            .next()
            .ok_or_else(|| SettlementError::Resolution(format!("unknown {} {}", partner_type, code)))
    }
}

/// One settlement in progress
///
/// Dropping a session abandons it.
pub struct SettlementSession {
    id: Uuid,
    state: SessionState,
    partner: BusinessPartner,
    composer: SettlementComposer,
    repository: Arc<dyn SettlementRepository>,
    sink: Arc<dyn PresentationSink>,
    metrics: SettlementMetrics,
    options: Arc<RwLock<Vec<TradingOption>>>,
    negotiation: Option<JoinHandle<NegotiationReport>>,
    report: Option<NegotiationReport>,
    cancel: CancellationToken,
    document: Option<SettlementDocument>,
}

impl SettlementSession {
    fn start(service: &SettlementService, partner: BusinessPartner, target: SettlementTarget) -> Self {
        let id = Uuid::new_v4();
        let mut session = Self {
            id,
            state: SessionState::Init,
            partner,
            composer: SettlementComposer::new(Arc::clone(&service.registry), target, &service.config),
            repository: Arc::clone(&service.repository),
            sink: Arc::clone(&service.sink),
            metrics: service.metrics.clone(),
            options: Arc::new(RwLock::new(Vec::new())),
            negotiation: None,
            report: None,
            cancel: CancellationToken::new(),
            document: None,
        };

        info!(
            session = %id,
            side = %service.side,
            partner = %session.partner.code,
            "Business partner resolved"
        );
        session.sink.push(ViewEvent::BusinessPartner(session.partner.clone()));
        session.sink.push(ViewEvent::Target(session.composer.target().clone()));

        let methods = service.registry.enabled_methods();
        session.sink.push(ViewEvent::Methods(
            methods.iter().map(|method| Arc::clone(method.descriptor())).collect(),
        ));

        let context = Arc::new(NegotiationContext::new(&session.partner, session.composer.target()));
        let negotiator = service.negotiator.clone();
        let registry = Arc::clone(&service.registry);
        let sink = Arc::clone(&session.sink);
        let options = Arc::clone(&session.options);
        let cancel = session.cancel.clone();
        let method_count = methods.len();

        session.negotiation = Some(tokio::spawn(async move {
            negotiator
                .negotiate_all(methods, context, cancel, move |outcome| match outcome.result {
                    Ok(found) => {
                        let found: Vec<_> = found
                            .into_iter()
                            .filter(|option| registry.is_enabled(option.method()))
                            .collect();
                        if found.is_empty() {
                            return;
                        }
                        options.write().extend(found.iter().cloned());
                        sink.push(ViewEvent::TradingOptions(found));
                    }
                    Err(e) => push_message(sink.as_ref(), MessageLevel::Warning, e.to_string()),
                })
                .await
        }));

        session.state = SessionState::Ready;
        info!(session = %id, methods = method_count, "Session ready, negotiation issued");
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn business_partner(&self) -> &BusinessPartner {
        &self.partner
    }

    pub fn target(&self) -> &SettlementTarget {
        self.composer.target()
    }

    /// Options merged from every method that has answered so far
    pub fn available_options(&self) -> Vec<TradingOption> {
        self.options.read().clone()
    }

    /// The working sequence in application order
    pub fn entries(&self) -> &[AppliedTrading] {
        self.composer.entries()
    }

    pub fn applied_total(&self) -> f64 {
        self.composer.applied_total()
    }

    pub fn remaining(&self) -> f64 {
        self.composer.remaining()
    }

    /// The saved document once the session is closed by a confirm
    pub fn document(&self) -> Option<&SettlementDocument> {
        self.document.as_ref()
    }

    /// Apply an option with a chosen amount
    pub fn apply_trading(&mut self, option: &TradingOption, amount: f64) -> Result<AppliedTrading> {
        self.ensure_state(SessionState::Ready, "apply a trading")?;
        let applied = self.composer.apply_trading(option, amount)?.clone();
        self.push_entries();
        Ok(applied)
    }

    /// Remove an applied entry; unknown entries are ignored
    pub fn remove_trading(&mut self, entry_id: Uuid) -> Result<Option<AppliedTrading>> {
        self.ensure_state(SessionState::Ready, "remove a trading")?;
        let removed = self.composer.remove_trading(entry_id);
        if removed.is_some() {
            self.push_entries();
        }
        Ok(removed)
    }

    /// Save the working sequence as a settlement document
    pub async fn confirm(&mut self) -> Result<SettlementDocument> {
        let document = self.prepare_document()?;
        self.persist(document).await
    }

    fn prepare_document(&self) -> Result<SettlementDocument> {
        self.ensure_state(SessionState::Ready, "confirm")?;
        self.composer.build_document(&self.partner)
    }

    /// Save a built document; reports its own outcome to the sink
    async fn persist(&mut self, document: SettlementDocument) -> Result<SettlementDocument> {
        self.state = SessionState::Confirming;
        info!(
            session = %self.id,
            kind = %document.kind,
            items = document.items.len(),
            total = document.total(),
            "Confirming settlement"
        );
        push_message(self.sink.as_ref(), MessageLevel::Info, format!("Saving {}", document.kind));

        match self.save(document).await {
            Ok(saved) => {
                self.state = SessionState::Closed;
                self.cancel.cancel();
                self.metrics.settlement_confirmed();
                info!(session = %self.id, doc_entry = ?saved.doc_entry, "Settlement saved");
                push_message(
                    self.sink.as_ref(),
                    MessageLevel::Success,
                    format!("{} {} saved", saved.kind, saved.doc_entry.unwrap_or_default()),
                );
                self.document = Some(saved.clone());
                self.composer.clear();
                Ok(saved)
            }
            Err(e) => {
                self.state = SessionState::Ready;
                self.metrics.settlement_failed();
                error!(session = %self.id, error = %e, "Settlement save failed");
                push_message(self.sink.as_ref(), MessageLevel::Error, e.user_message());
                Err(e)
            }
        }
    }

    /// Dispatch an intent from the presentation layer
    ///
    /// Errors are also pushed to the sink as messages.
    pub async fn handle(&mut self, intent: UserIntent) -> Result<()> {
        let result = match intent {
            UserIntent::Apply {
                option: Some(option),
                amount,
            } => self.apply_trading(&option, amount).map(|_| ()),
            UserIntent::Apply { option: None, .. } => {
                Err(SettlementError::Validation("choose a trading option first".to_string()))
            }
            UserIntent::Remove { entry_id } => self.remove_trading(entry_id).map(|_| ()),
            UserIntent::Confirm => match self.prepare_document() {
                // persist reports save failures itself
                Ok(document) => return self.persist(document).await.map(|_| ()),
                Err(e) => Err(e),
            },
        };

        if let Err(ref e) = result {
            push_message(self.sink.as_ref(), MessageLevel::Error, e.user_message());
        }
        result
    }

    /// Wait until every method has answered or negotiation was cancelled
    pub async fn wait_for_negotiation(&mut self) -> NegotiationReport {
        if let Some(handle) = self.negotiation.take() {
            let report = match handle.await {
                Ok(report) => report,
                Err(e) => {
                    warn!(session = %self.id, error = %e, "Negotiation task ended abnormally");
                    NegotiationReport {
                        cancelled: true,
                        ..Default::default()
                    }
                }
            };
            self.report = Some(report);
        }
        self.report.clone().unwrap_or_default()
    }

    /// End the session without saving
    pub fn abandon(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.cancel.cancel();
        self.composer.clear();
        self.state = SessionState::Closed;
        info!(session = %self.id, "Session abandoned");
    }

    async fn save(&self, document: SettlementDocument) -> Result<SettlementDocument> {
        self.repository
            .save_document(document)
            .await?
            .into_result()
            .map_err(SettlementError::Repository)?
            .into_iter()
            .next()
            .ok_or_else(|| SettlementError::Repository("repository returned no document".to_string()))
    }

    fn push_entries(&self) {
        self.sink
            .push(ViewEvent::AppliedTradings(self.composer.entries().to_vec()));
    }

    fn ensure_state(&self, expected: SessionState, action: &str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SettlementError::InvalidState(format!(
                "cannot {} while the session is {}",
                action, self.state
            )))
        }
    }
}

impl std::fmt::Debug for SettlementService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementService")
            .field("side", &self.side.as_str())
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for SettlementSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("partner", &self.partner.code)
            .field("entries", &self.composer.entries().len())
            .finish()
    }
}

impl Drop for SettlementSession {
    fn drop(&mut self) {
        self.abandon();
    }
}
