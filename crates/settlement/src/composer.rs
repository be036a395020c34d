//! Settlement composer - the working sequence of applied tradings
//!
//! The composer owns what the user has applied so far and turns it into a
//! settlement document on confirmation. It never talks to the repository.

use common::{BusinessPartner, SettlementTarget, TradingSide};
use config::{ReconciliationPolicy, TradingConfig};
use std::sync::Arc;
use tracing::debug;
use trading::{MethodRegistry, TradingOption};
use uuid::Uuid;

use crate::error::{Result, SettlementError};
use crate::types::{AppliedTrading, DocumentKind, SettlementDocument};

/// Accumulates applied tradings for one target
pub struct SettlementComposer {
    registry: Arc<MethodRegistry>,
    target: SettlementTarget,
    policy: ReconciliationPolicy,
    tolerance: f64,
    /// `None` until the first apply
    entries: Option<Vec<AppliedTrading>>,
}

impl SettlementComposer {
    pub fn new(registry: Arc<MethodRegistry>, target: SettlementTarget, config: &TradingConfig) -> Self {
        Self {
            registry,
            target,
            policy: config.reconciliation,
            tolerance: config.amount_tolerance,
            entries: None,
        }
    }

    pub fn side(&self) -> TradingSide {
        self.registry.side()
    }

    pub fn target(&self) -> &SettlementTarget {
        &self.target
    }

    /// Apply an option with a chosen amount
    ///
    /// The same option may be applied several times. An option whose method
    /// caps applied amounts may not be applied beyond its advertised amount
    /// in total.
    pub fn apply_trading(&mut self, option: &TradingOption, amount: f64) -> Result<&AppliedTrading> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(SettlementError::Validation(format!(
                "amount must be a positive number, got {}",
                amount
            )));
        }

        let method = option.method();
        if method.side != self.side() {
            return Err(SettlementError::Validation(format!(
                "trading mode {} belongs to the {} side",
                method.name, method.side
            )));
        }
        if !method.enabled || !self.registry.is_enabled(method) {
            return Err(SettlementError::Validation(format!(
                "trading mode {} is not available",
                method.name
            )));
        }

        if method.style.caps_applied_amount() {
            if let Some(limit) = option.amount {
                let already = self.applied_for(option);
                if already + amount > limit + self.tolerance {
                    return Err(SettlementError::Validation(format!(
                        "{} has {:.2} available, {:.2} already applied",
                        option.description, limit, already
                    )));
                }
            }
        }

        let applied = AppliedTrading::new(option.clone(), amount, self.target.currency.clone());
        debug!(
            entry = %applied.entry_id,
            mode = %option.mode(),
            trade_id = %option.id,
            amount,
            "Trading applied"
        );

        let entries = self.entries.get_or_insert_with(Vec::new);
        entries.push(applied);
        Ok(&entries[entries.len() - 1])
    }

    /// Remove an entry by id; absent entries are ignored
    pub fn remove_trading(&mut self, entry_id: Uuid) -> Option<AppliedTrading> {
        let entries = self.entries.as_mut()?;
        let position = entries.iter().position(|entry| entry.entry_id == entry_id)?;
        let removed = entries.remove(position);
        debug!(entry = %entry_id, mode = %removed.option.mode(), "Trading removed");
        Some(removed)
    }

    /// The working sequence in application order
    pub fn entries(&self) -> &[AppliedTrading] {
        self.entries.as_deref().unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn applied_total(&self) -> f64 {
        self.entries().iter().map(|entry| entry.amount).sum()
    }

    /// Target total minus the applied total
    pub fn remaining(&self) -> f64 {
        self.target.total - self.applied_total()
    }

    /// Amount already applied against the same trade
    pub fn applied_for(&self, option: &TradingOption) -> f64 {
        self.entries()
            .iter()
            .filter(|entry| entry.option.same_trade(option))
            .map(|entry| entry.amount)
            .sum()
    }

    /// Build the document to persist
    ///
    /// Fails when nothing was applied or when the applied total violates the
    /// reconciliation policy. The working sequence is left untouched.
    pub fn build_document(&self, partner: &BusinessPartner) -> Result<SettlementDocument> {
        if self.is_empty() {
            return Err(SettlementError::Validation(
                "apply at least one trading before confirming".to_string(),
            ));
        }

        self.policy
            .check(self.applied_total(), self.target.total, self.tolerance)
            .map_err(SettlementError::Validation)?;

        let mut document = SettlementDocument::new(DocumentKind::from(self.side()), partner);
        for entry in self.entries() {
            document.add_item(&self.target, entry);
        }
        Ok(document)
    }

    /// Drop the working sequence
    pub fn clear(&mut self) {
        self.entries = None;
    }
}
