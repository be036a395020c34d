//! SettlementRepository trait definition

use async_trait::async_trait;
use common::{BusinessPartner, BusinessPartnerType, OperationResult};

use crate::error::Result;
use crate::types::{DocumentKind, SettlementDocument};

/// SettlementRepository trait - business partners and settlement documents
///
/// A transport failure is an `Err`; a rejection by the repository comes back
/// as an `OperationResult` with a non-zero result code and a message.
#[async_trait]
pub trait SettlementRepository: Send + Sync {
    /// Fetch a business partner by type and code
    ///
    /// # Returns
    /// A result holding the partner, or no objects when the code is unknown
    async fn fetch_business_partner(
        &self,
        partner_type: BusinessPartnerType,
        code: &str,
    ) -> Result<OperationResult<BusinessPartner>>;

    /// Save a settlement document with its items
    ///
    /// # Returns
    /// The saved document with `doc_entry` assigned
    async fn save_document(&self, document: SettlementDocument) -> Result<OperationResult<SettlementDocument>>;

    /// Fetch a saved document
    ///
    /// # Arguments
    /// * `kind` - Receipt or payment
    /// * `doc_entry` - Entry assigned on save
    async fn fetch_document(&self, kind: DocumentKind, doc_entry: i64) -> Result<OperationResult<SettlementDocument>>;
}
