//! In-memory settlement repository implementation

use async_trait::async_trait;
use common::{BusinessPartner, BusinessPartnerType, OperationResult};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tracing::debug;

use crate::error::{Result, SettlementError};
use crate::store::traits::SettlementRepository;
use crate::types::{DocumentKind, SettlementDocument};

/// In-memory settlement repository for testing and development
pub struct InMemorySettlementRepository {
    partners: RwLock<HashMap<(BusinessPartnerType, String), BusinessPartner>>,
    documents: RwLock<HashMap<(DocumentKind, i64), SettlementDocument>>,
    next_entry: AtomicI64,
    save_failures: Mutex<VecDeque<String>>,
    unavailable: AtomicBool,
}

impl InMemorySettlementRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self {
            partners: RwLock::new(HashMap::new()),
            documents: RwLock::new(HashMap::new()),
            next_entry: AtomicI64::new(1),
            save_failures: Mutex::new(VecDeque::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Create a repository seeded with a few customers and suppliers
    pub fn with_sample_partners() -> Self {
        let repository = Self::new();
        repository.add_partner(BusinessPartner::new(BusinessPartnerType::Customer, "C001", "Acme Trading"));
        repository.add_partner(BusinessPartner::new(BusinessPartnerType::Customer, "C002", "Initech"));
        repository.add_partner(BusinessPartner::new(BusinessPartnerType::Supplier, "S001", "Globex Supplies"));
        repository.add_partner(BusinessPartner::new(BusinessPartnerType::Supplier, "S002", "Umbrella Parts"));
        repository
    }

    /// Add or replace a business partner
    pub fn add_partner(&self, partner: BusinessPartner) {
        self.partners
            .write()
            .insert((partner.partner_type, partner.code.clone()), partner);
    }

    /// Reject the next `count` saves with the given message
    pub fn fail_next_saves(&self, count: usize, message: impl Into<String>) {
        let message = message.into();
        let mut failures = self.save_failures.lock();
        for _ in 0..count {
            failures.push_back(message.clone());
        }
    }

    /// Fail every call at the transport level while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// All saved documents of a kind, by entry
    pub fn documents(&self, kind: DocumentKind) -> Vec<SettlementDocument> {
        let mut documents: Vec<_> = self
            .documents
            .read()
            .values()
            .filter(|document| document.kind == kind)
            .cloned()
            .collect();
        documents.sort_by_key(|document| document.doc_entry);
        documents
    }

    /// Number of saved documents of any kind
    pub fn document_count(&self) -> usize {
        self.documents.read().len()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SettlementError::Repository("repository is unavailable".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemorySettlementRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettlementRepository for InMemorySettlementRepository {
    async fn fetch_business_partner(
        &self,
        partner_type: BusinessPartnerType,
        code: &str,
    ) -> Result<OperationResult<BusinessPartner>> {
        self.check_available()?;

        let partner = self.partners.read().get(&(partner_type, code.to_string())).cloned();
        Ok(OperationResult::success(partner.into_iter().collect()))
    }

    async fn save_document(&self, mut document: SettlementDocument) -> Result<OperationResult<SettlementDocument>> {
        self.check_available()?;

        if let Some(message) = self.save_failures.lock().pop_front() {
            return Ok(OperationResult::failure(message));
        }

        let doc_entry = match document.doc_entry {
            Some(entry) => entry,
            None => self.next_entry.fetch_add(1, Ordering::SeqCst),
        };
        document.doc_entry = Some(doc_entry);

        debug!(kind = %document.kind, doc_entry, items = document.items.len(), "Document stored");
        self.documents
            .write()
            .insert((document.kind, doc_entry), document.clone());

        Ok(OperationResult::success(vec![document]))
    }

    async fn fetch_document(&self, kind: DocumentKind, doc_entry: i64) -> Result<OperationResult<SettlementDocument>> {
        self.check_available()?;

        let document = self.documents.read().get(&(kind, doc_entry)).cloned();
        Ok(OperationResult::success(document.into_iter().collect()))
    }
}
