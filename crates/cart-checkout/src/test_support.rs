//! Shared fixtures for checkout tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Notify;

use cart_core::{Cart, CartLine};
use cart_payments::{PaymentGateway, PaymentRequest, PaymentSession, TransactionLookup};

use crate::customer::CustomerInfo;

pub(crate) fn valid_customer() -> CustomerInfo {
    CustomerInfo {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: "ada@example.com".into(),
        phone: "+20 100 000 0000".into(),
        address: "1 Nile St".into(),
        city: "Cairo".into(),
        state: "Cairo".into(),
        zip_code: "11511".into(),
        country: "Egypt".into(),
    }
}

/// One unit per entry; repeated ids merge
pub(crate) fn cart_of(items: &[(&str, Decimal)]) -> Cart {
    Cart::from_lines(
        items
            .iter()
            .map(|(id, price)| CartLine {
                course_id: (*id).to_string(),
                title: format!("Course {id}"),
                unit_price: *price,
                unit_discount_price: *price,
                instructor: "Ada".into(),
                thumbnail: None,
                quantity: 1,
            })
            .collect(),
    )
}

/// Gateway double that records calls and optionally blocks until released
pub(crate) struct MockGateway {
    session: PaymentSession,
    lookup: Mutex<TransactionLookup>,
    gate: Option<Arc<Notify>>,
    create_calls: AtomicUsize,
    lookup_calls: AtomicUsize,
    last_request: Mutex<Option<PaymentRequest>>,
}

impl MockGateway {
    pub(crate) fn returning(session: PaymentSession) -> Self {
        Self {
            session,
            lookup: Mutex::new(TransactionLookup::default()),
            gate: None,
            create_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub(crate) fn with_lookup(self, lookup: TransactionLookup) -> Self {
        self.set_lookup(lookup);
        self
    }

    /// Change what later lookups report
    pub(crate) fn set_lookup(&self, lookup: TransactionLookup) {
        *self.lookup.lock().unwrap() = lookup;
    }

    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<PaymentRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_payment(&self, request: &PaymentRequest) -> PaymentSession {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.session.clone()
    }

    async fn get_transaction(&self, _transaction_ref: &str) -> TransactionLookup {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup.lock().unwrap().clone()
    }

    fn name(&self) -> &str {
        "MockGateway"
    }
}
