//! Purchase records, as seen by the staff directory
//!
//! The sales side owns purchases; the directory only reads them to compute
//! per-employee statistics.

use serde::{Deserialize, Serialize};

/// One completed purchase, attributed to the employee who rang it up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub employee_id: i64,
    pub amount: f64,
}

impl Purchase {
    pub fn new(employee_id: i64, amount: f64) -> Self {
        Self {
            employee_id,
            amount,
        }
    }
}

/// Read-only, index-addressable view over purchases
pub trait PurchaseSource {
    fn count(&self) -> usize;

    fn purchase_at(&self, index: usize) -> Option<&Purchase>;
}

impl PurchaseSource for [Purchase] {
    fn count(&self) -> usize {
        self.len()
    }

    fn purchase_at(&self, index: usize) -> Option<&Purchase> {
        self.get(index)
    }
}

impl PurchaseSource for Vec<Purchase> {
    fn count(&self) -> usize {
        self.len()
    }

    fn purchase_at(&self, index: usize) -> Option<&Purchase> {
        self.get(index)
    }
}

/// In-memory purchase collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseLedger {
    purchases: Vec<Purchase>,
}

impl PurchaseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, purchase: Purchase) {
        self.purchases.push(purchase);
    }
}

impl FromIterator<Purchase> for PurchaseLedger {
    fn from_iter<I: IntoIterator<Item = Purchase>>(iter: I) -> Self {
        Self {
            purchases: iter.into_iter().collect(),
        }
    }
}

impl PurchaseSource for PurchaseLedger {
    fn count(&self) -> usize {
        self.purchases.len()
    }

    fn purchase_at(&self, index: usize) -> Option<&Purchase> {
        self.purchases.get(index)
    }
}
