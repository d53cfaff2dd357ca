//! # Collections and Records
//!
//! Every persisted entity belongs to one [`Collection`]. The [`Record`]
//! trait ties a duka-core type to its collection so typed helpers can
//! encode and decode it without the caller naming the collection.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use duka_core::{
    AuditLog, Customer, Product, PurchaseOrder, Quotation, Sale, Shift, Supplier,
    SupplierInvoice, SupplierPayment,
};

use crate::error::DbError;

/// Named entity collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Products,
    Customers,
    Suppliers,
    Sales,
    Shifts,
    PurchaseOrders,
    SupplierInvoices,
    SupplierPayments,
    AuditLogs,
    Quotations,
    /// Sales completed while offline, waiting for sync. Own table.
    OrderQueue,
}

impl Collection {
    pub const ALL: [Collection; 11] = [
        Collection::Products,
        Collection::Customers,
        Collection::Suppliers,
        Collection::Sales,
        Collection::Shifts,
        Collection::PurchaseOrders,
        Collection::SupplierInvoices,
        Collection::SupplierPayments,
        Collection::AuditLogs,
        Collection::Quotations,
        Collection::OrderQueue,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Customers => "customers",
            Collection::Suppliers => "suppliers",
            Collection::Sales => "sales",
            Collection::Shifts => "shifts",
            Collection::PurchaseOrders => "purchase_orders",
            Collection::SupplierInvoices => "supplier_invoices",
            Collection::SupplierPayments => "supplier_payments",
            Collection::AuditLogs => "audit_logs",
            Collection::Quotations => "quotations",
            Collection::OrderQueue => "order_queue",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DbError::UnknownCollection(s.to_string()))
    }
}

// =============================================================================
// Record
// =============================================================================

/// A duka-core entity that can be stored.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection this type lives in by default.
    const COLLECTION: Collection;

    fn id(&self) -> &str;
}

macro_rules! impl_record {
    ($($ty:ty => $collection:expr),* $(,)?) => {
        $(
            impl Record for $ty {
                const COLLECTION: Collection = $collection;

                fn id(&self) -> &str {
                    &self.id
                }
            }
        )*
    };
}

impl_record! {
    Product => Collection::Products,
    Customer => Collection::Customers,
    Supplier => Collection::Suppliers,
    Sale => Collection::Sales,
    Shift => Collection::Shifts,
    PurchaseOrder => Collection::PurchaseOrders,
    SupplierInvoice => Collection::SupplierInvoices,
    SupplierPayment => Collection::SupplierPayments,
    AuditLog => Collection::AuditLogs,
    Quotation => Collection::Quotations,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_from_str() {
        for collection in Collection::ALL {
            assert_eq!(collection.as_str().parse::<Collection>().unwrap(), collection);
        }
        assert!("users".parse::<Collection>().is_err());
    }

    #[test]
    fn test_record_collections() {
        assert_eq!(<Sale as Record>::COLLECTION, Collection::Sales);
        assert_eq!(<Shift as Record>::COLLECTION, Collection::Shifts);
    }
}
