//! `certportal-billing` — invoices (transactions) tied to applications.
//!
//! "Transaction" here is the billing instrument, not a database transaction.

pub mod transaction;

pub use transaction::{
    CreateInvoice, PaymentOutcome, Transaction, TransactionId, TransactionStatus,
    UpdateTransactionStatus,
};
