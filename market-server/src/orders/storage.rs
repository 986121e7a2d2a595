//! redb-based storage layer for the order core
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | Order aggregate (items embedded) |
//! | `order_numbers` | `order_number` | `order_id` | Uniqueness index |
//! | `inventory_ledger` | `product_id` | `u64` | Available quantity |
//! | `payments` | `reference` | `PaymentTransaction` | Payment attempts |
//! | `notification_inbox` | `(user_id, seq)` | `Notification` | Durable inbox |
//! | `sequence_counter` | `()` | `u64` | Inbox sequence |
//!
//! # Consistency
//!
//! redb allows a single write transaction at a time, so every state-machine
//! command serializes against every other: the inventory floor check can
//! never race a concurrent reservation, and an aggregate recompute inside a
//! transaction always observes the latest committed sibling decisions.
//! Inbox records written through the same transaction are durable exactly
//! when the triggering command is.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::models::{Notification, Order, PaymentTransaction};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for orders: key = order_id, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Table for order number uniqueness: key = order_number, value = order_id
const ORDER_NUMBERS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("order_numbers");

/// Table for available stock: key = product_id, value = quantity
const LEDGER_TABLE: TableDefinition<&str, u64> = TableDefinition::new("inventory_ledger");

/// Table for payment transactions: key = reference, value = JSON-serialized PaymentTransaction
const PAYMENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("payments");

/// Table for the notification inbox: key = (user_id, seq), value = JSON-serialized Notification
const INBOX_TABLE: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("notification_inbox");

/// Table for counters: key = counter name, value = u64
const SEQUENCE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("sequence_counter");

const INBOX_SEQ_KEY: &str = "inbox_seq";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order not found: {0}")]
    OrderNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Order core storage backed by redb
///
/// redb commits are durable as soon as `commit()` returns (copy-on-write
/// with atomic pointer swap), so a crash can never leave a partial order,
/// a dangling reservation, or a missing inbox record.
#[derive(Clone)]
pub struct MarketStorage {
    db: Arc<Database>,
}

impl MarketStorage {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_NUMBERS_TABLE)?;
            let _ = write_txn.open_table(LEDGER_TABLE)?;
            let _ = write_txn.open_table(PAYMENTS_TABLE)?;
            let _ = write_txn.open_table(INBOX_TABLE)?;

            let mut seq_table = write_txn.open_table(SEQUENCE_TABLE)?;
            if seq_table.get(INBOX_SEQ_KEY)?.is_none() {
                seq_table.insert(INBOX_SEQ_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    ///
    /// Dropping the transaction without committing aborts it.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Order Operations ==========

    /// Insert or replace an order (within transaction)
    pub fn put_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.order_id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get an order by id
    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order by id (within transaction)
    ///
    /// Used by the aggregate recompute step so concurrent transitions always
    /// observe already-committed sibling updates.
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get all orders, newest first
    pub fn list_orders(&self) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            orders.push(order);
        }
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at));
        Ok(orders)
    }

    /// Claim an order number (within transaction)
    ///
    /// Returns false if the number is already taken; the caller regenerates.
    pub fn claim_order_number(
        &self,
        txn: &WriteTransaction,
        order_number: &str,
        order_id: &str,
    ) -> StorageResult<bool> {
        let mut table = txn.open_table(ORDER_NUMBERS_TABLE)?;
        if table.get(order_number)?.is_some() {
            return Ok(false);
        }
        table.insert(order_number, order_id)?;
        Ok(true)
    }

    // ========== Inventory Ledger ==========

    /// Available quantity for a product (0 if never seeded)
    pub fn ledger_available(&self, product_id: &str) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LEDGER_TABLE)?;
        Ok(table.get(product_id)?.map(|g| g.value()).unwrap_or(0))
    }

    /// Available quantity (within transaction)
    pub fn ledger_available_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
    ) -> StorageResult<u64> {
        let table = txn.open_table(LEDGER_TABLE)?;
        Ok(table.get(product_id)?.map(|g| g.value()).unwrap_or(0))
    }

    /// Reserve quantity with a floor check (within transaction)
    ///
    /// Returns false when available < qty. The write transaction is exclusive,
    /// so the check-then-decrement cannot race another reservation.
    pub fn ledger_reserve(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
        qty: u64,
    ) -> StorageResult<bool> {
        let mut table = txn.open_table(LEDGER_TABLE)?;
        let available = table.get(product_id)?.map(|g| g.value()).unwrap_or(0);
        if available < qty {
            return Ok(false);
        }
        table.insert(product_id, available - qty)?;
        Ok(true)
    }

    /// Restore quantity to the ledger (within transaction)
    ///
    /// Used for restock seeding and for releasing reservations on decline
    /// or cancellation.
    pub fn ledger_release(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
        qty: u64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(LEDGER_TABLE)?;
        let available = table.get(product_id)?.map(|g| g.value()).unwrap_or(0);
        table.insert(product_id, available.saturating_add(qty))?;
        Ok(())
    }

    // ========== Payment Transactions ==========

    /// Insert or replace a payment transaction (within transaction)
    pub fn put_payment(
        &self,
        txn: &WriteTransaction,
        payment: &PaymentTransaction,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(PAYMENTS_TABLE)?;
        let value = serde_json::to_vec(payment)?;
        table.insert(payment.reference.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Get a payment transaction by reference
    pub fn get_payment(&self, reference: &str) -> StorageResult<Option<PaymentTransaction>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PAYMENTS_TABLE)?;
        match table.get(reference)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a payment transaction by reference (within transaction)
    pub fn get_payment_txn(
        &self,
        txn: &WriteTransaction,
        reference: &str,
    ) -> StorageResult<Option<PaymentTransaction>> {
        let table = txn.open_table(PAYMENTS_TABLE)?;
        match table.get(reference)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    // ========== Notification Inbox ==========

    /// Append a notification to the durable inbox (within transaction)
    ///
    /// The record becomes visible exactly when the triggering command
    /// commits.
    pub fn push_notification(
        &self,
        txn: &WriteTransaction,
        notification: &Notification,
    ) -> StorageResult<()> {
        let seq = {
            let mut seq_table = txn.open_table(SEQUENCE_TABLE)?;
            let next = seq_table.get(INBOX_SEQ_KEY)?.map(|g| g.value()).unwrap_or(0) + 1;
            seq_table.insert(INBOX_SEQ_KEY, next)?;
            next
        };

        let mut table = txn.open_table(INBOX_TABLE)?;
        let value = serde_json::to_vec(notification)?;
        table.insert((notification.user_id.as_str(), seq), value.as_slice())?;
        Ok(())
    }

    /// All notifications for a user, newest first
    pub fn notifications_for_user(&self, user_id: &str) -> StorageResult<Vec<Notification>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INBOX_TABLE)?;

        let mut notifications = Vec::new();
        let range_start = (user_id, 0u64);
        let range_end = (user_id, u64::MAX);
        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            let notification: Notification = serde_json::from_slice(value.value())?;
            notifications.push(notification);
        }
        notifications.reverse();
        Ok(notifications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::NotificationKind;

    fn storage() -> MarketStorage {
        MarketStorage::open_in_memory().unwrap()
    }

    #[test]
    fn test_ledger_reserve_floor() {
        let storage = storage();

        let txn = storage.begin_write().unwrap();
        storage.ledger_release(&txn, "prod-1", 10).unwrap();
        txn.commit().unwrap();

        let txn = storage.begin_write().unwrap();
        assert!(storage.ledger_reserve(&txn, "prod-1", 6).unwrap());
        assert!(!storage.ledger_reserve(&txn, "prod-1", 5).unwrap());
        assert!(storage.ledger_reserve(&txn, "prod-1", 4).unwrap());
        txn.commit().unwrap();

        assert_eq!(storage.ledger_available("prod-1").unwrap(), 0);
    }

    #[test]
    fn test_ledger_unknown_product_has_no_stock() {
        let storage = storage();
        let txn = storage.begin_write().unwrap();
        assert!(!storage.ledger_reserve(&txn, "missing", 1).unwrap());
        drop(txn);
        assert_eq!(storage.ledger_available("missing").unwrap(), 0);
    }

    #[test]
    fn test_aborted_transaction_leaves_no_trace() {
        let storage = storage();

        let txn = storage.begin_write().unwrap();
        storage.ledger_release(&txn, "prod-1", 10).unwrap();
        txn.commit().unwrap();

        let txn = storage.begin_write().unwrap();
        assert!(storage.ledger_reserve(&txn, "prod-1", 10).unwrap());
        drop(txn); // abort

        assert_eq!(storage.ledger_available("prod-1").unwrap(), 10);
    }

    #[test]
    fn test_order_number_claim() {
        let storage = storage();

        let txn = storage.begin_write().unwrap();
        assert!(storage.claim_order_number(&txn, "FH-1", "ord-1").unwrap());
        assert!(!storage.claim_order_number(&txn, "FH-1", "ord-2").unwrap());
        assert!(storage.claim_order_number(&txn, "FH-2", "ord-2").unwrap());
        txn.commit().unwrap();
    }

    #[test]
    fn test_inbox_per_user_isolation_and_order() {
        let storage = storage();

        let txn = storage.begin_write().unwrap();
        for (user, msg) in [("u1", "first"), ("u2", "other"), ("u1", "second")] {
            let n = Notification::new(user, msg, NotificationKind::OrderUpdate, 0);
            storage.push_notification(&txn, &n).unwrap();
        }
        txn.commit().unwrap();

        let u1 = storage.notifications_for_user("u1").unwrap();
        assert_eq!(u1.len(), 2);
        // Newest first
        assert_eq!(u1[0].message, "second");
        assert_eq!(u1[1].message, "first");

        let u2 = storage.notifications_for_user("u2").unwrap();
        assert_eq!(u2.len(), 1);
        assert_eq!(u2[0].message, "other");
    }
}
