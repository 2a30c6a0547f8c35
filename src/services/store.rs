//! SQLite persistence for orders and holdings.
//!
//! The store is the single durable source of truth. Order status transitions
//! go through [`SqliteStore::transition_order`], a conditional update that
//! only fires while the row is still pending, so settle and cancel can race
//! and exactly one wins. Holding mutations execute as single statements under
//! the connection lock, which serializes concurrent fills on the same
//! (user, symbol) key.

use crate::types::{Holding, Order, OrderFilter, OrderKind, OrderSortField, OrderStatus, SortDirection};
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

/// SQLite store for orders and holdings.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SQLite store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("SQLite store initialized");
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub fn new_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("In-memory SQLite store initialized");
        Ok(store)
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<(), rusqlite::Error> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS orders (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                symbol TEXT NOT NULL,
                kind TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                price REAL NOT NULL,
                limit_price REAL,
                stop_price REAL,
                trailing_amount REAL,
                trailing_percent REAL,
                status TEXT NOT NULL DEFAULT 'pending',
                executed_price REAL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_orders_user_created
             ON orders(user_id, created_at DESC)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS holdings (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                symbol TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                average_price REAL NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            [],
        )?;

        // One holding per (user, symbol); the upsert in credit_holding relies on it
        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_holdings_user_symbol
             ON holdings(user_id, symbol)",
            [],
        )?;

        Ok(())
    }

    // ========== Order Methods ==========

    /// Persist a new order.
    pub fn create_order(&self, order: &Order) -> Result<(), rusqlite::Error> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO orders (id, user_id, symbol, kind, quantity, price,
                limit_price, stop_price, trailing_amount, trailing_percent,
                status, executed_price, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                order.id,
                order.user_id,
                order.symbol,
                order.kind.to_string(),
                order.quantity,
                order.price,
                order.limit_price,
                order.stop_price,
                order.trailing_amount,
                order.trailing_percent,
                order.status.as_str(),
                order.executed_price,
                order.created_at,
                order.updated_at,
            ],
        )?;

        debug!("Persisted order {}", order.id);
        Ok(())
    }

    /// Get an order by id.
    pub fn get_order(&self, order_id: &str) -> Option<Order> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"),
            params![order_id],
            map_order_row,
        );

        match result {
            Ok(order) => Some(order),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                error!("Error fetching order {}: {}", order_id, e);
                None
            }
        }
    }

    /// Get an order by id, scoped to its owner.
    pub fn get_user_order(&self, user_id: &str, order_id: &str) -> Option<Order> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1 AND user_id = ?2"),
            params![order_id, user_id],
            map_order_row,
        );

        match result {
            Ok(order) => Some(order),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                error!("Error fetching order {}: {}", order_id, e);
                None
            }
        }
    }

    /// Move a pending order to a terminal status.
    ///
    /// The update only fires while the row is still pending; `None` means the
    /// order was already terminal (or absent) and nothing changed.
    pub fn transition_order(
        &self,
        order_id: &str,
        status: OrderStatus,
        executed_price: Option<f64>,
    ) -> Result<Option<Order>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let now = chrono::Utc::now().timestamp_millis();

        let changed = conn.execute(
            "UPDATE orders SET status = ?1, executed_price = ?2, updated_at = ?3
             WHERE id = ?4 AND status = 'pending'",
            params![status.as_str(), executed_price, now, order_id],
        )?;

        if changed == 0 {
            return Ok(None);
        }

        conn.query_row(
            &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"),
            params![order_id],
            map_order_row,
        )
        .map(Some)
    }

    /// List a user's orders matching the filter, plus the total match count.
    pub fn list_orders(
        &self,
        user_id: &str,
        filter: &OrderFilter,
    ) -> Result<(Vec<Order>, u64), rusqlite::Error> {
        let mut clauses: Vec<&'static str> = vec!["user_id = ?"];
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id.to_string())];

        if let Some(kind) = filter.kind {
            clauses.push("kind = ?");
            args.push(Box::new(kind.to_string()));
        }
        if let Some(status) = filter.status {
            clauses.push("status = ?");
            args.push(Box::new(status.as_str().to_string()));
        }
        if let Some(ref symbol) = filter.symbol {
            clauses.push("symbol = ?");
            args.push(Box::new(symbol.to_uppercase()));
        }
        if let Some(from) = filter.created_from {
            clauses.push("created_at >= ?");
            args.push(Box::new(from));
        }
        if let Some(to) = filter.created_to {
            clauses.push("created_at <= ?");
            args.push(Box::new(to));
        }

        let where_sql = clauses.join(" AND ");

        let conn = self.conn.lock().unwrap();

        let total: u64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM orders WHERE {where_sql}"),
            params_from_iter(args.iter()),
            |row| row.get(0),
        )?;

        let sort_column = match filter.sort_field {
            OrderSortField::CreatedAt => "created_at",
            OrderSortField::Price => "price",
        };
        let sort_direction = match filter.sort_direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };

        let page_size = filter.page_size() as i64;
        let offset = (filter.page() as i64 - 1) * page_size;
        args.push(Box::new(page_size));
        args.push(Box::new(offset));

        let mut stmt = conn.prepare(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE {where_sql}
             ORDER BY {sort_column} {sort_direction} LIMIT ? OFFSET ?"
        ))?;

        let orders = stmt
            .query_map(params_from_iter(args.iter()), map_order_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((orders, total))
    }

    // ========== Holding Methods ==========

    /// Get a user's holding for a symbol.
    pub fn get_holding(&self, user_id: &str, symbol: &str) -> Option<Holding> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT id, user_id, symbol, quantity, average_price, updated_at
             FROM holdings WHERE user_id = ?1 AND symbol = ?2",
            params![user_id, symbol],
            map_holding_row,
        );

        match result {
            Ok(holding) => Some(holding),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                error!("Error fetching holding {}/{}: {}", user_id, symbol, e);
                None
            }
        }
    }

    /// Get all holdings for a user.
    pub fn get_user_holdings(&self, user_id: &str) -> Result<Vec<Holding>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, user_id, symbol, quantity, average_price, updated_at
             FROM holdings WHERE user_id = ?1 ORDER BY symbol",
        )?;

        let holdings = stmt
            .query_map(params![user_id], map_holding_row)?
            .collect::<Result<Vec<_>, _>>();
        holdings
    }

    /// Credit a buy fill to the (user, symbol) holding.
    ///
    /// Creates the holding with a zero average price when it doesn't exist;
    /// otherwise increments quantity in place. Single upsert statement, so
    /// concurrent fills on the same key never lose an update.
    pub fn credit_holding(
        &self,
        user_id: &str,
        symbol: &str,
        quantity: i64,
    ) -> Result<Holding, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let now = chrono::Utc::now().timestamp_millis();

        conn.execute(
            "INSERT INTO holdings (id, user_id, symbol, quantity, average_price, updated_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)
             ON CONFLICT(user_id, symbol) DO UPDATE SET
                quantity = quantity + excluded.quantity,
                updated_at = excluded.updated_at",
            params![Uuid::new_v4().to_string(), user_id, symbol, quantity, now],
        )?;

        conn.query_row(
            "SELECT id, user_id, symbol, quantity, average_price, updated_at
             FROM holdings WHERE user_id = ?1 AND symbol = ?2",
            params![user_id, symbol],
            map_holding_row,
        )
    }

    /// Debit a sell fill from the (user, symbol) holding.
    ///
    /// No holding is a no-op. A holding driven to zero or below is deleted,
    /// never persisted. Returns the remaining holding, if any.
    pub fn debit_holding(
        &self,
        user_id: &str,
        symbol: &str,
        quantity: i64,
    ) -> Result<Option<Holding>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();
        let now = chrono::Utc::now().timestamp_millis();

        let changed = conn.execute(
            "UPDATE holdings SET quantity = quantity - ?1, updated_at = ?2
             WHERE user_id = ?3 AND symbol = ?4",
            params![quantity, now, user_id, symbol],
        )?;

        if changed == 0 {
            return Ok(None);
        }

        conn.execute(
            "DELETE FROM holdings WHERE user_id = ?1 AND symbol = ?2 AND quantity <= 0",
            params![user_id, symbol],
        )?;

        let result = conn.query_row(
            "SELECT id, user_id, symbol, quantity, average_price, updated_at
             FROM holdings WHERE user_id = ?1 AND symbol = ?2",
            params![user_id, symbol],
            map_holding_row,
        );

        match result {
            Ok(holding) => Ok(Some(holding)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

const ORDER_COLUMNS: &str = "id, user_id, symbol, kind, quantity, price, limit_price, \
     stop_price, trailing_amount, trailing_percent, status, executed_price, \
     created_at, updated_at";

fn map_order_row(row: &rusqlite::Row<'_>) -> Result<Order, rusqlite::Error> {
    let kind: String = row.get(3)?;
    let status: String = row.get(10)?;

    Ok(Order {
        id: row.get(0)?,
        user_id: row.get(1)?,
        symbol: row.get(2)?,
        kind: parse_kind(&kind),
        quantity: row.get(4)?,
        price: row.get(5)?,
        limit_price: row.get(6)?,
        stop_price: row.get(7)?,
        trailing_amount: row.get(8)?,
        trailing_percent: row.get(9)?,
        status: parse_status(&status),
        executed_price: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn map_holding_row(row: &rusqlite::Row<'_>) -> Result<Holding, rusqlite::Error> {
    Ok(Holding {
        id: row.get(0)?,
        user_id: row.get(1)?,
        symbol: row.get(2)?,
        quantity: row.get(3)?,
        average_price: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn parse_kind(s: &str) -> OrderKind {
    match s {
        "buy" => OrderKind::Buy,
        "sell" => OrderKind::Sell,
        "limit" => OrderKind::Limit,
        "stop_loss" => OrderKind::StopLoss,
        "trailing_stop" => OrderKind::TrailingStop,
        _ => OrderKind::Buy,
    }
}

fn parse_status(s: &str) -> OrderStatus {
    match s {
        "pending" => OrderStatus::Pending,
        "completed" => OrderStatus::Completed,
        "cancelled" => OrderStatus::Cancelled,
        "failed" => OrderStatus::Failed,
        _ => OrderStatus::Failed,
    }
}
