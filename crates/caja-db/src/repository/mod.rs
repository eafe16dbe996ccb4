//! # Repository Module
//!
//! Database repository implementations for Caja.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checkout screen                                                        │
//! │       │                                                                 │
//! │       │  db.sessions().record_cash_sale(id, due, &tendered, policy)     │
//! │       ▼                                                                 │
//! │  CashSessionRepository                                                  │
//! │  ├── open_session / close_session                                       │
//! │  ├── give_change / give_manual_change / record_cash_sale                │
//! │  └── get_by_id / get_open_for_register / list_movements                 │
//! │       │                                                                 │
//! │       │  caja-core arithmetic, then SQL in one transaction              │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CashSessionRepository`](session::CashSessionRepository) - Drawer sessions and movements

pub mod session;
