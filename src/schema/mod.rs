//! Schema Module
//!
//! Describes the fixed-width layout of a row.
//!
//! ## Responsibilities
//! - Column types and their default widths
//! - Ordered column lists (`RowSpec`) and the derived row size
//! - Header serialization (JSON) stored at the front of every container
//!
//! ## Layout
//! ```text
//! RowSpec [symbol: str(8), price: u32(4), flag: bool(1)]
//!
//! ┌──────────────────────┬──────────────┬─────┐
//! │ symbol (8, 0-padded) │ price (4 LE) │ (1) │   RowSize = 13
//! └──────────────────────┴──────────────┴─────┘
//! ```

mod column;
mod spec;

pub use column::{Column, ColumnType};
pub use spec::RowSpec;
