//! Multi-Container Module
//!
//! A logical table spread over time-stamped segment files: one live
//! container takes appends, older segments are archived, and reads merge
//! every segment in timestamp order.
//!
//! ```text
//!            append / bulk_append
//!                    │
//!                    ▼
//!   ┌────────────────────────────────┐   rotate (on demand or periodic)
//!   │  current Container<R>  (.sbt)  │ ─────────────────────────────┐
//!   └────────────────────────────────┘                              │
//!                                                                   ▼
//!   ┌─────────────────────────────────────────────────────────────────────┐
//!   │ ArchiveManager: worker pool, .sbt → .sbt.gz                         │
//!   └─────────────────────────────────────────────────────────────────────┘
//!
//!   iter / iter_range:
//!     segments oldest → newest ──▶ decompress if archived ──▶ (key, row)
//! ```

mod multi_container;
mod trigger;

pub use multi_container::{ContainerGuard, MultiContainer, SegmentRowKey};
pub use trigger::PeriodicTrigger;
