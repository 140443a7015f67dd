//! Entities from §3, grouped by aggregate. These are plain data types — the
//! behaviour that mutates them lives in the component modules at the crate
//! root (`rent`, `invoice_generation`, `invoice_lifecycle`, ...), matching the
//! teacher's split between `pricing.rs`'s data shapes and the engine methods
//! that compute over them.

pub mod lease;
pub mod invoice;
pub mod credit_note;
pub mod utility;
pub mod sequence;
pub mod run;

pub use lease::*;
pub use invoice::*;
pub use credit_note::*;
pub use utility::*;
pub use sequence::*;
pub use run::*;
