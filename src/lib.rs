//! Rule-based scoring and classification engine for B2B mail-platform
//! migration leads.
//!
//! Given a mail provider identity and a bundle of DNS-derived signals, the
//! engine produces a deterministic 0-100 readiness score, a technical
//! segment, an itemized score breakdown, and the derived sales
//! classifications (technical heat, commercial segment and heat, priority
//! category, priority score). DNS/WHOIS resolution, persistence, and HTTP
//! surfaces live in the host application; this crate is the library core
//! they call into.

pub mod config;
pub mod error;
pub mod leads;
pub mod telemetry;

pub use error::HunterError;
