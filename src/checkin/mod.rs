//! Check-in verification core
//!
//! Pure evaluation logic with no I/O: activity availability, geofence
//! containment, rotating QR tokens, and the check-in decision ladder that
//! combines them. Services fetch state and persist outcomes; everything in
//! this module is a function of its arguments.

pub mod availability;
pub mod decision;
pub mod geofence;
pub mod qr;

pub use decision::{Decision, RejectReason};
