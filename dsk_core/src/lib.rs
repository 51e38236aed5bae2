//! # Desk Audio Core
//!
//! This crate contains the realtime-safe mechanisms and utilities
//! used throughout this workspace: the SPSC byte ring that carries
//! captured samples between audio callbacks, the publish-slot list that
//! lets the control thread register callbacks while audio is running,
//! atomic parameter cells, level math, and the shared error type.

pub mod atomic_float;
pub mod error;
pub mod level;
pub mod ring;
pub mod slots;

pub use atomic_float::AtomicF32;
pub use error::{DskError, Result};
pub use level::{db_to_gain, gain_to_db};
pub use ring::{ByteRing, RingConsumer, RingProducer};
pub use slots::PublishSlots;
