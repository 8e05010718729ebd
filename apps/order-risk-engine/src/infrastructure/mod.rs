//! Infrastructure Layer
//!
//! This module contains all adapters (implementations) for the ports defined
//! in the domain and application layers. Following hexagonal architecture:
//!
//! - **Driven Adapters (Outbound)**
//!   - `persistence/`: In-memory risk data store (limits, positions, exposure,
//!     drawdown, order rate, strategy directory)
//!   - `execution/`: Paper execution adapter
//!   - `messaging/`: Risk event sinks

pub mod execution;
pub mod messaging;
pub mod persistence;
