//! Data Transfer Objects (DTOs)
//!
//! DTOs are used for API boundaries and use case inputs/outputs.

mod order_dto;
mod risk_dto;

pub use order_dto::{OrderDto, PlaceOrderCommand};
pub use risk_dto::{RiskEventDto, ViolationDto};
