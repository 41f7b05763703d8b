//! Background services

pub mod rollover;
pub mod scheduler;
