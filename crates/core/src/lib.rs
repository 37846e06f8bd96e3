//! Core traits and types for driving reverse-communication optimizers.
//!
//! This crate defines the shared abstractions that the driver, the solver
//! backends, and the observers build on:
//!
//! - [`Objective`]: maps a point to an objective value and its gradient
//! - [`Evaluation`]: the value/gradient pair produced by an objective
//! - [`Bound`], [`BoundType`], [`Bounds`]: per-variable simple bounds
//! - [`Observer`]: receives driver events and optionally returns control actions
//! - [`problems`]: ready-made objectives used by the demo and the tests

mod bounds;
mod objective;
mod observer;

pub mod problems;

pub use bounds::{Bound, BoundType, Bounds, BoundsError};
pub use objective::{DomainError, Evaluation, Objective};
pub use observer::Observer;
