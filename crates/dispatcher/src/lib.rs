//! Subscription dispatch for committed domain events.
//!
//! This crate provides the read-side delivery machinery:
//! - [`PlatformEvent`] - the closed enumeration of every known event kind
//! - [`EventTypeRegistry`] - wire discriminator to decoder mapping
//! - [`DomainEventHandler`] and [`HandlerRegistry`] - handler wiring
//! - [`DispatcherConfig`] - event-type to handler routing for the two
//!   delivery pipelines ("main" unordered, "ordered" per-partition)
//! - [`EventDispatcher`] - retrying, parking delivery over both pipelines
//! - [`SubscriptionWorker`] - the long-lived checkpointing tail loop

pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod pipeline;
pub mod worker;

pub use config::{DispatcherConfig, ResolvedRoutes};
pub use error::DispatchError;
pub use event::{EventTypeRegistry, PlatformEvent, partition_key};
pub use handler::{DomainEventHandler, HandlerRegistry};
pub use pipeline::{EventDispatcher, ParkedEvent, ParkedEventStore, RetryPolicy};
pub use worker::{SubscriptionWorker, SubscriptionWorkerConfig};
