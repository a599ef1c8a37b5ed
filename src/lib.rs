#[path = "core/vec2.rs"]
pub mod vec2;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/store.rs"]
pub mod store;

#[path = "core/query.rs"]
pub mod query;

#[path = "core/synth.rs"]
pub mod synth;

#[path = "core/aggregate.rs"]
pub mod aggregate;

#[path = "core/likelihood.rs"]
pub mod likelihood;

#[path = "core/phase.rs"]
pub mod phase;

#[path = "core/scheduler.rs"]
pub mod scheduler;

pub mod config;
pub mod demos;

pub use vec2::Vec2;
