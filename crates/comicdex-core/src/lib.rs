//! Core domain logic for comicdex: ingestion, the inverted index, search,
//! and the concurrency controls that gate them. Everything in this crate
//! is storage- and transport-agnostic; concrete stores, the upstream HTTP
//! client and the JWT token manager live in their own crates and are
//! wired in behind the traits in [`interfaces`].

pub mod auth;
pub mod concurrency;
pub mod domain;
pub mod error;
pub mod interfaces;
pub mod ratelimiter;
pub mod scanner;
pub mod scheduler;
pub mod stemmer;
pub mod updater;

pub use auth::Auth;
pub use concurrency::ConcurrencyGate;
pub use domain::{Comic, ComicKeyword, User};
pub use error::{Error, Result};
pub use ratelimiter::RateLimiter;
pub use scanner::Scanner;
pub use scheduler::Scheduler;
pub use stemmer::Stemmer;
pub use updater::Updater;
