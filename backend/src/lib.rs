//! REST backend for the EstateNest real-estate marketplace.
//!
//! Properties, users, wishlists, reviews and offers live in a document
//! store; card payments go through Stripe. [`handlers::router`] assembles the
//! whole HTTP surface around an injected [`handlers::AppState`].

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod offer;
pub mod payment;
pub mod property;
pub mod review;
pub mod user;
pub mod wishlist;
