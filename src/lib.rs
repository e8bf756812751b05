//! Bento - link-in-bio page builder
//!
//! A Bento page is a grid of typed cards (links, images, notes, clocks,
//! movies, songs, verses and books) plus a floating profile badge. The owner
//! edits the page under a private key; every edit republishes a read-only
//! copy under a deterministic share key.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       HTTP API (axum)                        │
//! │   /api/v1/pages/*   /api/v1/shared/*   /api/v1/search/*      │
//! └───────┬──────────────────┬───────────────────┬───────────────┘
//!         │                  │                   │
//! ┌───────▼────────┐  ┌──────▼───────┐   ┌───────▼──────────────┐
//! │  PageRegistry  │  │  View render │   │  Enrichment clients  │
//! │   CardStore    │  │ edit/shared  │   │ OMDb · iTunes · NET  │
//! └───────┬────────┘  └──────────────┘   │ Bible · alquran ·    │
//!         │ full snapshot per mutation   │ Open Library · OG    │
//! ┌───────▼──────────────────────────┐   │  + SearchSession     │
//! │       Persistence gateway        │   └──────────────────────┘
//! │  memory · file · remote REST     │
//! │  <owner>  +  view_<owner>        │
//! └──────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`cards`]: card model, the owned page store and page endpoints
//! - [`storage`]: persistence gateways and share-key derivation
//! - [`enrichment`]: provider clients and debounced search sessions
//! - [`view`]: edit and shared page rendering
//! - [`api`]: router assembly and the error envelope
//! - [`config`]: configuration management

pub mod api;
pub mod cards;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod storage;
pub mod view;

#[cfg(test)]
mod testing;

pub use config::BentoConfig;
pub use error::{Error, Result};
