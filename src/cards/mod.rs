//! Cards: the page model, its owned store and the page HTTP API
//!
//! A page is an ordered list of cards plus an optional profile. The
//! [`CardStore`] owns one page and persists a full snapshot after every
//! mutation; the [`PageRegistry`] hands out stores by owner key.

mod handler;
pub mod registry;
pub mod store;
pub mod types;

pub use handler::{cards_router, CardsState};
pub use registry::PageRegistry;
pub use store::{AddedCard, CardStore};
pub use types::*;
