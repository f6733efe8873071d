//! Pure transformations from raw API items to store-ready records.
//!
//! This is the only layer that tolerates unknown or wrong-typed fields.
//! Every function here is total.

pub mod fields;
mod history;
mod listing;

pub use fields::{
    normalize_amount, normalize_bool, normalize_child_key, normalize_date, normalize_text,
};
pub use history::{normalize_history, normalize_history_entry};
pub use listing::{normalize_listing, normalize_listings};
