//! # tin-core — editor core for tin
//!
//! The text-buffer / viewport / rendering subsystem:
//!
//! - **[`row`]** — raw bytes plus the derived render form (tabs expanded,
//!   UTF-8 continuation bytes tracked)
//! - **[`buffer`]** — ordered rows, structural mutation, the dirty counter
//! - **[`cursor`]** — cursor position, raw↔render column mapping, movement
//! - **[`viewport`]** — window geometry, scroll offsets, the gutter
//! - **[`render`]** — one escape-coded frame per refresh, single-write flush
//! - **[`edit`]** — insert/delete/split/join under cursor guidance
//! - **[`search`]** — incremental wraparound substring search
//! - **[`status`]** — transient status message with an expiry
//! - **[`file`]** — newline-stripped load, atomic permission-preserving save
//!
//! Three coordinate spaces run through everything: raw byte offsets (what
//! the buffer stores), visible character counts (what the user perceives),
//! and render columns (what the screen shows). The row keeps the first two
//! consistent on every mutation; the cursor maps between the first and the
//! third on demand.

pub mod buffer;
pub mod cursor;
pub mod edit;
pub mod file;
pub mod render;
pub mod row;
pub mod search;
pub mod status;
pub mod viewport;
