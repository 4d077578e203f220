//! Admin report of authors and the articles they published over a selectable
//! period.
pub mod access;
pub mod config;
pub mod nonce;
pub mod preferences;
pub mod range;
pub mod render;
pub mod selection;
pub mod server;
pub mod storage;
pub mod util;
