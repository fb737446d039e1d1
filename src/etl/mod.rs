//! ETL Module
//!
//! The three stages an account crawl pushes data through:
//! - Extract: fetch history pages and ledger pages from the node
//! - Transform: turn raw history entries into transaction records
//! - Load: store new records exactly once

pub mod extract;
pub mod load;
pub mod transform;
