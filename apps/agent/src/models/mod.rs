// Core data model: discovered listings and per-job work products.
// Listings are created by discovery, scored once, and never edited after;
// packages carry everything a single worker produces for one listing.

pub mod job;
pub mod package;
