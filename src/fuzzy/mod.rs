//! Fuzzy Match & Ranking (spec §2.G, §4.G, ~15% share): scores a raw result
//! set against the query that produced it and orders it by confidence.

mod matcher;
mod phonetic;
mod similarity;
mod variants;

pub use matcher::rank;
