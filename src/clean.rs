//! Tag key classification and the heuristic rewrite rules applied to every
//! tag before it is written out.

pub mod classify;
pub mod rules;

pub use classify::{classify, has_problem_chars, key_type, split_key, KeyClass, KeyType, DEFAULT_TAG_TYPE};
pub use rules::TagNormalizer;
