//! Name comparison primitives shared by every identity decision.
//!
//! Both sides of a comparison must go through the same normalization before
//! scoring, otherwise accent or punctuation differences skew the result in
//! one direction only.

pub mod fuzzy;
pub mod normalize;

pub use fuzzy::similarity;
pub use normalize::{collapse_whitespace, comparison_key, format_author_name, normalize};
