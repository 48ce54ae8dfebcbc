#![doc = include_str!("../README.md")]

mod colorings;
mod document;
mod transform;

#[doc(inline)]
pub use colorings::{apply_country_scale, COUNTRY_COLORING_KEY, COUNTRY_COLOR_SCALE};
#[doc(inline)]
pub use document::{Coloring, Meta, TreeDocument, TreeNode};
#[doc(inline)]
pub use transform::{collect_countries, extract_accessions, rename_nodes};
