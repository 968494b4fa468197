//! Page text retrieval
//!
//! Fetches discovered pages and reduces their HTML to cleaned text, stored
//! for downstream chunking and indexing.

mod extract;
mod retriever;

pub use extract::{extract_text, preview};
pub use retriever::{retrieve_pages, RetrievalReport};
