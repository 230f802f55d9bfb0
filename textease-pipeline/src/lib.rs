//! The TextEase text pipeline.
//!
//! Raw text flows through sentence splitting and budgeted segmentation into
//! the rewrite engine; results can be translated, scored against the original
//! or decomposed into claims. Everything hangs off an [`AssistantContext`]
//! that owns the two shared models.
//!
//! # Examples
//! ```
//! use textease_pipeline::segmenter::Segmenter;
//! use textease_pipeline::sentences::sentence_splitter_for;
//!
//! let segmenter = Segmenter::new(sentence_splitter_for("ru"));
//! let chunks = segmenter.segment("Раз. Два. Три.", 9);
//! assert_eq!(chunks, vec!["Раз. Два.", "Три."]);
//! ```
pub mod claims;
pub mod cleanup;
pub mod context;
pub mod quality;
pub mod rewrite;
pub mod segmenter;
pub mod sentences;
pub mod translate;

pub use context::AssistantContext;
pub use quality::{QualityHint, QualityReport};
pub use rewrite::Strength;
