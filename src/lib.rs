//! # mathsheet_gen
//!
//! Question-mix resolution and number drawing for randomised mental-math
//! exercise sheets.
//!
//! An exercise is described declaratively, either as lines of a small
//! question language or as "mix" sections pairing question variants with
//! number sources. The engine turns that description into concrete,
//! numbered questions whose numbers come from named pools sampled without
//! replacement.
//!
//! ## How it works
//!
//! 1. Describe each exercise with an [`ExerciseSpec`] (question text and/or
//!    [`MixSection`]s, shuffle flag, preset, numbering policy).
//! 2. Call [`generate_sheet`]: each exercise is parsed, its counts are
//!    unrolled and symbolic subkinds unpacked, its number sources resolved,
//!    and every question draws its numbers from the pools.
//! 3. The returned [`Sheet`] holds [`Question`]s; [`Question::to_str`]
//!    renders the exercise, answer or hint text, and
//!    [`sheet_json::to_sheet_json`] packs a whole sheet for a renderer.
//!
//! ## Key features
//!
//! - **No short-term repeats**: a pool never hands out the same row twice
//!   within a pass; exhaustion triggers one reset and retry.
//! - **Round-robin menus**: symbolic subkinds such as `operation` cycle
//!   through every member before repeating one.
//! - **Persistent pools**: with `backing = "sqlite"` the draw state survives
//!   across runs (see [`EngineConfig`]).
//!
//! ## Quick start
//!
//! ```rust
//! use mathsheet_gen::{generate_sheet, ExerciseSpec, RenderMode, SheetRequest};
//!
//! let mut request = SheetRequest::new(vec![ExerciseSpec::from_questions(
//!     "multi direct -> intpairs_2to9 (5)\nvocabulary operation -> auto_vocabulary (4)",
//! )]);
//! request.rng_seed = Some(42);
//!
//! let sheet = generate_sheet(request).unwrap();
//! for q in &sheet.exercises[0].questions {
//!     println!("{}. {}", q.number, q.to_str(RenderMode::Exc));
//! }
//! ```

pub mod sheet_engine;
pub mod sheet_json;

// Convenience re-exports so callers can use `mathsheet_gen::generate_sheet`
// directly without reaching into `sheet_engine::`.
pub use sheet_engine::{
    generate_exercise, generate_sheet, generate_sheet_with, BackingKind, EngineConfig,
    Exercise, ExerciseSpec, MixSection, NumberingPolicy, Preset, Question, RenderMode,
    Sheet, SheetContext, SheetError, SheetRequest,
};
