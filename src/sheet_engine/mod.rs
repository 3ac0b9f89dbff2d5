//! Core sheet engine: question specs in, numbered questions with drawn
//! numbers out.
//!
//! ## Module overview
//!
//! | Module      | Purpose |
//! |-------------|---------|
//! | `models`    | Shared types: requests, normalized questions, exercise/sheet structs |
//! | `number`    | Exact decimals, pool values, the scalar/tuple draw result |
//! | `error`     | `SheetError` taxonomy (configuration, infeasible draw, storage) |
//! | `config`    | `EngineConfig` loaded from TOML (pool backing, exercise defaults) |
//! | `telemetry` | `tracing-subscriber` setup for hosts and demos |
//! | `parser`    | Question mini-language: alternations, continuations, choice blocks |
//! | `mix`       | Mix sections: compatibility check, then random question/source pairing |
//! | `catalogue` | Fixed tables: symbolic menus, literal subkinds, mix compatibility |
//! | `unpack`    | Cycle tracker for symbolic subkinds and sources |
//! | `builder`   | Count unrolling, subkind unpacking, ordering, declustering |
//! | `sources`   | Source tag classification and per-question source resolution |
//! | `pool`      | Draw engine: memory and SQLite pools behind one `draw` protocol |
//! | `merge`     | Common-number helpers for merge-source questions |
//! | `numbering` | Question label generator |
//! | `question`  | Instantiated question and its `to_str` rendering |
//! | `generator` | Entry points `generate_sheet()` and `generate_exercise()` |

pub mod builder;
pub mod catalogue;
pub mod config;
pub mod error;
pub mod generator;
pub mod merge;
pub mod mix;
pub mod models;
pub mod number;
pub mod numbering;
pub mod parser;
pub mod pool;
pub mod question;
pub mod sources;
pub mod telemetry;
pub mod unpack;

pub use config::{BackingKind, EngineConfig};
pub use error::{Result, SheetError};
pub use generator::{
    generate_exercise, generate_sheet, generate_sheet_with, SharedCounters, SheetContext,
};
pub use models::{
    Exercise, ExerciseSpec, MixSection, NormalizedQuestion, NumberingPolicy, Preset,
    QuestionRequest, Sheet, SheetRequest,
};
pub use number::{Decimal, Drawn, Value};
pub use pool::{DrawConstraint, PoolRegistry};
pub use question::{Question, RenderMode};
