use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sheet_engine::question::Question;

/// Free-form `attr=val` pairs attached to a question.
pub type Attributes = BTreeMap<String, String>;

/// Attribute keys that route a question instead of configuring it.
pub const ROUTING_KEYS: [&str; 6] = ["id", "kind", "subkind", "pick", "required", "nb"];

// ---------------------------------------------------------------------------
// Parsed requests
// ---------------------------------------------------------------------------

/// One row of an exercise's question spec, before counts are unrolled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub kind: String,
    pub subkind: String,
    pub attributes: Attributes,
    pub sources: Vec<String>,
    pub count: usize,
}

impl QuestionRequest {
    pub fn id(&self) -> String {
        format!("{}_{}", self.kind, self.subkind)
    }
}

/// One concrete question to instantiate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedQuestion {
    pub id: String,
    pub kind: String,
    pub subkind: String,
    pub nb_source: Vec<String>,
    pub options: Attributes,
    /// Position in the unrolled input, used when shuffling is off.
    pub order: usize,
}

impl NormalizedQuestion {
    pub fn new(
        kind: &str, subkind: &str, nb_source: Vec<String>,
        options: Attributes, order: usize,
    ) -> Self {
        NormalizedQuestion {
            id: format!("{kind}_{subkind}"),
            kind: kind.to_string(),
            subkind: subkind.to_string(),
            nb_source,
            options,
            order,
        }
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Exercise description (handed over by external sheet loaders)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    #[default]
    Default,
    MentalCalculation,
    Tabular,
    Slideshow,
}

impl Preset {
    /// Presets under which consecutive questions of the same id get spread out.
    pub fn alternates(self) -> bool {
        matches!(self, Preset::MentalCalculation | Preset::Tabular | Preset::Slideshow)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Preset::Default           => "default",
            Preset::MentalCalculation => "mental_calculation",
            Preset::Tabular           => "tabular",
            Preset::Slideshow         => "slideshow",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberingPolicy {
    Disabled,
    #[default]
    Numeric,
    Alphabetic,
}

/// `question` entries are paired at random with `nb` entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MixSection {
    #[serde(default)]
    pub question: Vec<String>,
    #[serde(default)]
    pub nb: Vec<String>,
}

fn default_shuffle() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseSpec {
    /// Mini-language text, one request per line.
    #[serde(default)]
    pub questions: Option<String>,
    #[serde(default)]
    pub mix: Vec<MixSection>,
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
    #[serde(default)]
    pub preset: Preset,
    #[serde(default)]
    pub numbering: NumberingPolicy,
}

impl ExerciseSpec {
    /// Shuffled, default preset, numeric numbering.
    pub fn from_questions(text: impl Into<String>) -> Self {
        ExerciseSpec {
            questions: Some(text.into()),
            mix: Vec::new(),
            shuffle: true,
            preset: Preset::Default,
            numbering: NumberingPolicy::Numeric,
        }
    }
}

// ---------------------------------------------------------------------------
// Sheet request / response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetRequest {
    pub exercises: Vec<ExerciseSpec>,
    pub rng_seed: Option<u64>,
}

impl SheetRequest {
    pub fn new(exercises: Vec<ExerciseSpec>) -> Self {
        SheetRequest { exercises, rng_seed: None }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Exercise {
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Sheet {
    pub exercises: Vec<Exercise>,
}
