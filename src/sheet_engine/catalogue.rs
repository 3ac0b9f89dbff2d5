//! Fixed tables: symbolic subkind menus, symbolic source menus, literal
//! subkinds, and the question/source compatibility table used by mix
//! sections.

use crate::sheet_engine::sources::SourceFamily;

// ---------------------------------------------------------------------------
// Subkinds
// ---------------------------------------------------------------------------

/// Symbolic subkinds and the concrete subkinds they stand for.
pub const SUBKINDS_TO_UNPACK: [(&str, &[&str]); 4] = [
    ("simple_parts_of_a_number", &["half", "third", "quarter"]),
    ("simple_multiples_of_a_number", &["double", "triple", "quadruple"]),
    (
        "simple_parts_or_multiples_of_a_number",
        &["half", "third", "quarter", "double", "triple", "quadruple"],
    ),
    ("operation", &["multi", "divi", "addi", "subtr"]),
];

/// Concrete subkinds that belong to at least one symbolic menu.
pub const UNPACKABLE_SUBKINDS: [&str; 10] = [
    "half", "third", "quarter", "double", "triple", "quadruple",
    "multi", "divi", "addi", "subtr",
];

/// Subkinds that are neither symbolic nor menu members.
pub const LITERAL_SUBKINDS: [&str; 7] = [
    "direct", "reversed", "square", "rectangle", "simplification",
    "order_of_operations", "quadruplet",
];

pub fn subkind_menu(subkind: &str) -> Option<&'static [&'static str]> {
    SUBKINDS_TO_UNPACK
        .iter()
        .find(|(name, _)| *name == subkind)
        .map(|(_, menu)| *menu)
}

/// Symbolic subkinds whose menu lists `member`.
pub fn menus_listing(member: &str) -> impl Iterator<Item = &'static str> + '_ {
    SUBKINDS_TO_UNPACK
        .iter()
        .filter(move |(_, menu)| menu.contains(&member))
        .map(|(name, _)| *name)
}

pub fn is_unpackable_subkind(subkind: &str) -> bool {
    UNPACKABLE_SUBKINDS.contains(&subkind)
}

pub fn is_literal_subkind(subkind: &str) -> bool {
    LITERAL_SUBKINDS.contains(&subkind)
}

/// Multiplier behind a part/multiple subkind: `half` and `double` are 2, ...
pub fn subkind_factor(subkind: &str) -> Option<i64> {
    match subkind {
        "half" | "double"      => Some(2),
        "third" | "triple"     => Some(3),
        "quarter" | "quadruple" => Some(4),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Symbolic sources
// ---------------------------------------------------------------------------

/// What a symbolic source menu is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpackKey {
    QuestionId,
    Subkind,
}

#[derive(Debug, PartialEq, Eq)]
pub struct SourceMenu {
    pub tag: &'static str,
    pub key: UnpackKey,
    pub entries: &'static [(&'static str, &'static [&'static str])],
}

impl SourceMenu {
    pub fn menu_for(&self, key: &str) -> Option<&'static [&'static str]> {
        self.entries.iter().find(|(k, _)| *k == key).map(|(_, m)| *m)
    }
}

const TABLES_2_TO_9: &[&str] = &[
    "table_2", "table_3", "table_4", "table_5", "table_6", "table_7", "table_8", "table_9",
];

pub const SOURCES_TO_UNPACK: [SourceMenu; 5] = [
    SourceMenu {
        tag: "auto_table",
        key: UnpackKey::QuestionId,
        entries: &[
            ("vocabulary_half", &["table_2"]),
            ("vocabulary_double", &["table_2"]),
            ("vocabulary_third", &["table_3"]),
            ("vocabulary_triple", &["table_3"]),
            ("vocabulary_quarter", &["table_4"]),
            ("vocabulary_quadruple", &["table_4"]),
            ("multi_direct", TABLES_2_TO_9),
            ("multi_reversed", TABLES_2_TO_9),
            ("divi_direct", TABLES_2_TO_9),
        ],
    },
    SourceMenu {
        tag: "auto_11_50",
        key: UnpackKey::QuestionId,
        entries: &[
            ("vocabulary_half", &["multiplesof2_6to25"]),
            ("vocabulary_third", &["multiplesof3_4to16"]),
            ("vocabulary_quarter", &["multiplesof4_3to12"]),
            ("vocabulary_double", &["multiplesof2_11to50"]),
            ("vocabulary_triple", &["multiplesof3_11to33"]),
            ("vocabulary_quadruple", &["multiplesof4_11to25"]),
        ],
    },
    SourceMenu {
        tag: "auto_vocabulary",
        key: UnpackKey::Subkind,
        entries: &[
            ("half", &["table_2", "multiplesof2_6to25"]),
            ("third", &["table_3", "multiplesof3_4to16"]),
            ("quarter", &["table_4", "multiplesof4_3to12"]),
            ("double", &["table_2", "multiplesof2_11to50"]),
            ("triple", &["table_3", "multiplesof3_11to33"]),
            ("quadruple", &["table_4", "multiplesof4_11to25"]),
            ("addi", &["intpairs_10to99", "intpairs_2to9"]),
            ("subtr", &["intpairs_10to99", "intpairs_2to9"]),
            ("multi", &["intpairs_2to9"]),
            ("divi", &["intpairs_2to9"]),
        ],
    },
    SourceMenu {
        tag: "decimal_and_10_100_1000",
        key: UnpackKey::Subkind,
        entries: &[
            ("multi", &["decimal_and_10_100_1000_for_multi"]),
            ("divi", &["decimal_and_10_100_1000_for_divi"]),
            ("direct", &["decimal_and_10_100_1000_for_multi", "decimal_and_10_100_1000_for_divi"]),
        ],
    },
    SourceMenu {
        tag: "decimal_and_one_digit",
        key: UnpackKey::Subkind,
        entries: &[
            ("multi", &["decimal_and_one_digit_for_multi"]),
            ("divi", &["decimal_and_one_digit_for_divi"]),
            ("direct", &["decimal_and_one_digit_for_multi", "decimal_and_one_digit_for_divi"]),
        ],
    },
];

pub fn source_menu(tag: &str) -> Option<&'static SourceMenu> {
    SOURCES_TO_UNPACK.iter().find(|m| m.tag == tag)
}

// ---------------------------------------------------------------------------
// Mix compatibility
// ---------------------------------------------------------------------------

use SourceFamily::*;

const VOCABULARY_SOURCES: &[SourceFamily] = &[IntPairs, Symbolic];

/// Source families each question id accepts inside a mix section.
pub const MIX_COMPATIBILITY: [(&str, &[SourceFamily]); 22] = [
    ("multi_direct", &[IntPairs, DecimalComposition, Symbolic]),
    ("multi_reversed", &[IntPairs, Symbolic]),
    ("divi_direct", &[IntPairs, DecimalComposition, Symbolic]),
    ("addi_direct", &[IntPairs, Symbolic]),
    ("subtr_direct", &[IntPairs, Symbolic]),
    ("area_square", &[SingleInt, SingleDecimal]),
    ("perimeter_square", &[SingleInt, SingleDecimal]),
    ("area_rectangle", &[IntPairs]),
    ("perimeter_rectangle", &[IntPairs]),
    ("rank_direct", &[RankWords]),
    ("fraction_simplification", &[ProperFraction]),
    ("calculation_order_of_operations", &[MergedTriples]),
    ("vocabulary_half", VOCABULARY_SOURCES),
    ("vocabulary_third", VOCABULARY_SOURCES),
    ("vocabulary_quarter", VOCABULARY_SOURCES),
    ("vocabulary_double", VOCABULARY_SOURCES),
    ("vocabulary_triple", VOCABULARY_SOURCES),
    ("vocabulary_quadruple", VOCABULARY_SOURCES),
    ("vocabulary_simple_parts_of_a_number", VOCABULARY_SOURCES),
    ("vocabulary_simple_multiples_of_a_number", VOCABULARY_SOURCES),
    ("vocabulary_simple_parts_or_multiples_of_a_number", VOCABULARY_SOURCES),
    ("vocabulary_operation", VOCABULARY_SOURCES),
];

/// `None` when the question id is absent from the table.
pub fn compatible_families(question_id: &str) -> Option<&'static [SourceFamily]> {
    MIX_COMPATIBILITY
        .iter()
        .find(|(id, _)| *id == question_id)
        .map(|(_, families)| *families)
}
