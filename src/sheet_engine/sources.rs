//! Number sources: classification of source tags and resolution of a
//! question's declared sources into concrete draw requests.
//!
//! A tag is classified once into a closed set of variants and everything
//! downstream dispatches on the variant:
//!
//! - [`SourceKind`] is what a pool is built from (`intpairs_2to9`,
//!   `singleint_5to20`, `rank_words`, ...).
//! - [`SourceTag`] adds the tags that expand into several pools or into a
//!   menu: merged sources, explicit `;;` lists, symbolic menus.

use rand::Rng;

use crate::sheet_engine::{
    catalogue::{self, UnpackKey},
    error::{Result, SheetError},
    models::NormalizedQuestion,
    number::{gcd, Decimal, Value},
    pool::{ColumnKind, PoolLayout, PoolRow},
    unpack::UnpackTracker,
};

/// Largest number int pair pools reach.
pub const MAX_PAIR_NB: i64 = 200;
/// Largest number single int pools reach.
pub const MAX_SINGLE_NB: i64 = 1000;
/// Largest number single decimal pools reach.
pub const MAX_SINGLE_DECIMAL: i64 = 100;

const RANK_WORDS: [(&str, i64, u32); 6] = [
    ("tenth", 1, 1),
    ("hundredth", 1, 2),
    ("thousandth", 1, 3),
    ("ten", 10, 0),
    ("hundred", 100, 0),
    ("thousand", 1000, 0),
];

/// Value of a rank word (`hundredth` is 0.01).
pub fn rank_word_value(word: &str) -> Option<Decimal> {
    RANK_WORDS
        .iter()
        .find(|(w, _, _)| *w == word)
        .map(|&(_, units, places)| Decimal::new(units, places))
}

// ---------------------------------------------------------------------------
// Pool-level classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSet {
    /// Every `(nb1, nb2)` with `min <= nb1 <= nb2 <= max`.
    Span { min: i64, max: i64 },
    /// `(factor, k)` for `k` in `min..=max`.
    Multiples { factor: i64, min: i64, max: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enumeration {
    RankWords,
    SimpleFractions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalComposition {
    /// `(decimal, 10|100|1000)`
    TenPowersForMulti,
    /// `(10|100|1000, decimal)`
    TenPowersForDivi,
    /// `(decimal, digit)`
    OneDigitForMulti,
    /// `(digit, decimal)`
    OneDigitForDivi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    IntPairs(PairSet),
    SingleInt { min: i64, max: i64 },
    SingleDecimal { places: u32, min: i64, max: i64 },
    FixedEnumeration(Enumeration),
    DecimalComposition(DecimalComposition),
    /// `nothing` and `bypass`: the question needs no number.
    Sentinel,
}

fn parse_bounds(tag: &str, text: &str) -> Result<(i64, i64)> {
    let unknown = || SheetError::UnknownSource(tag.to_string());
    let (lo, hi) = text.split_once("to").ok_or_else(unknown)?;
    let lo: i64 = lo.parse().map_err(|_| unknown())?;
    let hi: i64 = hi.parse().map_err(|_| unknown())?;
    if lo > hi {
        return Err(unknown());
    }
    Ok((lo, hi))
}

fn within(tag: &str, (lo, hi): (i64, i64), floor: i64, ceiling: i64) -> Result<(i64, i64)> {
    if lo < floor || hi > ceiling {
        return Err(SheetError::UnknownSource(tag.to_string()));
    }
    Ok((lo, hi))
}

impl SourceKind {
    pub fn classify(tag: &str) -> Result<SourceKind> {
        use DecimalComposition as Dc;

        let kind = match tag {
            "nothing" | "bypass"                => SourceKind::Sentinel,
            "rank_words"                        => SourceKind::FixedEnumeration(Enumeration::RankWords),
            "simple_fractions"                  => SourceKind::FixedEnumeration(Enumeration::SimpleFractions),
            "decimal_and_10_100_1000_for_multi" => SourceKind::DecimalComposition(Dc::TenPowersForMulti),
            "decimal_and_10_100_1000_for_divi"  => SourceKind::DecimalComposition(Dc::TenPowersForDivi),
            "decimal_and_one_digit_for_multi"   => SourceKind::DecimalComposition(Dc::OneDigitForMulti),
            "decimal_and_one_digit_for_divi"    => SourceKind::DecimalComposition(Dc::OneDigitForDivi),
            _ => return Self::classify_parametrised(tag),
        };
        Ok(kind)
    }

    fn classify_parametrised(tag: &str) -> Result<SourceKind> {
        let unknown = || SheetError::UnknownSource(tag.to_string());

        if let Some(rest) = tag.strip_prefix("intpairs_") {
            let (min, max) = within(tag, parse_bounds(tag, rest)?, 1, MAX_PAIR_NB)?;
            return Ok(SourceKind::IntPairs(PairSet::Span { min, max }));
        }
        if let Some(rest) = tag.strip_prefix("multiplesof") {
            let (factor, range) = rest.split_once('_').ok_or_else(unknown)?;
            let factor: i64 = factor.parse().map_err(|_| unknown())?;
            let (min, max) = within(tag, parse_bounds(tag, range)?, 1, MAX_PAIR_NB)?;
            if !(1..=MAX_PAIR_NB).contains(&factor) {
                return Err(unknown());
            }
            return Ok(SourceKind::IntPairs(PairSet::Multiples { factor, min, max }));
        }
        if let Some(rest) = tag.strip_prefix("table_") {
            let factor: i64 = rest.parse().map_err(|_| unknown())?;
            if !(1..=MAX_PAIR_NB).contains(&factor) {
                return Err(unknown());
            }
            return Ok(SourceKind::IntPairs(PairSet::Multiples { factor, min: 1, max: 10 }));
        }
        if let Some(rest) = tag.strip_prefix("singleint_") {
            let (min, max) = within(tag, parse_bounds(tag, rest)?, 0, MAX_SINGLE_NB)?;
            return Ok(SourceKind::SingleInt { min, max });
        }
        for (prefix, places) in [("singledeci1_", 1), ("singledeci2_", 2)] {
            if let Some(rest) = tag.strip_prefix(prefix) {
                let (min, max) = within(tag, parse_bounds(tag, rest)?, 0, MAX_SINGLE_DECIMAL)?;
                return Ok(SourceKind::SingleDecimal { places, min, max });
            }
        }
        Err(unknown())
    }

    /// Values present in every row of the pool, such as the factor of a
    /// table. Excluding them would empty the pool.
    pub fn fixed_values(&self) -> Vec<Value> {
        match *self {
            SourceKind::IntPairs(PairSet::Multiples { factor, .. }) => vec![Value::Int(factor)],
            _ => Vec::new(),
        }
    }

    pub fn is_int_pairs(&self) -> bool {
        matches!(self, SourceKind::IntPairs(_))
    }

    pub fn layout(&self) -> PoolLayout {
        use ColumnKind as C;
        match self {
            SourceKind::IntPairs(_) => PoolLayout::new(&[("nb1", C::Int), ("nb2", C::Int)]),
            SourceKind::SingleInt { .. } => PoolLayout::new(&[("nb1", C::Int)]),
            SourceKind::SingleDecimal { places, .. } => PoolLayout::new(&[("nb1", C::Decimal(*places))]),
            SourceKind::FixedEnumeration(Enumeration::RankWords) => PoolLayout::new(&[("nb1", C::Text)]),
            SourceKind::FixedEnumeration(Enumeration::SimpleFractions) => {
                PoolLayout::new(&[("nb1", C::Int), ("nb2", C::Int)])
            }
            SourceKind::DecimalComposition(dc) => match dc {
                DecimalComposition::TenPowersForMulti | DecimalComposition::OneDigitForMulti => {
                    PoolLayout::new(&[("nb1", C::Decimal(2)), ("nb2", C::Int)])
                }
                DecimalComposition::TenPowersForDivi | DecimalComposition::OneDigitForDivi => {
                    PoolLayout::new(&[("nb1", C::Int), ("nb2", C::Decimal(2))])
                }
            },
            SourceKind::Sentinel => PoolLayout::new(&[]),
        }
    }

    /// Every candidate row of the pool, keyed from 1.
    pub fn rows(&self) -> Vec<PoolRow> {
        let values: Vec<Vec<Value>> = match *self {
            SourceKind::IntPairs(PairSet::Span { min, max }) => (min..=max)
                .flat_map(|a| (a..=max).map(move |b| vec![Value::Int(a), Value::Int(b)]))
                .collect(),
            SourceKind::IntPairs(PairSet::Multiples { factor, min, max }) => (min..=max)
                .map(|k| vec![Value::Int(factor), Value::Int(k)])
                .collect(),
            SourceKind::SingleInt { min, max } => (min..=max).map(|n| vec![Value::Int(n)]).collect(),
            SourceKind::SingleDecimal { places, min, max } => {
                let scale = 10i64.pow(places);
                (min * scale..=max * scale)
                    .filter(|u| u % 10 != 0)
                    .map(|u| vec![Value::Decimal(Decimal::new(u, places))])
                    .collect()
            }
            SourceKind::FixedEnumeration(Enumeration::RankWords) => RANK_WORDS
                .iter()
                .map(|(w, _, _)| vec![Value::Text(w.to_string())])
                .collect(),
            SourceKind::FixedEnumeration(Enumeration::SimpleFractions) => (1..10i64)
                .flat_map(|n| (n + 1..=10).map(move |d| (n, d)))
                .filter(|&(n, d)| gcd(n, d) == 1)
                .map(|(n, d)| vec![Value::Int(n), Value::Int(d)])
                .collect(),
            SourceKind::DecimalComposition(dc) => decimal_composition_rows(dc),
            SourceKind::Sentinel => Vec::new(),
        };

        values
            .into_iter()
            .enumerate()
            .map(|(i, values)| {
                let mut row = PoolRow::new(i as i64 + 1, values);
                if self.is_int_pairs() {
                    if let (Some(a), Some(b)) = (row.values[0].as_int(), row.values[1].as_int()) {
                        row.coprime = gcd(a, b) == 1;
                        row.suits_for_deci1 = a % 10 != 0 || b % 10 != 0;
                        row.suits_for_deci2 = a % 10 != 0 && b % 10 != 0;
                        row.lock_class = Some(a * b);
                    }
                }
                row
            })
            .collect()
    }
}

fn decimal_composition_rows(dc: DecimalComposition) -> Vec<Vec<Value>> {
    let mut rows = Vec::new();
    match dc {
        DecimalComposition::TenPowersForMulti | DecimalComposition::TenPowersForDivi => {
            for places in 1..=2u32 {
                for units in (1..1000i64).filter(|u| u % 10 != 0) {
                    for power in [10, 100, 1000] {
                        let d = Value::Decimal(Decimal::new(units, places));
                        rows.push(match dc {
                            DecimalComposition::TenPowersForMulti => vec![d, Value::Int(power)],
                            _ => vec![Value::Int(power), d],
                        });
                    }
                }
            }
        }
        DecimalComposition::OneDigitForMulti | DecimalComposition::OneDigitForDivi => {
            for units in (2..100i64).filter(|u| u % 10 != 0) {
                for digit in 2..=9 {
                    let d = Value::Decimal(Decimal::new(units, 1));
                    rows.push(match dc {
                        DecimalComposition::OneDigitForMulti => vec![d, Value::Int(digit)],
                        _ => vec![Value::Int(digit), d],
                    });
                }
            }
        }
    }
    rows
}

// ---------------------------------------------------------------------------
// Families (mix compatibility)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFamily {
    IntPairs,
    SingleInt,
    SingleDecimal,
    RankWords,
    SimpleFractions,
    DecimalComposition,
    ProperFraction,
    MergedTriples,
    Quadruplet,
    Symbolic,
    Sentinel,
}

/// Families of a tag; an explicit `;;` list yields one family per part.
pub fn families_of(tag: &str) -> Result<Vec<SourceFamily>> {
    Ok(match SourceTag::classify(tag)? {
        SourceTag::ProperFraction { .. } => vec![SourceFamily::ProperFraction],
        SourceTag::MergedIntTriples(_) => vec![SourceFamily::MergedTriples],
        SourceTag::ExtProportionalityQuadruplet(_) => vec![SourceFamily::Quadruplet],
        SourceTag::Symbolic(_) => vec![SourceFamily::Symbolic],
        SourceTag::Explicit(parts) => {
            let mut families = Vec::new();
            for part in parts {
                families.extend(families_of(&part)?);
            }
            families
        }
        SourceTag::Atomic(kind) => vec![match kind {
            SourceKind::IntPairs(_) => SourceFamily::IntPairs,
            SourceKind::SingleInt { .. } => SourceFamily::SingleInt,
            SourceKind::SingleDecimal { .. } => SourceFamily::SingleDecimal,
            SourceKind::FixedEnumeration(Enumeration::RankWords) => SourceFamily::RankWords,
            SourceKind::FixedEnumeration(Enumeration::SimpleFractions) => SourceFamily::SimpleFractions,
            SourceKind::DecimalComposition(_) => SourceFamily::DecimalComposition,
            SourceKind::Sentinel => SourceFamily::Sentinel,
        }],
    })
}

// ---------------------------------------------------------------------------
// Resolver-level tags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceTag {
    /// Two int pairs, the second coprime to a number of the first.
    ProperFraction { pairs: String, ratio: Option<i64> },
    /// Two sources sharing one number; holds the concrete pair source.
    MergedIntTriples(String),
    /// Three int pairs, the last one bounded by a triangle inequality.
    ExtProportionalityQuadruplet(String),
    Explicit(Vec<String>),
    Symbolic(&'static catalogue::SourceMenu),
    Atomic(SourceKind),
}

impl SourceTag {
    pub fn classify(tag: &str) -> Result<SourceTag> {
        let unknown = || SheetError::UnknownSource(tag.to_string());

        if tag.contains(";;") {
            let parts: Vec<String> = tag
                .split(";;")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            if parts.is_empty() {
                return Err(unknown());
            }
            return Ok(SourceTag::Explicit(parts));
        }
        if let Some(menu) = catalogue::source_menu(tag) {
            return Ok(SourceTag::Symbolic(menu));
        }
        if let Some(rest) = tag.strip_prefix("properfraction_") {
            let (ratio, bounds) = match rest.split_once(['x', '×']) {
                Some((r, b)) => (Some(r.parse::<i64>().map_err(|_| unknown())?), b),
                None => (None, rest),
            };
            let pairs = format!("intpairs_{bounds}");
            SourceKind::classify(&pairs)?;
            return Ok(SourceTag::ProperFraction { pairs, ratio });
        }
        if let Some(rest) = tag.strip_prefix("mergedinttriples_") {
            let pairs = if rest.contains("to") {
                format!("intpairs_{rest}")
            } else {
                let n: i64 = rest.parse().map_err(|_| unknown())?;
                format!("multiplesof{n}_2to9")
            };
            SourceKind::classify(&pairs)?;
            return Ok(SourceTag::MergedIntTriples(pairs));
        }
        if let Some(rest) = tag.strip_prefix("ext_proportionality_quadruplet_") {
            let pairs = format!("intpairs_{rest}");
            SourceKind::classify(&pairs)?;
            return Ok(SourceTag::ExtProportionalityQuadruplet(pairs));
        }
        Ok(SourceTag::Atomic(SourceKind::classify(tag)?))
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Flags forwarded to the draw constraint of one source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawFlags {
    pub suits_for_deci1: bool,
    pub suits_for_deci2: bool,
    pub lock_equal_products: bool,
    pub rectangle: bool,
    pub square: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
    pub source_id: String,
    pub kind: SourceKind,
    pub flags: DrawFlags,
}

/// How the draws of one question relate to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtraInfos {
    pub merge_sources: bool,
    pub coprime: bool,
    pub triangle_inequality: bool,
    pub ratio: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub sources: Vec<SourceRequest>,
    pub extra: ExtraInfos,
}

/// Turn a question's declared sources into concrete draw requests.
pub fn resolve<R: Rng + ?Sized>(
    q: &NormalizedQuestion, tracker: &mut UnpackTracker, rng: &mut R,
) -> Result<Resolved> {
    let mut extra = ExtraInfos::default();
    let mut ids: Vec<String> = Vec::new();

    match q.nb_source.as_slice() {
        [] => return Err(SheetError::UnknownSource(String::new())),
        [single] => match SourceTag::classify(single)? {
            SourceTag::ProperFraction { pairs, ratio } => {
                extra.merge_sources = true;
                extra.coprime = true;
                extra.ratio = ratio;
                ids.extend([pairs.clone(), pairs]);
            }
            SourceTag::MergedIntTriples(pairs) => {
                extra.merge_sources = true;
                ids.extend([pairs.clone(), pairs]);
            }
            SourceTag::ExtProportionalityQuadruplet(pairs) => {
                extra.merge_sources = true;
                extra.triangle_inequality = true;
                ids.extend([pairs.clone(), pairs.clone(), pairs]);
            }
            SourceTag::Explicit(parts) => {
                for part in &parts {
                    ids.push(resolve_one(q, part, tracker, rng)?);
                }
            }
            SourceTag::Symbolic(menu) => ids.push(unpack_source(q, menu, tracker, rng)?),
            SourceTag::Atomic(_) => ids.push(single.clone()),
        },
        several => {
            for tag in several {
                ids.push(resolve_one(q, tag, tracker, rng)?);
            }
        }
    }

    let sources = ids
        .into_iter()
        .map(|source_id| {
            let kind = SourceKind::classify(&source_id)?;
            let flags = draw_flags(q, kind);
            Ok(SourceRequest { source_id, kind, flags })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Resolved { sources, extra })
}

/// A member of an explicit list must stand for exactly one pool.
fn resolve_one<R: Rng + ?Sized>(
    q: &NormalizedQuestion, tag: &str, tracker: &mut UnpackTracker, rng: &mut R,
) -> Result<String> {
    match SourceTag::classify(tag)? {
        SourceTag::Atomic(_) => Ok(tag.to_string()),
        SourceTag::Symbolic(menu) => unpack_source(q, menu, tracker, rng),
        _ => Err(SheetError::UnknownSource(tag.to_string())),
    }
}

fn unpack_source<R: Rng + ?Sized>(
    q: &NormalizedQuestion, menu: &catalogue::SourceMenu,
    tracker: &mut UnpackTracker, rng: &mut R,
) -> Result<String> {
    let key = match menu.key {
        UnpackKey::QuestionId => q.id.as_str(),
        UnpackKey::Subkind => q.subkind.as_str(),
    };
    let missing = || SheetError::MissingUnpackEntry {
        source_tag: menu.tag.to_string(),
        key: key.to_string(),
    };
    let members = menu.menu_for(key).ok_or_else(missing)?;
    let cycle = format!("{}:{key}", menu.tag);
    tracker.unpack(&cycle, members, rng).ok_or_else(missing)
}

fn draw_flags(q: &NormalizedQuestion, kind: SourceKind) -> DrawFlags {
    let mut flags = DrawFlags::default();
    if !kind.is_int_pairs() {
        return flags;
    }
    match q.option("nb_variant") {
        Some(v) if v.starts_with("decimal1") => flags.suits_for_deci1 = true,
        Some(v) if v.starts_with("decimal2") => flags.suits_for_deci2 = true,
        _ => {}
    }
    flags.lock_equal_products = q.id == "multi_reversed";
    if matches!(q.kind.as_str(), "area" | "perimeter") {
        flags.rectangle = q.subkind == "rectangle";
        flags.square = q.subkind == "square";
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet_engine::models::Attributes;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn question(kind: &str, subkind: &str, sources: &[&str]) -> NormalizedQuestion {
        NormalizedQuestion::new(
            kind, subkind,
            sources.iter().map(|s| s.to_string()).collect(),
            Attributes::new(), 0,
        )
    }

    fn ids(resolved: &Resolved) -> Vec<&str> {
        resolved.sources.iter().map(|s| s.source_id.as_str()).collect()
    }

    #[test]
    fn classifies_pool_families() {
        assert_eq!(
            SourceKind::classify("intpairs_2to9").unwrap(),
            SourceKind::IntPairs(PairSet::Span { min: 2, max: 9 })
        );
        assert_eq!(
            SourceKind::classify("table_7").unwrap(),
            SourceKind::IntPairs(PairSet::Multiples { factor: 7, min: 1, max: 10 })
        );
        assert_eq!(SourceKind::classify("bypass").unwrap(), SourceKind::Sentinel);
        assert!(SourceKind::classify("intpairs_9to2").is_err());
        assert!(SourceKind::classify("intpairs_2to900").is_err());
        assert!(SourceKind::classify("rainbow").is_err());
    }

    #[test]
    fn pair_rows_carry_flags() {
        let rows = SourceKind::classify("intpairs_2to9").unwrap().rows();
        assert_eq!(rows.len(), 36);
        let r = rows.iter().find(|r| r.values == vec![Value::Int(4), Value::Int(9)]).unwrap();
        assert!(r.coprime);
        assert_eq!(r.lock_class, Some(36));
        let deci_rows = SourceKind::classify("singledeci1_1to2").unwrap().rows();
        assert_eq!(deci_rows.len(), 9);
    }

    #[test]
    fn proper_fraction_expands_to_two_coprime_merged_draws() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut tracker = UnpackTracker::new();
        let q = question("fraction", "simplification", &["properfraction_3x2to9"]);
        let r = resolve(&q, &mut tracker, &mut rng).unwrap();
        assert_eq!(ids(&r), ["intpairs_2to9", "intpairs_2to9"]);
        assert!(r.extra.merge_sources && r.extra.coprime);
        assert_eq!(r.extra.ratio, Some(3));
    }

    #[test]
    fn merged_triples_and_quadruplets() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut tracker = UnpackTracker::new();
        let q = question("calculation", "order_of_operations", &["mergedinttriples_10"]);
        let r = resolve(&q, &mut tracker, &mut rng).unwrap();
        assert_eq!(ids(&r), ["multiplesof10_2to9", "multiplesof10_2to9"]);
        assert!(r.extra.merge_sources && !r.extra.coprime);

        let q = question("proportionality", "quadruplet", &["ext_proportionality_quadruplet_2to9"]);
        let r = resolve(&q, &mut tracker, &mut rng).unwrap();
        assert_eq!(r.sources.len(), 3);
        assert!(r.extra.triangle_inequality);
    }

    #[test]
    fn explicit_lists_do_not_merge() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut tracker = UnpackTracker::new();
        let q = question("addi", "direct", &["singleint_2to9;;table_3"]);
        let r = resolve(&q, &mut tracker, &mut rng).unwrap();
        assert_eq!(ids(&r), ["singleint_2to9", "table_3"]);
        assert!(!r.extra.merge_sources);
    }

    #[test]
    fn symbolic_sources_cycle_through_their_menu() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut tracker = UnpackTracker::new();
        let q = question("multi", "direct", &["auto_table"]);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..8 {
            let r = resolve(&q, &mut tracker, &mut rng).unwrap();
            seen.insert(r.sources[0].source_id.clone());
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn symbolic_source_without_entry_is_a_config_error() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut tracker = UnpackTracker::new();
        let q = question("area", "square", &["auto_table"]);
        let err = resolve(&q, &mut tracker, &mut rng).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn variant_and_shape_flags_are_attached_to_pair_sources() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut tracker = UnpackTracker::new();
        let mut q = question("multi", "reversed", &["intpairs_2to9"]);
        q.options.insert("nb_variant".into(), "decimal2".into());
        let r = resolve(&q, &mut tracker, &mut rng).unwrap();
        assert!(r.sources[0].flags.suits_for_deci2);
        assert!(r.sources[0].flags.lock_equal_products);

        let q = question("area", "rectangle", &["intpairs_2to9"]);
        assert!(resolve(&q, &mut tracker, &mut rng).unwrap().sources[0].flags.rectangle);

        let mut q = question("area", "square", &["singleint_2to9"]);
        q.options.insert("nb_variant".into(), "decimal1".into());
        assert_eq!(resolve(&q, &mut tracker, &mut rng).unwrap().sources[0].flags, DrawFlags::default());
    }

    #[test]
    fn families_follow_classification() {
        assert_eq!(families_of("rank_words").unwrap(), [SourceFamily::RankWords]);
        assert_eq!(families_of("auto_vocabulary").unwrap(), [SourceFamily::Symbolic]);
        assert_eq!(
            families_of("intpairs_2to9;;singleint_3to5").unwrap(),
            [SourceFamily::IntPairs, SourceFamily::SingleInt]
        );
    }
}
