use std::collections::HashMap;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

use crate::sheet_engine::{
    builder::build_mix,
    config::EngineConfig,
    error::{Result, SheetError},
    merge::{common_nb_from_pairs_pair, merge_pair_to_tuple},
    mix::parse_mix,
    models::{Exercise, ExerciseSpec, NormalizedQuestion, Sheet, SheetRequest},
    number::Value,
    numbering::Numbering,
    parser::parse_questions,
    pool::{DrawConstraint, FieldBound, PoolRegistry, Shape},
    question::Question,
    sources::{resolve, ExtraInfos, SourceKind, SourceRequest},
    unpack::UnpackTracker,
};

/// Counters shared by the questions of the exercise being built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SharedCounters {
    pub question_nb: usize,
}

/// Everything that outlives one exercise: the pools and the unpack cycles.
pub struct SheetContext {
    pub registry: PoolRegistry,
    pub tracker: UnpackTracker,
    pub counters: SharedCounters,
}

impl SheetContext {
    pub fn new(registry: PoolRegistry) -> Self {
        SheetContext { registry, tracker: UnpackTracker::new(), counters: SharedCounters::default() }
    }

    pub fn in_memory() -> Self {
        Self::new(PoolRegistry::in_memory())
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Ok(Self::new(PoolRegistry::from_config(config)?))
    }
}

/// Build a whole sheet against in-memory pools.
pub fn generate_sheet(request: SheetRequest) -> Result<Sheet> {
    generate_sheet_with(request, &mut SheetContext::in_memory())
}

/// Build a whole sheet against the pools of `ctx`, one exercise after the
/// other with a single RNG.
pub fn generate_sheet_with(request: SheetRequest, ctx: &mut SheetContext) -> Result<Sheet> {
    let mut rng: StdRng = match request.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None       => StdRng::from_entropy(),
    };

    let exercises = request
        .exercises
        .iter()
        .map(|spec| generate_exercise(spec, ctx, &mut rng))
        .collect::<Result<Vec<_>>>()?;
    Ok(Sheet { exercises })
}

/// Parse, build, resolve, draw and instantiate the questions of one exercise.
///
/// The shared counters start from zero and are zeroed again on every exit,
/// failed exercises included.
pub fn generate_exercise<R: Rng>(
    spec: &ExerciseSpec, ctx: &mut SheetContext, rng: &mut R,
) -> Result<Exercise> {
    ctx.counters.question_nb = 0;
    let built = build_questions(spec, ctx, rng);
    ctx.counters.question_nb = 0;

    let questions = built?;
    info!(questions = questions.len(), preset = %spec.preset, "built exercise");
    Ok(Exercise { questions })
}

fn build_questions<R: Rng>(
    spec: &ExerciseSpec, ctx: &mut SheetContext, rng: &mut R,
) -> Result<Vec<Question>> {
    let mut requests = Vec::new();
    if let Some(text) = &spec.questions {
        requests.extend(parse_questions(text, rng)?);
    }
    for section in &spec.mix {
        requests.extend(parse_mix(section, rng)?);
    }
    if requests.is_empty() {
        return Err(SheetError::Config("exercise has neither questions nor a mix section".into()));
    }

    let mix = build_mix(&requests, spec.shuffle, spec.preset, &mut ctx.tracker, rng)?;

    // Per source id, the numbers of its latest draw in this exercise.
    let mut last_draw: HashMap<String, Vec<Value>> = HashMap::new();
    let mut numbering = Numbering::new(spec.numbering);
    let mut questions = Vec::with_capacity(mix.len());

    for mut q in mix {
        ctx.counters.question_nb += 1;
        let nbs = draw_numbers(&mut q, ctx, &mut last_draw, rng)?;
        let number = numbering.next().unwrap_or_default();
        debug!(id = %q.id, position = ctx.counters.question_nb, ?nbs, "instantiated question");
        questions.push(Question::new(q, nbs, number, ctx.counters.question_nb));
    }
    Ok(questions)
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

fn draw_numbers<R: Rng>(
    q: &mut NormalizedQuestion, ctx: &mut SheetContext,
    last_draw: &mut HashMap<String, Vec<Value>>, rng: &mut R,
) -> Result<Vec<Value>> {
    let resolved = resolve(q, &mut ctx.tracker, rng)?;
    let extra = resolved.extra;
    if let Some(ratio) = extra.ratio {
        q.options.insert("ratio".to_string(), ratio.to_string());
    }

    let mut nbs: Vec<Value> = Vec::new();
    let mut common: Option<Value> = None;

    for (i, src) in resolved.sources.iter().enumerate() {
        if src.kind == SourceKind::Sentinel {
            continue;
        }
        let mut constraint = constraint_for(q, src)?;
        if let Some(previous) = last_draw.get(&src.source_id) {
            constraint = constraint
                .avoid_recent(previous.iter().cloned())
                .prevail(src.kind.fixed_values());
        }
        if extra.merge_sources && i > 0 {
            constraint = continue_merge(constraint, i, &extra, &nbs, common.as_ref())?;
        }

        let drawn = ctx.registry.next(&src.source_id, &constraint, &mut *rng)?.into_values();
        last_draw.insert(src.source_id.clone(), drawn.clone());

        if !extra.merge_sources || i == 0 {
            nbs.extend(drawn);
        } else if i == 1 {
            let shared = match (extra.coprime, nbs.get(1)) {
                (true, Some(n)) => n.clone(),
                _ => common_nb_from_pairs_pair((nbs.as_slice(), drawn.as_slice()))?,
            };
            nbs = merge_pair_to_tuple(nbs, &drawn, &shared)?;
            common = Some(shared);
        } else if extra.triangle_inequality {
            let first = drawn
                .into_iter()
                .next()
                .ok_or_else(|| SheetError::Merge(format!("empty draw from {}", src.source_id)))?;
            nbs.push(first);
        } else {
            let shared = common
                .clone()
                .ok_or_else(|| SheetError::Merge("continuation without a common number".into()))?;
            nbs = merge_pair_to_tuple(nbs, &drawn, &shared)?;
        }
    }
    Ok(nbs)
}

fn int_at(nbs: &[Value], i: usize) -> Result<i64> {
    nbs.get(i)
        .and_then(Value::as_int)
        .ok_or_else(|| SheetError::Merge(format!("expected an integer at position {i} of {nbs:?}")))
}

/// Tie draw `i > 0` of a merge-source question to the numbers so far.
fn continue_merge(
    constraint: DrawConstraint, i: usize, extra: &ExtraInfos,
    nbs: &[Value], common: Option<&Value>,
) -> Result<DrawConstraint> {
    if i == 1 {
        if extra.coprime {
            let n = int_at(nbs, 1)?;
            let mut c = constraint.prevail([Value::Int(n)]);
            c.coprime_to = Some(n);
            return Ok(c);
        }
        return Ok(constraint.either("nb1", "nb2", nbs.to_vec()).prevail(nbs.iter().cloned()));
    }
    if extra.triangle_inequality {
        let (a, b) = (int_at(nbs, 0)?, int_at(nbs, 1)?);
        return Ok(constraint
            .shape(Shape::TriangleInequality { a, b, field: "nb1".into() })
            .prevail(nbs.iter().cloned()));
    }
    let common = common
        .cloned()
        .ok_or_else(|| SheetError::Merge("continuation without a common number".into()))?;
    Ok(constraint.either("nb1", "nb2", vec![common.clone()]).prevail([common]))
}

// ---------------------------------------------------------------------------
// Question options -> constraint
// ---------------------------------------------------------------------------

fn truthy(value: &str) -> bool {
    matches!(value, "true" | "yes" | "1")
}

/// `nb1`, `nb2`, ... but not `nb_variant`.
fn nb_field(key: &str) -> Option<&str> {
    let digits = key.strip_prefix("nb")?;
    (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some(key)
}

fn option_number(key: &str, value: &str) -> Result<Value> {
    Value::parse_number(value)
        .ok_or_else(|| SheetError::malformed(&format!("{key}={value}"), "option value is not a number"))
}

/// `AtoB|CtoD` as a union of ranges on `nb1`.
fn parse_ranges(value: &str) -> Result<Vec<Vec<FieldBound>>> {
    value
        .split('|')
        .map(|range| {
            let bad = || SheetError::malformed(range, "expected a range like `2to9`");
            let (lo, hi) = range.trim().split_once("to").ok_or_else(bad)?;
            let lo = Value::parse_number(lo).ok_or_else(bad)?;
            let hi = Value::parse_number(hi).ok_or_else(bad)?;
            Ok(vec![FieldBound::new("nb1", Some(lo), Some(hi))])
        })
        .collect()
}

/// Constraint from the source flags and the question options. Options only
/// apply to pools having the fields they name.
fn constraint_for(q: &NormalizedQuestion, src: &SourceRequest) -> Result<DrawConstraint> {
    let layout = src.kind.layout();
    let has = |field: &str| layout.index_of(field).is_some();
    let pairs = has("nb1") && has("nb2");

    let mut c = DrawConstraint {
        suits_for_deci1: src.flags.suits_for_deci1,
        suits_for_deci2: src.flags.suits_for_deci2,
        lock_equal_products: src.flags.lock_equal_products,
        ..DrawConstraint::default()
    };
    if src.flags.rectangle {
        c = c.shape(Shape::Rectangle);
    }
    if src.flags.square {
        c = c.shape(Shape::Square);
    }

    for (key, value) in &q.options {
        match key.as_str() {
            "rectangle" if pairs && truthy(value) => c = c.shape(Shape::Rectangle),
            "square" if pairs && truthy(value) => c = c.shape(Shape::Square),
            "diff7atleast" if pairs && truthy(value) => c = c.shape(Shape::Diff7AtLeast),
            "nb1_in_ranges" if has("nb1") => c.raw = parse_ranges(value)?,
            _ => {
                if let Some(field) = key.strip_suffix("_min").and_then(nb_field) {
                    if has(field) {
                        c = c.bound(field, Some(option_number(key, value)?), None);
                    }
                } else if let Some(field) = key.strip_suffix("_max").and_then(nb_field) {
                    if has(field) {
                        c = c.bound(field, None, Some(option_number(key, value)?));
                    }
                } else if let Some(field) = nb_field(key) {
                    if has(field) {
                        c = c.pin(field, option_number(key, value)?);
                    }
                }
            }
        }
    }
    Ok(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet_engine::models::{Attributes, Preset};
    use crate::sheet_engine::sources::DrawFlags;

    fn request(tag: &str) -> SourceRequest {
        SourceRequest {
            source_id: tag.to_string(),
            kind: SourceKind::classify(tag).unwrap(),
            flags: DrawFlags::default(),
        }
    }

    fn question(options: &[(&str, &str)]) -> NormalizedQuestion {
        let options: Attributes =
            options.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        NormalizedQuestion::new("multi", "direct", vec!["intpairs_2to9".into()], options, 0)
    }

    #[test]
    fn options_become_bounds_pins_and_shapes() {
        let q = question(&[
            ("nb1_min", "3"), ("nb2_max", "7"), ("nb2", "5"),
            ("diff7atleast", "false"), ("rectangle", "true"),
            ("nb_variant", "decimal1"), ("spacing", "15pt"),
        ]);
        let c = constraint_for(&q, &request("intpairs_2to9")).unwrap();
        assert_eq!(c.bounds.len(), 2);
        assert_eq!(c.pinned, vec![("nb2".to_string(), Value::Int(5))]);
        assert_eq!(c.shapes, vec![Shape::Rectangle]);
    }

    #[test]
    fn options_skip_fields_the_pool_lacks() {
        let q = question(&[("nb2_max", "7"), ("square", "true")]);
        let c = constraint_for(&q, &request("singleint_2to9")).unwrap();
        assert_eq!(c, DrawConstraint::default());
    }

    #[test]
    fn range_union_goes_to_raw() {
        let q = question(&[("nb1_in_ranges", "2to3|8to9")]);
        let c = constraint_for(&q, &request("intpairs_2to9")).unwrap();
        assert_eq!(c.raw.len(), 2);
        let q = question(&[("nb1_in_ranges", "2-3")]);
        assert!(constraint_for(&q, &request("intpairs_2to9")).unwrap_err().is_config_error());
        let q = question(&[("nb1_min", "three")]);
        assert!(constraint_for(&q, &request("intpairs_2to9")).is_err());
    }

    #[test]
    fn counters_reset_after_each_exercise() {
        let mut ctx = SheetContext::in_memory();
        let mut rng = StdRng::seed_from_u64(3);
        let spec = ExerciseSpec::from_questions("addi direct -> intpairs_2to9 (3)");
        let ex = generate_exercise(&spec, &mut ctx, &mut rng).unwrap();
        let positions: Vec<usize> = ex.questions.iter().map(|q| q.position).collect();
        assert_eq!(positions, [1, 2, 3]);
        assert_eq!(ctx.counters.question_nb, 0);
    }

    #[test]
    fn counters_restart_after_a_failed_exercise() {
        let mut ctx = SheetContext::in_memory();
        let mut rng = StdRng::seed_from_u64(3);
        let mut failing = ExerciseSpec::from_questions(
            "addi direct -> intpairs_2to9 (2)\nmulti direct, nb1_min=40 -> intpairs_2to9 (1)",
        );
        failing.shuffle = false;
        let err = generate_exercise(&failing, &mut ctx, &mut rng).unwrap_err();
        assert!(matches!(err, SheetError::Infeasible { .. }));
        assert_eq!(ctx.counters.question_nb, 0);

        let spec = ExerciseSpec::from_questions("subtr direct -> intpairs_10to99 (2)");
        let ex = generate_exercise(&spec, &mut ctx, &mut rng).unwrap();
        let positions: Vec<usize> = ex.questions.iter().map(|q| q.position).collect();
        assert_eq!(positions, [1, 2]);
    }

    #[test]
    fn last_draw_is_only_avoided_while_other_rows_fit() {
        for seed in 0..20 {
            let mut ctx = SheetContext::in_memory();
            let mut rng = StdRng::seed_from_u64(seed);
            let spec = ExerciseSpec::from_questions("multi direct -> intpairs_2to3 (2)");
            let ex = generate_exercise(&spec, &mut ctx, &mut rng)
                .unwrap_or_else(|e| panic!("seed {seed}: {e}"));
            assert_eq!(ex.questions.len(), 2);
            assert_ne!(ex.questions[0].nbs, ex.questions[1].nbs, "seed {seed}");
        }
    }

    #[test]
    fn proper_fraction_draws_are_coprime_and_merged() {
        let mut ctx = SheetContext::in_memory();
        let mut rng = StdRng::seed_from_u64(8);
        let spec = ExerciseSpec::from_questions("fraction simplification -> properfraction_3x2to9 (4)");
        let ex = generate_exercise(&spec, &mut ctx, &mut rng).unwrap();
        for q in &ex.questions {
            assert_eq!(q.nbs.len(), 3);
            let (d, x) = (q.nbs[0].as_int().unwrap(), q.nbs[2].as_int().unwrap());
            assert_eq!(crate::sheet_engine::number::gcd(d, x), 1);
            assert_eq!(q.options.get("ratio").map(String::as_str), Some("3"));
        }
    }

    #[test]
    fn merged_triples_share_their_first_number() {
        let mut ctx = SheetContext::in_memory();
        let mut rng = StdRng::seed_from_u64(4);
        let spec = ExerciseSpec::from_questions(
            "calculation order_of_operations -> mergedinttriples_2to9 (6)",
        );
        let ex = generate_exercise(&spec, &mut ctx, &mut rng).unwrap();
        assert!(ex.questions.iter().all(|q| q.nbs.len() == 3));
    }

    #[test]
    fn quadruplets_respect_the_triangle_inequality() {
        let mut ctx = SheetContext::in_memory();
        let mut rng = StdRng::seed_from_u64(10);
        let spec = ExerciseSpec::from_questions(
            "proportionality quadruplet -> ext_proportionality_quadruplet_2to9 (3)",
        );
        let ex = generate_exercise(&spec, &mut ctx, &mut rng).unwrap();
        for q in &ex.questions {
            assert_eq!(q.nbs.len(), 4);
            let v: Vec<i64> = q.nbs.iter().map(|n| n.as_int().unwrap()).collect();
            assert!((v[0] - v[1]).abs() < v[3] && v[3] < v[0] + v[1]);
        }
    }

    #[test]
    fn sentinel_sources_yield_no_numbers() {
        let mut ctx = SheetContext::in_memory();
        let mut rng = StdRng::seed_from_u64(1);
        let mut spec = ExerciseSpec::from_questions("rank direct -> nothing (2)");
        spec.preset = Preset::Tabular;
        let ex = generate_exercise(&spec, &mut ctx, &mut rng).unwrap();
        assert!(ex.questions.iter().all(|q| q.nbs.is_empty()));
    }

    #[test]
    fn overlong_decimal_bound_is_a_config_error() {
        let mut ctx = SheetContext::in_memory();
        let mut rng = StdRng::seed_from_u64(1);
        let line = format!("multi direct, nb1_min=0.{}1 -> intpairs_2to9 (1)", "0".repeat(38));
        let err = generate_exercise(&ExerciseSpec::from_questions(&line), &mut ctx, &mut rng)
            .unwrap_err();
        assert!(err.is_config_error(), "{err}");
    }

    #[test]
    fn empty_exercise_is_a_config_error() {
        let mut ctx = SheetContext::in_memory();
        let mut rng = StdRng::seed_from_u64(1);
        let spec = ExerciseSpec { questions: None, ..ExerciseSpec::from_questions("") };
        assert!(matches!(
            generate_exercise(&spec, &mut ctx, &mut rng),
            Err(SheetError::Config(_))
        ));
    }
}
