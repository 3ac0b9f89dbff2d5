//! Question-mix builder: unroll counts, unpack symbolic subkinds, order the
//! questions and optionally spread out runs of the same question id.

use std::collections::VecDeque;

use rand::Rng;
use tracing::debug;

use crate::sheet_engine::{
    catalogue,
    error::{Result, SheetError},
    models::{Attributes, NormalizedQuestion, Preset, QuestionRequest, ROUTING_KEYS},
    unpack::UnpackTracker,
};

/// Concrete subkind for `subkind`: drawn from the cycle for a symbolic one,
/// recorded as used in every menu listing it for a menu member.
pub fn unpack_subkind<R: Rng + ?Sized>(
    subkind: &str, tracker: &mut UnpackTracker, rng: &mut R,
) -> Result<String> {
    if let Some(menu) = catalogue::subkind_menu(subkind) {
        return tracker
            .unpack(subkind, menu, rng)
            .ok_or_else(|| SheetError::UnknownSubkind(subkind.to_string()));
    }
    if catalogue::is_unpackable_subkind(subkind) {
        for cycle in catalogue::menus_listing(subkind) {
            tracker.mark_used(cycle, subkind);
        }
        return Ok(subkind.to_string());
    }
    if catalogue::is_literal_subkind(subkind) {
        return Ok(subkind.to_string());
    }
    Err(SheetError::UnknownSubkind(subkind.to_string()))
}

fn options_of(attributes: &Attributes) -> Attributes {
    attributes
        .iter()
        .filter(|(k, _)| !ROUTING_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Turn parsed requests into the ordered list of questions of one exercise.
pub fn build_mix<R: Rng + ?Sized>(
    requests: &[QuestionRequest], shuffle: bool, preset: Preset,
    tracker: &mut UnpackTracker, rng: &mut R,
) -> Result<Vec<NormalizedQuestion>> {
    // Grouped by the requested (kind, subkind), first-seen order.
    let mut groups: Vec<((&str, &str), VecDeque<NormalizedQuestion>)> = Vec::new();
    let mut order = 0;

    for req in requests {
        let key = (req.kind.as_str(), req.subkind.as_str());
        let slot = match groups.iter().position(|(k, _)| *k == key) {
            Some(i) => i,
            None => {
                groups.push((key, VecDeque::new()));
                groups.len() - 1
            }
        };
        let options = options_of(&req.attributes);
        for _ in 0..req.count {
            let subkind = unpack_subkind(&req.subkind, tracker, rng)?;
            groups[slot].1.push_back(NormalizedQuestion::new(
                &req.kind, &subkind, req.sources.clone(), options.clone(), order,
            ));
            order += 1;
        }
    }

    let mut mix: Vec<NormalizedQuestion> = Vec::with_capacity(order);
    if shuffle {
        let mut live: Vec<VecDeque<NormalizedQuestion>> =
            groups.into_iter().map(|(_, g)| g).filter(|g| !g.is_empty()).collect();
        while !live.is_empty() {
            let i = rng.gen_range(0..live.len());
            if let Some(q) = live[i].pop_front() {
                mix.push(q);
            }
            if live[i].is_empty() {
                live.swap_remove(i);
            }
        }
    } else {
        mix.extend(groups.into_iter().flat_map(|(_, g)| g));
        mix.sort_by_key(|q| q.order);
    }

    if preset.alternates() {
        decluster(&mut mix, |q| q.id.clone());
    }
    debug!(questions = mix.len(), shuffle, %preset, "built question mix");
    Ok(mix)
}

/// One forward pass: when `i` and `i+1` share a key and `i+2` differs,
/// swap `i+1` and `i+2`. Leaves already alternating input untouched.
pub fn increase_alternation<T, K: PartialEq>(items: &mut [T], key: impl Fn(&T) -> K) {
    for i in 0..items.len().saturating_sub(2) {
        let (a, b, c) = (key(&items[i]), key(&items[i + 1]), key(&items[i + 2]));
        if a == b && b != c {
            items.swap(i + 1, i + 2);
        }
    }
}

/// Forward pass, then a pass over the reversed list. Best effort: runs
/// covering more than a third of the list survive.
pub fn decluster<T, K: PartialEq>(items: &mut [T], key: impl Fn(&T) -> K) {
    increase_alternation(items, &key);
    items.reverse();
    increase_alternation(items, &key);
    items.reverse();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn request(kind: &str, subkind: &str, count: usize) -> QuestionRequest {
        QuestionRequest {
            kind: kind.into(),
            subkind: subkind.into(),
            attributes: Attributes::from([
                ("nb_variant".to_string(), "decimal1".to_string()),
                ("pick".to_string(), "2".to_string()),
            ]),
            sources: vec!["intpairs_2to9".into()],
            count,
        }
    }

    #[test]
    fn counts_are_unrolled_and_routing_keys_dropped() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut tracker = UnpackTracker::new();
        let mix = build_mix(
            &[request("multi", "direct", 3), request("addi", "direct", 2)],
            false, Preset::Default, &mut tracker, &mut rng,
        )
        .unwrap();
        assert_eq!(mix.len(), 5);
        let orders: Vec<usize> = mix.iter().map(|q| q.order).collect();
        assert_eq!(orders, [0, 1, 2, 3, 4]);
        assert_eq!(mix[0].option("nb_variant"), Some("decimal1"));
        assert_eq!(mix[0].option("pick"), None);
    }

    #[test]
    fn shuffled_mix_keeps_per_group_fifo_order() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut tracker = UnpackTracker::new();
        let mix = build_mix(
            &[request("multi", "direct", 4), request("divi", "direct", 4)],
            true, Preset::Default, &mut tracker, &mut rng,
        )
        .unwrap();
        let multi: Vec<usize> = mix.iter().filter(|q| q.kind == "multi").map(|q| q.order).collect();
        assert_eq!(multi, [0, 1, 2, 3]);
        assert_eq!(mix.len(), 8);
    }

    #[test]
    fn symbolic_subkind_covers_its_menu_per_cycle() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut tracker = UnpackTracker::new();
        let mix = build_mix(
            &[request("vocabulary", "operation", 8)],
            false, Preset::Default, &mut tracker, &mut rng,
        )
        .unwrap();
        for cycle in mix.chunks(4) {
            let subkinds: HashSet<&str> = cycle.iter().map(|q| q.subkind.as_str()).collect();
            assert_eq!(subkinds.len(), 4);
        }
        assert_eq!(mix[0].id, format!("vocabulary_{}", mix[0].subkind));
    }

    #[test]
    fn concrete_members_are_marked_in_every_menu() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut tracker = UnpackTracker::new();
        assert_eq!(unpack_subkind("half", &mut tracker, &mut rng).unwrap(), "half");
        assert_eq!(tracker.used_in("simple_parts_of_a_number"), 1);
        assert_eq!(tracker.used_in("simple_parts_or_multiples_of_a_number"), 1);
        // The next two parts must be third and quarter.
        let a = unpack_subkind("simple_parts_of_a_number", &mut tracker, &mut rng).unwrap();
        let b = unpack_subkind("simple_parts_of_a_number", &mut tracker, &mut rng).unwrap();
        let mut rest = [a, b];
        rest.sort();
        assert_eq!(rest, ["quarter", "third"]);
    }

    #[test]
    fn unknown_subkind_is_fatal() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut tracker = UnpackTracker::new();
        let err = build_mix(&[request("multi", "sideways", 1)], true, Preset::Default, &mut tracker, &mut rng)
            .unwrap_err();
        assert!(matches!(err, SheetError::UnknownSubkind(_)));
    }

    #[test]
    fn alternation_leaves_alternating_input_alone() {
        let mut items = vec!["a", "b", "a", "c", "b", "a"];
        let before = items.clone();
        increase_alternation(&mut items, |s| *s);
        assert_eq!(items, before);
        decluster(&mut items, |s| *s);
        assert_eq!(items, before);
    }

    #[test]
    fn alternation_breaks_short_runs() {
        let mut items = vec!["a", "a", "b", "b", "c", "c"];
        decluster(&mut items, |s| *s);
        assert!(items.windows(2).all(|w| w[0] != w[1]), "{items:?}");
    }

    #[test]
    fn mental_calculation_preset_declusters() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut tracker = UnpackTracker::new();
        let mix = build_mix(
            &[request("multi", "direct", 2), request("addi", "direct", 2)],
            false, Preset::MentalCalculation, &mut tracker, &mut rng,
        )
        .unwrap();
        assert!(mix.windows(2).all(|w| w[0].id != w[1].id));
    }
}
