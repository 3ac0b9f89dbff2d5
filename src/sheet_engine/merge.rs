//! Combining the draws of a merge-source question into one tuple.

use crate::sheet_engine::{
    error::{Result, SheetError},
    number::Value,
};

fn show(values: &[Value]) -> String {
    let parts: Vec<String> = values.iter().map(Value::to_string).collect();
    format!("({})", parts.join(", "))
}

/// First element of `pairs.0`, left to right, also found in `pairs.1`.
pub fn common_nb_from_pairs_pair(pairs: (&[Value], &[Value])) -> Result<Value> {
    let (p1, p2) = pairs;
    p1.iter()
        .find(|v| p2.contains(v))
        .cloned()
        .ok_or_else(|| SheetError::Merge(format!("{} and {}: no common number", show(p1), show(p2))))
}

/// Append the element of `pair` other than `common` to `tuple`, moving
/// `common` to the front of `tuple` first when it sits second.
pub fn merge_pair_to_tuple(mut tuple: Vec<Value>, pair: &[Value], common: &Value) -> Result<Vec<Value>> {
    let other = match pair {
        [a, b] if a == common => b.clone(),
        [a, b] if b == common => a.clone(),
        [_, _] => {
            return Err(SheetError::Merge(format!("{} does not contain {common}", show(pair))));
        }
        _ => {
            return Err(SheetError::Merge(format!(
                "{} is not a pair",
                show(pair)
            )))
        }
    };
    if !tuple.contains(common) {
        return Err(SheetError::Merge(format!("{} does not contain {common}", show(&tuple))));
    }
    if tuple.len() >= 2 && &tuple[1] == common && &tuple[0] != common {
        tuple.swap(0, 1);
    }
    tuple.push(other);
    Ok(tuple)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(v: &[i64]) -> Vec<Value> {
        v.iter().copied().map(Value::Int).collect()
    }

    #[test]
    fn common_number_is_the_first_shared_element() {
        let p1 = ints(&[3, 7]);
        let p2 = ints(&[7, 3]);
        assert_eq!(common_nb_from_pairs_pair((p1.as_slice(), p2.as_slice())).unwrap(), Value::Int(3));
        let p3 = ints(&[2, 7]);
        assert_eq!(common_nb_from_pairs_pair((p1.as_slice(), p3.as_slice())).unwrap(), Value::Int(7));
        assert!(common_nb_from_pairs_pair((p1.as_slice(), ints(&[4, 5]).as_slice())).is_err());
    }

    #[test]
    fn merged_tuple_keeps_the_first_pair_and_adds_the_other_number() {
        for (p1, p2) in [([3, 7], [7, 9]), ([3, 7], [2, 3]), ([4, 4], [4, 6]), ([5, 8], [8, 8])] {
            let (p1, p2) = (ints(&p1), ints(&p2));
            let common = common_nb_from_pairs_pair((p1.as_slice(), p2.as_slice())).unwrap();
            assert!(p1.contains(&common) && p2.contains(&common));
            let merged = merge_pair_to_tuple(p1.clone(), &p2, &common).unwrap();
            assert_eq!(merged.len(), 3);
            assert_eq!(merged[0], common);
            assert!(p1.iter().all(|v| merged.contains(v)));
            let mut rest = p2.clone();
            let pos = rest.iter().position(|v| *v == common).unwrap();
            rest.remove(pos);
            assert_eq!(merged[2], rest[0]);
        }
    }

    #[test]
    fn arity_mismatch_is_a_config_error() {
        let err = merge_pair_to_tuple(ints(&[3, 7]), &ints(&[3, 7, 9]), &Value::Int(3)).unwrap_err();
        assert!(err.is_config_error());
        let err = merge_pair_to_tuple(ints(&[3, 7]), &ints(&[4, 5]), &Value::Int(3)).unwrap_err();
        assert!(err.is_config_error());
    }
}
