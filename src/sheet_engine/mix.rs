//! Mix sections: random pairing of question variants with number sources.
//!
//! ```toml
//! [[mix]]
//! question = ["multi direct, pick=3", "area rectangle"]
//! nb = ["intpairs_2to9 (2)", "table_7, required=true", "intpairs_3to6 (2)"]
//! ```
//!
//! Every question id is checked against every source before pairing, so an
//! authoring mistake fails regardless of how the shuffle would have paired.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::sheet_engine::{
    catalogue,
    error::{Result, SheetError},
    models::{Attributes, MixSection, QuestionRequest},
    parser::{parse_attributes, parse_head, split_count, Head},
    sources::families_of,
};

struct MixSource {
    tag: String,
    attributes: Attributes,
    required: bool,
}

fn parse_mix_source(entry: &str) -> Result<(MixSource, usize)> {
    let (body, count) = split_count(entry, entry)?;
    let mut fragments = body.split(',');
    let tag = fragments.next().unwrap_or("").trim();
    if tag.is_empty() {
        return Err(SheetError::malformed(entry, "missing number source"));
    }
    let mut attributes = parse_attributes(fragments);
    let required = attributes.remove("required").is_some_and(|v| v == "true");
    Ok((MixSource { tag: tag.to_string(), attributes, required }, count))
}

fn parse_pick(head: &Head, entry: &str) -> Result<usize> {
    match head.attributes.get("pick") {
        None => Ok(1),
        Some(v) => match v.parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(SheetError::malformed(entry, format!("pick `{v}` is not a positive number"))),
        },
    }
}

/// `question_id` must accept every family `tag` belongs to.
pub fn check_compatibility(question_id: &str, tag: &str) -> Result<()> {
    let accepted = catalogue::compatible_families(question_id)
        .ok_or_else(|| SheetError::UnknownMixQuestion(question_id.to_string()))?;
    if families_of(tag)?.iter().all(|f| accepted.contains(f)) {
        Ok(())
    } else {
        Err(SheetError::IncompatiblePair {
            question: question_id.to_string(),
            source_tag: tag.to_string(),
        })
    }
}

/// Pair the section's questions with its sources. Each output request has
/// count 1 and carries the question attributes merged with the source's.
pub fn parse_mix<R: Rng + ?Sized>(section: &MixSection, rng: &mut R) -> Result<Vec<QuestionRequest>> {
    let mut questions: Vec<Head> = Vec::new();
    for entry in &section.question {
        let head = parse_head(entry, entry)?;
        let pick = parse_pick(&head, entry)?;
        questions.extend(std::iter::repeat(head).take(pick));
    }

    let mut required: Vec<MixSource> = Vec::new();
    let mut optional: Vec<MixSource> = Vec::new();
    for entry in &section.nb {
        let (source, count) = parse_mix_source(entry)?;
        for _ in 0..count {
            let copy = MixSource {
                tag: source.tag.clone(),
                attributes: source.attributes.clone(),
                required: source.required,
            };
            if copy.required {
                required.push(copy);
            } else {
                optional.push(copy);
            }
        }
    }

    for head in &questions {
        let id = format!("{}_{}", head.kind, head.subkind);
        for source in required.iter().chain(&optional) {
            check_compatibility(&id, &source.tag)?;
        }
    }

    let available = required.len() + optional.len();
    if available < questions.len() {
        return Err(SheetError::MixTooFewSources { questions: questions.len(), sources: available });
    }

    questions.shuffle(rng);
    required.shuffle(rng);
    optional.shuffle(rng);

    let mut paired: Vec<QuestionRequest> = questions
        .into_iter()
        .zip(required.into_iter().chain(optional))
        .map(|(head, source)| {
            let mut attributes = head.attributes;
            attributes.extend(source.attributes);
            QuestionRequest {
                kind: head.kind,
                subkind: head.subkind,
                attributes,
                sources: vec![source.tag],
                count: 1,
            }
        })
        .collect();
    paired.shuffle(rng);
    Ok(paired)
}
