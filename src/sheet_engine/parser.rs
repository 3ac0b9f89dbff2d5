//! Question spec mini-language.
//!
//! ```text
//! multi direct -> intpairs_2to9 (5)
//! vocabulary {half|double}, nb_variant=decimal1 -> auto_vocabulary (2)
//! -> table_3 (1)
//! [2][
//! addi direct -> intpairs_10to99 (3)
//! subtr direct -> intpairs_10to99 (3)
//! ]
//! ```
//!
//! - `kind subkind[, attr=val]* -> source[;;source]* (count)`, the count
//!   defaulting to 1. Several `-> source (count)` segments may follow one
//!   head; a line starting with `->` reuses the previous head.
//! - `{a|b|c}` picks one alternative, independently per occurrence.
//! - `[N][ ... ]` keeps N of the block's requests, each with count 1.

use std::sync::OnceLock;

use rand::seq::SliceRandom;
use rand::Rng;
use regex::{Captures, Regex};
use tracing::warn;

use crate::sheet_engine::{
    error::{Result, SheetError},
    models::{Attributes, QuestionRequest},
};

fn alternation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]*)\}").expect("alternation pattern is valid"))
}

fn block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\[\s*(\d+)\s*\]\s*\[(.*?)\]").expect("block pattern is valid"))
}

/// `kind subkind` plus attributes, shared by continuation lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Head {
    pub kind: String,
    pub subkind: String,
    pub attributes: Attributes,
}

/// Parse `kind subkind[, attr=val]*`.
pub(crate) fn parse_head(text: &str, line: &str) -> Result<Head> {
    let mut fragments = text.split(',');
    let ident = fragments.next().unwrap_or("").trim();
    let mut words = ident.split_whitespace();
    let kind = words
        .next()
        .ok_or_else(|| SheetError::malformed(line, "missing question identifier"))?;
    let subkind = words
        .next()
        .ok_or_else(|| SheetError::malformed(line, format!("identifier `{kind}` has no subkind")))?;
    if words.next().is_some() {
        return Err(SheetError::malformed(line, format!("identifier `{ident}` has extra words")));
    }
    Ok(Head {
        kind: kind.to_string(),
        subkind: subkind.to_string(),
        attributes: parse_attributes(fragments),
    })
}

/// `attr=val` fragments; a fragment without `=` is logged and dropped.
pub(crate) fn parse_attributes<'a>(fragments: impl Iterator<Item = &'a str>) -> Attributes {
    let mut attributes = Attributes::new();
    for fragment in fragments.map(str::trim).filter(|f| !f.is_empty()) {
        match fragment.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                attributes.insert(key.trim().to_string(), value.trim().to_string());
            }
            _ => warn!(fragment, "ignoring attribute without `=`"),
        }
    }
    attributes
}

/// Split a trailing `(count)` off `seg`. No parentheses means count 1.
pub(crate) fn split_count<'a>(seg: &'a str, line: &str) -> Result<(&'a str, usize)> {
    let seg = seg.trim();
    let opening = seg.matches('(').count();
    let closing = seg.matches(')').count();
    if opening != closing {
        return Err(SheetError::malformed(line, "unbalanced parentheses"));
    }
    if opening == 0 {
        return Ok((seg, 1));
    }
    let start = seg.rfind('(').unwrap_or(0);
    if opening > 1 || !seg.ends_with(')') {
        return Err(SheetError::malformed(line, "count must be a single trailing `(n)`"));
    }
    let inner = seg[start + 1..seg.len() - 1].trim();
    let count: usize = inner
        .parse()
        .map_err(|_| SheetError::malformed(line, format!("count `{inner}` is not a number")))?;
    if count == 0 {
        return Err(SheetError::malformed(line, "count must be at least 1"));
    }
    Ok((seg[..start].trim(), count))
}

/// Replace every `{a|b|c}` with one of its alternatives.
pub fn resolve_alternations<R: Rng + ?Sized>(line: &str, rng: &mut R) -> String {
    alternation_re()
        .replace_all(line, |caps: &Captures| {
            let choices: Vec<&str> = caps[1].split('|').collect();
            choices.choose(&mut *rng).map_or("", |c| c.trim()).to_string()
        })
        .into_owned()
}

fn parse_line(line: &str, previous: &mut Option<Head>) -> Result<Vec<QuestionRequest>> {
    let mut segments = line.split("->");
    let head_text = segments.next().unwrap_or("").trim();

    let head = if head_text.is_empty() {
        previous
            .clone()
            .ok_or_else(|| SheetError::malformed(line, "continuation line without a previous question"))?
    } else {
        parse_head(head_text, line)?
    };

    let mut requests = Vec::new();
    for segment in segments {
        let (source, count) = split_count(segment, line)?;
        if source.is_empty() {
            return Err(SheetError::malformed(line, "missing number source"));
        }
        requests.push(QuestionRequest {
            kind: head.kind.clone(),
            subkind: head.subkind.clone(),
            attributes: head.attributes.clone(),
            sources: vec![source.to_string()],
            count,
        });
    }
    if requests.is_empty() {
        return Err(SheetError::malformed(line, "missing `-> source`"));
    }
    *previous = Some(head);
    Ok(requests)
}

fn parse_lines<R: Rng + ?Sized>(
    text: &str, previous: &mut Option<Head>, rng: &mut R,
) -> Result<Vec<QuestionRequest>> {
    let mut requests = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = resolve_alternations(line, rng);
        requests.extend(parse_line(&line, previous)?);
    }
    Ok(requests)
}

/// Keep exactly `size` of the block's requests, after flattening each
/// request's count into that many count-1 requests.
pub fn dissolve_block<R: Rng + ?Sized>(
    size: &str, body: &str, rng: &mut R,
) -> Result<Vec<QuestionRequest>> {
    let requested: usize = size
        .trim()
        .parse()
        .map_err(|_| SheetError::malformed(size, "block size is not a number"))?;

    let mut previous = None;
    let flattened: Vec<QuestionRequest> = parse_lines(body, &mut previous, rng)?
        .into_iter()
        .flat_map(|r| {
            let count = r.count;
            std::iter::repeat(QuestionRequest { count: 1, ..r }).take(count)
        })
        .collect();

    if requested > flattened.len() {
        return Err(SheetError::BlockTooSmall { requested, available: flattened.len() });
    }
    Ok(rand::seq::index::sample(rng, flattened.len(), requested)
        .into_iter()
        .map(|i| flattened[i].clone())
        .collect())
}

/// Parse a whole `questions` text into requests, blocks dissolved in place.
pub fn parse_questions<R: Rng + ?Sized>(text: &str, rng: &mut R) -> Result<Vec<QuestionRequest>> {
    let mut requests = Vec::new();
    let mut previous = None;
    let mut rest = 0;

    for caps in block_re().captures_iter(text) {
        let (Some(whole), Some(size), Some(body)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        requests.extend(parse_lines(&text[rest..whole.start()], &mut previous, rng)?);
        requests.extend(dissolve_block(size.as_str(), body.as_str(), rng)?);
        rest = whole.end();
    }
    requests.extend(parse_lines(&text[rest..], &mut previous, rng)?);
    Ok(requests)
}
