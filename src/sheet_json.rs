use serde_json::{json, Value};

use crate::sheet_engine::{
    models::{Exercise, Sheet},
    question::{Question, RenderMode},
};

/// One question as the external renderer expects it: label, id and the
/// three rendered texts.
fn question_json(q: &Question) -> Value {
    json!({
        "number": q.number,
        "id":     q.id,
        "exc":    q.to_str(RenderMode::Exc),
        "ans":    q.to_str(RenderMode::Ans),
        "hint":   q.to_str(RenderMode::Hint),
    })
}

fn exercise_json(ex: &Exercise) -> Value {
    json!({ "questions": ex.questions.iter().map(question_json).collect::<Vec<_>>() })
}

/// Convert a generated `Sheet` into the renderer's JSON document:
/// `{"exercises": [{"questions": [{number, id, exc, ans, hint}]}]}`.
pub fn to_sheet_json(sheet: &Sheet) -> Value {
    json!({ "exercises": sheet.exercises.iter().map(exercise_json).collect::<Vec<_>>() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet_engine::{generate_sheet, ExerciseSpec, SheetRequest};

    #[test]
    fn document_mirrors_the_sheet() {
        let mut request = SheetRequest::new(vec![
            ExerciseSpec::from_questions("multi direct -> table_6 (2)"),
            ExerciseSpec::from_questions("rank direct -> rank_words (1)"),
        ]);
        request.rng_seed = Some(17);
        let sheet = generate_sheet(request).unwrap();
        let doc = to_sheet_json(&sheet);

        let exercises = doc["exercises"].as_array().unwrap();
        assert_eq!(exercises.len(), 2);
        let first = exercises[0]["questions"].as_array().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0]["number"], "1");
        assert_eq!(first[0]["id"], "multi_direct");
        assert!(first[0]["exc"].as_str().unwrap().starts_with("$6 \\times"));
        assert!(exercises[1]["questions"][0]["ans"].as_str().unwrap().starts_with("1 "));
    }
}
