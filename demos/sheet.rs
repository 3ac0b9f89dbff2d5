//! Generate a small mental-math sheet and print it.
//!
//! Run with: `cargo run --example sheet`
//!
//! The sheet has three exercises:
//!
//! 1. **Question lines**: tables, a symbolic `operation` subkind that cycles
//!    through multiplication, division, addition and subtraction, and a rank
//!    question drawn from the word list.
//! 2. **Mix section**: question variants paired with number sources, one of
//!    them required.
//! 3. **Composite sources**: a proper fraction to simplify and an order of
//!    operations calculation built from merged pairs.
//!
//! ## Key concepts demonstrated
//!
//! - `rng_seed: Some(u64)` makes the whole sheet reproducible.
//! - `MATHSHEET_CONFIG` may point to a TOML file selecting the pool backing
//!   (`memory` or `sqlite`); without it the in-memory pools are used.
//! - `LOG_LEVEL=debug` shows every draw, `LOG_FORMAT=json` switches the log
//!   output to JSON lines.

use mathsheet_gen::{
    generate_sheet_with, sheet_engine::telemetry::init_tracing, sheet_json::to_sheet_json,
    EngineConfig, ExerciseSpec, MixSection, NumberingPolicy, RenderMode, Sheet, SheetContext,
    SheetRequest,
};

const LINES: &str = "\
# tables first
multi direct -> table_{6|7|8} (3)
vocabulary operation -> auto_vocabulary (4)
rank direct -> rank_words (2)";

fn print_sheet(sheet: &Sheet, mode: RenderMode) {
    for (i, exercise) in sheet.exercises.iter().enumerate() {
        println!("  Exercise {}", i + 1);
        for q in &exercise.questions {
            println!("    {:>3}  {}", q.number, q.to_str(mode));
        }
        println!();
    }
}

fn main() {
    init_tracing();

    let config = match EngineConfig::load_from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        }
    };

    let mut mixed = config.exercise("");
    mixed.questions = None;
    mixed.numbering = NumberingPolicy::Alphabetic;
    mixed.mix = vec![MixSection {
        question: vec!["multi direct, pick=2".into(), "area rectangle".into()],
        nb: vec!["intpairs_2to9 (2)".into(), "intpairs_3to6, required=true".into()],
    }];

    let exercises: Vec<ExerciseSpec> = vec![
        config.exercise(LINES),
        mixed,
        config.exercise(
            "fraction simplification -> properfraction_3x2to9 (2)\n\
             calculation order_of_operations -> mergedinttriples_2to9 (2)",
        ),
    ];

    let request = SheetRequest { exercises, rng_seed: Some(2024) };
    let sheet = match SheetContext::from_config(&config)
        .and_then(|mut ctx| generate_sheet_with(request, &mut ctx))
    {
        Ok(sheet) => sheet,
        Err(err) => {
            eprintln!("could not generate the sheet: {err}");
            std::process::exit(1);
        }
    };

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Questions");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    print_sheet(&sheet, RenderMode::Exc);

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Answers");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    print_sheet(&sheet, RenderMode::Ans);

    match serde_json::to_string_pretty(&to_sheet_json(&sheet)) {
        Ok(doc) => println!("{doc}"),
        Err(err) => eprintln!("could not serialise the sheet: {err}"),
    }
}
