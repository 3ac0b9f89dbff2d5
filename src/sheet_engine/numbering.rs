use crate::sheet_engine::models::NumberingPolicy;

/// Endless label generator for the questions of one exercise.
///
/// Alphabetic labels wrap by repeating the letter: `z` is followed by `aa`,
/// `bb`, ... `zz`, then `aaa`.
#[derive(Debug, Clone)]
pub struct Numbering {
    policy: NumberingPolicy,
    index: usize,
}

impl Numbering {
    pub fn new(policy: NumberingPolicy) -> Self {
        Numbering { policy, index: 0 }
    }
}

impl Iterator for Numbering {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let i = self.index;
        self.index += 1;
        Some(match self.policy {
            NumberingPolicy::Disabled => String::new(),
            NumberingPolicy::Numeric => (i + 1).to_string(),
            NumberingPolicy::Alphabetic => {
                let letter = char::from(b'a' + (i % 26) as u8);
                letter.to_string().repeat(i / 26 + 1)
            }
        })
    }
}
