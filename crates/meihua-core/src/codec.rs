//! Integer to trigram/hexagram code arithmetic.
//!
//! Codes are strings of `'0'`/`'1'`. A hexagram code is the lower trigram's
//! three characters followed by the upper trigram's; line `k` is the
//! character at index `k - 1`.

use serde::{Deserialize, Serialize};

use crate::error::{DivinationError, DivinationResult};

/// Divisor used to pick a trigram from an input number.
pub const TRIGRAM_DIVISOR: u64 = 8;
/// Divisor used to pick the changing line from an input number.
pub const LINE_DIVISOR: u64 = 6;

/// Length of a hexagram code.
pub const CODE_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigram {
    Qian,
    Dui,
    Li,
    Zhen,
    Xun,
    Kan,
    Gen,
    Kun,
}

impl Trigram {
    /// All trigrams in selector order (selector 1 first).
    pub const ALL: [Trigram; 8] = [
        Trigram::Qian,
        Trigram::Dui,
        Trigram::Li,
        Trigram::Zhen,
        Trigram::Xun,
        Trigram::Kan,
        Trigram::Gen,
        Trigram::Kun,
    ];

    pub fn from_selector(selector: u64) -> DivinationResult<Self> {
        match selector {
            1..=8 => Ok(Self::ALL[(selector - 1) as usize]),
            other => Err(DivinationError::InvalidSelector(other)),
        }
    }

    pub fn selector(self) -> u8 {
        self as u8 + 1
    }

    pub fn bits(self) -> &'static str {
        match self {
            Trigram::Qian => "111",
            Trigram::Dui => "011",
            Trigram::Li => "101",
            Trigram::Zhen => "001",
            Trigram::Xun => "110",
            Trigram::Kan => "010",
            Trigram::Gen => "100",
            Trigram::Kun => "000",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Trigram::Qian => "Qian",
            Trigram::Dui => "Dui",
            Trigram::Li => "Li",
            Trigram::Zhen => "Zhen",
            Trigram::Xun => "Xun",
            Trigram::Kan => "Kan",
            Trigram::Gen => "Gen",
            Trigram::Kun => "Kun",
        }
    }

    pub fn chinese_name(self) -> &'static str {
        match self {
            Trigram::Qian => "乾",
            Trigram::Dui => "兑",
            Trigram::Li => "离",
            Trigram::Zhen => "震",
            Trigram::Xun => "巽",
            Trigram::Kan => "坎",
            Trigram::Gen => "艮",
            Trigram::Kun => "坤",
        }
    }
}

/// `n mod divisor`, except a zero remainder becomes `divisor`.
///
/// The result is always in `1..=divisor`. Panics if `divisor` is zero.
pub fn remainder_or_max(n: u64, divisor: u64) -> u64 {
    match n % divisor {
        0 => divisor,
        r => r,
    }
}

/// The three-character code of trigram `selector` (1..=8).
pub fn trigram_bits(selector: u64) -> DivinationResult<&'static str> {
    Trigram::from_selector(selector).map(Trigram::bits)
}

/// Lower trigram first, upper trigram last.
pub fn compose_primary_code(lower_selector: u64, upper_selector: u64) -> DivinationResult<String> {
    let lower = trigram_bits(lower_selector)?;
    let upper = trigram_bits(upper_selector)?;
    Ok(format!("{lower}{upper}"))
}

/// Copy of `code` with line `line_position` (1..=6) inverted.
pub fn flip_line(code: &str, line_position: u64) -> DivinationResult<String> {
    if !is_hexagram_code(code) {
        return Err(DivinationError::MalformedCode(code.to_string()));
    }
    if !(1..=CODE_LEN as u64).contains(&line_position) {
        return Err(DivinationError::InvalidLinePosition(line_position));
    }
    let index = (line_position - 1) as usize;
    Ok(code
        .chars()
        .enumerate()
        .map(|(i, c)| match (i == index, c) {
            (true, '1') => '0',
            (true, _) => '1',
            (false, c) => c,
        })
        .collect())
}

/// True for exactly six `'0'`/`'1'` characters.
pub fn is_hexagram_code(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| b == b'0' || b == b'1')
}

/// Every 6-bit code, `000000` through `111111`.
pub fn all_codes() -> impl Iterator<Item = String> {
    (0u8..64).map(|v| format!("{v:06b}"))
}
