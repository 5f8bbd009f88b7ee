//! Built-in skeleton of the standard reference table.
//!
//! Names and ordinals only; descriptive prompts and classical texts are
//! curated through the admin console and are not shipped here.

use crate::codec::{self, Trigram};
use crate::error::KnowledgeBaseError;
use crate::knowledge::KnowledgeBase;
use crate::{Hexagram, Line, ALL_CHANGING_LINE};

/// King Wen ordinal, indexed `[upper selector - 1][lower selector - 1]`.
const KING_WEN: [[u8; 8]; 8] = [
    // upper Qian
    [1, 10, 13, 25, 44, 6, 33, 12],
    // upper Dui
    [43, 58, 49, 17, 28, 47, 31, 45],
    // upper Li
    [14, 38, 30, 21, 50, 64, 56, 35],
    // upper Zhen
    [34, 54, 55, 51, 32, 40, 62, 16],
    // upper Xun
    [9, 61, 37, 42, 57, 59, 53, 20],
    // upper Kan
    [5, 60, 63, 3, 48, 29, 39, 8],
    // upper Gen
    [26, 41, 22, 27, 18, 4, 52, 23],
    // upper Kun
    [11, 19, 36, 24, 46, 7, 15, 2],
];

/// (name, gloss) by ordinal - 1.
const NAMES: [(&str, &str); 64] = [
    ("乾", "Qian: The Creative"),
    ("坤", "Kun: The Receptive"),
    ("屯", "Zhun: Difficulty at the Beginning"),
    ("蒙", "Meng: Youthful Folly"),
    ("需", "Xu: Waiting"),
    ("讼", "Song: Conflict"),
    ("师", "Shi: The Army"),
    ("比", "Bi: Holding Together"),
    ("小畜", "Xiao Xu: Small Taming"),
    ("履", "Lü: Treading"),
    ("泰", "Tai: Peace"),
    ("否", "Pi: Standstill"),
    ("同人", "Tong Ren: Fellowship"),
    ("大有", "Da You: Great Possession"),
    ("谦", "Qian: Modesty"),
    ("豫", "Yu: Enthusiasm"),
    ("随", "Sui: Following"),
    ("蛊", "Gu: Work on the Decayed"),
    ("临", "Lin: Approach"),
    ("观", "Guan: Contemplation"),
    ("噬嗑", "Shi He: Biting Through"),
    ("贲", "Bi: Grace"),
    ("剥", "Bo: Splitting Apart"),
    ("复", "Fu: Return"),
    ("无妄", "Wu Wang: Innocence"),
    ("大畜", "Da Xu: Great Taming"),
    ("颐", "Yi: Nourishment"),
    ("大过", "Da Guo: Great Exceeding"),
    ("坎", "Kan: The Abysmal"),
    ("离", "Li: The Clinging"),
    ("咸", "Xian: Influence"),
    ("恒", "Heng: Duration"),
    ("遁", "Dun: Retreat"),
    ("大壮", "Da Zhuang: Great Power"),
    ("晋", "Jin: Progress"),
    ("明夷", "Ming Yi: Darkening of the Light"),
    ("家人", "Jia Ren: The Family"),
    ("睽", "Kui: Opposition"),
    ("蹇", "Jian: Obstruction"),
    ("解", "Xie: Deliverance"),
    ("损", "Sun: Decrease"),
    ("益", "Yi: Increase"),
    ("夬", "Guai: Breakthrough"),
    ("姤", "Gou: Coming to Meet"),
    ("萃", "Cui: Gathering Together"),
    ("升", "Sheng: Pushing Upward"),
    ("困", "Kun: Oppression"),
    ("井", "Jing: The Well"),
    ("革", "Ge: Revolution"),
    ("鼎", "Ding: The Cauldron"),
    ("震", "Zhen: The Arousing"),
    ("艮", "Gen: Keeping Still"),
    ("渐", "Jian: Development"),
    ("归妹", "Gui Mei: The Marrying Maiden"),
    ("丰", "Feng: Abundance"),
    ("旅", "Lü: The Wanderer"),
    ("巽", "Xun: The Gentle"),
    ("兑", "Dui: The Joyous"),
    ("涣", "Huan: Dispersion"),
    ("节", "Jie: Limitation"),
    ("中孚", "Zhong Fu: Inner Truth"),
    ("小过", "Xiao Guo: Small Exceeding"),
    ("既济", "Ji Ji: After Completion"),
    ("未济", "Wei Ji: Before Completion"),
];

/// All 64 hexagrams in ordinal order, coded lower trigram first.
pub fn seed_hexagrams() -> Vec<Hexagram> {
    let mut hexagrams: Vec<Hexagram> = Trigram::ALL
        .iter()
        .flat_map(|upper| Trigram::ALL.iter().map(move |lower| (*lower, *upper)))
        .map(|(lower, upper)| {
            let position = KING_WEN[upper.selector() as usize - 1][lower.selector() as usize - 1];
            let (name, gloss) = NAMES[position as usize - 1];
            Hexagram {
                id: format!("gua-{position}"),
                name: name.to_string(),
                prompt: gloss.to_string(),
                position,
                binary_code: format!("{}{}", lower.bits(), upper.bits()),
                classical_text: None,
            }
        })
        .collect();
    hexagrams.sort_by_key(|h| h.position);
    hexagrams
}

/// Six lines per hexagram named from their yin/yang value, plus 用九/用六 on
/// the two uniform hexagrams.
pub fn seed_lines(hexagrams: &[Hexagram]) -> Vec<Line> {
    let mut lines = Vec::with_capacity(hexagrams.len() * 6 + 2);
    for h in hexagrams {
        for position in 1..=codec::CODE_LEN as u8 {
            lines.push(Line {
                id: format!("yao-{}-{}", h.position, position),
                hexagram_position: h.position,
                position,
                name: line_name(position, line_is_yang(&h.binary_code, position)),
                prompt: String::new(),
            });
        }
        if h.is_uniform() {
            let name = if h.binary_code.starts_with('1') {
                "用九"
            } else {
                "用六"
            };
            lines.push(Line {
                id: format!("yao-{}-{}", h.position, ALL_CHANGING_LINE),
                hexagram_position: h.position,
                position: ALL_CHANGING_LINE,
                name: name.to_string(),
                prompt: String::new(),
            });
        }
    }
    lines
}

/// Whether line `position` (1 = bottom) is yang.
///
/// Each trigram's bits are written top line first, so within a half the
/// bottom line is the last character: line 1 is `code[2]`, line 4 is `code[5]`.
fn line_is_yang(code: &str, position: u8) -> bool {
    let half = if position <= 3 { 0 } else { 3 };
    let within = (position - 1) % 3;
    let index = half + 2 - within as usize;
    code.as_bytes().get(index) == Some(&b'1')
}

fn line_name(position: u8, yang: bool) -> String {
    let number = if yang { "九" } else { "六" };
    match position {
        1 => format!("初{number}"),
        6 => format!("上{number}"),
        2 => format!("{number}二"),
        3 => format!("{number}三"),
        4 => format!("{number}四"),
        _ => format!("{number}五"),
    }
}

/// The seed tables as a ready knowledge base.
pub fn seed_knowledge_base() -> Result<KnowledgeBase, KnowledgeBaseError> {
    let hexagrams = seed_hexagrams();
    let lines = seed_lines(&hexagrams);
    KnowledgeBase::new(hexagrams, lines)
}
