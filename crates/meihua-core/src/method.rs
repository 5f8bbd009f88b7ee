/// Plum Blossom derivation rules: single source of truth for MCP instructions and the `get_method` tool.
pub const METHOD: &str = "\
1. Three positive integers are supplied. Zero or negative numbers are rejected; nothing is computed.\n\
2. Remainders. The first number is divided by 8 for the lower trigram, the second by 8 for the upper \
trigram, the third by 6 for the changing line. A remainder of 0 counts as the divisor itself \
(8 or 6), so every remainder lies in 1..=8 or 1..=6.\n\
3. Trigrams. Remainder to bits: 1 Qian 乾 111, 2 Dui 兑 011, 3 Li 离 101, 4 Zhen 震 001, \
5 Xun 巽 110, 6 Kan 坎 010, 7 Gen 艮 100, 8 Kun 坤 000. This table is fixed and must match the \
reference data.\n\
4. Primary hexagram (本卦). Lower trigram bits followed by upper trigram bits, e.g. lower Qian and \
upper Kun give 111000. Do not swap the halves.\n\
5. Secondary hexagram (之卦). Invert the character at the changing-line position, counted from 1 \
at the left (lower trigram) end. Line 1 of 111111 gives 011111.\n\
6. Changing line (变爻). The line record at that position on the primary hexagram, looked up by the \
primary hexagram's ordinal (1..=64), not its id.\n\
7. Qian (111111) and Kun (000000) also carry a 7th line (用九 / 用六) for all lines changing. It is \
reported alongside the reading but never selected by the third number.\n\
8. A code or line missing from the reference data is a data error. It is reported, never guessed.\n\
\n\
## Example\n\
Inputs 9, 17, 7: remainders 1, 1, 1. Primary 111111, secondary 011111, changing line 1 of the \
primary hexagram. Inputs 1, 1, 1 give the same reading.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_lists_every_trigram() {
        for t in crate::codec::Trigram::ALL {
            let entry = format!("{} {} {} {}", t.selector(), t.name(), t.chinese_name(), t.bits());
            assert!(METHOD.contains(&entry), "missing {entry}");
        }
    }
}
