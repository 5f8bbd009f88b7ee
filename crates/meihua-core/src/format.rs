use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::resolver::DerivationResult;

/// Language of the summary sentence.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    English,
    Chinese,
}

/// The one-sentence result used for display and clipboard export.
pub fn render_summary(primary: &str, secondary: &str, line: &str, locale: Locale) -> String {
    match locale {
        Locale::English => format!(
            "Result: primary hexagram is \"{primary}\", secondary hexagram is \"{secondary}\", \
             changing line is the primary hexagram's (\"{primary}\") \"{line}\""
        ),
        Locale::Chinese => format!(
            "占卜结果：本卦为\"{primary}\"，之卦为\"{secondary}\"，变爻为 本卦（\"{primary}\"）的 \"{line}\""
        ),
    }
}

/// Summary sentence of a finished derivation.
pub fn summary(result: &DerivationResult, locale: Locale) -> String {
    render_summary(
        &result.primary.name,
        &result.secondary.name,
        &result.changing_line.name,
        locale,
    )
}

/// Multi-line breakdown of every intermediate value.
pub fn render_report(result: &DerivationResult) -> String {
    let mut out = String::with_capacity(512);
    let [n1, n2, n3] = result.inputs;
    let r = &result.remainders;
    let b = &result.binaries;

    // Writing to a String cannot fail.
    let _ = writeln!(out, "{}", result.summary);
    let _ = writeln!(out);
    let _ = writeln!(out, "Inputs: {n1}, {n2}, {n3}");
    let _ = writeln!(
        out,
        "Lower trigram: {n1} -> {} -> {} {} ({})",
        r.lower,
        b.lower,
        result.lower_trigram.name(),
        result.lower_trigram.chinese_name()
    );
    let _ = writeln!(
        out,
        "Upper trigram: {n2} -> {} -> {} {} ({})",
        r.upper,
        b.upper,
        result.upper_trigram.name(),
        result.upper_trigram.chinese_name()
    );
    let _ = writeln!(out, "Changing line: {n3} -> {}", r.line);
    let _ = writeln!(
        out,
        "Primary: #{} {} [{}]",
        result.primary.position, result.primary.name, b.primary
    );
    if let Some(text) = &result.primary.classical_text {
        let _ = writeln!(out, "  {text}");
    }
    let _ = writeln!(
        out,
        "Secondary: #{} {} [{}]",
        result.secondary.position, result.secondary.name, b.secondary
    );
    if let Some(text) = &result.secondary.classical_text {
        let _ = writeln!(out, "  {text}");
    }
    let _ = writeln!(
        out,
        "Line {} of #{}: {}",
        result.changing_line.position, result.changing_line.hexagram_position, result.changing_line.name
    );
    if !result.changing_line.prompt.is_empty() {
        let _ = writeln!(out, "  {}", result.changing_line.prompt);
    }
    if let Some(all) = &result.all_changing_line {
        let _ = writeln!(out, "All lines changing: {}", all.name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_sentence_is_canonical() {
        assert_eq!(
            render_summary("Qian", "Lü", "Nine at the beginning", Locale::English),
            "Result: primary hexagram is \"Qian\", secondary hexagram is \"Lü\", \
             changing line is the primary hexagram's (\"Qian\") \"Nine at the beginning\""
        );
    }

    #[test]
    fn chinese_sentence_matches_console() {
        assert_eq!(
            render_summary("乾", "履", "初九", Locale::Chinese),
            "占卜结果：本卦为\"乾\"，之卦为\"履\"，变爻为 本卦（\"乾\"）的 \"初九\""
        );
    }

    #[test]
    fn locale_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Locale::Chinese).unwrap(), "\"chinese\"");
        assert_eq!(Locale::default(), Locale::English);
    }
}
