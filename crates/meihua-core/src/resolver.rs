//! Three numbers in, primary hexagram, secondary hexagram and changing line out.

use serde::Serialize;

use crate::codec::{self, Trigram, LINE_DIVISOR, TRIGRAM_DIVISOR};
use crate::error::{DivinationError, DivinationResult};
use crate::format::{self, Locale};
use crate::knowledge::SymbolicKnowledge;
use crate::{Hexagram, Line};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Remainders {
    pub lower: u64,
    pub upper: u64,
    pub line: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binaries {
    pub lower: String,
    pub upper: String,
    pub primary: String,
    pub secondary: String,
}

/// Everything one derivation computed and resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivationResult {
    pub inputs: [u64; 3],
    pub remainders: Remainders,
    pub lower_trigram: Trigram,
    pub upper_trigram: Trigram,
    pub binaries: Binaries,
    pub primary: Hexagram,
    pub secondary: Hexagram,
    pub changing_line: Line,
    /// The primary hexagram's 7th line, when the table defines one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_changing_line: Option<Line>,
    pub summary: String,
}

/// Runs derivations against an injected knowledge base.
#[derive(Debug, Clone)]
pub struct DivinationResolver<K> {
    knowledge: K,
    locale: Locale,
}

impl<K: SymbolicKnowledge> DivinationResolver<K> {
    pub fn new(knowledge: K) -> Self {
        Self {
            knowledge,
            locale: Locale::default(),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn knowledge(&self) -> &K {
        &self.knowledge
    }

    /// Derive a reading from three positive integers.
    ///
    /// Non-positive inputs are rejected before anything is computed. Lookup
    /// failures are returned as-is; there is no fallback hexagram.
    pub fn derive(&self, n1: i64, n2: i64, n3: i64) -> DivinationResult<DerivationResult> {
        let inputs = [positive(1, n1)?, positive(2, n2)?, positive(3, n3)?];

        let remainders = Remainders {
            lower: codec::remainder_or_max(inputs[0], TRIGRAM_DIVISOR),
            upper: codec::remainder_or_max(inputs[1], TRIGRAM_DIVISOR),
            line: codec::remainder_or_max(inputs[2], LINE_DIVISOR),
        };
        tracing::debug!(?inputs, ?remainders, "remainders");

        let lower_trigram = Trigram::from_selector(remainders.lower)?;
        let upper_trigram = Trigram::from_selector(remainders.upper)?;
        let primary_code = codec::compose_primary_code(remainders.lower, remainders.upper)?;
        let secondary_code = codec::flip_line(&primary_code, remainders.line)?;
        tracing::debug!(primary = %primary_code, secondary = %secondary_code, "codes");

        let primary = self.knowledge.find_hexagram_by_code(&primary_code)?;
        let secondary = self.knowledge.find_hexagram_by_code(&secondary_code)?;
        // remainders.line is 1..=6 here
        let changing_line = self
            .knowledge
            .find_line(primary.position, remainders.line as u8)?;
        let all_changing_line = self.knowledge.all_changing_line(primary.position).cloned();
        tracing::debug!(
            primary = primary.position,
            secondary = secondary.position,
            line = changing_line.position,
            "resolved"
        );

        let summary = format::render_summary(
            &primary.name,
            &secondary.name,
            &changing_line.name,
            self.locale,
        );

        Ok(DerivationResult {
            inputs,
            remainders,
            lower_trigram,
            upper_trigram,
            binaries: Binaries {
                lower: lower_trigram.bits().to_string(),
                upper: upper_trigram.bits().to_string(),
                primary: primary_code,
                secondary: secondary_code,
            },
            primary: primary.clone(),
            secondary: secondary.clone(),
            changing_line: changing_line.clone(),
            all_changing_line,
            summary,
        })
    }
}

fn positive(index: usize, value: i64) -> DivinationResult<u64> {
    u64::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or(DivinationError::InvalidInput { index, value })
}
