use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::codec;
use crate::error::{DivinationError, DivinationResult, KnowledgeBaseError};
use crate::{Hexagram, Line, ALL_CHANGING_LINE, HEXAGRAM_COUNT};

/// Read-only lookups the resolver needs from the reference data.
pub trait SymbolicKnowledge {
    fn find_hexagram_by_code(&self, code: &str) -> DivinationResult<&Hexagram>;

    fn find_line(&self, hexagram_position: u8, line_position: u8) -> DivinationResult<&Line>;

    /// The synthetic 7th line, if this hexagram defines one.
    fn all_changing_line(&self, hexagram_position: u8) -> Option<&Line>;
}

impl<K: SymbolicKnowledge + ?Sized> SymbolicKnowledge for &K {
    fn find_hexagram_by_code(&self, code: &str) -> DivinationResult<&Hexagram> {
        (**self).find_hexagram_by_code(code)
    }

    fn find_line(&self, hexagram_position: u8, line_position: u8) -> DivinationResult<&Line> {
        (**self).find_line(hexagram_position, line_position)
    }

    fn all_changing_line(&self, hexagram_position: u8) -> Option<&Line> {
        (**self).all_changing_line(hexagram_position)
    }
}

impl<K: SymbolicKnowledge + ?Sized> SymbolicKnowledge for Arc<K> {
    fn find_hexagram_by_code(&self, code: &str) -> DivinationResult<&Hexagram> {
        (**self).find_hexagram_by_code(code)
    }

    fn find_line(&self, hexagram_position: u8, line_position: u8) -> DivinationResult<&Line> {
        (**self).find_line(hexagram_position, line_position)
    }

    fn all_changing_line(&self, hexagram_position: u8) -> Option<&Line> {
        (**self).all_changing_line(hexagram_position)
    }
}

/// Immutable, indexed table of hexagrams and their lines.
///
/// Built once from externally supplied records; every invariant of the
/// reference data is checked in [`KnowledgeBase::new`].
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    /// Keyed by ordinal position so listings come out in order.
    hexagrams: BTreeMap<u8, Hexagram>,
    by_code: HashMap<String, u8>,
    lines: BTreeMap<(u8, u8), Line>,
}

impl KnowledgeBase {
    pub fn new(hexagrams: Vec<Hexagram>, lines: Vec<Line>) -> Result<Self, KnowledgeBaseError> {
        let mut kb = KnowledgeBase::default();

        for hexagram in hexagrams {
            if !(1..=HEXAGRAM_COUNT).contains(&hexagram.position) {
                return Err(KnowledgeBaseError::PositionOutOfRange {
                    id: hexagram.id,
                    position: hexagram.position,
                });
            }
            if !codec::is_hexagram_code(&hexagram.binary_code) {
                return Err(KnowledgeBaseError::MalformedCode {
                    id: hexagram.id,
                    code: hexagram.binary_code,
                });
            }
            if let Some(existing) = kb.hexagrams.get(&hexagram.position) {
                return Err(KnowledgeBaseError::DuplicatePosition {
                    position: hexagram.position,
                    first: existing.id.clone(),
                    second: hexagram.id,
                });
            }
            if let Some(pos) = kb.by_code.get(&hexagram.binary_code) {
                return Err(KnowledgeBaseError::DuplicateCode {
                    code: hexagram.binary_code,
                    first: kb.hexagrams[pos].id.clone(),
                    second: hexagram.id,
                });
            }
            kb.by_code
                .insert(hexagram.binary_code.clone(), hexagram.position);
            kb.hexagrams.insert(hexagram.position, hexagram);
        }

        for line in lines {
            let Some(owner) = kb.hexagrams.get(&line.hexagram_position) else {
                return Err(KnowledgeBaseError::OrphanLine {
                    id: line.id,
                    hexagram: line.hexagram_position,
                });
            };
            let max = if owner.is_uniform() {
                ALL_CHANGING_LINE
            } else {
                ALL_CHANGING_LINE - 1
            };
            if !(1..=max).contains(&line.position) {
                return Err(KnowledgeBaseError::LinePositionOutOfRange {
                    id: line.id,
                    position: line.position,
                });
            }
            let key = (line.hexagram_position, line.position);
            if let Some(existing) = kb.lines.get(&key) {
                return Err(KnowledgeBaseError::DuplicateLine {
                    hexagram: key.0,
                    line: key.1,
                    first: existing.id.clone(),
                    second: line.id,
                });
            }
            kb.lines.insert(key, line);
        }

        tracing::debug!(
            hexagrams = kb.hexagrams.len(),
            lines = kb.lines.len(),
            "knowledge base built"
        );
        Ok(kb)
    }

    pub fn find_hexagram_by_position(&self, position: u8) -> Option<&Hexagram> {
        self.hexagrams.get(&position)
    }

    /// Hexagrams in ordinal order.
    pub fn hexagrams(&self) -> impl Iterator<Item = &Hexagram> {
        self.hexagrams.values()
    }

    /// Lines of one hexagram in position order, the 7th line last if present.
    pub fn lines_of(&self, hexagram_position: u8) -> impl Iterator<Item = &Line> {
        self.lines
            .range((hexagram_position, 0)..=(hexagram_position, u8::MAX))
            .map(|(_, line)| line)
    }

    pub fn hexagram_count(&self) -> usize {
        self.hexagrams.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Gaps in the table that would make some derivation fail.
    pub fn audit(&self) -> KnowledgeBaseReport {
        let missing_codes: Vec<String> = codec::all_codes()
            .filter(|code| !self.by_code.contains_key(code))
            .collect();

        let incomplete_hexagrams: Vec<IncompleteHexagram> = self
            .hexagrams
            .values()
            .filter_map(|h| {
                let missing_lines: Vec<u8> = (1..ALL_CHANGING_LINE)
                    .filter(|p| !self.lines.contains_key(&(h.position, *p)))
                    .collect();
                if missing_lines.is_empty() {
                    None
                } else {
                    Some(IncompleteHexagram {
                        position: h.position,
                        name: h.name.clone(),
                        missing_lines,
                    })
                }
            })
            .collect();

        let report = KnowledgeBaseReport {
            hexagrams: self.hexagrams.len(),
            lines: self.lines.len(),
            missing_codes,
            incomplete_hexagrams,
        };
        if !report.is_complete() {
            tracing::warn!(
                missing_codes = report.missing_codes.len(),
                incomplete_hexagrams = report.incomplete_hexagrams.len(),
                "knowledge base has gaps"
            );
        }
        report
    }
}

impl SymbolicKnowledge for KnowledgeBase {
    fn find_hexagram_by_code(&self, code: &str) -> DivinationResult<&Hexagram> {
        self.by_code
            .get(code)
            .and_then(|pos| self.hexagrams.get(pos))
            .ok_or_else(|| DivinationError::HexagramNotFound(code.to_string()))
    }

    fn find_line(&self, hexagram_position: u8, line_position: u8) -> DivinationResult<&Line> {
        self.lines
            .get(&(hexagram_position, line_position))
            .ok_or(DivinationError::LineNotFound {
                hexagram: hexagram_position,
                line: line_position,
            })
    }

    fn all_changing_line(&self, hexagram_position: u8) -> Option<&Line> {
        self.lines.get(&(hexagram_position, ALL_CHANGING_LINE))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncompleteHexagram {
    pub position: u8,
    pub name: String,
    pub missing_lines: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeBaseReport {
    pub hexagrams: usize,
    pub lines: usize,
    /// 6-bit codes no hexagram carries.
    pub missing_codes: Vec<String>,
    /// Hexagrams lacking one or more of lines 1..=6.
    pub incomplete_hexagrams: Vec<IncompleteHexagram>,
}

impl KnowledgeBaseReport {
    pub fn is_complete(&self) -> bool {
        self.missing_codes.is_empty() && self.incomplete_hexagrams.is_empty()
    }
}

/// A knowledge base that can be replaced wholesale while readers hold snapshots.
///
/// Readers never observe a half-updated table: `replace` swaps the whole `Arc`.
#[derive(Debug, Default)]
pub struct SharedKnowledgeBase {
    current: RwLock<Arc<KnowledgeBase>>,
}

impl SharedKnowledgeBase {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self {
            current: RwLock::new(Arc::new(kb)),
        }
    }

    pub fn snapshot(&self) -> Arc<KnowledgeBase> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Swap in a new table, returning the previous one.
    pub fn replace(&self, kb: KnowledgeBase) -> Arc<KnowledgeBase> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        tracing::info!(
            hexagrams = kb.hexagram_count(),
            lines = kb.line_count(),
            "knowledge base replaced"
        );
        std::mem::replace(&mut *guard, Arc::new(kb))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hexagram(position: u8, code: &str) -> Hexagram {
        Hexagram {
            id: format!("gua-{position}"),
            name: format!("Hexagram {position}"),
            prompt: String::new(),
            position,
            binary_code: code.to_string(),
            classical_text: None,
        }
    }

    fn line(hexagram_position: u8, position: u8) -> Line {
        Line {
            id: format!("yao-{hexagram_position}-{position}"),
            hexagram_position,
            position,
            name: format!("Line {position}"),
            prompt: String::new(),
        }
    }

    #[test]
    fn finds_records_by_code_and_key() {
        let kb = KnowledgeBase::new(
            vec![hexagram(1, "111111"), hexagram(2, "000000")],
            vec![line(1, 1), line(1, 7)],
        )
        .unwrap();

        assert_eq!(kb.find_hexagram_by_code("000000").unwrap().position, 2);
        assert_eq!(kb.find_line(1, 1).unwrap().id, "yao-1-1");
        assert_eq!(kb.all_changing_line(1).unwrap().id, "yao-1-7");
        assert!(kb.all_changing_line(2).is_none());
    }

    #[test]
    fn misses_are_errors() {
        let kb = KnowledgeBase::new(vec![hexagram(1, "111111")], vec![]).unwrap();
        assert_eq!(
            kb.find_hexagram_by_code("101010"),
            Err(DivinationError::HexagramNotFound("101010".into()))
        );
        assert_eq!(
            kb.find_line(1, 3),
            Err(DivinationError::LineNotFound {
                hexagram: 1,
                line: 3
            })
        );
    }

    #[test]
    fn rejects_duplicate_codes_and_positions() {
        let err = KnowledgeBase::new(vec![hexagram(1, "111111"), hexagram(2, "111111")], vec![])
            .unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::DuplicateCode { .. }));

        let err = KnowledgeBase::new(vec![hexagram(3, "111111"), hexagram(3, "000000")], vec![])
            .unwrap_err();
        assert!(matches!(
            err,
            KnowledgeBaseError::DuplicatePosition { position: 3, .. }
        ));
    }

    #[test]
    fn rejects_bad_hexagram_fields() {
        let err = KnowledgeBase::new(vec![hexagram(65, "111111")], vec![]).unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::PositionOutOfRange { .. }));

        let err = KnowledgeBase::new(vec![hexagram(1, "11111")], vec![]).unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::MalformedCode { .. }));
    }

    #[test]
    fn seventh_line_only_on_uniform_hexagrams() {
        let err = KnowledgeBase::new(vec![hexagram(11, "111000")], vec![line(11, 7)]).unwrap_err();
        assert!(matches!(
            err,
            KnowledgeBaseError::LinePositionOutOfRange { position: 7, .. }
        ));

        let err = KnowledgeBase::new(vec![hexagram(1, "111111")], vec![line(1, 8)]).unwrap_err();
        assert!(matches!(
            err,
            KnowledgeBaseError::LinePositionOutOfRange { position: 8, .. }
        ));
    }

    #[test]
    fn rejects_orphan_and_duplicate_lines() {
        let err = KnowledgeBase::new(vec![hexagram(1, "111111")], vec![line(2, 1)]).unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::OrphanLine { hexagram: 2, .. }));

        let err = KnowledgeBase::new(vec![hexagram(1, "111111")], vec![line(1, 1), line(1, 1)])
            .unwrap_err();
        assert!(matches!(
            err,
            KnowledgeBaseError::DuplicateLine {
                hexagram: 1,
                line: 1,
                ..
            }
        ));
    }

    #[test]
    fn lines_of_lists_in_order() {
        let kb = KnowledgeBase::new(
            vec![hexagram(1, "111111"), hexagram(2, "000000")],
            vec![line(1, 7), line(1, 2), line(2, 1), line(1, 1)],
        )
        .unwrap();
        let positions: Vec<u8> = kb.lines_of(1).map(|l| l.position).collect();
        assert_eq!(positions, vec![1, 2, 7]);
    }

    #[test]
    fn audit_reports_gaps() {
        let kb = KnowledgeBase::new(
            vec![hexagram(1, "111111")],
            (1..=5).map(|p| line(1, p)).collect(),
        )
        .unwrap();
        let report = kb.audit();
        assert!(!report.is_complete());
        assert_eq!(report.missing_codes.len(), 63);
        assert!(!report.missing_codes.contains(&"111111".to_string()));
        assert_eq!(report.incomplete_hexagrams.len(), 1);
        assert_eq!(report.incomplete_hexagrams[0].missing_lines, vec![6]);
    }

    #[test]
    fn shared_replace_keeps_old_snapshots_intact() {
        let shared = SharedKnowledgeBase::new(
            KnowledgeBase::new(vec![hexagram(1, "111111")], vec![]).unwrap(),
        );
        let before = shared.snapshot();

        let previous = shared.replace(
            KnowledgeBase::new(vec![hexagram(1, "111111"), hexagram(2, "000000")], vec![])
                .unwrap(),
        );

        assert!(Arc::ptr_eq(&before, &previous));
        assert_eq!(before.hexagram_count(), 1);
        assert_eq!(shared.snapshot().hexagram_count(), 2);
    }
}
