use std::collections::BTreeMap;

use crate::error::SessionError;

/// Selected option per question index. Entries are sparse and overwritten on re-selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerLedger {
    total: usize,
    answers: BTreeMap<usize, String>,
}

impl AnswerLedger {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            answers: BTreeMap::new(),
        }
    }

    pub fn select(&mut self, index: usize, option: impl Into<String>) -> Result<(), SessionError> {
        self.check(index)?;
        self.answers.insert(index, option.into());
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.answers.contains_key(&index)
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.answers.iter().map(|(i, a)| (*i, a.as_str()))
    }

    fn check(&self, index: usize) -> Result<(), SessionError> {
        if index < self.total {
            Ok(())
        } else {
            Err(SessionError::IndexOutOfRange {
                index,
                total: self.total,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reselecting_overwrites() {
        let mut ledger = AnswerLedger::new(3);
        ledger.select(1, "A").unwrap();
        ledger.select(1, "B").unwrap();

        assert_eq!(ledger.get(1), Some("B"));
        assert_eq!(ledger.iter().count(), 1);
    }

    #[test]
    fn selecting_same_option_twice_is_idempotent() {
        let mut once = AnswerLedger::new(2);
        once.select(0, "C").unwrap();

        let mut twice = AnswerLedger::new(2);
        twice.select(0, "C").unwrap();
        twice.select(0, "C").unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut ledger = AnswerLedger::new(2);
        assert_eq!(
            ledger.select(2, "A"),
            Err(SessionError::IndexOutOfRange { index: 2, total: 2 })
        );
        assert!(ledger.is_empty());
        assert!(!ledger.is_answered(2));
    }

    #[test]
    fn sparse_entries() {
        let mut ledger = AnswerLedger::new(4);
        ledger.select(3, "D").unwrap();
        ledger.select(0, "A").unwrap();

        assert!(!ledger.is_answered(1));
        assert_eq!(ledger.get(2), None);
        assert_eq!(ledger.iter().collect::<Vec<_>>(), vec![(0, "A"), (3, "D")]);
    }
}
