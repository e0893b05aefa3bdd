//! Turn ledger - one participant's arguments in submission order
//!
//! Position in the ledger is the round number (1-based), so the ledger length
//! is the number of rounds this participant has completed.

/// Append-only list of a participant's arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnLedger {
    arguments: Vec<String>,
}

impl TurnLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rounds recorded
    pub fn rounds(&self) -> u32 {
        self.arguments.len() as u32
    }

    pub fn is_full(&self, rounds_target: u32) -> bool {
        self.rounds() >= rounds_target
    }

    /// Append an argument, returning its round number.
    /// Returns `None` without recording if the ledger already holds `rounds_target` entries.
    pub fn append(&mut self, argument: String, rounds_target: u32) -> Option<u32> {
        if self.is_full(rounds_target) {
            return None;
        }
        self.arguments.push(argument);
        Some(self.rounds())
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_numbers_rounds() {
        let mut ledger = TurnLedger::new();
        assert_eq!(ledger.append("first".into(), 2), Some(1));
        assert_eq!(ledger.append("second".into(), 2), Some(2));
        assert_eq!(ledger.arguments(), ["first", "second"]);
    }

    #[test]
    fn test_never_exceeds_target() {
        let mut ledger = TurnLedger::new();
        ledger.append("only".into(), 1);
        assert!(ledger.is_full(1));
        assert_eq!(ledger.append("extra".into(), 1), None);
        assert_eq!(ledger.rounds(), 1);
    }
}
