//! Argument scores

use serde::{Deserialize, Serialize};

/// Lowest value a scoring dimension may take
pub const SCORE_MIN: f64 = 0.0;
/// Highest value a scoring dimension may take
pub const SCORE_MAX: f64 = 10.0;

/// Three-dimension evaluation of one argument.
///
/// Serialized with its derived `total` so stored records are self-describing;
/// the total is recomputed on load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "ScoreRepr", from = "ScoreRepr")]
pub struct Score {
    pub logic: f64,
    pub relevance: f64,
    pub persuasiveness: f64,
}

impl Score {
    /// Score assigned when the oracle cannot produce one
    pub const NEUTRAL: Score = Score {
        logic: 5.0,
        relevance: 5.0,
        persuasiveness: 5.0,
    };

    pub const ZERO: Score = Score {
        logic: 0.0,
        relevance: 0.0,
        persuasiveness: 0.0,
    };

    pub fn new(logic: f64, relevance: f64, persuasiveness: f64) -> Self {
        Self {
            logic,
            relevance,
            persuasiveness,
        }
    }

    pub fn total(&self) -> f64 {
        self.logic + self.relevance + self.persuasiveness
    }

    /// All dimensions finite and within [`SCORE_MIN`, `SCORE_MAX`]
    pub fn is_valid(&self) -> bool {
        [self.logic, self.relevance, self.persuasiveness]
            .iter()
            .all(|v| v.is_finite() && (SCORE_MIN..=SCORE_MAX).contains(v))
    }
}

#[derive(Serialize, Deserialize)]
struct ScoreRepr {
    logic: f64,
    relevance: f64,
    persuasiveness: f64,
    #[serde(default)]
    total: f64,
}

impl From<Score> for ScoreRepr {
    fn from(s: Score) -> Self {
        Self {
            logic: s.logic,
            relevance: s.relevance,
            persuasiveness: s.persuasiveness,
            total: s.total(),
        }
    }
}

impl From<ScoreRepr> for Score {
    fn from(r: ScoreRepr) -> Self {
        Score::new(r.logic, r.relevance, r.persuasiveness)
    }
}

/// Element-wise mean of all Turn Scores of one participant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverallScore(Score);

impl OverallScore {
    /// Average each dimension over `turns`. An empty slice averages to zero.
    pub fn from_turns(turns: &[Score]) -> Self {
        if turns.is_empty() {
            return Self(Score::ZERO);
        }
        let n = turns.len() as f64;
        let sum = turns.iter().fold(Score::ZERO, |acc, s| {
            Score::new(
                acc.logic + s.logic,
                acc.relevance + s.relevance,
                acc.persuasiveness + s.persuasiveness,
            )
        });
        Self(Score::new(
            sum.logic / n,
            sum.relevance / n,
            sum.persuasiveness / n,
        ))
    }

    pub fn dimensions(&self) -> Score {
        self.0
    }

    /// Sum of the three averaged dimensions
    pub fn total(&self) -> f64 {
        self.0.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_total_is_plain_sum() {
        let s = Score::new(7.5, 8.0, 7.0);
        assert!((s.total() - 22.5).abs() < EPS);
    }

    #[test]
    fn test_validity_bounds() {
        assert!(Score::new(0.0, 10.0, 5.5).is_valid());
        assert!(!Score::new(-0.1, 5.0, 5.0).is_valid());
        assert!(!Score::new(5.0, 10.5, 5.0).is_valid());
        assert!(!Score::new(f64::NAN, 5.0, 5.0).is_valid());
    }

    #[test]
    fn test_overall_is_mean_of_five_turns() {
        let turns = [
            Score::new(7.0, 8.0, 6.0),
            Score::new(6.5, 7.0, 7.5),
            Score::new(8.0, 9.0, 8.5),
            Score::new(5.0, 6.0, 4.0),
            Score::new(9.0, 8.5, 9.5),
        ];
        let overall = OverallScore::from_turns(&turns);
        let d = overall.dimensions();
        assert!((d.logic - 7.1).abs() < EPS);
        assert!((d.relevance - 7.7).abs() < EPS);
        assert!((d.persuasiveness - 7.1).abs() < EPS);
        assert!((overall.total() - (d.logic + d.relevance + d.persuasiveness)).abs() < EPS);
        assert!((overall.total() - 21.9).abs() < EPS);
    }

    #[test]
    fn test_serialized_score_carries_total() {
        let json = serde_json::to_value(Score::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(json["total"], 6.0);
        let back: Score = serde_json::from_value(json).unwrap();
        assert_eq!(back, Score::new(1.0, 2.0, 3.0));
    }
}
