use crate::config::Thresholds;

/// Orchestrator states, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Direct,
    Alternate,
    OpenGraph,
    Terminal,
}

impl Tier {
    pub fn next(self) -> Self {
        match self {
            Self::Direct => Self::Alternate,
            Self::Alternate => Self::OpenGraph,
            Self::OpenGraph | Self::Terminal => Self::Terminal,
        }
    }

    /// Characters a tier's output needs to be accepted.
    pub fn min_chars(self, thresholds: &Thresholds) -> usize {
        match self {
            Self::Direct => thresholds.direct_min_chars,
            Self::Alternate => thresholds.alternate_min_chars,
            Self::OpenGraph => thresholds.open_graph_min_chars,
            Self::Terminal => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_advance_to_terminal() {
        let mut tier = Tier::Direct;
        let mut seen = vec![tier];
        while tier != Tier::Terminal {
            tier = tier.next();
            seen.push(tier);
        }
        assert_eq!(
            seen,
            vec![Tier::Direct, Tier::Alternate, Tier::OpenGraph, Tier::Terminal]
        );
        assert_eq!(Tier::Terminal.next(), Tier::Terminal);
    }

    #[test]
    fn test_thresholds_descend() {
        let t = Thresholds::default();
        assert!(Tier::Direct.min_chars(&t) >= Tier::Alternate.min_chars(&t));
        assert!(Tier::Alternate.min_chars(&t) >= Tier::OpenGraph.min_chars(&t));
        assert_eq!(Tier::Terminal.min_chars(&t), 0);
    }
}
