/// Snapshot of session state for tooling and shutdown logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub seed: u64,
    pub holders: usize,
    pub trigger_keys: usize,
    pub subscriptions: usize,
    pub animated: usize,
    pub stopped: usize,
    pub trigger_sweeps: u64,
    pub animator_sweeps: u64,
    pub rules_fired: u64,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Session: seed={} holders={} keys={} subscriptions={} animated={} stopped={} \
             trigger_sweeps={} animator_sweeps={} fired={}",
            self.seed,
            self.holders,
            self.trigger_keys,
            self.subscriptions,
            self.animated,
            self.stopped,
            self.trigger_sweeps,
            self.animator_sweeps,
            self.rules_fired,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_lists_every_counter() {
        let summary = SessionSummary {
            seed: 7,
            holders: 2,
            trigger_keys: 3,
            subscriptions: 4,
            animated: 1,
            stopped: 0,
            trigger_sweeps: 5,
            animator_sweeps: 6,
            rules_fired: 1,
        };
        assert_eq!(
            summary.to_string(),
            "Session: seed=7 holders=2 keys=3 subscriptions=4 animated=1 stopped=0 \
             trigger_sweeps=5 animator_sweeps=6 fired=1"
        );
    }
}
