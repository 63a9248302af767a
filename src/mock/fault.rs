use crate::mock::model::StepType;

pub const TRANSIENT_FAULT_MESSAGE: &str = "transient upstream error (simulated)";

/// Decides whether the active step fails transiently on this tick.
pub trait FaultPolicy {
    fn should_inject_fault(&self, step_type: &StepType, attempt: u32, tick: i64) -> bool;
}

impl<F> FaultPolicy for F
where
    F: Fn(&StepType, u32, i64) -> bool,
{
    fn should_inject_fault(&self, step_type: &StepType, attempt: u32, tick: i64) -> bool {
        self(step_type, attempt, tick)
    }
}

/// First attempt of an `http` step fails whenever the tick is a multiple of `every`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickModuloFault {
    every: i64,
}

impl TickModuloFault {
    pub const DEFAULT_EVERY: i64 = 7;

    pub fn new(every: i64) -> Self {
        Self {
            every: every.max(1),
        }
    }

    pub fn every(&self) -> i64 {
        self.every
    }
}

impl Default for TickModuloFault {
    fn default() -> Self {
        Self::new(Self::DEFAULT_EVERY)
    }
}

impl FaultPolicy for TickModuloFault {
    fn should_inject_fault(&self, step_type: &StepType, attempt: u32, tick: i64) -> bool {
        *step_type == StepType::Http && attempt == 1 && tick % self.every == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoFaults;

impl FaultPolicy for NoFaults {
    fn should_inject_fault(&self, _step_type: &StepType, _attempt: u32, _tick: i64) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_only_hits_first_http_attempt_on_multiples_of_seven() {
        let policy = TickModuloFault::default();
        assert!(policy.should_inject_fault(&StepType::Http, 1, 7));
        assert!(policy.should_inject_fault(&StepType::Http, 1, 14));
        assert!(policy.should_inject_fault(&StepType::Http, 1, 0));
        assert!(!policy.should_inject_fault(&StepType::Http, 1, 8));
        assert!(!policy.should_inject_fault(&StepType::Http, 2, 7));
        assert!(!policy.should_inject_fault(&StepType::Code, 1, 7));
    }

    #[test]
    fn closures_act_as_policies() {
        let always = |_: &StepType, _: u32, _: i64| true;
        assert!(always.should_inject_fault(&StepType::Llm, 3, 1));
        assert!(!NoFaults.should_inject_fault(&StepType::Http, 1, 7));
    }

    #[test]
    fn non_positive_interval_is_clamped() {
        assert_eq!(TickModuloFault::new(0).every(), 1);
        assert_eq!(TickModuloFault::new(-4).every(), 1);
    }
}
