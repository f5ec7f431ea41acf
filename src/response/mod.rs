//! Response actions for an injected or detected threat: firewall mitigation
//! and the forensic report offered for download.

mod mitigation;

pub use mitigation::{Mitigator, MitigationOutcome, MitigationStatus, FALLBACK_TARGET};

use crate::observation::Observation;

/// Plain-text report body for a threat record.
pub fn forensic_report(observation: &Observation) -> String {
    format!(
        "CONFIDENTIAL REPORT\nTARGET: {}\nTIME: {}\nDEVICE: {}\nSCORE: {:.2}\nALERT: {}",
        observation.destination(),
        observation.time_of_day(),
        observation.device(),
        observation.score(),
        observation.alert(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_names_target() {
        let o = Observation::idle();
        let r = forensic_report(&o);
        assert!(r.starts_with("CONFIDENTIAL REPORT\n"));
        assert!(r.contains("TARGET: -"));
        assert!(r.contains(&format!("TIME: {}", o.time_of_day())));
    }
}
