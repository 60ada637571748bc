use crate::leads::providers::{ProviderClassifier, ProviderRegistry};
use crate::leads::scoring::ScoringEngine;
use crate::leads::{DmarcPolicy, ProviderName, RulesetVersion, SignalsBundle};

pub(super) fn engine() -> ScoringEngine {
    ScoringEngine::new(RulesetVersion::V2).expect("v2 ruleset loads")
}

pub(super) fn engine_v1() -> ScoringEngine {
    ScoringEngine::new(RulesetVersion::V1).expect("v1 ruleset loads")
}

pub(super) fn classifier() -> ProviderClassifier {
    ProviderClassifier::new(ProviderRegistry::load().expect("provider registry loads"))
}

pub(super) fn provider(name: &str) -> ProviderName {
    ProviderName::new(name)
}

pub(super) fn signals(spf: bool, dkim: bool, dmarc_policy: Option<DmarcPolicy>) -> SignalsBundle {
    SignalsBundle {
        spf,
        dkim,
        dmarc_policy,
        spf_record: None,
    }
}

pub(super) fn mx(hosts: &[&str]) -> Vec<String> {
    hosts.iter().map(|host| host.to_string()).collect()
}

pub(super) fn full_stack() -> SignalsBundle {
    signals(true, true, Some(DmarcPolicy::Reject))
}

pub(super) fn no_signals() -> SignalsBundle {
    signals(false, false, None)
}
