use std::time::Duration;

use super::common::{engine, engine_v1, full_stack, mx, no_signals, provider, signals};
use crate::leads::domain::is_valid_domain;
use crate::leads::scoring::SCORING_CACHE_MAX_ENTRIES;
use crate::leads::{DmarcPolicy, ProviderName, Segment, SignalsBundle};

#[test]
fn unknown_provider_without_signals_floors_at_zero() {
    let engine = engine();
    let score = engine.calculate_score(&ProviderName::unknown(), &no_signals());
    assert_eq!(score, 0);
}

#[test]
fn provider_points_follow_registry_tiers() {
    let engine = engine();
    let bundle = no_signals();

    let m365 = engine.calculate_score(&provider("M365"), &bundle);
    let yandex = engine.calculate_score(&provider("Yandex"), &bundle);
    let unknown = engine.calculate_score(&ProviderName::unknown(), &bundle);

    assert!(m365 > yandex);
    assert!(yandex > unknown);
    assert_eq!(m365, 25);
}

#[test]
fn spf_and_dkim_each_add_points() {
    let engine = engine();
    let provider = provider("M365");

    let none = engine.calculate_score(&provider, &no_signals());
    let spf_only = engine.calculate_score(&provider, &signals(true, false, None));
    let both = engine.calculate_score(&provider, &signals(true, true, None));

    assert!(spf_only > none);
    assert!(both > spf_only);
    assert_eq!(both, 70);
}

#[test]
fn dmarc_reject_outscores_quarantine() {
    let engine = engine();
    let provider = provider("M365");

    let quarantine =
        engine.calculate_score(&provider, &signals(true, true, Some(DmarcPolicy::Quarantine)));
    let reject = engine.calculate_score(&provider, &signals(true, true, Some(DmarcPolicy::Reject)));

    assert_eq!(quarantine, 85);
    assert_eq!(reject, 90);
}

#[test]
fn dmarc_policy_none_is_penalized_but_absent_dmarc_is_not() {
    let engine = engine();
    let provider = provider("M365");

    let absent = engine.calculate_score(&provider, &signals(true, true, None));
    let published_none =
        engine.calculate_score(&provider, &signals(true, true, Some(DmarcPolicy::None)));

    assert_eq!(absent, 70);
    assert_eq!(published_none, 60);
}

#[test]
fn missing_dkim_stacks_both_penalties_under_v2() {
    let v1 = engine_v1();
    let v2 = engine();
    let provider = provider("M365");
    let bundle = signals(true, false, None);

    assert_eq!(v1.calculate_score(&provider, &bundle), 50);
    assert_eq!(v2.calculate_score(&provider, &bundle), 45);
}

#[test]
fn hosting_with_no_auth_takes_weak_mx_penalty() {
    let engine = engine();

    let bare = engine.calculate_score(&provider("Hosting"), &no_signals());
    let with_spf = engine.calculate_score(&provider("Hosting"), &signals(true, false, None));

    assert_eq!(bare, 0);
    assert_eq!(with_spf, 15);
}

#[test]
fn spf_include_sprawl_is_penalized_past_the_limit() {
    let engine = engine();
    let provider = provider("Google");

    let mut bundle = full_stack();
    bundle.spf_record = Some(
        "v=spf1 include:_spf.google.com include:a.example include:b.example ~all".to_string(),
    );
    assert_eq!(engine.calculate_score(&provider, &bundle), 90);

    bundle.spf_record = Some(
        "v=spf1 include:_spf.google.com include:a.example include:b.example include:c.example ~all"
            .to_string(),
    );
    assert_eq!(engine.calculate_score(&provider, &bundle), 85);
}

#[test]
fn score_is_clamped_to_hundred() {
    let engine = engine();
    let score = engine.calculate_score(&provider("M365"), &full_stack());
    assert!(score <= 100);
}

#[test]
fn m365_is_existing_regardless_of_score() {
    let engine = engine();

    let (segment, _) = engine.determine_segment(90, &provider("M365"));
    assert_eq!(segment, Segment::Existing);

    let (segment, _) = engine.determine_segment(10, &provider("M365"));
    assert_eq!(segment, Segment::Existing);
}

#[test]
fn strong_cloud_providers_become_migration() {
    let engine = engine();

    for name in ["Google", "Yandex", "Zoho"] {
        let (segment, _) = engine.determine_segment(75, &provider(name));
        assert_eq!(segment, Segment::Migration, "provider {name}");
    }

    let (segment, _) = engine.determine_segment(69, &provider("Google"));
    assert_eq!(segment, Segment::Cold);
}

#[test]
fn mid_band_scores_are_cold_and_low_scores_skip() {
    let engine = engine();
    let local = provider("Local");

    assert_eq!(engine.determine_segment(40, &local).0, Segment::Cold);
    assert_eq!(engine.determine_segment(69, &local).0, Segment::Cold);
    assert_eq!(engine.determine_segment(39, &local).0, Segment::Skip);
    assert_eq!(engine.determine_segment(0, &local).0, Segment::Skip);
}

#[test]
fn segment_reason_carries_score_and_provider() {
    let engine = engine();
    let (_, reason) = engine.determine_segment(85, &provider("M365"));
    assert!(reason.contains("Score: 85"));
    assert!(reason.contains("Provider: M365"));
}

#[test]
fn unmatched_segment_input_degrades_to_skip() {
    let engine = engine();
    let (segment, reason) = engine.determine_segment(150, &ProviderName::unknown());
    // 150 exceeds every max_score clause, so only the wildcard-free Skip rule
    // range is left and nothing matches.
    assert_eq!(segment, Segment::Skip);
    assert!(reason.contains("did not match any segment rule"));
}

#[test]
fn missing_mx_hard_fails_before_scoring() {
    let engine = engine();

    assert_eq!(engine.check_hard_fail(None), Some("No MX records found"));
    assert_eq!(
        engine.check_hard_fail(Some(&mx(&[]))),
        Some("No MX records found")
    );
    assert_eq!(engine.check_hard_fail(Some(&mx(&["mx1.example.com"]))), None);

    let result = engine.score_domain("example.com", &provider("M365"), &full_stack(), None);
    assert_eq!(result.score, 0);
    assert_eq!(result.segment, Segment::Skip);
    assert_eq!(result.reason, "Hard-fail: No MX records found");
}

#[test]
fn invalid_domain_is_skipped_without_scoring() {
    let engine = engine();
    let records = mx(&["mx1.example.com"]);

    for junk in ["", "nan", "n/a", "localhost", "http://example.com", "exa mple.com"] {
        let result = engine.score_domain(junk, &provider("M365"), &full_stack(), Some(&records));
        assert_eq!(result.score, 0, "domain {junk:?}");
        assert_eq!(result.segment, Segment::Skip, "domain {junk:?}");
        assert!(
            result.reason.starts_with("Invalid domain format:"),
            "domain {junk:?}"
        );
    }
}

#[test]
fn score_domain_produces_segment_and_reason() {
    let engine = engine();
    let records = mx(&["contoso-com.mail.protection.outlook.com"]);
    let result = engine.score_domain("contoso.com", &provider("M365"), &full_stack(), Some(&records));

    assert_eq!(result.score, 90);
    assert_eq!(result.segment, Segment::Existing);
    assert!(result.reason.contains("Already on Microsoft 365"));
}

#[test]
fn cache_is_transparent() {
    let uncached = engine();
    let cached = engine().with_cache();
    let records = mx(&["aspmx.l.google.com"]);
    let bundle = signals(true, true, Some(DmarcPolicy::Quarantine));

    let baseline = uncached.score_domain("example.com", &provider("Google"), &bundle, Some(&records));
    let first = cached.score_domain("example.com", &provider("Google"), &bundle, Some(&records));
    let second = cached.score_domain("example.com", &provider("Google"), &bundle, Some(&records));

    assert_eq!(first, baseline);
    assert_eq!(second, baseline);
}

#[test]
fn cache_distinguishes_signal_bundles() {
    let engine = engine().with_cache();
    let records = mx(&["aspmx.l.google.com"]);

    let weak = engine.score_domain(
        "example.com",
        &provider("Google"),
        &signals(true, false, None),
        Some(&records),
    );
    let strong = engine.score_domain("example.com", &provider("Google"), &full_stack(), Some(&records));

    assert_ne!(weak.score, strong.score);
}

#[test]
fn expired_cache_entries_are_recomputed() {
    let uncached = engine();
    let mut cached = engine().with_cache();
    cached.set_cache_ttl(Duration::ZERO);
    let records = mx(&["aspmx.l.google.com"]);
    let bundle = full_stack();

    let baseline = uncached.score_domain("example.com", &provider("Google"), &bundle, Some(&records));
    for _ in 0..3 {
        let result = cached.score_domain("example.com", &provider("Google"), &bundle, Some(&records));
        assert_eq!(result, baseline);
    }
    // The stale entry is dropped on each reread, not left to pile up.
    assert_eq!(cached.cache_len(), 1);
}

#[test]
fn cache_size_stays_bounded() {
    let records = mx(&["mx1.example.com"]);
    let bundle = full_stack();

    let mut expiring = engine().with_cache();
    expiring.set_cache_ttl(Duration::ZERO);
    for i in 0..SCORING_CACHE_MAX_ENTRIES + 50 {
        expiring.score_domain(&format!("lead{i}.example.com"), &provider("Local"), &bundle, Some(&records));
    }
    assert!(expiring.cache_len() < SCORING_CACHE_MAX_ENTRIES);

    let fresh = engine().with_cache();
    for i in 0..SCORING_CACHE_MAX_ENTRIES + 50 {
        fresh.score_domain(&format!("lead{i}.example.com"), &provider("Local"), &bundle, Some(&records));
    }
    assert!(fresh.cache_len() <= SCORING_CACHE_MAX_ENTRIES);
}

#[test]
fn dmarc_policy_parsing_is_case_insensitive() {
    assert_eq!(DmarcPolicy::parse("REJECT"), Some(DmarcPolicy::Reject));
    assert_eq!(DmarcPolicy::parse("Quarantine"), Some(DmarcPolicy::Quarantine));
    assert_eq!(DmarcPolicy::parse(" none "), Some(DmarcPolicy::None));
    assert_eq!(DmarcPolicy::parse("monitor"), None);
    assert_eq!(DmarcPolicy::parse(""), None);
}

#[test]
fn domain_validation_accepts_real_domains() {
    for domain in ["example.com", "sub.example.co.uk", "xn--bcher-kva.de", "a-b.example"] {
        assert!(is_valid_domain(domain), "domain {domain:?}");
    }
}

#[test]
fn domain_validation_rejects_junk() {
    for domain in [
        "",
        "   ",
        "nan",
        "website",
        "https",
        "no-dots",
        "http://x.com",
        "spaced domain.com",
        "-lead.example.com",
        "trailing-.example.com",
        "example.c",
        "double..dot.com",
    ] {
        assert!(!is_valid_domain(domain), "domain {domain:?}");
    }
}

#[test]
fn canonical_signals_key_is_order_stable() {
    let a = SignalsBundle {
        spf: true,
        dkim: false,
        dmarc_policy: Some(DmarcPolicy::Reject),
        spf_record: None,
    };
    let b = a.clone();
    assert_eq!(a.canonical_key(), b.canonical_key());
    assert_eq!(a.canonical_key(), "dkim=false;dmarc=reject;spf=true;spf_record=-");
}
