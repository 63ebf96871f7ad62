//! Classification invariant tests
//!
//! These tests pin down the boundary, fallback, and color-encoding behavior
//! the renderer depends on. Run in CI to prevent regressions.

use seismap_core::risk::DEFAULT_TIERS;
use seismap_core::{classify, hex_to_rgb, resolve_color, resolve_color_hex, rgb_to_hex, Rgb};

/// Magnitudes spanning every tier, both sides of each boundary
fn sweep() -> Vec<f64> {
    let mut values = vec![
        f64::NEG_INFINITY,
        -1.0e12,
        -1.0,
        0.0,
        999.0,
        999.999,
        1.0e15,
        f64::MAX,
        f64::INFINITY,
    ];
    for tier in DEFAULT_TIERS {
        values.push(tier.lower);
        values.push(tier.lower - 0.001);
        values.push(tier.lower + 0.001);
        values.push(tier.lower * 1.5);
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    values
}

#[test]
fn test_classify_is_total() {
    for m in sweep().into_iter().chain([f64::NAN, -0.0, f64::MIN_POSITIVE]) {
        let class = classify(m);
        assert!(class.rank() <= DEFAULT_TIERS.len(), "rank out of range for {}", m);
    }
}

#[test]
fn test_boundary_inclusivity() {
    assert_eq!(classify(1000.0).rank(), 1);
    assert!(classify(999.999).is_below_risk());
    assert_eq!(classify(5000.0).rank(), 2);
    assert_eq!(classify(1_000_000.0).label(), "1M - 2M");
    assert_eq!(classify(999_999.99).label(), "500k - 1M");
}

#[test]
fn test_every_tier_lower_bound_belongs_to_that_tier() {
    for (index, tier) in DEFAULT_TIERS.iter().enumerate() {
        let class = classify(tier.lower);
        assert_eq!(class.rank(), index + 1, "lower bound {} misclassified", tier.lower);
        assert_eq!(class.color(), tier.color);
    }
}

#[test]
fn test_classification_is_monotonic() {
    let values = sweep();
    for pair in values.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        assert!(
            classify(lo).rank() <= classify(hi).rank(),
            "rank({}) > rank({})",
            lo,
            hi
        );
    }
}

#[test]
fn test_tier_colors_round_trip_through_hex() {
    for tier in DEFAULT_TIERS {
        assert_eq!(hex_to_rgb(&tier.color.to_hex()).unwrap(), tier.color);
        assert_eq!(hex_to_rgb(&rgb_to_hex(&tier.color.to_css())).unwrap(), tier.color);
    }
}

#[test]
fn test_side_color_is_nine_characters() {
    for m in sweep() {
        let side = resolve_color_hex(m) + "80";
        assert_eq!(side.len(), 9, "unexpected side color {:?} for {}", side, m);
        assert!(side.starts_with('#'));
    }
}

#[test]
fn test_concrete_scenarios() {
    assert!(classify(500.0).is_below_risk());
    assert_eq!(resolve_color(500.0), Rgb::new(255, 255, 255));
    assert_eq!(resolve_color_hex(500.0), "#ffffff");

    let mid = classify(7500.0);
    let tier = mid.tier().expect("7500 is inside a tier");
    assert_eq!((tier.lower, tier.upper), (5000.0, 10000.0));
    assert_eq!(resolve_color(7500.0), Rgb::new(250, 252, 243));
    assert_eq!(resolve_color_hex(7500.0), "#fafcf3");

    let top = classify(12_000_000.0);
    assert!(top.tier().unwrap().is_unbounded());
    assert_eq!(resolve_color(12_000_000.0), Rgb::new(255, 69, 0));
    assert_eq!(resolve_color_hex(12_000_000.0), "#ff4500");

    let exact = classify(1_000_000.0).tier().unwrap();
    assert_eq!((exact.lower, exact.upper), (1_000_000.0, 2_000_000.0));
}

#[test]
fn test_concurrent_classification_matches_serial() {
    let values = sweep();
    let serial: Vec<String> = values.iter().map(|m| resolve_color_hex(*m)).collect();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let values = values.clone();
            std::thread::spawn(move || {
                values
                    .iter()
                    .map(|m| resolve_color_hex(*m))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), serial);
    }
}
