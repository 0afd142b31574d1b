use planar_target_localization::features::{Descriptor, DescriptorMatch, DESCRIPTOR_BYTES};
use planar_target_localization::matching::{filter_matches, match_descriptors};

/// Descriptor with the first `bits` comparison bits set.
fn desc_with_bits(bits: usize) -> Descriptor {
    let mut bytes = [0u8; DESCRIPTOR_BYTES];
    for i in 0..bits {
        bytes[i / 8] |= 1 << (7 - i % 8);
    }
    Descriptor(bytes)
}

#[test]
fn test_hamming_distance() {
    let zero = desc_with_bits(0);
    assert_eq!(zero.hamming_distance(&zero), 0);
    assert_eq!(zero.hamming_distance(&desc_with_bits(5)), 5);
    assert_eq!(desc_with_bits(3).hamming_distance(&desc_with_bits(9)), 6);
    assert_eq!(zero.hamming_distance(&desc_with_bits(256)), 256);
}

#[test]
fn test_one_match_per_query() {
    let query = vec![desc_with_bits(0), desc_with_bits(10), desc_with_bits(200)];
    let target = vec![desc_with_bits(1), desc_with_bits(11)];
    let matches = match_descriptors(&query, &target);

    assert_eq!(matches.len(), query.len());
    for m in &matches {
        assert!(m.query_idx < query.len());
        assert!(m.target_idx < target.len());
        assert!(m.distance >= 0.0);
    }
}

#[test]
fn test_empty_inputs_give_empty_matches() {
    let some = vec![desc_with_bits(4)];
    assert!(match_descriptors(&[], &some).is_empty());
    assert!(match_descriptors(&some, &[]).is_empty());
    assert!(match_descriptors(&[], &[]).is_empty());
}

#[test]
fn test_nearest_target_wins() {
    let query = vec![desc_with_bits(8)];
    let target = vec![desc_with_bits(100), desc_with_bits(9), desc_with_bits(30)];
    let matches = match_descriptors(&query, &target);

    assert_eq!(matches[0].target_idx, 1);
    assert_eq!(matches[0].distance, 1.0);
}

#[test]
fn test_ties_break_to_lowest_index() {
    // Target 0 and target 2 are identical; the first occurrence wins.
    let query = vec![desc_with_bits(16)];
    let target = vec![desc_with_bits(16), desc_with_bits(64), desc_with_bits(16)];
    let matches = match_descriptors(&query, &target);

    assert_eq!(matches[0].target_idx, 0);
    assert_eq!(matches[0].distance, 0.0);
}

#[test]
fn test_filter_keeps_subset_below_multiple_of_min() {
    let matches = vec![
        DescriptorMatch::new(0, 0, 10.0),
        DescriptorMatch::new(1, 1, 25.0),
        DescriptorMatch::new(2, 2, 31.0),
        DescriptorMatch::new(3, 3, 100.0),
    ];
    let good = filter_matches(&matches, 3.0);

    // min is 10, so the cutoff is strictly below 30.
    assert_eq!(good.len(), 2);
    assert!(good.iter().all(|g| matches.contains(g)));
    assert!(good.iter().all(|g| g.distance < 30.0));
}

#[test]
fn test_filter_cutoff_is_strict() {
    let matches = vec![
        DescriptorMatch::new(0, 0, 10.0),
        DescriptorMatch::new(1, 1, 30.0),
    ];
    let good = filter_matches(&matches, 3.0);
    assert_eq!(good.len(), 1);
    assert_eq!(good[0].distance, 10.0);
}

#[test]
fn test_filter_empty_input() {
    assert!(filter_matches(&[], 3.0).is_empty());
}

#[test]
fn test_filter_all_zero_distances_are_retained() {
    // A zero minimum must not degenerate to "distance < 0".
    let matches = vec![
        DescriptorMatch::new(0, 0, 0.0),
        DescriptorMatch::new(1, 1, 0.0),
        DescriptorMatch::new(2, 2, 0.0),
    ];
    let good = filter_matches(&matches, 3.0);
    assert_eq!(good.len(), 3);
}

#[test]
fn test_filter_zero_min_drops_nonzero_distances() {
    let matches = vec![
        DescriptorMatch::new(0, 0, 0.0),
        DescriptorMatch::new(1, 1, 1.0),
        DescriptorMatch::new(2, 2, 40.0),
    ];
    let good = filter_matches(&matches, 3.0);
    assert_eq!(good.len(), 1);
    assert_eq!(good[0].distance, 0.0);
}

#[test]
fn test_filter_multiple_is_tunable() {
    let matches = vec![
        DescriptorMatch::new(0, 0, 10.0),
        DescriptorMatch::new(1, 1, 45.0),
    ];
    assert_eq!(filter_matches(&matches, 3.0).len(), 1);
    assert_eq!(filter_matches(&matches, 5.0).len(), 2);
}
