use kira_variant_counts::aggregate::{aggregate, drop_undefined_coordinates};
use kira_variant_counts::table::MutationRow;

fn row(chr: Option<&str>, start: Option<i64>, alt: &str, sample: &str) -> MutationRow {
    MutationRow {
        gene: Some("GeneX".to_string()),
        chromosome: chr.map(str::to_string),
        start_position: start,
        end_position: start,
        reference_allele: Some("A".to_string()),
        variant_allele: Some(alt.to_string()),
        sample_id: Some(sample.to_string()),
    }
}

fn sample_rows() -> Vec<MutationRow> {
    vec![
        row(Some("1"), Some(100), "T", "S1"),
        row(None, Some(100), "T", "S2"),
        row(Some("1"), None, "T", "S3"),
        row(Some("1"), Some(100), "T", "S2"),
        row(Some("17"), Some(7_577_120), "C", "S1"),
        row(Some("1"), Some(100), "G", "S4"),
        row(Some("1"), Some(100), "T", "S1"),
    ]
}

#[test]
fn coordinate_filter_is_order_independent() {
    let rows = sample_rows();
    let mut reversed = rows.clone();
    reversed.reverse();

    let mut forward = drop_undefined_coordinates(&rows);
    let mut backward = drop_undefined_coordinates(&reversed);
    assert_eq!(forward.len(), 5);
    forward.sort_by_key(|r| format!("{r:?}"));
    backward.sort_by_key(|r| format!("{r:?}"));
    assert_eq!(forward, backward);
    assert_eq!(aggregate(&rows), aggregate(&reversed));
}

#[test]
fn aggregation_is_idempotent() {
    let rows = sample_rows();
    let counts = aggregate(&rows);

    let mut deduplicated = drop_undefined_coordinates(&rows);
    deduplicated.sort_by_key(|r| format!("{r:?}"));
    deduplicated.dedup();
    assert_eq!(aggregate(&deduplicated), counts);
    assert_eq!(aggregate(&drop_undefined_coordinates(&rows)), counts);
}

#[test]
fn counts_per_variant() {
    let counts = aggregate(&sample_rows());
    let summary: Vec<_> = counts
        .iter()
        .map(|c| {
            (
                c.key.chromosome.as_str(),
                c.key.variant_allele.as_str(),
                c.sample_count,
            )
        })
        .collect();
    assert_eq!(summary, vec![("1", "G", 1), ("1", "T", 2), ("17", "C", 1)]);
}
