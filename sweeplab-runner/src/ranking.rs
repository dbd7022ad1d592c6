//! Ranking of variant results by total value.

use std::collections::HashSet;

use crate::report::{RankedRow, SummaryRow};

/// Longest key usable as a per-variant report sheet or file name.
pub const SHEET_KEY_MAX: usize = 31;

/// Order rows by `total_value` descending and number them from 1.
///
/// The sort is stable: variants with equal totals keep their generation order.
pub fn rank_rows(rows: &[SummaryRow]) -> Vec<RankedRow> {
    let mut sorted: Vec<&SummaryRow> = rows.iter().collect();
    sorted.sort_by(|a, b| b.total_value.total_cmp(&a.total_value));
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, row)| RankedRow {
            rank: i + 1,
            row: row.clone(),
        })
        .collect()
}

/// Truncate a variant name to at most [`SHEET_KEY_MAX`] characters.
pub fn sheet_key(name: &str) -> String {
    name.chars().take(SHEET_KEY_MAX).collect()
}

/// Sheet keys for one instrument's runs, in order, with no two alike.
///
/// A key that collides with an earlier one is re-truncated to make room for a
/// `~N` suffix.
pub fn unique_sheet_keys<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut taken = HashSet::new();
    let mut keys = Vec::new();
    for name in names {
        let mut key = sheet_key(name);
        let mut n = 1;
        while taken.contains(&key) {
            let suffix = format!("~{n}");
            let stem: String = name
                .chars()
                .take(SHEET_KEY_MAX - suffix.chars().count())
                .collect();
            key = format!("{stem}{suffix}");
            n += 1;
        }
        taken.insert(key.clone());
        keys.push(key);
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn row(variant: &str, total_value: f64) -> SummaryRow {
        SummaryRow {
            instrument: "BTCUSDT".into(),
            variant: variant.into(),
            kind: "rsi_threshold".into(),
            rsi_buy: Some(30.0),
            rsi_sell: Some(70.0),
            final_cash_value: total_value,
            reserve_accumulated: 0.0,
            total_value,
            profit: total_value - 1000.0,
            profit_pct: (total_value - 1000.0) / 10.0,
            trade_count: 0,
            parameters: BTreeMap::new(),
        }
    }

    #[test]
    fn ranks_by_total_value_descending() {
        let rows = vec![row("a", 990.0), row("b", 1050.0), row("c", 1010.0)];
        let ranked = rank_rows(&rows);
        let order: Vec<_> = ranked
            .iter()
            .map(|r| (r.rank, r.row.variant.as_str()))
            .collect();
        assert_eq!(order, vec![(1, "b"), (2, "c"), (3, "a")]);
    }

    #[test]
    fn ties_keep_generation_order() {
        let rows = vec![row("first", 1000.0), row("second", 1000.0), row("top", 1001.0)];
        let ranked = rank_rows(&rows);
        assert_eq!(ranked[0].row.variant, "top");
        assert_eq!(ranked[1].row.variant, "first");
        assert_eq!(ranked[2].row.variant, "second");
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn empty_input_empty_ranking() {
        assert!(rank_rows(&[]).is_empty());
    }

    #[test]
    fn sheet_key_truncates_long_names() {
        assert_eq!(sheet_key("SMA_5_15"), "SMA_5_15");
        let long = "Combo_30.123456_70.654321_SMA100000";
        assert_eq!(sheet_key(long).chars().count(), SHEET_KEY_MAX);
        assert!(long.starts_with(&sheet_key(long)));
    }

    #[test]
    fn sheet_key_respects_char_boundaries() {
        let name = "é".repeat(40);
        assert_eq!(sheet_key(&name), "é".repeat(SHEET_KEY_MAX));
    }

    #[test]
    fn unique_keys_suffix_collisions() {
        let keys = unique_sheet_keys([
            "Reversal_3",
            "Reversal_3",
            "Combo_30.123456_70.654321_SMA100000",
            "Combo_30.123456_70.654321_SMA100001",
        ]);
        assert_eq!(keys[0], "Reversal_3");
        assert_eq!(keys[1], "Reversal_3~1");
        assert_eq!(keys[2], "Combo_30.123456_70.654321_SMA10");
        assert_eq!(keys[3], "Combo_30.123456_70.654321_SMA~1");
        assert!(keys.iter().all(|k| k.chars().count() <= SHEET_KEY_MAX));
    }

    #[test]
    fn unique_keys_leave_distinct_names_alone() {
        assert_eq!(
            unique_sheet_keys(["SMA_5_15", "Reversal_3"]),
            vec!["SMA_5_15".to_string(), "Reversal_3".to_string()]
        );
    }

    proptest! {
        #[test]
        fn sheet_keys_are_always_unique(names in prop::collection::vec("[a-c]{0,40}", 0..30)) {
            let keys = unique_sheet_keys(names.iter().map(String::as_str));
            prop_assert_eq!(keys.len(), names.len());
            let distinct: HashSet<_> = keys.iter().collect();
            prop_assert_eq!(distinct.len(), keys.len());
            for key in &keys {
                prop_assert!(key.chars().count() <= SHEET_KEY_MAX);
            }
        }

        #[test]
        fn ranking_is_a_sorted_permutation(totals in prop::collection::vec(0.0..5000.0_f64, 0..40)) {
            let rows: Vec<_> = totals
                .iter()
                .enumerate()
                .map(|(i, &t)| row(&format!("v{i}"), t))
                .collect();
            let ranked = rank_rows(&rows);

            prop_assert_eq!(ranked.len(), rows.len());
            for (i, r) in ranked.iter().enumerate() {
                prop_assert_eq!(r.rank, i + 1);
            }
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].row.total_value >= pair[1].row.total_value);
            }
            let mut names: Vec<_> = ranked.iter().map(|r| r.row.variant.clone()).collect();
            names.sort();
            let mut expected: Vec<_> = rows.iter().map(|r| r.variant.clone()).collect();
            expected.sort();
            prop_assert_eq!(names, expected);
        }
    }
}
