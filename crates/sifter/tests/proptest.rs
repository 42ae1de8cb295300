//! Property-based tests for sifter using proptest.

use std::cmp::Ordering;

use proptest::prelude::*;
use serde_json::{json, Value as Json};
use sifter::{
    filter, json_value, matches_all, search, search_positions, sort, FilterDefinition, Filters,
    Number, PageInfo, Pagination, Record, SearchIndex, SortSpec, Value,
};

// ============================================================================
// Test helpers
// ============================================================================

#[derive(Debug, Clone)]
struct Row {
    name: String,
    team: String,
    score: Option<i64>,
}

impl Record for Row {
    fn field_value(&self, field: &str) -> Value<'_> {
        match field {
            "name" => Value::String(&self.name),
            "team" => Value::String(&self.team),
            "score" => self
                .score
                .map_or(Value::None, |s| Value::Number(Number::I64(s))),
            _ => Value::None,
        }
    }

    fn field_values(&self) -> Vec<(&str, Value<'_>)> {
        ["name", "team", "score"]
            .into_iter()
            .map(|field| (field, self.field_value(field)))
            .collect()
    }
}

fn row_strategy() -> impl Strategy<Value = Row> {
    (
        "[a-zA-Z]{0,8}",
        prop::sample::select(vec!["red", "blue", "green"]),
        prop::option::of(-50i64..50),
    )
        .prop_map(|(name, team, score)| Row {
            name,
            team: team.to_string(),
            score,
        })
}

fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(row_strategy(), 0..60)
}

// A loosely typed column: numbers, numeric strings, words and nulls.
fn mixed_cell_strategy() -> impl Strategy<Value = Json> {
    prop_oneof![
        (-1000i64..1000).prop_map(|n| json!(n)),
        (-1000.0f64..1000.0).prop_map(|f| json!(f)),
        (-1000i64..1000).prop_map(|n| json!(n.to_string())),
        "[a-zA-Z]{1,4}".prop_map(|s| json!(s)),
        Just(Json::Null),
    ]
}

fn mixed_rows_strategy() -> impl Strategy<Value = Vec<Json>> {
    prop::collection::vec(mixed_cell_strategy().prop_map(|v| json!({ "v": v })), 0..450)
}

fn definitions() -> Vec<FilterDefinition> {
    vec![
        FilterDefinition::select("team", "Team", []),
        FilterDefinition::text("name", "Name"),
        FilterDefinition::number("score", "Score"),
    ]
}

fn fields() -> Vec<String> {
    vec!["name".to_string(), "team".to_string()]
}

fn same_rows(a: &[&Row], b: &[&Row]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| std::ptr::eq(*x, *y))
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Search never grows the collection and every hit contains the term.
    #[test]
    fn search_yields_matching_subset(rows in rows_strategy(), term in "[a-z]{1,3}") {
        let hits = search(&rows, &term, &fields());
        prop_assert!(hits.len() <= rows.len());
        for row in hits {
            let name = row.name.to_lowercase();
            prop_assert!(name.contains(&term) || row.team.contains(&term));
        }
    }

    /// A blank term matches every record.
    #[test]
    fn blank_search_matches_all(rows in rows_strategy(), spaces in " {0,4}") {
        prop_assert_eq!(search(&rows, &spaces, &fields()).len(), rows.len());
    }

    /// The prebuilt index returns what a direct scan returns.
    #[test]
    fn index_agrees_with_scan(rows in rows_strategy(), term in "[a-zA-Z]{0,3}") {
        let index = SearchIndex::build(&rows, &fields());
        prop_assert_eq!(index.search(&term), search_positions(&rows, &term, &fields()));
    }

    /// Filtering with several values equals filtering with each in turn.
    #[test]
    fn filters_compose_as_and(
        rows in rows_strategy(),
        team in prop::sample::select(vec!["red", "blue", "green"]),
        name in "[a-z]{0,2}",
    ) {
        let defs = definitions();
        let both: Filters = [("team", team), ("name", name.as_str())].into_iter().collect();
        let by_team: Filters = [("team", team)].into_iter().collect();
        let by_name: Filters = [("name", name.as_str())].into_iter().collect();

        let combined = filter(&rows, &defs, &both);
        let stepwise: Vec<&Row> = filter(&rows, &defs, &by_team)
            .into_iter()
            .filter(|row| matches_all(*row, &defs, &by_name))
            .collect();
        prop_assert!(same_rows(&combined, &stepwise));
    }

    /// Filters with no active value pass everything through unchanged.
    #[test]
    fn empty_filters_are_identity(rows in rows_strategy()) {
        let filters: Filters = [("team", ""), ("name", "")].into_iter().collect();
        let all: Vec<&Row> = rows.iter().collect();
        prop_assert!(same_rows(&filter(&rows, &definitions(), &filters), &all));
    }

    /// Sorting is a permutation with nulls at the end in both directions.
    #[test]
    fn sort_is_permutation_with_nulls_last(rows in rows_strategy(), desc in any::<bool>()) {
        let spec = if desc { SortSpec::desc("score") } else { SortSpec::asc("score") };
        let sorted = sort(&rows, Some(&spec));
        prop_assert_eq!(sorted.len(), rows.len());

        let first_null = sorted.iter().position(|r| r.score.is_none()).unwrap_or(sorted.len());
        prop_assert!(sorted[first_null..].iter().all(|r| r.score.is_none()));

        let scores: Vec<i64> = sorted[..first_null].iter().filter_map(|r| r.score).collect();
        for pair in scores.windows(2) {
            if desc {
                prop_assert!(pair[0] >= pair[1]);
            } else {
                prop_assert!(pair[0] <= pair[1]);
            }
        }
    }

    /// Flipping direction reverses the non-null keys.
    #[test]
    fn flipping_direction_reverses_keys(rows in rows_strategy()) {
        let asc: Vec<Option<i64>> = sort(&rows, Some(&SortSpec::asc("score")))
            .iter()
            .map(|r| r.score)
            .filter(Option::is_some)
            .collect();
        let mut desc: Vec<Option<i64>> = sort(&rows, Some(&SortSpec::desc("score")))
            .iter()
            .map(|r| r.score)
            .filter(Option::is_some)
            .collect();
        desc.reverse();
        prop_assert_eq!(asc, desc);
    }

    /// Sorting a column of mixed types yields a consistent order in both
    /// directions, and flipping direction reverses the defined entries.
    #[test]
    fn mixed_column_sorts_consistently(rows in mixed_rows_strategy()) {
        let asc = SortSpec::asc("v");
        let desc = SortSpec::desc("v");
        let up = sort(&rows, Some(&asc));
        let down = sort(&rows, Some(&desc));

        for (spec, sorted) in [(&asc, &up), (&desc, &down)] {
            for pair in sorted.windows(2) {
                let (a, b) = (json_value(&pair[0]["v"]), json_value(&pair[1]["v"]));
                prop_assert_ne!(spec.compare(&a, &b), Ordering::Greater);
            }
        }

        let defined = |sorted: &[&Json]| -> Vec<Json> {
            sorted.iter().map(|r| r["v"].clone()).filter(|v| !v.is_null()).collect()
        };
        let mut reversed = defined(&down);
        reversed.reverse();
        let forward = defined(&up);
        prop_assert_eq!(forward.len(), reversed.len());
        for (a, b) in forward.iter().zip(&reversed) {
            prop_assert_eq!(asc.compare(&json_value(a), &json_value(b)), Ordering::Equal);
        }
    }

    /// Walking every page covers each result exactly once, in order.
    #[test]
    fn pages_partition_results(total in 0usize..200, size in 1usize..25) {
        let info = PageInfo::new(1, size, total);
        let mut covered = Vec::new();
        for page in 1..=info.total_pages {
            covered.extend(PageInfo::new(page, size, total).range());
        }
        prop_assert_eq!(covered, (0..total).collect::<Vec<_>>());
    }

    /// Page bounds always describe a valid, clamped page.
    #[test]
    fn page_info_is_clamped(requested in 0usize..1000, size in 0usize..30, total in 0usize..500) {
        let info = PageInfo::new(requested, size, total);
        prop_assert!(info.current_page >= 1);
        prop_assert!(info.current_page <= info.total_pages.max(1));
        prop_assert!(info.end_item <= total);
        if total > 0 {
            prop_assert!(info.start_item >= 1);
            prop_assert!(info.start_item <= info.end_item);
            prop_assert!(info.end_item - info.start_item < info.page_size);
        } else {
            prop_assert_eq!((info.start_item, info.end_item), (0, 0));
        }
    }

    /// Jumping to a page is clamped and idempotent.
    #[test]
    fn go_to_is_idempotent(page in any::<i64>(), size in 1usize..20, total in 0usize..300) {
        let mut once = Pagination::new(size);
        once.go_to(page, total);
        let mut twice = once;
        twice.go_to(once.requested_page() as i64, total);
        prop_assert_eq!(once, twice);
        prop_assert!(once.requested_page() >= 1);
        prop_assert!(once.requested_page() <= once.info(total).total_pages.max(1));
    }
}
