//! End-to-end checks of the task engine through the public library API:
//! documents are built into task records, then filtered, grouped, sorted
//! and scored the way `tq list` does it.

use std::path::Path;

use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;

use tq::io::document_io::Document;
use tq::model::query::GroupKey;
use tq::model::repeat::RepeatRule;
use tq::model::task::TaskRecord;
use tq::ops::query::{apply_filters, build_filters, run_query};
use tq::ops::recurrence::next_occurrence;
use tq::ops::score::score;
use tq::ops::task_builder::{TaskRead, build_task};
use tq::parse::checklist::find_checklist_items;
use tq::parse::frontmatter::Frontmatter;
use tq::parse::query_parser::build_configuration;
use tq::util::date::end_of_day;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    day(2021, 6, 6)
}

/// Build a task record from document text, as the task store does
fn task(name: &str, text: &str) -> TaskRecord {
    let doc = Document::from_text(text);
    let items = find_checklist_items(&doc.lines);
    let path = format!("tasks/{name}.md");
    match build_task(Path::new(&path), text, &items, today()).unwrap() {
        TaskRead::Task(task) => task,
        other => panic!("{name} did not read as a task: {other:?}"),
    }
}

fn names(tasks: &[TaskRecord]) -> Vec<&str> {
    tasks.iter().map(|t| t.line.as_str()).collect()
}

/// Run a query and flatten its groups
fn query(lines: &[&str], tasks: &[TaskRecord]) -> Vec<String> {
    let config = build_configuration(lines);
    run_query(tasks, &config, today())
        .into_iter()
        .flat_map(|(_, tasks)| tasks)
        .map(|t| t.line)
        .collect()
}

// ---------------------------------------------------------------------------
// Filtering scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_completed_false_keeps_only_open_tasks() {
    let tasks = vec![
        task("a", "- [ ] unchecked no due\n"),
        task("b", "- [x] checked no due\n"),
        task("c", "---\ndue: 2021-06-06\n---\n- [x] checked due\n"),
    ];
    assert_eq!(query(&["completed: false"], &tasks), vec!["unchecked no due"]);
}

#[test]
fn test_select_day_keeps_that_day_and_undated_tasks() {
    let tasks = vec![
        task("a", "- [ ] no due\n"),
        task("b", "---\ndue: 2021-06-06\n---\n- [x] checked on the day\n"),
        task("c", "---\ndue: 2021-06-06\n---\n- [ ] open on the day\n"),
        task("d", "---\ndue: 2021-06-15\n---\n- [ ] later\n"),
    ];
    assert_eq!(
        query(&["select-day: 2021-06-06"], &tasks),
        vec!["no due", "checked on the day", "open on the day"]
    );
}

#[test]
fn test_select_tags_follows_tag_hierarchy() {
    let tasks = vec![
        task("a", "---\ntags: work/meetings\n---\n- [ ] standup\n"),
        task("b", "---\ntags: [work/email]\n---\n- [ ] inbox zero\n"),
        task("c", "---\ntags: home\n---\n- [ ] laundry\n"),
        task("d", "---\ntags: workshop\n---\n- [ ] sand the table\n"),
    ];
    assert_eq!(query(&["select-tags: work/email"], &tasks), vec!["inbox zero"]);
    assert_eq!(query(&["select-tags: work"], &tasks), vec!["standup", "inbox zero"]);
    assert_eq!(
        query(&["omit-tags: [work]"], &tasks),
        vec!["laundry", "sand the table"]
    );
}

#[test]
fn test_filters_are_idempotent() {
    let tasks = vec![
        task("a", "- [ ] no due\n"),
        task("b", "---\ndue: 2021-06-01\ntags: work\n---\n- [ ] overdue\n"),
        task("c", "---\ndue: 2021-06-09\n---\n- [x] done later\n"),
        task("d", "---\nhide-until: 2021-06-10\n---\n- [ ] hidden\n"),
    ];
    for lines in [
        vec!["completed: false"],
        vec!["overdue: false"],
        vec!["no-due: false", "select-tags: work"],
        vec!["select-week: 2021-06-09"],
    ] {
        let filters = build_filters(&build_configuration(&lines), today());
        let once = apply_filters(&tasks, &filters);
        let twice = apply_filters(&once, &filters);
        assert_eq!(names(&once), names(&twice), "query {lines:?}");
    }
}

#[test]
fn test_hidden_tasks_stay_out_until_their_day() {
    let tasks = vec![
        task("a", "---\nhide-until: 2021-06-10\n---\n- [ ] later\n"),
        task("b", "- [ ] now\n"),
    ];
    assert_eq!(query(&[], &tasks), vec!["now"]);
    // A selected day past the hide date reveals it
    assert_eq!(query(&["select-day: 2021-06-10"], &tasks), vec!["later", "now"]);
}

// ---------------------------------------------------------------------------
// Grouping and sorting
// ---------------------------------------------------------------------------

#[test]
fn test_group_by_due_puts_undated_last() {
    let tasks = vec![
        task("a", "- [ ] undated\n"),
        task("b", "---\ndue: 2021-06-09\n---\n- [ ] later\n"),
        task("c", "---\ndue: 2021-06-02\n---\n- [ ] earlier\n"),
        task("d", "---\ndue: 2021-06-09\n---\n- [ ] also later\n"),
    ];
    let config = build_configuration(&["group: due"]);
    let keys: Vec<GroupKey> = run_query(&tasks, &config, today())
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    assert_eq!(
        keys,
        vec![
            GroupKey::Due(day(2021, 6, 2)),
            GroupKey::Due(day(2021, 6, 9)),
            GroupKey::NoDue,
        ]
    );
}

#[test]
fn test_group_by_completed_puts_incomplete_first() {
    let tasks = vec![task("a", "- [x] done\n"), task("b", "- [ ] open\n")];
    let config = build_configuration(&["group: completed"]);
    let groups = run_query(&tasks, &config, today());
    assert_eq!(groups[0].0, GroupKey::Incomplete);
    assert_eq!(names(&groups[0].1), vec!["open"]);
    assert_eq!(groups[1].0, GroupKey::Complete);
}

#[test]
fn test_sort_by_due_then_by_score() {
    let tasks = vec![
        task("a", "- [ ] undated\n"),
        task("b", "---\ndue: 2021-06-08\n---\n- [ ] in two days\n"),
        task("c", "---\ndue: 2021-06-03\nurgent: true\n---\n- [ ] three days late\n"),
        task("d", "---\ndue: 2021-06-06\n---\n- [ ] today\n"),
        task("e", "---\ndue: 2021-06-04\n---\n- [x] finished\n"),
    ];
    assert_eq!(
        query(&["sort: due"], &tasks),
        vec!["three days late", "finished", "today", "in two days", "undated"]
    );
    assert_eq!(
        query(&["sort: score"], &tasks),
        vec!["three days late", "today", "undated", "in two days", "finished"]
    );
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[test]
fn test_checked_tasks_score_one() {
    for text in [
        "- [x] plain\n",
        "---\ndue: 2021-06-01\nurgent: true\nimportant: true\n---\n- [x] flagged and late\n",
        "---\ndue: 2021-07-01\n---\n- [X] far off\n",
    ] {
        assert_eq!(score(&task("t", text), today()), 1.0);
    }
}

#[test]
fn test_score_grows_as_deadline_nears() {
    let scores: Vec<f64> = (1..=6)
        .rev()
        .map(|days| {
            let due = today() + Duration::days(days);
            let text = format!("---\ndue: {}\n---\n- [ ] t\n", due.format("%Y-%m-%d"));
            score(&task("t", &text), today())
        })
        .collect();
    assert!(scores.windows(2).all(|w| w[0] < w[1]), "{scores:?}");
    assert_eq!(scores.last(), Some(&1.0));
}

// ---------------------------------------------------------------------------
// Recurrence
// ---------------------------------------------------------------------------

#[test]
fn test_last_day_of_month_lands_on_leap_day() {
    let rule = RepeatRule::from_text("every month on the last day").unwrap();
    let next = next_occurrence(&rule, end_of_day(day(2024, 2, 15))).unwrap();
    assert_eq!(next, day(2024, 2, 29));
}

#[test]
fn test_next_occurrence_is_strictly_after() {
    let rules = [
        "every day",
        "every 3 days",
        "every week on Monday and Thursday",
        "every 2 weeks",
        "every month on the 31st",
        "every year",
    ];
    for text in rules {
        let rule = RepeatRule::from_text(text).unwrap();
        for start in [day(2021, 1, 31), day(2021, 6, 6), day(2024, 2, 29), day(2021, 12, 31)] {
            let next = next_occurrence(&rule, end_of_day(start)).unwrap();
            assert!(next > start, "{text} after {start} gave {next}");
        }
    }
}

// ---------------------------------------------------------------------------
// Frontmatter
// ---------------------------------------------------------------------------

#[test]
fn test_frontmatter_round_trips_through_a_document() {
    let mut fm = Frontmatter::default();
    fm.set_repeat("every week on Monday");
    fm.set_tags(&["work/email".to_string(), "home".to_string()]);
    fm.set("urgent", true);
    fm.set("hide-until", "2021-06-10");
    fm.set("project", "garden");
    fm.set_completed(vec!["2021-05-31".to_string()]);

    let mut lines = vec!["- [ ] Water plants".to_string()];
    fm.serialize(&mut lines).unwrap();
    assert_eq!(lines.first().map(String::as_str), Some("---"));
    assert_eq!(lines.last().map(String::as_str), Some("- [ ] Water plants"));

    let parsed = Frontmatter::from_lines(&lines).unwrap();
    assert_eq!(parsed.keys(), fm.keys());
    for key in fm.keys() {
        assert_eq!(parsed.get(&key), fm.get(&key), "field {key}");
    }
}
