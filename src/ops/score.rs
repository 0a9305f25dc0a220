use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::model::task::TaskRecord;

/// Urgency score of a task on `today`.
///
/// Checked tasks score 1. Otherwise the score starts at 1 and is scaled by
/// `1 / days` when the task is due in the future, or `days / 2` when it is
/// due today (giving 0) or overdue (negative). Urgent doubles the score and
/// important scales it by 1.5.
pub fn score(task: &TaskRecord, today: NaiveDate) -> f64 {
    if task.checked {
        return 1.0;
    }

    let mut score = 1.0;
    if let Some(due) = task.due {
        let days = (due - today).num_days() as f64;
        if days > 0.0 {
            score *= 1.0 / days;
        } else {
            score *= days / 2.0;
        }
    }
    if task.urgent {
        score *= 2.0;
    }
    if task.important {
        score *= 1.5;
    }
    score
}

/// Rank of a task in a score-sorted list: due-now first, then upcoming,
/// then checked
fn band(task: &TaskRecord, score: f64) -> u8 {
    if task.checked {
        2
    } else if score <= 0.0 {
        0
    } else {
        1
    }
}

/// Display order by score.
///
/// Unchecked tasks due today or overdue come first, most overdue first.
/// Then the remaining unchecked tasks, highest score first. Checked tasks go
/// last.
pub fn compare_by_score(a: &TaskRecord, b: &TaskRecord, today: NaiveDate) -> Ordering {
    let sa = score(a, today);
    let sb = score(b, today);
    let (ba, bb) = (band(a, sa), band(b, sb));
    if ba != bb {
        return ba.cmp(&bb);
    }
    match ba {
        0 => sa.total_cmp(&sb),
        1 => sb.total_cmp(&sa),
        _ => Ordering::Equal,
    }
}
