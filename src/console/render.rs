use std::fmt::Write as _;

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use crate::core::time::format_timestamp;
use crate::page::alert::{AlertState, Severity};
use crate::page::controller::PageView;
use crate::page::detail::{DetailDialog, ScoreTone, StudentCard};
use crate::schemas::history::HistoryRecord;
use crate::schemas::pagination::PaginationModel;

const ROW_ACTIONS: &str = "view · delete · reeval";

pub(crate) const LOADING: &str = "Loading…";
pub(crate) const LOADING_DETAILS: &str = "Loading details…";
pub(crate) const DOWNLOADING: &str = "Downloading…";
pub(crate) const RE_EVALUATING: &str = "Re-evaluating…";

/// Busy line shown while a request is in flight.
pub(crate) fn pending(label: &str) -> String {
    label.dimmed().to_string()
}

/// Full screen for one page state. `fresh_alert` marks a notice the user has
/// not seen rendered yet.
pub(crate) fn page(view: &PageView<'_>, page_size_options: &[usize], fresh_alert: bool) -> String {
    let mut out = String::new();

    let user = view.user.as_ref().map(|user| user.label()).unwrap_or("not signed in");
    let _ = writeln!(out, "{} ({})", "Evaluation history".bold(), user);

    if view.loading {
        let _ = writeln!(out, "{}", pending(LOADING));
    }

    let _ = writeln!(out, "{}", records_table(view.rows));
    let _ = writeln!(out, "{}", footer(view.pagination, view.total_rows, page_size_options));

    if let Some(id) = view.pending_delete {
        let _ = writeln!(
            out,
            "{} Delete record {id}? This cannot be undone. [yes/no]",
            "?".yellow().bold()
        );
    }

    if view.view_loading {
        let _ = writeln!(out, "{}", pending(LOADING_DETAILS));
    }

    if let Some(dialog) = &view.detail {
        out.push_str(&detail(dialog));
    }

    if let Some(line) = alert(&view.alert, fresh_alert) {
        let _ = writeln!(out, "{line}");
    }

    out
}

/// Row numbers are page-local; commands address rows by them.
fn records_table(rows: &[HistoryRecord]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Title", "Category", "Created", "Actions"]);

    if rows.is_empty() {
        table.add_row(vec![Cell::new(""), Cell::new("No records".dimmed())]);
    }

    for (index, record) in rows.iter().enumerate() {
        let created = record.created_at.as_deref().map(format_timestamp).unwrap_or_default();
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&record.title),
            Cell::new(record.category.label()),
            Cell::new(created),
            Cell::new(ROW_ACTIONS),
        ]);
    }

    table.to_string()
}

fn footer(pagination: PaginationModel, total_rows: u64, page_size_options: &[usize]) -> String {
    let page_count = pagination.page_count(total_rows);
    let page = pagination.page.min(page_count - 1);
    let total = usize::try_from(total_rows).unwrap_or(usize::MAX);
    let end = ((page + 1) * pagination.page_size).min(total);
    let start = if total == 0 { 0 } else { (page * pagination.page_size + 1).min(end) };
    let options = page_size_options
        .iter()
        .map(|size| {
            if *size == pagination.page_size {
                format!("[{size}]")
            } else {
                size.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "Rows {start}-{end} of {total_rows} | page {} of {page_count} | per page: {options}",
        page + 1
    )
}

pub(crate) fn detail(dialog: &DetailDialog) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} [{}]", dialog.title.bold(), dialog.category_label);
    if !dialog.description.trim().is_empty() {
        let _ = writeln!(out, "{}", dialog.description);
    }
    if dialog.students.is_empty() {
        let _ = writeln!(out, "{}", "No student results.".dimmed());
    }

    for (index, student) in dialog.students.iter().enumerate() {
        out.push_str(&student_card(index + 1, student));
    }
    let _ = writeln!(out, "{}", "(close)".dimmed());

    out
}

fn student_card(number: usize, card: &StudentCard) -> String {
    let mut out = String::new();

    let score = format!("{:.1}%", card.score_percent);
    let score = match card.tone {
        ScoreTone::Pass => score.green().bold(),
        ScoreTone::Fail => score.red().bold(),
    };
    let actions = match &card.download {
        Some(action) => {
            let name = action.suggested_name.as_deref().unwrap_or("file");
            format!("  [download {number}: {name}] [rescore {number}]")
        }
        None => String::new(),
    };
    let _ = writeln!(out, "{number}. {} {score}{actions}", card.student_name.bold());

    if !card.reasoning.trim().is_empty() {
        let _ = writeln!(out, "   {}", card.reasoning);
    }
    for question in &card.questions {
        let mark = if question.correct { "✓".green() } else { "✗".red() };
        let _ = writeln!(out, "   {mark} Q{}: {}", question.number, question.question);
        let _ = writeln!(out, "     Answer: {}", question.student_answer);
        let _ = writeln!(out, "     Feedback: {}", question.feedback);
    }

    out
}

fn alert(state: &AlertState, fresh: bool) -> Option<String> {
    if !state.open {
        return None;
    }

    let label = format!("[{}]", state.severity);
    let label = match state.severity {
        Severity::Info => label.cyan(),
        Severity::Success => label.green(),
        Severity::Error => label.red(),
    };
    let line = format!("{label} {}", state.message);
    Some(if fresh { line.bold().to_string() } else { line })
}
