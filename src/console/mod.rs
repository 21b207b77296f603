mod commands;
mod render;

use std::io::Write as _;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;

use crate::core::shutdown;
use crate::page::controller::HistoryPage;
use crate::page::detail::StudentCard;
use crate::schemas::history::HistoryRecord;
use crate::schemas::pagination::PaginationModel;

use commands::{Command, HELP};

/// Result of applying one command.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    /// Command was not applied; the hint says why.
    Hint(String),
    Quit,
}

/// Line-driven front end for [`HistoryPage`].
pub(crate) struct Console {
    page: HistoryPage,
    page_size_options: Vec<usize>,
    last_alert: u64,
}

impl Console {
    pub(crate) fn new(page: HistoryPage, page_size_options: Vec<usize>) -> Self {
        Self { page, page_size_options, last_alert: 0 }
    }

    /// Runs until `quit`, end of input, Ctrl+C or the session ending.
    pub(crate) async fn run<R>(
        mut self,
        input: R,
        mut logged_out: watch::Receiver<bool>,
    ) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let interrupted = shutdown::interrupted();
        tokio::pin!(interrupted);

        self.page.mount().await;
        self.draw();

        loop {
            prompt()?;
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        tracing::debug!("input closed");
                        break;
                    };
                    match self.apply_line(&line).await {
                        Step::Quit => break,
                        Step::Hint(hint) => println!("{hint}"),
                        Step::Continue => self.draw(),
                    }
                }
                changed = logged_out.changed() => {
                    if changed.is_err() || *logged_out.borrow() {
                        println!("\nSigned out. Start again with a fresh token.");
                        break;
                    }
                }
                () = &mut interrupted => {
                    println!();
                    break;
                }
            }
        }

        tracing::info!("history console closed");
        Ok(())
    }

    async fn apply_line(&mut self, line: &str) -> Step {
        match commands::parse(line) {
            Ok(command) => self.apply(command).await,
            Err(err) => Step::Hint(err.to_string()),
        }
    }

    async fn apply(&mut self, command: Command) -> Step {
        let current = self.page.pagination();
        let total_rows = self.page.total_rows();

        match command {
            Command::Next => {
                if !current.has_next(total_rows) {
                    return Step::Hint("Already on the last page.".to_string());
                }
                self.change_page(PaginationModel::new(current.page + 1, current.page_size)).await;
            }
            Command::Previous => {
                if !current.has_previous() {
                    return Step::Hint("Already on the first page.".to_string());
                }
                self.change_page(PaginationModel::new(current.page - 1, current.page_size)).await;
            }
            Command::Page(number) => {
                let count = current.page_count(total_rows);
                if number > count {
                    return Step::Hint(format!("There are only {count} page(s)."));
                }
                self.change_page(PaginationModel::new(number - 1, current.page_size)).await;
            }
            Command::Size(size) => {
                if !self.page_size_options.contains(&size) {
                    return Step::Hint(format!(
                        "Rows per page must be one of: {}.",
                        join(&self.page_size_options)
                    ));
                }
                self.change_page(PaginationModel::new(0, size)).await;
            }
            Command::View(row) => {
                let Some(record) = self.row(row) else {
                    return self.no_such_row(row);
                };
                announce(render::LOADING_DETAILS);
                self.page.on_view_details(&record).await;
            }
            Command::Close => self.page.close_details(),
            Command::Delete(row) => {
                let Some(record) = self.row(row) else {
                    return self.no_such_row(row);
                };
                self.page.on_delete_click(record.id);
            }
            Command::Confirm => {
                if self.page.delete_id().is_none() {
                    return Step::Hint("Nothing to confirm.".to_string());
                }
                announce(render::LOADING);
                self.page.confirm_delete().await;
            }
            Command::Cancel => self.page.cancel_delete(),
            Command::Download(student) => {
                let action = match self.student_with_file(student) {
                    Ok(card) => card.download,
                    Err(hint) => return hint,
                };
                if let Some(action) = action {
                    announce(render::DOWNLOADING);
                    let name = action.suggested_name.as_deref();
                    self.page.download_file(Some(&action.file_id), name).await;
                }
            }
            Command::Rescore(student) => {
                if let Err(hint) = self.student_with_file(student) {
                    return hint;
                }
                announce(render::RE_EVALUATING);
                self.page.re_evaluate_student(student - 1).await;
            }
            Command::ReEvaluate(row) => {
                let Some(record) = self.row(row) else {
                    return self.no_such_row(row);
                };
                self.page.on_re_evaluate(&record);
            }
            Command::Refresh => {
                announce(render::LOADING);
                self.page.refresh().await;
            }
            Command::Dismiss => self.page.dismiss_alert(),
            Command::Help => return Step::Hint(HELP.to_string()),
            Command::Quit => return Step::Quit,
        }

        Step::Continue
    }

    async fn change_page(&mut self, model: PaginationModel) {
        if model != self.page.pagination() {
            announce(render::LOADING);
            self.page.on_pagination_model_change(model).await;
        }
    }

    /// Card of a one-based student in the open detail, if a file was submitted.
    fn student_with_file(&self, student: usize) -> Result<StudentCard, Step> {
        let Some(dialog) = self.page.view().detail else {
            return Err(Step::Hint("Open a record with `view <row>` first.".to_string()));
        };
        let Some(card) = dialog.students.into_iter().nth(student - 1) else {
            return Err(Step::Hint(format!("No student {student} in this record.")));
        };
        if card.download.is_none() {
            return Err(Step::Hint(format!("{} has no submitted file.", card.student_name)));
        }
        Ok(card)
    }

    fn row(&self, row: usize) -> Option<HistoryRecord> {
        self.page.records().get(row.checked_sub(1)?).cloned()
    }

    fn no_such_row(&self, row: usize) -> Step {
        Step::Hint(format!("No row {row} on this page ({} shown).", self.page.records().len()))
    }

    fn draw(&mut self) {
        let view = self.page.view();
        let fresh = view.alert.open && view.alert.sequence > self.last_alert;
        if view.alert.open {
            self.last_alert = view.alert.sequence;
        }
        println!("{}", render::page(&view, &self.page_size_options, fresh));
    }
}

/// Printed before an awaited request; the page is redrawn once it settles.
fn announce(label: &str) {
    println!("{}", render::pending(label));
}

fn prompt() -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()
}

fn join(values: &[usize]) -> String {
    values.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
