use thiserror::Error;

pub(crate) const HELP: &str = "\
Commands:
  next | prev            move one page
  page <n>               jump to page n
  size <n>               change rows per page
  view <row>             open the details of a row
  close                  close the details
  delete <row>           delete a row (asks for confirmation)
  yes | no               confirm or cancel the pending delete
  download <student>     save the file of a student in the open details
  rescore <student>      grade that student's file again
  reeval <row>           re-evaluate a row
  refresh                reload the current page
  dismiss                hide the notification
  help | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    Next,
    Previous,
    /// One-based page number.
    Page(usize),
    Size(usize),
    View(usize),
    Close,
    Delete(usize),
    Confirm,
    Cancel,
    Download(usize),
    Rescore(usize),
    ReEvaluate(usize),
    Refresh,
    Dismiss,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum CommandError {
    #[error("type a command, or `help`")]
    Empty,
    #[error("unknown command `{0}`; type `help`")]
    Unknown(String),
    #[error("`{0}` needs a number")]
    MissingArgument(&'static str),
    #[error("`{0}` is not a positive number")]
    InvalidNumber(String),
}

pub(crate) fn parse(line: &str) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Err(CommandError::Empty);
    };
    let argument = words.next();

    let command = match head.to_ascii_lowercase().as_str() {
        "next" | "n" => Command::Next,
        "prev" | "previous" | "p" => Command::Previous,
        "page" => Command::Page(number("page", argument)?),
        "size" => Command::Size(number("size", argument)?),
        "view" | "v" => Command::View(number("view", argument)?),
        "close" => Command::Close,
        "delete" | "rm" => Command::Delete(number("delete", argument)?),
        "yes" | "y" => Command::Confirm,
        "no" | "cancel" => Command::Cancel,
        "download" | "dl" => Command::Download(number("download", argument)?),
        "rescore" => Command::Rescore(number("rescore", argument)?),
        "reeval" | "re-evaluate" => Command::ReEvaluate(number("reeval", argument)?),
        "refresh" | "r" => Command::Refresh,
        "dismiss" => Command::Dismiss,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(command)
}

fn number(command: &'static str, argument: Option<&str>) -> Result<usize, CommandError> {
    let raw = argument.ok_or(CommandError::MissingArgument(command))?;
    match raw.parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(CommandError::InvalidNumber(raw.to_string())),
    }
}
