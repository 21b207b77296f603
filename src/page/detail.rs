use crate::schemas::history::{HistoryDetail, QuestionDetail, StudentResult};

pub(crate) const PASS_THRESHOLD_PERCENT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScoreTone {
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DetailDialog {
    pub(crate) title: String,
    pub(crate) category_label: &'static str,
    pub(crate) description: String,
    pub(crate) students: Vec<StudentCard>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StudentCard {
    pub(crate) student_name: String,
    pub(crate) score_percent: f64,
    pub(crate) tone: ScoreTone,
    pub(crate) reasoning: String,
    pub(crate) download: Option<DownloadAction>,
    pub(crate) questions: Vec<QuestionLine>,
}

/// Arguments for the page's download action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DownloadAction {
    pub(crate) file_id: String,
    pub(crate) suggested_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QuestionLine {
    pub(crate) number: usize,
    pub(crate) question: String,
    pub(crate) student_answer: String,
    pub(crate) feedback: String,
    pub(crate) correct: bool,
}

pub(crate) fn render(detail: Option<&HistoryDetail>) -> Option<DetailDialog> {
    let detail = detail?;
    Some(DetailDialog {
        title: detail.title.clone(),
        category_label: detail.category.label(),
        description: detail.description.clone(),
        students: detail.results.iter().map(student_card).collect(),
    })
}

fn student_card(result: &StudentResult) -> StudentCard {
    let score_percent = clamp_percent(result.score_percent);
    StudentCard {
        student_name: result.student_name.clone(),
        score_percent,
        tone: score_tone(score_percent),
        reasoning: result.reasoning.clone(),
        download: result.downloadable_file().map(|file_id| DownloadAction {
            file_id: file_id.to_string(),
            suggested_name: result.suggested_filename().map(ToString::to_string),
        }),
        questions: result.details.iter().enumerate().map(question_line).collect(),
    }
}

fn question_line((index, detail): (usize, &QuestionDetail)) -> QuestionLine {
    QuestionLine {
        number: index + 1,
        question: detail.question.clone(),
        student_answer: detail.student_answer.clone().unwrap_or_default(),
        feedback: detail.feedback.clone(),
        correct: detail.is_correct,
    }
}

pub(crate) fn score_tone(score_percent: f64) -> ScoreTone {
    if score_percent >= PASS_THRESHOLD_PERCENT {
        ScoreTone::Pass
    } else {
        ScoreTone::Fail
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
