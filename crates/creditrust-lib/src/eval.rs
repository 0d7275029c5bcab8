//! Batch evaluation: answer a fixed list of questions and record the results
//! as a CSV sheet for manual scoring.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use tracing::info;

use crate::config::EVAL_TOP_SOURCES;
use crate::pipeline::answer::{AnswerOutcome, AnswerPipeline};

/// Questions asked when no question file is given.
pub const SAMPLE_QUESTIONS: &[&str] = &[
    "What are common issues with credit card fraud?",
    "How do customers describe their problems with savings accounts?",
    "Are there complaints about Buy Now, Pay Later services?",
    "What complaints exist regarding personal loans?",
    "What issues do customers face with money transfers?",
];

/// One row of the evaluation sheet. The score and comments are left empty
/// for a reviewer to fill in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalRow {
    #[serde(rename = "Question")]
    pub question: String,
    #[serde(rename = "Generated Answer")]
    pub answer: String,
    /// JSON array of the nearest source excerpts.
    #[serde(rename = "Retrieved Sources")]
    pub sources: String,
    #[serde(rename = "Quality Score")]
    pub quality_score: Option<u8>,
    #[serde(rename = "Comments")]
    pub comments: String,
    #[serde(skip)]
    pub outcome: AnswerOutcome,
}

/// Answer one question and turn the result into a sheet row.
pub fn evaluate_question(pipeline: &AnswerPipeline, question: &str) -> anyhow::Result<EvalRow> {
    let answer = pipeline.answer(question)?;
    let outcome = answer.outcome;
    let (text, sources) = answer.into_parts();
    let top: Vec<&str> = sources
        .iter()
        .take(EVAL_TOP_SOURCES)
        .map(String::as_str)
        .collect();

    Ok(EvalRow {
        question: question.to_string(),
        answer: text,
        sources: serde_json::to_string(&top)?,
        quality_score: None,
        comments: String::new(),
        outcome,
    })
}

/// Evaluate every question in order. Questions without retrievable context
/// still get a row carrying the canned answer.
pub fn run_evaluation(
    pipeline: &AnswerPipeline,
    questions: &[String],
) -> anyhow::Result<Vec<EvalRow>> {
    let mut rows = Vec::with_capacity(questions.len());
    for question in questions {
        let row = evaluate_question(pipeline, question)
            .with_context(|| format!("Failed to evaluate question: {question}"))?;
        rows.push(row);
    }
    info!(rows = rows.len(), "Evaluation finished");
    Ok(rows)
}

/// Write rows as CSV with a header line.
pub fn write_csv<W: Write>(rows: &[EvalRow], writer: W) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row).context("Failed to write evaluation row")?;
    }
    csv.flush()?;
    Ok(())
}

/// Read a newline-delimited question file, skipping blank lines.
pub fn read_questions(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read questions from {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// The built-in sample questions as owned strings.
pub fn sample_questions() -> Vec<String> {
    SAMPLE_QUESTIONS.iter().map(|q| (*q).to_string()).collect()
}
