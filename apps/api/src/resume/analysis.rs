//! AI resume analysis: strengths, improvements and an ATS score.
//!
//! Independent of smart update; the result is stored alongside the resume and never
//! touches its structured data or version.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::info;

use crate::llm_client::prompts::{fill_placeholders, JSON_ONLY_SYSTEM};
use crate::llm_client::{LlmClient, LlmError};
use crate::resume::prompts::{ANALYSIS_PROMPT, ANALYSIS_SYSTEM};
use crate::resume::structured::{null_as_default, StructuredResume};

/// Feedback is allowed more latitude than planning.
const ANALYSIS_TEMPERATURE: f32 = 0.5;
const MAX_ATS_SCORE: u32 = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeAnalysis {
    #[serde(default, deserialize_with = "null_as_default")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub improvements: Vec<String>,
    #[serde(default, deserialize_with = "clamped_score")]
    pub ats_score: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub formatting_tips: Vec<String>,
}

/// Accepts any JSON number and clamps it to 0..=100. Anything else scores 0.
fn clamped_score<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let score = match raw {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(score.round().clamp(0.0, MAX_ATS_SCORE as f64) as u32)
}

pub async fn analyze_resume(
    resume: &StructuredResume,
    llm: &LlmClient,
) -> Result<ResumeAnalysis, LlmError> {
    let resume_json = serde_json::to_string_pretty(resume)?;
    let prompt = fill_placeholders(ANALYSIS_PROMPT, &[("{resume_json}", resume_json.as_str())]);
    let system = format!("{ANALYSIS_SYSTEM} {JSON_ONLY_SYSTEM}");

    let analysis: ResumeAnalysis = llm.call_json(&prompt, &system, ANALYSIS_TEMPERATURE).await?;
    info!(
        "Resume analysis complete: ATS score {}, {} improvements",
        analysis.ats_score,
        analysis.improvements.len()
    );
    Ok(analysis)
}
