//! Update planner — turns free-text updates into a `ChangePlan`.
//!
//! Pluggable and trait-based like every other model-backed component: `UpdateService`
//! holds an `Arc<dyn UpdatePlanner>`, the default being `LlmUpdatePlanner`. Tests swap in
//! a scripted planner.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::llm_client::prompts::{
    fill_placeholders, JSON_ONLY_SYSTEM, NO_FABRICATION_INSTRUCTION,
};
use crate::llm_client::{LlmClient, LlmError};
use crate::resume::plan::ChangePlan;
use crate::resume::prompts::{UPDATE_PLAN_PROMPT, UPDATE_PLAN_SYSTEM};
use crate::resume::structured::StructuredResume;

/// Low temperature: the plan should extract, not create.
const PLANNING_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("planner model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("could not serialize current resume for the planner: {0}")]
    Snapshot(#[source] serde_json::Error),
}

#[async_trait]
pub trait UpdatePlanner: Send + Sync {
    /// Proposes additive edits to `current` implied by `update_text`.
    async fn plan(
        &self,
        current: &StructuredResume,
        update_text: &str,
    ) -> Result<ChangePlan, PlannerError>;
}

/// Default planner backed by the shared `LlmClient`.
pub struct LlmUpdatePlanner {
    llm: LlmClient,
}

impl LlmUpdatePlanner {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl UpdatePlanner for LlmUpdatePlanner {
    async fn plan(
        &self,
        current: &StructuredResume,
        update_text: &str,
    ) -> Result<ChangePlan, PlannerError> {
        let prompt = build_plan_prompt(current, update_text)?;
        let system = format!("{UPDATE_PLAN_SYSTEM} {NO_FABRICATION_INSTRUCTION} {JSON_ONLY_SYSTEM}");

        let plan: ChangePlan = self
            .llm
            .call_json(&prompt, &system, PLANNING_TEMPERATURE)
            .await?;

        debug!(
            "Planner proposed {} skills, {} projects, {} experience updates",
            plan.add_skills.len(),
            plan.add_projects.len(),
            plan.update_experience.len()
        );
        Ok(plan)
    }
}

fn build_plan_prompt(current: &StructuredResume, update_text: &str) -> Result<String, PlannerError> {
    let current_json = serde_json::to_string_pretty(current).map_err(PlannerError::Snapshot)?;
    Ok(fill_placeholders(
        UPDATE_PLAN_PROMPT,
        &[
            ("{current_resume}", current_json.as_str()),
            ("{update_text}", update_text.trim()),
        ],
    ))
}
