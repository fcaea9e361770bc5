//! Smart update — fetch → plan → merge → persist for one resume.
//!
//! All-or-nothing: any failure before the store call leaves the stored resume exactly as
//! it was, and so does dropping the future midway. Updates to the same resume are
//! serialized by `ResumeLocks`; writers in other processes are caught by the store's
//! version check and surface as `UpdateError::Conflict`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::resume::locks::ResumeLocks;
use crate::resume::merge::{merge, MergeOutcome};
use crate::resume::plan::{AppliedSummary, ChangePlan};
use crate::resume::planner::{PlannerError, UpdatePlanner};
use crate::resume::store::{ResumeStore, StoreError, VersionedWrite};
use crate::resume::structured::StructuredResume;

/// Result of a smart update, returned for audit and display.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub resume_id: Uuid,
    /// Stored version holding `updated_resume`, or the untouched prior version when
    /// the write failed.
    pub version: i32,
    pub original_plan: ChangePlan,
    pub applied: AppliedSummary,
    pub updated_resume: StructuredResume,
}

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("resume {0} not found")]
    NotFound(Uuid),

    #[error("resume {0} has no structured data to update")]
    PreconditionFailed(Uuid),

    #[error("stored data for resume {resume_id} is not a readable resume: {source}")]
    CorruptRecord {
        resume_id: Uuid,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load resume: {0}")]
    Fetch(#[source] StoreError),

    #[error("update planner failed: {0}")]
    Planner(#[source] PlannerError),

    #[error("update planner timed out after {0:?}")]
    PlannerTimeout(Duration),

    #[error("resume {0} was changed by another update; retry")]
    Conflict(Uuid),

    /// The merge succeeded but was not saved. `outcome` is for display only.
    #[error("failed to store updated resume: {source}")]
    Persistence {
        #[source]
        source: StoreError,
        outcome: Box<UpdateOutcome>,
    },
}

pub struct UpdateService {
    planner: Arc<dyn UpdatePlanner>,
    store: Arc<dyn ResumeStore>,
    locks: ResumeLocks,
    planner_timeout: Duration,
}

impl UpdateService {
    pub fn new(
        planner: Arc<dyn UpdatePlanner>,
        store: Arc<dyn ResumeStore>,
        planner_timeout: Duration,
    ) -> Self {
        Self {
            planner,
            store,
            locks: ResumeLocks::new(),
            planner_timeout,
        }
    }

    /// Applies a free-text update to the caller's resume and stores the result as a new version.
    pub async fn apply_update(
        &self,
        resume_id: Uuid,
        user_id: Uuid,
        update_text: &str,
    ) -> Result<UpdateOutcome, UpdateError> {
        let _guard = self.locks.acquire(resume_id).await;

        // Step 1: load the current version (owner-scoped)
        let row = self
            .store
            .fetch(resume_id, user_id)
            .await
            .map_err(UpdateError::Fetch)?
            .ok_or(UpdateError::NotFound(resume_id))?;

        let stored = row.parsed_data.unwrap_or(Value::Null);
        let current = StructuredResume::from_stored(&stored)
            .map_err(|source| UpdateError::CorruptRecord { resume_id, source })?
            .ok_or(UpdateError::PreconditionFailed(resume_id))?;

        // Step 2: plan
        let plan = match tokio::time::timeout(
            self.planner_timeout,
            self.planner.plan(&current, update_text),
        )
        .await
        {
            Ok(Ok(plan)) => plan,
            Ok(Err(e)) => {
                warn!("Planner failed for resume {resume_id}: {e}");
                return Err(UpdateError::Planner(e));
            }
            Err(_) => {
                warn!(
                    "Planner timed out for resume {resume_id} after {:?}",
                    self.planner_timeout
                );
                return Err(UpdateError::PlannerTimeout(self.planner_timeout));
            }
        };

        if plan.is_empty() {
            info!("Planner found nothing to apply for resume {resume_id}");
        }

        // Step 3: merge
        let MergeOutcome {
            resume: updated,
            applied,
        } = merge(&current, &plan);
        if applied.is_noop() {
            info!("Update for resume {resume_id} is a no-op");
        }
        info!(
            "Merged update into resume {}: +{} skills, +{} projects, {} experience updates ({} unmatched)",
            resume_id,
            applied.skills_added.len(),
            applied.projects_added.len(),
            applied.experience.len(),
            applied.unmatched_updates()
        );

        // Step 4: persist
        let stored = self
            .store
            .store(VersionedWrite {
                resume_id,
                expected_version: row.version,
                resume: &updated,
                plan: &plan,
            })
            .await;

        match stored {
            Ok(version) => Ok(UpdateOutcome {
                resume_id,
                version,
                original_plan: plan,
                applied,
                updated_resume: updated,
            }),
            Err(StoreError::StaleVersion { .. }) => {
                warn!("Resume {resume_id} moved past version {} during update", row.version);
                Err(UpdateError::Conflict(resume_id))
            }
            Err(source) => Err(UpdateError::Persistence {
                source,
                outcome: Box::new(UpdateOutcome {
                    resume_id,
                    version: row.version,
                    original_plan: plan,
                    applied,
                    updated_resume: updated,
                }),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::llm_client::LlmError;
    use crate::resume::plan::ExperienceUpdate;
    use crate::resume::store::memory::InMemoryResumeStore;
    use crate::resume::structured::Project;

    enum Script {
        Fixed(ChangePlan),
        /// Adds the update text as a skill, after a short pause.
        EchoSkill,
        Fail,
        Hang,
    }

    struct ScriptedPlanner {
        script: Script,
        calls: AtomicUsize,
    }

    impl ScriptedPlanner {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UpdatePlanner for ScriptedPlanner {
        async fn plan(
            &self,
            _current: &StructuredResume,
            update_text: &str,
        ) -> Result<ChangePlan, PlannerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.script {
                Script::Fixed(plan) => Ok(plan.clone()),
                Script::EchoSkill => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(ChangePlan {
                        add_skills: vec![update_text.to_string()],
                        ..Default::default()
                    })
                }
                Script::Fail => Err(PlannerError::Llm(LlmError::EmptyContent)),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(ChangePlan::default())
                }
            }
        }
    }

    fn initial_resume() -> Value {
        json!({
            "name": "Ada",
            "skills": ["Python", "FastAPI"],
            "projects": [],
            "experience": [
                {"company": "Tech Corp", "title": "Developer", "bullets": ["Wrote code"]}
            ]
        })
    }

    fn scenario_plan() -> ChangePlan {
        ChangePlan {
            add_skills: vec!["Docker".to_string(), "Kubernetes".to_string()],
            add_projects: vec![Project {
                title: "New AI App".to_string(),
                company: "Personal".to_string(),
                duration: "2024".to_string(),
                bullets: vec!["Built an agent".to_string()],
                ..Default::default()
            }],
            update_experience: vec![ExperienceUpdate {
                company: "Tech Corp".to_string(),
                title: Some("Developer".to_string()),
                bullets_to_add: vec!["Led team meeting".to_string()],
            }],
        }
    }

    fn service(planner: Arc<ScriptedPlanner>, store: Arc<InMemoryResumeStore>) -> UpdateService {
        UpdateService::new(planner, store, Duration::from_secs(5))
    }

    fn stored_resume(store: &InMemoryResumeStore, id: Uuid) -> StructuredResume {
        let row = store.get(id).unwrap();
        serde_json::from_value(row.parsed_data.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_apply_update_merges_and_persists() {
        let store = Arc::new(InMemoryResumeStore::new());
        let user = Uuid::new_v4();
        let id = store.insert(user, Some(initial_resume()));
        let planner = ScriptedPlanner::new(Script::Fixed(scenario_plan()));
        let svc = service(planner.clone(), store.clone());

        let outcome = svc
            .apply_update(id, user, "I learned Docker and built an AI app.")
            .await
            .unwrap();

        assert_eq!(outcome.version, 2);
        assert_eq!(outcome.original_plan, scenario_plan());
        assert_eq!(
            outcome.updated_resume.skills,
            vec!["Python", "FastAPI", "Docker", "Kubernetes"]
        );
        assert_eq!(outcome.updated_resume.projects[0].title, "New AI App");
        assert_eq!(
            outcome.updated_resume.experience[0].bullets,
            vec!["Wrote code", "Led team meeting"]
        );

        let saved = stored_resume(&store, id);
        assert_eq!(saved, outcome.updated_resume);
        assert_eq!(saved.name.as_deref(), Some("Ada"));
        assert_eq!(store.get(id).unwrap().version, 2);
        assert_eq!(planner.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_resume_is_not_found() {
        let store = Arc::new(InMemoryResumeStore::new());
        let planner = ScriptedPlanner::new(Script::Fixed(scenario_plan()));
        let svc = service(planner.clone(), store);

        let err = svc
            .apply_update(Uuid::new_v4(), Uuid::new_v4(), "anything")
            .await
            .unwrap_err();

        assert!(matches!(err, UpdateError::NotFound(_)));
        assert_eq!(planner.calls(), 0);
    }

    #[tokio::test]
    async fn test_other_users_resume_is_not_found() {
        let store = Arc::new(InMemoryResumeStore::new());
        let id = store.insert(Uuid::new_v4(), Some(initial_resume()));
        let planner = ScriptedPlanner::new(Script::Fixed(scenario_plan()));
        let svc = service(planner.clone(), store.clone());

        let err = svc.apply_update(id, Uuid::new_v4(), "anything").await.unwrap_err();

        assert!(matches!(err, UpdateError::NotFound(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_structured_data_is_precondition_failure() {
        let store = Arc::new(InMemoryResumeStore::new());
        let user = Uuid::new_v4();
        let unparsed = store.insert(user, None);
        let empty = store.insert(user, Some(json!({})));
        let empty_sections = store.insert(
            user,
            Some(json!({"certifications": [], "education": [], "experience": [], "projects": [], "skills": []})),
        );
        let planner = ScriptedPlanner::new(Script::Fixed(scenario_plan()));
        let svc = service(planner.clone(), store.clone());

        for id in [unparsed, empty, empty_sections] {
            let err = svc.apply_update(id, user, "anything").await.unwrap_err();
            assert!(matches!(err, UpdateError::PreconditionFailed(_)));
        }
        assert_eq!(planner.calls(), 0);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_structured_data_is_corrupt_record() {
        let store = Arc::new(InMemoryResumeStore::new());
        let user = Uuid::new_v4();
        let id = store.insert(user, Some(json!({"skills": "Python, Go"})));
        let planner = ScriptedPlanner::new(Script::Fixed(scenario_plan()));
        let svc = service(planner.clone(), store);

        let err = svc.apply_update(id, user, "anything").await.unwrap_err();

        assert!(matches!(err, UpdateError::CorruptRecord { .. }));
        assert_eq!(planner.calls(), 0);
    }

    #[tokio::test]
    async fn test_planner_failure_leaves_resume_untouched() {
        let store = Arc::new(InMemoryResumeStore::new());
        let user = Uuid::new_v4();
        let id = store.insert(user, Some(initial_resume()));
        let before = store.get(id).unwrap();
        let svc = service(ScriptedPlanner::new(Script::Fail), store.clone());

        let err = svc.apply_update(id, user, "anything").await.unwrap_err();

        assert!(matches!(err, UpdateError::Planner(_)));
        let after = store.get(id).unwrap();
        assert_eq!(after.version, before.version);
        assert_eq!(after.parsed_data, before.parsed_data);
    }

    #[tokio::test(start_paused = true)]
    async fn test_planner_timeout_leaves_resume_untouched() {
        let store = Arc::new(InMemoryResumeStore::new());
        let user = Uuid::new_v4();
        let id = store.insert(user, Some(initial_resume()));
        let svc = UpdateService::new(
            ScriptedPlanner::new(Script::Hang),
            store.clone(),
            Duration::from_secs(30),
        );

        let err = svc.apply_update(id, user, "anything").await.unwrap_err();

        assert!(matches!(err, UpdateError::PlannerTimeout(d) if d == Duration::from_secs(30)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_returns_unsaved_outcome() {
        let store = Arc::new(InMemoryResumeStore::new());
        let user = Uuid::new_v4();
        let id = store.insert(user, Some(initial_resume()));
        store.fail_writes(true);
        let svc = service(ScriptedPlanner::new(Script::Fixed(scenario_plan())), store.clone());

        let err = svc.apply_update(id, user, "anything").await.unwrap_err();

        match err {
            UpdateError::Persistence { outcome, .. } => {
                assert_eq!(outcome.version, 1);
                assert!(outcome.updated_resume.skills.contains(&"Docker".to_string()));
            }
            other => panic!("expected persistence error, got {other:?}"),
        }
        assert_eq!(stored_resume(&store, id).skills, vec!["Python", "FastAPI"]);
    }

    #[tokio::test]
    async fn test_stale_version_is_conflict() {
        // A writer in another process moves the version between our fetch and store.
        struct BumpingPlanner(Arc<InMemoryResumeStore>, Uuid);

        #[async_trait]
        impl UpdatePlanner for BumpingPlanner {
            async fn plan(
                &self,
                _current: &StructuredResume,
                _update_text: &str,
            ) -> Result<ChangePlan, PlannerError> {
                self.0.bump_version(self.1);
                Ok(ChangePlan::default())
            }
        }

        let store = Arc::new(InMemoryResumeStore::new());
        let user = Uuid::new_v4();
        let id = store.insert(user, Some(initial_resume()));
        let svc = UpdateService::new(
            Arc::new(BumpingPlanner(store.clone(), id)),
            store.clone(),
            Duration::from_secs(5),
        );

        let err = svc.apply_update(id, user, "anything").await.unwrap_err();

        assert!(matches!(err, UpdateError::Conflict(conflicted) if conflicted == id));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_updates_to_same_resume_are_not_lost() {
        let store = Arc::new(InMemoryResumeStore::new());
        let user = Uuid::new_v4();
        let id = store.insert(user, Some(initial_resume()));
        let svc = Arc::new(service(ScriptedPlanner::new(Script::EchoSkill), store.clone()));

        let a = tokio::spawn({
            let svc = svc.clone();
            async move { svc.apply_update(id, user, "Docker").await }
        });
        let b = tokio::spawn({
            let svc = svc.clone();
            async move { svc.apply_update(id, user, "Terraform").await }
        });

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let saved = stored_resume(&store, id);
        assert!(saved.skills.contains(&"Docker".to_string()));
        assert!(saved.skills.contains(&"Terraform".to_string()));
        assert_eq!(store.get(id).unwrap().version, 3);
    }

    #[tokio::test]
    async fn test_repeated_update_does_not_duplicate_skills() {
        let store = Arc::new(InMemoryResumeStore::new());
        let user = Uuid::new_v4();
        let id = store.insert(user, Some(initial_resume()));
        let plan = ChangePlan {
            add_skills: vec!["docker".to_string()],
            ..Default::default()
        };
        let svc = service(ScriptedPlanner::new(Script::Fixed(plan)), store.clone());

        svc.apply_update(id, user, "I use docker").await.unwrap();
        let second = svc.apply_update(id, user, "I use docker").await.unwrap();

        assert_eq!(second.version, 3);
        assert!(second.applied.skills_added.is_empty());
        let docker_count = stored_resume(&store, id)
            .skills
            .iter()
            .filter(|s| s.eq_ignore_ascii_case("docker"))
            .count();
        assert_eq!(docker_count, 1);
    }
}
