//! Change plan (planner output, merge input) and the audit record a merge produces.

use serde::{Deserialize, Serialize};

use crate::resume::structured::{null_as_default, Project};

/// Additive edits proposed for a structured resume. Every category is optional;
/// an absent or `null` category is an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangePlan {
    #[serde(default, deserialize_with = "null_as_default")]
    pub add_skills: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub add_projects: Vec<Project>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub update_experience: Vec<ExperienceUpdate>,
}

/// Bullets to append to an existing experience entry. Never creates an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceUpdate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bullets_to_add: Vec<String>,
}

impl ChangePlan {
    pub fn is_empty(&self) -> bool {
        self.add_skills.is_empty()
            && self.add_projects.is_empty()
            && self.update_experience.is_empty()
    }
}

impl ExperienceUpdate {
    /// The title filter, if any. A blank title matches every title.
    pub fn title_filter(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }
}

/// What a merge actually did, as opposed to what the plan asked for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedSummary {
    pub skills_added: Vec<String>,
    /// Plan skills dropped because an equal skill (ignoring case) was already present.
    pub skills_skipped: Vec<String>,
    /// Titles of prepended projects, in plan order.
    pub projects_added: Vec<String>,
    /// One record per `update_experience` item, in plan order.
    pub experience: Vec<ExperienceMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceMatch {
    pub company: String,
    pub title: Option<String>,
    /// `None` when no existing entry matched and the update was dropped.
    pub matched: Option<MatchedEntry>,
    pub bullets_added: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedEntry {
    /// Position in `experience` at merge time.
    pub index: usize,
    pub company: String,
    pub title: String,
}

impl AppliedSummary {
    /// True when the merge left the resume unchanged.
    pub fn is_noop(&self) -> bool {
        self.skills_added.is_empty()
            && self.projects_added.is_empty()
            && self.experience.iter().all(|m| m.bullets_added == 0)
    }

    pub fn unmatched_updates(&self) -> usize {
        self.experience.iter().filter(|m| m.matched.is_none()).count()
    }
}
