//! Merge engine — applies a `ChangePlan` onto a `StructuredResume`.
//!
//! Pure and total: no I/O, no errors. Merges are additive only; nothing already in the
//! resume is removed, reordered or rewritten. Phases run in a fixed order:
//! skills, then projects, then experience.

use std::collections::HashSet;

use crate::resume::plan::{
    AppliedSummary, ChangePlan, ExperienceMatch, ExperienceUpdate, MatchedEntry,
};
use crate::resume::structured::{ExperienceEntry, Project, StructuredResume};

/// The merged resume together with the audit record of what changed.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub resume: StructuredResume,
    pub applied: AppliedSummary,
}

/// Applies `plan` to a copy of `resume`. Fields the plan does not touch are carried through.
pub fn merge(resume: &StructuredResume, plan: &ChangePlan) -> MergeOutcome {
    let mut merged = resume.clone();
    let mut applied = AppliedSummary::default();

    merge_skills(&mut merged.skills, &plan.add_skills, &mut applied);
    merge_projects(&mut merged.projects, &plan.add_projects, &mut applied);
    merge_experience(&mut merged.experience, &plan.update_experience, &mut applied);

    MergeOutcome {
        resume: merged,
        applied,
    }
}

/// Appends skills not already present (ignoring case), in plan order.
/// Duplicates inside the plan itself collapse to their first occurrence.
fn merge_skills(skills: &mut Vec<String>, additions: &[String], applied: &mut AppliedSummary) {
    let mut seen: HashSet<String> = skills.iter().map(|s| s.to_lowercase()).collect();

    for skill in additions {
        if seen.insert(skill.to_lowercase()) {
            skills.push(skill.clone());
            applied.skills_added.push(skill.clone());
        } else {
            applied.skills_skipped.push(skill.clone());
        }
    }
}

/// Prepends projects one at a time, so the LAST project in the plan ends up first.
/// No deduplication.
fn merge_projects(projects: &mut Vec<Project>, additions: &[Project], applied: &mut AppliedSummary) {
    projects.splice(0..0, additions.iter().rev().cloned());
    applied
        .projects_added
        .extend(additions.iter().map(|p| p.title.clone()));
}

/// Appends bullets to the first entry each update matches. Unmatched updates are dropped.
fn merge_experience(
    entries: &mut [ExperienceEntry],
    updates: &[ExperienceUpdate],
    applied: &mut AppliedSummary,
) {
    for update in updates {
        let matched = find_matching_entry(entries, update).map(|index| {
            let entry = &mut entries[index];
            entry.bullets.extend(update.bullets_to_add.iter().cloned());
            MatchedEntry {
                index,
                company: entry.company.clone(),
                title: entry.title.clone(),
            }
        });

        applied.experience.push(ExperienceMatch {
            company: update.company.clone(),
            title: update.title.clone(),
            bullets_added: if matched.is_some() {
                update.bullets_to_add.len()
            } else {
                0
            },
            matched,
        });
    }
}

/// Index of the first entry, in storage order, that `update` refers to.
///
/// Company: either lowercased string contains the other. Title: when the update
/// names one, it must be contained in the entry's title (one direction only).
pub fn find_matching_entry(entries: &[ExperienceEntry], update: &ExperienceUpdate) -> Option<usize> {
    let company = update.company.to_lowercase();
    let title = update.title_filter().map(str::to_lowercase);

    entries.iter().position(|entry| {
        let entry_company = entry.company.to_lowercase();
        let company_matches = entry_company.contains(&company) || company.contains(&entry_company);

        company_matches
            && title
                .as_deref()
                .map_or(true, |t| entry.title.to_lowercase().contains(t))
    })
}
