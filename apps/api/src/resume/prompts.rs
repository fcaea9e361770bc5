// Resume module LLM prompt templates.

pub const UPDATE_PLAN_SYSTEM: &str = "\
You are a precise resume updater. \
You read a user's free-text update and decide which additive edits it implies for their resume. \
You never rewrite, shorten or remove existing resume content.";

/// Replace `{current_resume}` and `{update_text}` before sending.
pub const UPDATE_PLAN_PROMPT: &str = r#"Review the CURRENT RESUME and the USER UPDATE TEXT.
Identify new skills, new projects, or new bullets for existing experience entries.

CURRENT RESUME:
{current_resume}

USER UPDATE TEXT:
{update_text}

RULES:
1. Do NOT rewrite the resume.
2. Only extract information explicitly present in the USER UPDATE TEXT.
3. Put each piece of new information in exactly one place:
   - "add_skills": technologies, tools or skills the user now has
   - "add_projects": new projects (personal, open source, or done at an employer)
   - "update_experience": new bullets for a job that ALREADY exists in the resume.
     Copy "company" and "title" from that existing entry.
4. Never use "update_experience" for a job that is not in the resume.
5. Return empty arrays if nothing fits.

OUTPUT SCHEMA (return exactly this structure):
{
  "add_skills": ["skill1", "skill2"],
  "add_projects": [
    {"title": "Project Title", "company": "Company/Context", "duration": "Duration", "bullets": ["bullet1", "bullet2"]}
  ],
  "update_experience": [
    {"company": "Company Name", "title": "Title to Match", "bullets_to_add": ["new bullet"]}
  ]
}"#;

pub const ANALYSIS_SYSTEM: &str = "\
You are a professional resume analyst. \
Provide specific, actionable feedback that improves a resume's clarity and ATS ranking.";

/// Replace `{resume_json}` before sending.
pub const ANALYSIS_PROMPT: &str = r#"Analyze this resume and provide:
1. Overall strengths (3-5 points)
2. Areas for improvement (3-5 points)
3. ATS compatibility score (0-100)
4. Keyword suggestions for better ATS ranking
5. Formatting recommendations

RESUME:
{resume_json}

OUTPUT SCHEMA (return exactly this structure):
{
  "strengths": ["string"],
  "improvements": ["string"],
  "ats_score": 0,
  "keywords": ["string"],
  "formatting_tips": ["string"]
}"#;
