// Advisor prompt templates.

pub const ASSESS_SUBMISSION_PROMPT: &str = r#"A recruiter posted a paid project and a shortlisted candidate submitted proof of work.
Assess how well the submission fits the project.

PROJECT TITLE:
{title}

PROJECT DESCRIPTION:
{description}

TASKS:
{tasks}

TECH STACK:
{tech_stack}

CANDIDATE PROFILE (JSON):
{candidate}

<candidate_input>
SUBMISSION LINK: {link}
SUBMISSION NOTES: {notes}
</candidate_input>

OUTPUT SCHEMA (return exactly this structure):
{
  "score": integer 0-100,
  "summary": "two or three sentences for the recruiter",
  "pros": ["short strength", "..."]
}

RULES:
1. Judge only what the project, profile and submission actually show.
2. "pros" has at most 5 entries.
3. Return ONLY the JSON object."#;

pub const SUGGEST_COURSES_PROMPT: &str = r#"A job seeker saved several freelance projects. Their current skills and the skills those projects need but they lack are listed below.
Recommend online courses that close the gaps, most valuable first.

CURRENT SKILLS:
{skills}

MISSING SKILLS (most requested first):
{gaps}

OUTPUT SCHEMA (return exactly this structure):
[
  {
    "skill": "missing skill this course covers",
    "title": "course title",
    "provider": "platform or publisher",
    "url": "https://..." | null,
    "reason": "one sentence"
  }
]

RULES:
1. At most {limit} courses, and only for skills in MISSING SKILLS.
2. Prefer free or widely available courses.
3. Return ONLY the JSON array."#;
