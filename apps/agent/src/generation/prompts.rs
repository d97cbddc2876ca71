// Prompt constants for the generation module. The provider manager never
// sees these: prompts are built here and handed over as opaque strings.

use crate::models::job::JobListing;
use crate::profile::CandidateProfile;

/// Resume tailoring prompt. Replace `{resume_text}`, `{company}`, `{title}`,
/// `{description}` before sending.
pub const RESUME_PROMPT_TEMPLATE: &str = r#"You are an expert resume writer.

Rewrite the candidate's resume so it is tailored to the job below. Keep every
claim grounded in the original resume. Do NOT invent employers, titles,
dates, or accomplishments. Reorder and reword to emphasize the experience
most relevant to this role, and mirror terminology from the job description
where the resume genuinely supports it.

Return ONLY the tailored resume as plain text. No commentary, no preamble.

CANDIDATE RESUME:
{resume_text}

TARGET ROLE: {title} at {company}

JOB DESCRIPTION:
{description}"#;

/// Cover letter prompt. Replace `{candidate_name}`, `{resume_text}`,
/// `{company}`, `{title}`, `{description}` before sending.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"You are an expert cover letter writer.

Write a concise, specific cover letter (250-350 words) from {candidate_name}
for the role below. Ground every claim in the resume. Reference the company
by name, connect two or three concrete experiences to the role's needs, and
close with a direct ask. Avoid generic filler ("I am a team player").

Return ONLY the letter body as plain text. No commentary, no placeholders.

CANDIDATE RESUME:
{resume_text}

TARGET ROLE: {title} at {company}

JOB DESCRIPTION:
{description}"#;

/// Description extraction prompt, used when a fetched page has no
/// recognizable structure. Replace `{company}`, `{title}`, `{page_text}`.
pub const EXTRACT_DESCRIPTION_PROMPT_TEMPLATE: &str = r#"The text below was scraped from a careers page for the role "{title}" at {company}.

Extract the actual job description: the role summary, responsibilities, and
qualifications. Drop navigation, cookie banners, legal boilerplate, and
unrelated postings. Return ONLY the cleaned description as plain text,
preserving section headers where present.

PAGE TEXT:
{page_text}"#;

pub fn build_resume_prompt(
    profile: &CandidateProfile,
    job: &JobListing,
    description: &str,
) -> String {
    RESUME_PROMPT_TEMPLATE
        .replace("{resume_text}", &profile.resume_text)
        .replace("{company}", &job.company)
        .replace("{title}", &job.title)
        .replace("{description}", description)
}

pub fn build_cover_letter_prompt(
    profile: &CandidateProfile,
    job: &JobListing,
    description: &str,
) -> String {
    COVER_LETTER_PROMPT_TEMPLATE
        .replace("{candidate_name}", &profile.name)
        .replace("{resume_text}", &profile.resume_text)
        .replace("{company}", &job.company)
        .replace("{title}", &job.title)
        .replace("{description}", description)
}

pub fn build_extract_prompt(job: &JobListing, page_text: &str) -> String {
    EXTRACT_DESCRIPTION_PROMPT_TEMPLATE
        .replace("{company}", &job.company)
        .replace("{title}", &job.title)
        .replace("{page_text}", page_text)
}
