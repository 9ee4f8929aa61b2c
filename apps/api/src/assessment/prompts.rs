// Assessment LLM prompt templates.

pub const QUESTION_SYSTEM: &str = "\
You are an experienced organisational psychologist and technical interviewer. \
You write clear, unambiguous assessment questions for job candidates. \
You MUST respond with valid JSON only, with no markdown fences and no explanations.";

pub const PERSONALITY_PROMPT: &str = r#"Generate {count} psychometric questions that assess a candidate's personality and workplace behavior.
Questions should be diverse and relevant to professional settings.
Each question must offer between 3 and 5 multiple-choice options.

OUTPUT SCHEMA (return exactly this structure):
{
  "questions": [
    {"prompt": "string", "options": ["string", "string", "string"]}
  ]
}"#;

pub const ROLE_PROMPT: &str = r#"Generate {count} job role-specific interview questions for a {job_role}.
These questions should assess technical skills, problem-solving, and domain knowledge.
They are open-ended: leave "options" empty.

OUTPUT SCHEMA (return exactly this structure):
{
  "questions": [
    {"prompt": "string", "options": []}
  ]
}"#;

pub const ANALYSIS_SYSTEM: &str = "\
You are an assessment analyst. You infer a candidate's strengths from their answers. \
Base every inference on the answers provided; do not invent experience. \
You MUST respond with valid JSON only, with no markdown fences and no explanations.";

pub const ANALYSIS_PROMPT: &str = r#"Analyze the following psychometric and job-related answers for a {job_role} candidate and determine:
1. Top 3 skills with percentage.
2. Top 3 personality traits with percentage.
3. Top 3 areas of improvement with percentage.

PSYCHOMETRIC ANSWERS:
{personality_answers}

JOB-ROLE ANSWERS:
{role_answers}

OUTPUT SCHEMA (percentages are integers from 0 to 100):
{
  "skills": [{"name": "string", "percentage": 0}],
  "personality_traits": [{"name": "string", "percentage": 0}],
  "improvement_areas": [{"name": "string", "percentage": 0}]
}"#;
