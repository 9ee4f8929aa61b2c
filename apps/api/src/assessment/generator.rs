//! Question battery generation and final analysis via the LLM client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::assessment::prompts::{
    ANALYSIS_PROMPT, ANALYSIS_SYSTEM, PERSONALITY_PROMPT, QUESTION_SYSTEM, ROLE_PROMPT,
};
use crate::assessment::session::{
    AssessmentAnalysis, AssessmentSession, Question, QuestionSet, ScoredItem,
};
use crate::errors::AppError;
use crate::llm_client::LlmClient;

pub const PERSONALITY_QUESTION_COUNT: usize = 7;
pub const ROLE_QUESTION_COUNT: usize = 5;
/// Entries kept per analysis category.
const TOP_N: usize = 3;

const QUESTION_TEMPERATURE: f32 = 0.7;
const ANALYSIS_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Deserialize)]
struct QuestionBatch {
    questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    skills: Vec<RawScoredItem>,
    #[serde(default)]
    personality_traits: Vec<RawScoredItem>,
    #[serde(default)]
    improvement_areas: Vec<RawScoredItem>,
}

#[derive(Debug, Deserialize)]
struct RawScoredItem {
    name: String,
    #[serde(default)]
    percentage: Value,
}

/// Source of question batteries and the final analysis. `LlmClient` is the
/// production implementation; the assessment flow only sees this trait.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn personality_questions(&self) -> Result<Vec<Question>, AppError>;

    async fn role_questions(&self, job_role: &str) -> Result<Vec<Question>, AppError>;

    async fn analysis(&self, session: &AssessmentSession) -> Result<AssessmentAnalysis, AppError>;
}

#[async_trait]
impl QuestionGenerator for LlmClient {
    async fn personality_questions(&self) -> Result<Vec<Question>, AppError> {
        generate_personality_questions(self).await
    }

    async fn role_questions(&self, job_role: &str) -> Result<Vec<Question>, AppError> {
        generate_role_questions(self, job_role).await
    }

    async fn analysis(&self, session: &AssessmentSession) -> Result<AssessmentAnalysis, AppError> {
        request_analysis(self, session).await
    }
}

pub async fn generate_personality_questions(llm: &LlmClient) -> Result<Vec<Question>, AppError> {
    let prompt = PERSONALITY_PROMPT.replace("{count}", &PERSONALITY_QUESTION_COUNT.to_string());
    let batch: QuestionBatch = llm
        .call_json(&prompt, QUESTION_SYSTEM, QUESTION_TEMPERATURE)
        .await
        .map_err(|e| AppError::Llm(format!("Psychometric question generation failed: {e}")))?;

    validate_questions(batch.questions, PERSONALITY_QUESTION_COUNT, true).map_err(|reason| {
        AppError::Llm(format!("Failed to generate psychometric questions: {reason}"))
    })
}

pub async fn generate_role_questions(
    llm: &LlmClient,
    job_role: &str,
) -> Result<Vec<Question>, AppError> {
    let prompt = ROLE_PROMPT
        .replace("{count}", &ROLE_QUESTION_COUNT.to_string())
        .replace("{job_role}", job_role);
    let batch: QuestionBatch = llm
        .call_json(&prompt, QUESTION_SYSTEM, QUESTION_TEMPERATURE)
        .await
        .map_err(|e| AppError::Llm(format!("Job-role question generation failed: {e}")))?;

    validate_questions(batch.questions, ROLE_QUESTION_COUNT, false).map_err(|reason| {
        AppError::Llm(format!("Failed to generate job-specific questions: {reason}"))
    })
}

pub async fn request_analysis(
    llm: &LlmClient,
    session: &AssessmentSession,
) -> Result<AssessmentAnalysis, AppError> {
    let prompt = build_analysis_prompt(session);
    let raw: RawAnalysis = llm
        .call_json(&prompt, ANALYSIS_SYSTEM, ANALYSIS_TEMPERATURE)
        .await
        .map_err(|e| AppError::Llm(format!("Assessment analysis failed: {e}")))?;

    Ok(normalize_analysis(raw))
}

/// Keeps the first `count` usable questions. Blank prompts are dropped; when
/// `require_options` is set, questions with fewer than two options are dropped too.
fn validate_questions(
    questions: Vec<Question>,
    count: usize,
    require_options: bool,
) -> Result<Vec<Question>, String> {
    let usable: Vec<Question> = questions
        .into_iter()
        .filter_map(|q| {
            let prompt = q.prompt.trim().to_string();
            let options: Vec<String> = q
                .options
                .into_iter()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
            if prompt.is_empty() || (require_options && options.len() < 2) {
                return None;
            }
            Some(Question {
                prompt,
                options: if require_options { options } else { Vec::new() },
            })
        })
        .take(count)
        .collect();

    if usable.len() < count {
        return Err(format!(
            "expected {count} usable questions, got {}",
            usable.len()
        ));
    }
    Ok(usable)
}

fn build_analysis_prompt(session: &AssessmentSession) -> String {
    let empty = QuestionSet::default();
    let role = session.role_specific.as_ref().unwrap_or(&empty);
    ANALYSIS_PROMPT
        .replace("{job_role}", &session.job_role)
        .replace("{personality_answers}", &format_answers(&session.personality))
        .replace("{role_answers}", &format_answers(role))
}

fn format_answers(set: &QuestionSet) -> String {
    set.answered()
        .enumerate()
        .map(|(i, (q, a))| format!("{}. Q: {}\n   A: {}", i + 1, q.prompt, a))
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalize_analysis(raw: RawAnalysis) -> AssessmentAnalysis {
    AssessmentAnalysis {
        skills: normalize_items(raw.skills),
        personality_traits: normalize_items(raw.personality_traits),
        improvement_areas: normalize_items(raw.improvement_areas),
    }
}

fn normalize_items(items: Vec<RawScoredItem>) -> Vec<ScoredItem> {
    let mut scored: Vec<ScoredItem> = items
        .into_iter()
        .filter_map(|item| {
            let name = item.name.trim().to_string();
            if name.is_empty() {
                return None;
            }
            Some(ScoredItem {
                name,
                percentage: parse_percentage(&item.percentage),
            })
        })
        .collect();
    scored.sort_by(|a, b| b.percentage.cmp(&a.percentage));
    scored.truncate(TOP_N);
    scored
}

/// Accepts `85`, `85.4`, `"85"` or `"85%"`, clamped to 0..=100. Anything else is 0.
fn parse_percentage(value: &Value) -> u8 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    number
        .filter(|n| n.is_finite())
        .map(|n| n.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn q(prompt: &str, options: &[&str]) -> Question {
        Question {
            prompt: prompt.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    #[test]
    fn test_question_batch_deserializes_without_options() {
        let json = r#"{"questions": [{"prompt": "Explain CAP theorem"}]}"#;
        let batch: QuestionBatch = serde_json::from_str(json).unwrap();
        assert!(batch.questions[0].options.is_empty());
    }

    #[test]
    fn test_validate_questions_truncates_to_count() {
        let questions = (0..9).map(|i| q(&format!("Q{i}"), &["A", "B"])).collect();
        let valid = validate_questions(questions, PERSONALITY_QUESTION_COUNT, true).unwrap();
        assert_eq!(valid.len(), PERSONALITY_QUESTION_COUNT);
        assert_eq!(valid[0].prompt, "Q0");
    }

    #[test]
    fn test_validate_questions_rejects_short_batch() {
        let questions = (0..4).map(|i| q(&format!("Q{i}"), &[])).collect();
        let err = validate_questions(questions, ROLE_QUESTION_COUNT, false).unwrap_err();
        assert!(err.contains("expected 5"));
    }

    #[test]
    fn test_validate_questions_drops_blank_and_optionless_personality_questions() {
        let questions = vec![
            q("  ", &["A", "B"]),
            q("Only one option", &["A", " "]),
            q("  Good question  ", &[" Often ", "Rarely"]),
        ];
        let valid = validate_questions(questions, 1, true).unwrap();
        assert_eq!(valid, vec![q("Good question", &["Often", "Rarely"])]);
    }

    #[test]
    fn test_role_questions_have_options_cleared() {
        let valid = validate_questions(vec![q("Design a cache", &["x"])], 1, false).unwrap();
        assert!(valid[0].options.is_empty());
    }

    #[test]
    fn test_parse_percentage_variants() {
        assert_eq!(parse_percentage(&json!(85)), 85);
        assert_eq!(parse_percentage(&json!(72.6)), 73);
        assert_eq!(parse_percentage(&json!("64%")), 64);
        assert_eq!(parse_percentage(&json!(" 40 % ")), 40);
        assert_eq!(parse_percentage(&json!(140)), 100);
        assert_eq!(parse_percentage(&json!(-5)), 0);
        assert_eq!(parse_percentage(&json!("high")), 0);
        assert_eq!(parse_percentage(&Value::Null), 0);
    }

    #[test]
    fn test_normalize_analysis_keeps_top_three_sorted() {
        let raw: RawAnalysis = serde_json::from_value(json!({
            "skills": [
                {"name": "SQL", "percentage": 60},
                {"name": "Python", "percentage": "90%"},
                {"name": "", "percentage": 99},
                {"name": "Statistics", "percentage": 75},
                {"name": "Excel", "percentage": 50}
            ],
            "personality_traits": [{"name": "Curious", "percentage": 80}]
        }))
        .unwrap();

        let analysis = normalize_analysis(raw);
        let names: Vec<_> = analysis.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Python", "Statistics", "SQL"]);
        assert_eq!(analysis.personality_traits.len(), 1);
        assert!(analysis.improvement_areas.is_empty());
    }

    #[test]
    fn test_analysis_prompt_pairs_questions_with_answers() {
        let mut session = AssessmentSession::new(
            "Site Reliability Engineer".to_string(),
            vec![q("How do you handle stress?", &["Calmly", "Poorly"])],
        );
        session.answer_personality("Calmly").unwrap();
        session
            .begin_role_questions(vec![q("Describe an outage you handled", &[])])
            .unwrap();
        session.answer_role("Rolled back a bad deploy").unwrap();

        let prompt = build_analysis_prompt(&session);
        assert!(prompt.contains("Site Reliability Engineer"));
        assert!(prompt.contains("Q: How do you handle stress?\n   A: Calmly"));
        assert!(prompt.contains("A: Rolled back a bad deploy"));
        assert!(!prompt.contains("{role_answers}"));
    }
}
