//! Assessment session state machine.
//!
//! A session walks two question sets in order: personality questions, then
//! role-specific questions. Each set keeps a cursor that only advances by
//! appending exactly one answer, so `answers.len() == cursor <= questions.len()`
//! holds for every persisted session.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::AppError;

/// A single generated question. Personality questions carry multiple-choice
/// options; role-specific questions are open-ended and leave `options` empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub questions: Vec<Question>,
    pub answers: Vec<String>,
    pub cursor: usize,
}

impl QuestionSet {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            answers: Vec::new(),
            cursor: 0,
        }
    }

    /// The question awaiting an answer, if any.
    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.cursor)
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.questions.len()
    }

    /// Appends `answer` to the current question and advances the cursor.
    fn record(&mut self, answer: String) -> Result<(), FlowError> {
        if self.is_finished() {
            return Err(FlowError::PhaseMismatch(
                "All questions in this section are already answered".to_string(),
            ));
        }
        self.answers.push(answer);
        self.cursor += 1;
        Ok(())
    }

    /// Question/answer pairs collected so far.
    pub fn answered(&self) -> impl Iterator<Item = (&Question, &String)> {
        self.questions.iter().zip(self.answers.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub name: String,
    pub percentage: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentAnalysis {
    #[serde(default)]
    pub skills: Vec<ScoredItem>,
    #[serde(default)]
    pub personality_traits: Vec<ScoredItem>,
    #[serde(default)]
    pub improvement_areas: Vec<ScoredItem>,
}

/// Where a session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Personality,
    /// Personality answers are complete; role-specific questions still need generating.
    AwaitingRoleQuestions,
    RoleSpecific,
    /// Every answer is in; the analysis still needs requesting.
    AwaitingAnalysis,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSession {
    pub job_role: String,
    pub personality: QuestionSet,
    #[serde(default)]
    pub role_specific: Option<QuestionSet>,
    #[serde(default)]
    pub analysis: Option<AssessmentAnalysis>,
}

#[derive(Debug, Error, PartialEq)]
pub enum FlowError {
    #[error("Answer cannot be empty")]
    EmptyAnswer,
    #[error("{0}")]
    PhaseMismatch(String),
}

impl From<FlowError> for AppError {
    fn from(e: FlowError) -> Self {
        match e {
            FlowError::EmptyAnswer => AppError::Validation(e.to_string()),
            FlowError::PhaseMismatch(msg) => AppError::Conflict(msg),
        }
    }
}

/// What the caller should do after an answer has been recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Ask the next question in the same section. `number` is 1-based.
    Next { number: usize, question: Question },
    /// The section is done and the follow-up model call is due.
    SectionComplete,
}

impl AssessmentSession {
    pub fn new(job_role: String, personality_questions: Vec<Question>) -> Self {
        Self {
            job_role,
            personality: QuestionSet::new(personality_questions),
            role_specific: None,
            analysis: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.analysis.is_some() {
            return Phase::Completed;
        }
        match &self.role_specific {
            None if self.personality.is_finished() => Phase::AwaitingRoleQuestions,
            None => Phase::Personality,
            Some(set) if set.is_finished() => Phase::AwaitingAnalysis,
            Some(_) => Phase::RoleSpecific,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.phase() == Phase::Completed
    }

    /// Records a personality answer.
    pub fn answer_personality(&mut self, answer: &str) -> Result<Advance, FlowError> {
        let answer = non_empty(answer)?;
        match self.phase() {
            Phase::Personality => {}
            Phase::AwaitingRoleQuestions => {
                return Err(FlowError::PhaseMismatch(
                    "Psychometric questions are already answered".to_string(),
                ))
            }
            Phase::RoleSpecific | Phase::AwaitingAnalysis => {
                return Err(FlowError::PhaseMismatch(
                    "Psychometric test already completed; submit job-role answers instead"
                        .to_string(),
                ))
            }
            Phase::Completed => return Err(completed()),
        }
        self.personality.record(answer)?;
        Ok(next_or_complete(&self.personality))
    }

    /// Records a role-specific answer.
    pub fn answer_role(&mut self, answer: &str) -> Result<Advance, FlowError> {
        let answer = non_empty(answer)?;
        match self.phase() {
            Phase::RoleSpecific => {}
            Phase::Personality | Phase::AwaitingRoleQuestions => {
                return Err(FlowError::PhaseMismatch(
                    "Job-role questions have not started yet".to_string(),
                ))
            }
            Phase::AwaitingAnalysis => {
                return Err(FlowError::PhaseMismatch(
                    "Job-role questions are already answered".to_string(),
                ))
            }
            Phase::Completed => return Err(completed()),
        }
        let set = self
            .role_specific
            .as_mut()
            .ok_or_else(|| FlowError::PhaseMismatch("Job-role questions missing".to_string()))?;
        set.record(answer)?;
        Ok(next_or_complete(set))
    }

    /// Installs generated role-specific questions. Only valid once personality
    /// answers are complete and no role questions exist yet.
    pub fn begin_role_questions(
        &mut self,
        questions: Vec<Question>,
    ) -> Result<&Question, FlowError> {
        if self.phase() != Phase::AwaitingRoleQuestions {
            return Err(FlowError::PhaseMismatch(
                "Job-role questions cannot be started now".to_string(),
            ));
        }
        let set = self.role_specific.insert(QuestionSet::new(questions));
        set.current()
            .ok_or_else(|| FlowError::PhaseMismatch("No job-role questions generated".to_string()))
    }

    pub fn complete(&mut self, analysis: AssessmentAnalysis) -> Result<(), FlowError> {
        if self.phase() != Phase::AwaitingAnalysis {
            return Err(FlowError::PhaseMismatch(
                "Assessment cannot be completed before every question is answered".to_string(),
            ));
        }
        self.analysis = Some(analysis);
        Ok(())
    }
}

fn non_empty(answer: &str) -> Result<String, FlowError> {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        return Err(FlowError::EmptyAnswer);
    }
    Ok(trimmed.to_string())
}

fn completed() -> FlowError {
    FlowError::PhaseMismatch("Assessment already completed".to_string())
}

fn next_or_complete(set: &QuestionSet) -> Advance {
    match set.current() {
        Some(question) => Advance::Next {
            number: set.cursor + 1,
            question: question.clone(),
        },
        None => Advance::SectionComplete,
    }
}
