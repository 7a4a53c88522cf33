//! Priority classification for new complaints.
//!
//! Primary path asks the oracle for "High" or "Low" against a fixed
//! rubric. Any failure (unreachable, timeout, empty or unparseable
//! answer) drops to the keyword scan, which must work with no oracle
//! at all.

use crate::{complaint::Priority, oracle::Oracle};

pub struct PriorityClassifier<'a> {
    oracle: &'a dyn Oracle,
    fallback_keywords: Vec<String>,
}

impl<'a> PriorityClassifier<'a> {
    pub fn new(oracle: &'a dyn Oracle, fallback_keywords: &[String]) -> Self {
        Self {
            oracle,
            fallback_keywords: fallback_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
        }
    }

    pub fn classify(&self, title: &str, description: &str, department: &str) -> Priority {
        let prompt = rubric_prompt(title, description, department);
        match self.oracle.generate(&prompt) {
            Ok(reply) => match parse_priority_reply(&reply) {
                Some(priority) => priority,
                None => {
                    log::warn!("classifier: unusable oracle reply {reply:?}, using keyword fallback");
                    self.fallback(title, description)
                }
            },
            Err(e) => {
                log::warn!("classifier: oracle failed ({e}), using keyword fallback");
                self.fallback(title, description)
            }
        }
    }

    /// Keyword scan over title and description.
    pub fn fallback(&self, title: &str, description: &str) -> Priority {
        keyword_priority(title, description, &self.fallback_keywords)
    }
}

/// High iff any keyword occurs in the lowercased concatenation of title
/// and description (no separator).
pub fn keyword_priority(title: &str, description: &str, keywords: &[String]) -> Priority {
    let text = format!("{title}{description}").to_lowercase();
    if keywords.iter().any(|kw| text.contains(kw.as_str())) {
        Priority::High
    } else {
        Priority::Low
    }
}

/// "high" anywhere wins; otherwise "low" means Low.
/// Blank replies and replies naming neither are unusable.
pub fn parse_priority_reply(reply: &str) -> Option<Priority> {
    let text = reply.trim().to_lowercase();
    if text.contains("high") {
        Some(Priority::High)
    } else if text.contains("low") {
        Some(Priority::Low)
    } else {
        None
    }
}

pub fn rubric_prompt(title: &str, description: &str, department: &str) -> String {
    format!(
        "Analyze the following grievance complaint and assign a priority level: \"High\" or \"Low\".

Context: A citizen grievance redressal portal.
Criteria for High Priority:
- Safety hazards (fire, electricity, structural damage)
- Immediate health risks
- Violence, harassment, or crime
- Urgent water/power outages affecting large areas
- Child or elderly welfare issues
Anything else is Low Priority.

Complaint Details:
Department: {department}
Title: {title}
Description: {description}

Respond ONLY with the word \"High\" or \"Low\"."
    )
}
