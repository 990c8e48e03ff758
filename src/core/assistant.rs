//! Lifestyle assistant
//!
//! Keyword-matched canned guidance for patients. No model is involved;
//! the first matching topic wins.

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::MAX_CHAT_MESSAGE_LEN;

const SLEEP_ADVICE: &str = "For better sleep quality: keep a consistent schedule, limit caffeine after midday, and avoid screens 30-60 minutes before bed. If your average stays below 7 hours, aim to add 15-30 minutes this week.";

const DIABETES_ADVICE: &str = "To reduce diabetes risk: prioritize high-fiber meals (vegetables, legumes, whole grains), reduce sugary drinks, and aim for 150 minutes/week of moderate exercise. Keeping BMI and fasting glucose in range helps most.";

const EXERCISE_ADVICE: &str = "A simple plan: 30 minutes brisk walking 5 days/week + 2 days of light strength training. If you're new, start with 10-15 minutes and increase gradually.";

const DEFAULT_PROMPT: &str = "I can help interpret your trends and suggest habits. Tell me what you want to improve (blood pressure, sleep, weight, blood sugar), and I'll suggest a simple next step.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Sleep,
    Diabetes,
    Exercise,
    General,
}

impl Topic {
    pub fn detect(message: &str) -> Self {
        let msg = message.to_lowercase();
        if msg.contains("sleep") {
            Topic::Sleep
        } else if msg.contains("diabetes") || msg.contains("blood sugar") {
            Topic::Diabetes
        } else if msg.contains("exercise") {
            Topic::Exercise
        } else {
            Topic::General
        }
    }

    pub fn answer(&self) -> &'static str {
        match self {
            Topic::Sleep => SLEEP_ADVICE,
            Topic::Diabetes => DIABETES_ADVICE,
            Topic::Exercise => EXERCISE_ADVICE,
            Topic::General => DEFAULT_PROMPT,
        }
    }
}

/// Answer a patient message. Empty or oversized messages are rejected.
pub fn reply(message: &str) -> AppResult<&'static str> {
    let message = message.trim();
    let len = message.chars().count();
    if len == 0 || len > MAX_CHAT_MESSAGE_LEN {
        return Err(AppError::out_of_range("message length", 1, MAX_CHAT_MESSAGE_LEN));
    }
    Ok(Topic::detect(message).answer())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topics() {
        assert_eq!(Topic::detect("How can I SLEEP better?"), Topic::Sleep);
        assert_eq!(Topic::detect("my blood sugar is high"), Topic::Diabetes);
        assert_eq!(Topic::detect("Diabetes tips"), Topic::Diabetes);
        assert_eq!(Topic::detect("exercise plan please"), Topic::Exercise);
        assert_eq!(Topic::detect("hello"), Topic::General);
    }

    #[test]
    fn test_first_topic_wins() {
        // Sleep is checked before exercise
        assert_eq!(Topic::detect("does exercise help sleep"), Topic::Sleep);
    }

    #[test]
    fn test_reply_bounds() {
        assert!(reply("   ").is_err());
        assert!(reply(&"a".repeat(MAX_CHAT_MESSAGE_LEN + 1)).is_err());
        assert_eq!(reply("exercise").unwrap(), EXERCISE_ADVICE);
    }
}
