//! Pass summarization: one independent generation request per (day, pass).

use chrono::NaiveDate;
use log::warn;

use crate::config::WeekrepConfig;
use crate::event::DayBucket;
use crate::generate::{GenerationRequest, TextGenerator};
use crate::prompt::{self, PromptVariant};

/// Substituted when the service signals no output or retries are exhausted.
pub const NO_OUTPUT_SENTINEL: &str = "No response generated.";

/// One independent summarization attempt over a day's events. Append-only
/// once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Pass {
    pub date: NaiveDate,
    pub pass_id: u8,
    pub text: String,
    pub source_label: String,
}

/// Summarizes day buckets through an injected generation capability.
pub struct PassSummarizer<'a, G: TextGenerator + ?Sized> {
    generator: &'a G,
    owner: Option<String>,
    max_tokens: u32,
    stop: Vec<String>,
}

impl<'a, G: TextGenerator + ?Sized> PassSummarizer<'a, G> {
    pub fn new(generator: &'a G, config: &WeekrepConfig) -> Self {
        PassSummarizer {
            generator,
            owner: config.user_name.clone(),
            max_tokens: config.generator.day_max_tokens,
            stop: config.generator.stop.clone(),
        }
    }

    /// Summarize one day with one pass.
    ///
    /// Generation failures degrade to [`NO_OUTPUT_SENTINEL`]; one day's
    /// failure never aborts the whole run.
    pub fn summarize(&self, bucket: &DayBucket, pass_id: u8, source_label: &str) -> Pass {
        let variant = PromptVariant::for_pass(pass_id);
        let request = GenerationRequest {
            prompt: prompt::day_prompt(bucket, self.owner.as_deref(), variant),
            max_tokens: self.max_tokens,
            stop: self.stop.clone(),
        };

        let text = match self.generator.generate(&request) {
            Ok(Some(text)) => text,
            Ok(None) => {
                warn!("no output for {} pass {}", bucket.date, pass_id);
                NO_OUTPUT_SENTINEL.to_string()
            }
            Err(e) => {
                warn!("generation failed for {} pass {}: {}", bucket.date, pass_id, e);
                NO_OUTPUT_SENTINEL.to_string()
            }
        };

        Pass {
            date: bucket.date,
            pass_id,
            text,
            source_label: source_label.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{WeekrepError, WeekrepResult};
    use crate::event::{CalendarEvent, EventStart};
    use std::cell::RefCell;

    struct ScriptedGenerator {
        replies: RefCell<Vec<WeekrepResult<Option<String>>>>,
        prompts: RefCell<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(replies: Vec<WeekrepResult<Option<String>>>) -> Self {
            ScriptedGenerator {
                replies: RefCell::new(replies),
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn generate(&self, request: &GenerationRequest) -> WeekrepResult<Option<String>> {
            self.prompts.borrow_mut().push(request.prompt.clone());
            self.replies.borrow_mut().remove(0)
        }
    }

    fn bucket() -> DayBucket {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        DayBucket {
            date,
            events: vec![CalendarEvent {
                title: "Standup".to_string(),
                start: EventStart::AllDay(date),
                description: "No description".to_string(),
                location: "No location specified".to_string(),
                date,
            }],
        }
    }

    #[test]
    fn records_the_generated_text() {
        let generator = ScriptedGenerator::new(vec![Ok(Some("the summary".to_string()))]);
        let summarizer = PassSummarizer::new(&generator, &WeekrepConfig::default());

        let pass = summarizer.summarize(&bucket(), 1, "cal.ics");

        assert_eq!(pass.text, "the summary");
        assert_eq!(pass.pass_id, 1);
        assert_eq!(pass.source_label, "cal.ics");
        assert!(generator.prompts.borrow()[0].contains("Event: Standup"));
    }

    #[test]
    fn no_output_degrades_to_the_sentinel() {
        let generator = ScriptedGenerator::new(vec![Ok(None)]);
        let summarizer = PassSummarizer::new(&generator, &WeekrepConfig::default());

        let pass = summarizer.summarize(&bucket(), 1, "cal.ics");
        assert_eq!(pass.text, NO_OUTPUT_SENTINEL);
    }

    #[test]
    fn exhausted_retries_degrade_to_the_sentinel() {
        let generator = ScriptedGenerator::new(vec![Err(WeekrepError::GenerationExhausted {
            attempts: 3,
            reason: "connection refused".to_string(),
        })]);
        let summarizer = PassSummarizer::new(&generator, &WeekrepConfig::default());

        let pass = summarizer.summarize(&bucket(), 2, "cal.ics");
        assert_eq!(pass.text, NO_OUTPUT_SENTINEL);
    }
}
