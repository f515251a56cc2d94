//! Cross-validation of the accumulated passes.
//!
//! An explicit state machine with an escalation counter capped at 1: a first
//! disagreement records exactly one extra pass and stops; the three-way
//! comparison happens on the next invocation, so a run can never retry
//! without an operator in the loop.

use log::{info, warn};

use crate::config::WeekrepConfig;
use crate::error::WeekrepResult;
use crate::generate::{GenerationRequest, TextGenerator};
use crate::prompt::{self, MISMATCH_MARKER};
use crate::store::ReportStore;
use crate::summarize::NO_OUTPUT_SENTINEL;

/// Log slot reserved for the escalation pass.
pub const ESCALATION_PASS_ID: u8 = 3;

/// Maximum escalations per run; a second disagreement is terminal.
const MAX_ESCALATIONS: u8 = 1;

/// States of a consolidation invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsolidationState {
    Start,
    PassesCollected,
    Comparing,
    MismatchFirstDetected,
    ThirdPassRequested,
    Comparing2,
    Done,
}

/// Terminal result of one consolidation invocation, consumed once per run.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsolidationOutcome {
    /// The passes agree; the consolidated report was written.
    Consistent { final_text: String },
    /// First disagreement: one escalation pass was recorded. The next
    /// invocation performs the three-way comparison.
    MismatchEscalated,
    /// Disagreement survived the escalation. Surfaced for manual review with
    /// both underlying summaries attached; not a failure.
    MismatchTerminal {
        response: String,
        first: String,
        second: String,
    },
}

pub struct Consolidator<'a, G: TextGenerator + ?Sized> {
    generator: &'a G,
    store: &'a ReportStore,
    max_tokens: u32,
    escalation_max_tokens: u32,
    stop: Vec<String>,
    state: ConsolidationState,
    escalations: u8,
}

impl<'a, G: TextGenerator + ?Sized> Consolidator<'a, G> {
    pub fn new(generator: &'a G, store: &'a ReportStore, config: &WeekrepConfig) -> Self {
        Consolidator {
            generator,
            store,
            max_tokens: config.generator.consolidation_max_tokens,
            escalation_max_tokens: config.generator.escalation_max_tokens,
            stop: config.generator.stop.clone(),
            state: ConsolidationState::Start,
            escalations: 0,
        }
    }

    pub fn state(&self) -> ConsolidationState {
        self.state
    }

    /// Run one consolidation step over the recorded pass logs.
    ///
    /// Empty logs participate as empty strings. The step never recurses: on a
    /// first-detected mismatch it records the escalation pass and returns,
    /// leaving the three-way comparison to the next invocation.
    pub fn run(&mut self) -> WeekrepResult<ConsolidationOutcome> {
        self.state = ConsolidationState::PassesCollected;
        let first = self.store.read_log(1)?;
        let second = self.store.read_log(2)?;
        let third = self.store.read_log(ESCALATION_PASS_ID)?;

        if third.trim().is_empty() {
            self.state = ConsolidationState::Comparing;
            let response = self.generate(prompt::two_way_prompt(&first, &second), self.max_tokens)?;

            if !contains_marker(&response) {
                self.store.write_final_report(&response)?;
                self.state = ConsolidationState::Done;
                return Ok(ConsolidationOutcome::Consistent {
                    final_text: response,
                });
            }

            if self.escalations >= MAX_ESCALATIONS {
                self.state = ConsolidationState::Done;
                return Ok(ConsolidationOutcome::MismatchTerminal {
                    response,
                    first,
                    second,
                });
            }

            self.state = ConsolidationState::MismatchFirstDetected;
            self.escalations += 1;
            warn!("pass summaries disagree; recording one escalation pass");
            self.record_escalation(&first, &second)?;
            self.state = ConsolidationState::ThirdPassRequested;
            return Ok(ConsolidationOutcome::MismatchEscalated);
        }

        self.state = ConsolidationState::Comparing2;
        info!("escalation pass present; running three-way comparison");
        let response = self.generate(
            prompt::three_way_prompt(&first, &second, &third),
            self.max_tokens,
        )?;

        self.state = ConsolidationState::Done;
        if contains_marker(&response) {
            return Ok(ConsolidationOutcome::MismatchTerminal {
                response,
                first,
                second,
            });
        }

        self.store.write_final_report(&response)?;
        Ok(ConsolidationOutcome::Consistent {
            final_text: response,
        })
    }

    fn generate(&self, prompt: String, max_tokens: u32) -> WeekrepResult<String> {
        let request = GenerationRequest {
            prompt,
            max_tokens,
            stop: self.stop.clone(),
        };
        Ok(self
            .generator
            .generate(&request)?
            .unwrap_or_else(|| NO_OUTPUT_SENTINEL.to_string()))
    }

    /// One additional pass over the concatenation of the two summaries.
    /// Generation failure still records the sentinel so the next invocation
    /// reaches the three-way comparison instead of escalating again.
    fn record_escalation(&self, first: &str, second: &str) -> WeekrepResult<()> {
        let request = GenerationRequest {
            prompt: prompt::escalation_prompt(first, second),
            max_tokens: self.escalation_max_tokens,
            stop: self.stop.clone(),
        };
        let text = match self.generator.generate(&request) {
            Ok(Some(text)) => text,
            Ok(None) => NO_OUTPUT_SENTINEL.to_string(),
            Err(e) => {
                warn!("escalation pass generation failed: {}", e);
                NO_OUTPUT_SENTINEL.to_string()
            }
        };
        self.store.append_escalation(ESCALATION_PASS_ID, &text)
    }
}

fn contains_marker(response: &str) -> bool {
    response.to_ascii_uppercase().contains(MISMATCH_MARKER)
}
