//! Prompt construction for summarization and cross-validation.
//!
//! This module is intentionally dumb: it only formats text. No parsing, no
//! networking, no pipeline logic.

use crate::event::DayBucket;

/// Signal string the model is instructed to emit when summaries disagree.
pub const MISMATCH_MARKER: &str = "MISMATCH DETECTED";

/// Fixed outline style every day summary must follow.
const OUTLINE_EXAMPLE: &str = "\
I. [Date]
    A. [Time]: [Event title]
        * [Event detail]
    B. [Time]: [Event title]
        * [Event detail]
    and so on...";

/// How a pass's instructions differ. A recheck pass re-derives the report
/// from the raw events instead of echoing an earlier attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PromptVariant {
    Standard,
    Recheck,
}

impl PromptVariant {
    pub fn for_pass(pass_id: u8) -> Self {
        if pass_id <= 1 {
            PromptVariant::Standard
        } else {
            PromptVariant::Recheck
        }
    }
}

/// One labelled block per event, in bucket order.
pub fn event_block(bucket: &DayBucket) -> String {
    let mut block = String::new();
    for event in &bucket.events {
        block.push_str("Event: ");
        block.push_str(&event.title);
        block.push_str("\nTime: ");
        block.push_str(&event.time_label());
        block.push_str("\nDescription: ");
        block.push_str(&event.description);
        block.push_str("\nLocation: ");
        block.push_str(&event.location);
        block.push_str("\n\n");
    }
    block.trim_end().to_string()
}

/// Daily summary prompt: merge duplicates, keep chronological order, mark
/// unknowns instead of fabricating, follow the fixed outline.
pub fn day_prompt(bucket: &DayBucket, owner: Option<&str>, variant: PromptVariant) -> String {
    let mut prompt = String::new();

    prompt.push_str("This is the calendar entry of ");
    match owner {
        Some(name) => prompt.push_str(name),
        None => prompt.push_str("the calendar owner"),
    }
    prompt.push_str(&format!(
        " for {} (yyyy-mm-dd). Report what happened during the day. \
         Keep it short and concise.\n\n",
        bucket.date
    ));

    prompt.push_str("Ensure that:\n");
    prompt.push_str("- Duplicate info is combined\n");
    prompt.push_str("- Output is sorted from early to late\n");
    prompt.push_str(
        "- If you are uncertain, state that a detail is unknown rather than making it up\n",
    );
    prompt.push_str(
        "- Ignore the input formatting and follow the styling from the example:\n",
    );
    prompt.push_str(OUTLINE_EXAMPLE);
    prompt.push_str("\n\n");

    if variant == PromptVariant::Recheck {
        prompt.push_str(
            "Work only from the events below, independently of any earlier \
             report of this day.\n\n",
        );
    }

    prompt.push_str("Actual day:\n");
    prompt.push_str(&event_block(bucket));
    prompt
}

/// Two-way comparison: either an explicit mismatch marker, or the
/// consolidated report.
pub fn two_way_prompt(first: &str, second: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "Fact check and summarize. Review the information from the first and \
         second report below.\n",
    );
    prompt.push_str(&format!(
        "If the two reports disagree about any event, reply with the exact \
         phrase \"{}\" and nothing else.\n",
        MISMATCH_MARKER
    ));
    prompt.push_str(
        "Otherwise, ignore any event that does not appear in both and create \
         a consolidated final weekly report by day.\n\n",
    );
    prompt.push_str("First report:\n");
    prompt.push_str(first);
    prompt.push_str("\n\nSecond report:\n");
    prompt.push_str(second);
    prompt
}

/// Three-way comparison used after an escalation pass has been recorded.
pub fn three_way_prompt(first: &str, second: &str, third: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "Three independently produced reports of the same days follow. \
         Identify the most accurate consolidation and create a final weekly \
         report by day.\n",
    );
    prompt.push_str(&format!(
        "If the reports remain irreconcilably contradictory, reply with the \
         exact phrase \"{}\" and nothing else.\n\n",
        MISMATCH_MARKER
    ));
    prompt.push_str("First report:\n");
    prompt.push_str(first);
    prompt.push_str("\n\nSecond report:\n");
    prompt.push_str(second);
    prompt.push_str("\n\nThird report:\n");
    prompt.push_str(third);
    prompt
}

/// The escalation pass: one more independent report derived from the
/// concatenation of the two disagreeing summaries.
pub fn escalation_prompt(first: &str, second: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "Two independently produced reports of the same days follow. Produce \
         a third independent report of the same days in the same outline \
         style, working only from the information present below. If you are \
         uncertain, state that a detail is unknown rather than making it \
         up.\n\n",
    );
    prompt.push_str("First report:\n");
    prompt.push_str(first);
    prompt.push_str("\n\nSecond report:\n");
    prompt.push_str(second);
    prompt
}
