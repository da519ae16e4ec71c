//! Prompt construction for the conversation loop.
//!
//! Every model call the loop makes is built here, so the exact wording sent
//! to the model lives in one place.

use simulon_types::llm::Message;
use simulon_types::think::QaPair;

/// Instruction appended to the running context to obtain a follow-up question.
pub const FOLLOW_UP_INSTRUCTION: &str =
    "Based on our conversation, generate a single intelligent follow-up question.";

/// System instruction for the standalone answer call.
pub const ANSWER_INSTRUCTION: &str = "Respond concisely in about 10 lines.";

/// Marker shared by both persona prompts.
pub const PERSONA_COMPLETION: &str = "complete this sentence exactly: You are a ...";

/// Ask for a persona line derived from the seed query.
pub fn seed_persona(seed: &str) -> Vec<Message> {
    vec![Message::user(format!(
        "You are Simulon, based on the query: '{seed}', {PERSONA_COMPLETION}"
    ))]
}

/// Ask for a persona line derived from the latest question and answer.
pub fn refreshed_persona(pair: &QaPair) -> Vec<Message> {
    vec![Message::user(format!(
        "You are Simulon, based on the question '{}' and answer '{}', {PERSONA_COMPLETION}",
        pair.q, pair.a
    ))]
}

/// The running context plus the follow-up instruction.
pub fn follow_up(context: &[Message]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(context.len() + 1);
    messages.extend_from_slice(context);
    messages.push(Message::user(FOLLOW_UP_INSTRUCTION));
    messages
}

/// A fresh two-message prompt answering `question` on its own.
pub fn answer(question: &str) -> Vec<Message> {
    vec![
        Message::system(ANSWER_INSTRUCTION),
        Message::user(question),
    ]
}

/// Normalize a persona completion into a full "You are ..." sentence.
///
/// Models either repeat the sentence start or return only its continuation.
pub fn persona_line(completion: &str) -> String {
    let text = completion.trim();
    let lower = text.to_lowercase();
    if lower.starts_with("you are") {
        return text.to_string();
    }
    if let Some(rest) = strip_article(text, "an ") {
        return format!("You are an {rest}");
    }
    if let Some(rest) = strip_article(text, "a ") {
        return format!("You are a {rest}");
    }
    let article = match text.chars().next() {
        Some(c) if "aeiouAEIOU".contains(c) => "an",
        _ => "a",
    };
    format!("You are {article} {text}")
}

fn strip_article<'a>(text: &'a str, article: &str) -> Option<&'a str> {
    let head = text.get(..article.len())?;
    head.eq_ignore_ascii_case(article)
        .then(|| &text[article.len()..])
}
