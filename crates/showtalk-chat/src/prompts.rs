//! Fixed prompt text and message-list builders.

use showtalk_core::types::ChatMessage;

/// Instructions for the search/no-search classification call.
pub const CLASSIFIER_PROMPT: &str = "You have access to a database of Keeping Up with the Kardashians episode titles, \
descriptions, and IMDB ratings. Search is by a single word in the episode title. \
The user will ask a question. Reply with exactly: \
YES followed by one space and exactly ONE word to search (e.g. YES perfume, YES wedding), \
or NO if the question does not need episode data (greetings, meta questions, etc.). \
Choose the one word that best matches what to look up in episode titles.";

/// System prompt when answering from retrieved episodes.
pub const GROUNDED_SYSTEM_PROMPT: &str = "You answer questions about Keeping Up with the Kardashians using only the episode information provided. \
If the information is not in the episodes, say so briefly.";

/// System prompt for plain conversation.
pub const DIRECT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Answer the user's question about Keeping Up with the Kardashians \
or anything else briefly and conversationally.";

/// Classification request for one utterance.
pub fn classification_messages(utterance: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(CLASSIFIER_PROMPT),
        ChatMessage::user(utterance),
    ]
}

/// Answer request grounded in rendered episode context.
pub fn grounded_messages(context: &str, question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(GROUNDED_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Episode information:\n\n{}\n\nUser question: {}",
            context, question
        )),
    ]
}

/// Answer request with no retrieval.
pub fn direct_messages(question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(DIRECT_SYSTEM_PROMPT),
        ChatMessage::user(question),
    ]
}
