use serde::Deserialize;

const CHAT_PREAMBLE: &str = "You are a financial analyst assistant for CrediTrust. \
Your task is to answer questions about customer complaints.\n\
Use the following retrieved complaint excerpts to formulate your answer. \
If the context doesn't contain the answer,\n\
state that you don't have enough information.";

const ANALYST_PREAMBLE: &str = "You are a financial analyst assistant for CrediTrust.\n\
Use the following retrieved complaint excerpts to answer the question.\n\
If the answer is not contained in the context, say \"I don't have enough information.\"";

const CONCISE_PREAMBLE: &str = "Use the following customer complaint excerpts \
to answer the question clearly and concisely.";

/// Prompt layout. Every template ends with the `Answer:` marker the generator
/// continues from. The question is inserted verbatim, without escaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTemplate {
    /// Analyst role with instructions, question on the `Question:` line.
    #[default]
    Chat,
    /// Analyst role, question on its own line after `Question:`.
    Analyst,
    /// Terse instruction for summarisation-style text-to-text models.
    Concise,
}

impl PromptTemplate {
    /// Render the prompt for `context` and `question`.
    pub fn build(self, context: &str, question: &str) -> String {
        match self {
            Self::Chat => format!(
                "{CHAT_PREAMBLE}\n\nContext:\n{context}\n\nQuestion: {question}\nAnswer:"
            ),
            Self::Analyst => format!(
                "{ANALYST_PREAMBLE}\n\nContext:\n{context}\n\nQuestion:\n{question}\n\nAnswer:"
            ),
            Self::Concise => format!(
                "{CONCISE_PREAMBLE}\n\nContext:\n{context}\n\nQuestion: {question}\nAnswer:"
            ),
        }
    }
}
