/// Join retrieved chunks in retrieval order and cut the result to at most
/// `budget` characters.
///
/// The cut is a plain prefix and may fall mid-chunk or mid-word.
pub fn assemble_context(chunks: &[&str], separator: &str, budget: usize) -> String {
    let mut context = chunks.join(separator);
    if let Some((cut, _)) = context.char_indices().nth(budget) {
        context.truncate(cut);
    }
    context
}
