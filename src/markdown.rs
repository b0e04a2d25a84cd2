/// Removes `**`, `*` and backticks from `text`, in that order.
///
/// This is plain substring deletion, not a markdown parser: code fences,
/// escapes and literal asterisks are all stripped alike.
pub fn strip_markdown(text: &str) -> String {
    text.replace("**", "").replace('*', "").replace('`', "")
}
