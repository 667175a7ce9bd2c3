/// Renders one sentence block: `# sent_id`, optional `# text`, token lines,
/// then the blank line that separates sentences.
pub fn render_sentence(sent_id: &str, text: Option<&str>, token_lines: &str) -> String {
    let mut block = format!("# sent_id = {sent_id}\n");
    if let Some(text) = text {
        block.push_str(&format!("# text = {text}\n"));
    }
    if !token_lines.is_empty() {
        block.push_str(token_lines);
        block.push('\n');
    }
    block.push('\n');
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::treebank::reader::parse_conllu;

    #[test]
    fn test_render_sentence_layout() {
        let block = render_sentence("s1", Some("Ja!"), "1\tJa\n2\t!");
        assert_eq!(block, "# sent_id = s1\n# text = Ja!\n1\tJa\n2\t!\n\n");
    }

    #[test]
    fn test_rendered_blocks_read_back_as_separate_sentences() {
        let doc = [
            render_sentence("a", Some("Ja"), "1\tJa\tja\tINTJ\t_\t_\t0\troot\t_\t_"),
            render_sentence("b", None, "1\tNej\tnej\tINTJ\t_\t_\t0\troot\t_\t_"),
        ]
        .concat();

        let sentences = parse_conllu(&doc);
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].sent_id.as_deref(), Some("a"));
        assert_eq!(sentences[1].text, None);
    }
}
