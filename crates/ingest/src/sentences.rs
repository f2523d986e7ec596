use unicode_segmentation::UnicodeSegmentation;

/// A sentence borrowed from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence<'a> {
    pub text: &'a str,
    pub offset: usize, // byte position of the trimmed text in the source
}

/// Split text into trimmed, non-empty sentences using Unicode sentence boundaries.
pub fn split_sentences(text: &str) -> Vec<Sentence<'_>> {
    text.split_sentence_bound_indices()
        .filter_map(|(start, raw)| {
            let trimmed = raw.trim_start();
            let leading = raw.len() - trimmed.len();
            let trimmed = trimmed.trim_end();
            if trimmed.is_empty() {
                None
            } else {
                Some(Sentence {
                    text: trimmed,
                    offset: start + leading,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences() {
        let text = "Rotting Christ performed in Athens. Necromantia joined them!  ";
        let sentences = split_sentences(text);

        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].text, "Rotting Christ performed in Athens.");
        assert_eq!(sentences[1].text, "Necromantia joined them!");
        assert_eq!(&text[sentences[1].offset..][..11], "Necromantia");
    }

    #[test]
    fn test_blank_text_has_no_sentences() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("   \n\n ").is_empty());
    }
}
