use tracing::debug;

use super::records::SkipReason;

/// Heading printed above every kit group in the picking document.
pub const SECTION_MARKER: &str = "Sorties des KITS";

/// Below this many tokens a section cannot hold its kit header and a single record.
pub const MIN_SECTION_TOKENS: usize = 4;

/// Whitespace tokens of one kit group. The first token is the kit identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub index: usize,
    pub tokens: Vec<&'a str>,
}

impl<'a> Section<'a> {
    pub fn kit(&self) -> &'a str {
        self.tokens.first().copied().unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct SplitSections<'a> {
    pub sections: Vec<Section<'a>>,
    pub skipped: usize,
}

pub fn split_sections(text: &str) -> SplitSections<'_> {
    let mut split = SplitSections::default();

    // Everything before the first heading is document preamble.
    for (index, chunk) in text.split(SECTION_MARKER).skip(1).enumerate() {
        let tokens = chunk.split_whitespace().collect::<Vec<&str>>();
        if tokens.len() < MIN_SECTION_TOKENS {
            debug!(
                section = index,
                tokens = tokens.len(),
                reason = SkipReason::ShortSection.as_str(),
                "skipping section"
            );
            split.skipped += 1;
            continue;
        }

        split.sections.push(Section { index, tokens });
    }

    split
}
