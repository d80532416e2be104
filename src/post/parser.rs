//! Posts-file parser.
//!
//! A posts file is a run of blocks separated by `+++` lines:
//!
//! ```text
//! <preamble>          discarded
//! +++
//! <site metadata>     discarded (belongs to the source, not the merge)
//! +++
//! <site body>         discarded
//! +++
//! <post metadata>     ┐
//! +++                 │ repeated
//! <post body>         ┘
//! ```
//!
//! [`split_blocks`] cuts the text into blocks and [`Parser`] walks them with
//! an explicit state machine, so the header offsets and the meta/body
//! pairing are decided by state names rather than index arithmetic.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::Record;

/// Delimiter line content.
pub const DELIMITER: &str = "+++";

/// Parts of the source header, in the order they appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderPart {
    Preamble,
    SiteMeta,
    SiteBody,
}

/// Where the parser is in the block sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State<'a> {
    ExpectHeader(HeaderPart),
    ExpectPostMeta,
    /// `meta` is `None` when the metadata block was blank; the body that
    /// follows is then dropped along with it.
    ExpectPostBody { meta: Option<&'a str> },
}

/// The document had a header but no post metadata block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoPosts;

/// Is this line a block delimiter? Trailing whitespace is tolerated.
fn is_delimiter(line: &str) -> bool {
    line.strip_prefix(DELIMITER)
        .is_some_and(|rest| rest.chars().all(char::is_whitespace))
}

/// Split a document on delimiter lines. Always yields at least one block
/// (the preamble, possibly empty).
pub fn split_blocks(content: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    for line in content.split_inclusive('\n') {
        let end = pos + line.len();
        if is_delimiter(line.trim_end_matches(['\n', '\r'])) {
            blocks.push(&content[start..pos]);
            start = end;
        }
        pos = end;
    }
    blocks.push(&content[start..]);
    blocks
}

/// Block-by-block state machine producing [`Record`]s.
pub struct Parser<'a> {
    source_name: &'a str,
    undated: DateTime<Utc>,
    state: State<'a>,
    post_blocks: usize,
    records: Vec<Record>,
}

impl<'a> Parser<'a> {
    pub fn new(source_name: &'a str, undated: DateTime<Utc>) -> Self {
        Self {
            source_name,
            undated,
            state: State::ExpectHeader(HeaderPart::Preamble),
            post_blocks: 0,
            records: Vec::new(),
        }
    }

    pub fn state(&self) -> &State<'a> {
        &self.state
    }

    /// Feed the next block.
    pub fn push(&mut self, block: &'a str) {
        self.state = match std::mem::replace(&mut self.state, State::ExpectPostMeta) {
            State::ExpectHeader(HeaderPart::Preamble) => State::ExpectHeader(HeaderPart::SiteMeta),
            State::ExpectHeader(HeaderPart::SiteMeta) => State::ExpectHeader(HeaderPart::SiteBody),
            State::ExpectHeader(HeaderPart::SiteBody) => State::ExpectPostMeta,
            State::ExpectPostMeta => self.on_post_meta(block),
            State::ExpectPostBody { meta } => {
                if let Some(meta) = meta {
                    self.emit(meta, block);
                }
                State::ExpectPostMeta
            }
        };
    }

    fn on_post_meta(&mut self, block: &'a str) -> State<'a> {
        self.post_blocks += 1;
        let meta = (!block.trim().is_empty()).then_some(block);
        State::ExpectPostBody { meta }
    }

    fn emit(&mut self, meta: &str, body: &str) {
        self.records
            .push(Record::new(self.source_name, meta, body, self.undated));
    }

    /// End of input. A metadata block with no body after it still counts
    /// as a post with an empty body.
    pub fn finish(mut self) -> Result<Vec<Record>, NoPosts> {
        if let State::ExpectPostBody { meta: Some(meta) } = self.state {
            self.emit(meta, "");
        }
        if self.post_blocks == 0 {
            return Err(NoPosts);
        }
        Ok(self.records)
    }
}

/// Parse a document without logging.
pub fn try_parse(
    content: &str,
    source_name: &str,
    undated: DateTime<Utc>,
) -> Result<Vec<Record>, NoPosts> {
    let mut parser = Parser::new(source_name, undated);
    for block in split_blocks(content) {
        parser.push(block);
    }
    parser.finish()
}

/// Parse a source's posts file. A file with no posts logs one warning and
/// yields nothing; that is not an error.
pub fn parse_document(content: &str, source_name: &str, undated: DateTime<Utc>) -> Vec<Record> {
    match try_parse(content, source_name, undated) {
        Ok(records) => records,
        Err(NoPosts) => {
            warn!("{source_name}: no posts found (need site metadata + at least 1 post)");
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UNDATED_SORT_KEY;

    const HEADER: &str = "+++\nsite_title: Alpha\n+++\n\nAlpha's own page\n\n";

    fn parse(doc: &str) -> Result<Vec<Record>, NoPosts> {
        try_parse(doc, "Alpha", UNDATED_SORT_KEY)
    }

    #[test]
    fn splits_on_delimiter_lines_only() {
        let blocks = split_blocks("a\n+++\nb +++\n+++  \r\nc");
        assert_eq!(blocks, vec!["a\n", "b +++\n", "c"]);
    }

    #[test]
    fn document_without_delimiters_is_one_block() {
        assert_eq!(split_blocks("just text"), vec!["just text"]);
        assert_eq!(split_blocks(""), vec![""]);
    }

    #[test]
    fn header_only_document_has_no_posts() {
        assert_eq!(parse(HEADER), Err(NoPosts));
        assert_eq!(parse(""), Err(NoPosts));
        assert_eq!(parse("no delimiters at all"), Err(NoPosts));
    }

    #[test]
    fn parse_document_returns_empty_for_header_only() {
        assert!(parse_document(HEADER, "Alpha", UNDATED_SORT_KEY).is_empty());
    }

    #[test]
    fn extracts_posts_in_document_order() {
        let doc = format!(
            "{HEADER}+++\ntitle: One\ndate: 2024-01-01\n+++\n\nFirst body\n\n\
             +++\ntitle: Two\ndate: 2024-03-01\n+++\n\nSecond body\n"
        );
        let records = parse(&doc).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].meta, "title: One\ndate: 2024-01-01");
        assert_eq!(records[0].body, "First body");
        assert_eq!(records[0].source_name, "Alpha");
        assert_eq!(records[1].date.as_deref(), Some("2024-03-01"));
        assert_eq!(records[1].body, "Second body");
    }

    #[test]
    fn trailing_meta_without_body_yields_empty_body() {
        let doc = format!("{HEADER}+++\ntitle: Last\ndate: 2024-01-01\n");
        let records = parse(&doc).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].body, "");
    }

    #[test]
    fn blank_meta_is_skipped_with_its_body() {
        let doc = format!(
            "{HEADER}+++\n   \n+++\nORPHAN BODY\n\
             +++\ntitle: Kept\ndate: 2024-02-01\n+++\nkept body\n"
        );
        let records = parse(&doc).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].meta, "title: Kept\ndate: 2024-02-01");
        assert!(records.iter().all(|r| !r.body.contains("ORPHAN")));
    }

    #[test]
    fn only_blank_meta_is_valid_but_empty() {
        let doc = format!("{HEADER}+++\n\n+++\nbody\n");
        assert_eq!(parse(&doc), Ok(vec![]));
    }

    #[test]
    fn state_machine_walks_header_then_alternates() {
        let mut p = Parser::new("s", UNDATED_SORT_KEY);
        assert_eq!(p.state(), &State::ExpectHeader(HeaderPart::Preamble));
        p.push("");
        assert_eq!(p.state(), &State::ExpectHeader(HeaderPart::SiteMeta));
        p.push("site_title: x");
        assert_eq!(p.state(), &State::ExpectHeader(HeaderPart::SiteBody));
        p.push("site body");
        assert_eq!(p.state(), &State::ExpectPostMeta);
        p.push("date: 2024-01-01");
        assert_eq!(
            p.state(),
            &State::ExpectPostBody { meta: Some("date: 2024-01-01") }
        );
        p.push("body");
        assert_eq!(p.state(), &State::ExpectPostMeta);
        p.push(" ");
        assert_eq!(p.state(), &State::ExpectPostBody { meta: None });

        let records = p.finish().unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn meta_round_trips_verbatim() {
        let meta = "title: \"Quoted: yes\"\ndate: '2024-05-05'\nlinks:\n  - https://example.com/a+b";
        let doc = format!("{HEADER}+++\n{meta}\n+++\nbody\n");
        let records = parse(&doc).unwrap();
        assert_eq!(records[0].meta, meta);
    }
}
