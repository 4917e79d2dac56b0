//! FB2 (FictionBook) metadata for reply captions
//!
//! Only `<title-info>` is read: the book title and the first author. Parsing
//! stops at the end of `<title-info>` or the start of `<body>`, so large
//! books are never scanned in full.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::{Error, Result};

/// Longest title kept for a caption, in characters
const MAX_TITLE_CHARS: usize = 255;

/// Book metadata relevant for captions
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BookMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
}

impl BookMetadata {
    /// Caption describing the book, if any metadata is present
    #[must_use]
    pub fn caption(&self) -> Option<String> {
        match (&self.title, &self.author) {
            (Some(title), Some(author)) => Some(format!(
                "\u{1f4da} \"{title}\" by {author} has been successfully extracted!"
            )),
            (Some(title), None) => Some(format!(
                "\u{1f4da} \"{title}\" has been successfully extracted!"
            )),
            (None, Some(author)) => Some(format!(
                "\u{1f4da} A book by {author} has been successfully extracted!"
            )),
            (None, None) => None,
        }
    }
}

/// Author name parts from `<title-info><author>`
#[derive(Debug, Default)]
struct Fb2Author {
    first_name: Option<String>,
    last_name: Option<String>,
    nickname: Option<String>,
}

impl Fb2Author {
    fn set(&mut self, field: &str, text: &str) {
        let slot = match field {
            "first-name" => &mut self.first_name,
            "last-name" => &mut self.last_name,
            "nickname" => &mut self.nickname,
            _ => return,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    fn display_name(self) -> Option<String> {
        match (self.first_name, self.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (None, Some(last)) => Some(last),
            (Some(first), None) => Some(first),
            (None, None) => self.nickname,
        }
    }
}

/// Read title and first author from an FB2 document
///
/// # Errors
///
/// Returns [`Error::Document`] if the XML is malformed before the end of
/// `<title-info>`
pub fn read_metadata(data: &[u8]) -> Result<BookMetadata> {
    let mut reader = Reader::from_reader(data);
    let mut buf = Vec::new();
    let mut path: Vec<String> = Vec::new();

    let mut title: Option<String> = None;
    let mut author = Fb2Author::default();
    let mut author_seen = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if name == "body" {
                    break;
                }
                path.push(name);
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                let name = name.as_ref();
                if name == b"title-info" {
                    break;
                }
                if name == b"author" && path.len() >= 2 && path[path.len() - 2] == "title-info" {
                    author_seen = true;
                }
                path.pop();
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::Document(format!("FB2 text error: {e}")))?;
                let text = text.trim();
                let tail: Vec<&str> = path.iter().map(String::as_str).collect();
                match tail.as_slice() {
                    _ if text.is_empty() => {}
                    [.., "title-info", "book-title"] => {
                        title.get_or_insert_with(String::new).push_str(text);
                    }
                    [.., "title-info", "author", field] if !author_seen => author.set(field, text),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Document(format!("FB2 parse error: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    Ok(BookMetadata {
        title: title.map(|t| t.chars().take(MAX_TITLE_CHARS).collect()),
        author: author.display_name(),
    })
}
