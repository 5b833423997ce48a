//! Splitting a feed into per-item fragments.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::tree::{strip_bom, XmlElement};
use crate::errors::{FeedflowError, Result};

/// Returns the exact source text of every direct child element of the root.
///
/// The document is validated first, so a malformed feed yields
/// [`FeedflowError::ParseFailure`] and no fragments.
pub fn split_children(xml: &str) -> Result<Vec<String>> {
    let xml = strip_bom(xml);
    XmlElement::parse(xml)?;

    let mut reader = Reader::from_str(xml);
    let mut fragments = Vec::new();
    let mut depth = 0usize;
    let mut fragment_start = 0usize;

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event().map_err(FeedflowError::parse)? {
            Event::Start(_) => {
                depth += 1;
                if depth == 2 {
                    fragment_start = before;
                }
            }
            Event::Empty(_) if depth == 1 => {
                let end = reader.buffer_position() as usize;
                fragments.push(xml[before..end].to_string());
            }
            Event::End(_) => {
                if depth == 2 {
                    let end = reader.buffer_position() as usize;
                    fragments.push(xml[fragment_start..end].to_string());
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(fragments)
}

/// Number of direct child elements of the document root.
pub fn count_items(xml: &str) -> Result<usize> {
    Ok(XmlElement::parse(xml)?.element_count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_preserves_fragment_text() {
        let feed = r#"<?xml version="1.0"?>
<products>
    <product id="1"><entry lang="en"><title>A</title></entry></product>
    <!-- comment between items -->
    <product id="2"/>
    <product id="3">text &amp; more</product>
</products>"#;

        let fragments = split_children(feed).unwrap();
        assert_eq!(
            fragments,
            vec![
                r#"<product id="1"><entry lang="en"><title>A</title></entry></product>"#.to_string(),
                r#"<product id="2"/>"#.to_string(),
                r#"<product id="3">text &amp; more</product>"#.to_string(),
            ]
        );
    }

    #[test]
    fn test_fragments_are_standalone_documents() {
        let feed = "<items><item a=\"1\"><x/></item><item a=\"2\"/></items>";
        for fragment in split_children(feed).unwrap() {
            let root = XmlElement::parse(&fragment).unwrap();
            assert_eq!(root.name, "item");
        }
    }

    #[test]
    fn test_split_without_whitespace() {
        let fragments = split_children("<r><a/><b>1</b></r>").unwrap();
        assert_eq!(fragments, vec!["<a/>".to_string(), "<b>1</b>".to_string()]);
    }

    #[test]
    fn test_split_empty_root() {
        assert!(split_children("<r/>").unwrap().is_empty());
        assert!(split_children("<r>  </r>").unwrap().is_empty());
    }

    #[test]
    fn test_split_malformed_feed_fails() {
        assert!(matches!(
            split_children("<r><a></r>"),
            Err(FeedflowError::ParseFailure(_))
        ));
    }

    #[test]
    fn test_count_items() {
        assert_eq!(count_items("<r><a/><b/><c><d/></c></r>").unwrap(), 3);
        assert_eq!(count_items("<r/>").unwrap(), 0);
    }
}
