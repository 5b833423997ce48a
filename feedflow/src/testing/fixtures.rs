//! Document and configuration fixtures.

use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use crate::config::PipelineConfig;
use crate::fetch::{FetchContext, FetchSource};

/// Source URL used by [`test_config`].
pub const TEST_SOURCE: &str = "memory://feed.xml";

/// A product item with English and Lithuanian descriptions.
#[must_use]
pub fn item_xml(id: &str) -> String {
    format!(
        concat!(
            r#"<product id="{id}" sku="SKU-{id}">"#,
            r#"<text lang="en"><title>Title {id}</title><description>Description {id}</description></text>"#,
            r#"<text lang="lt"><title>Pavadinimas {id}</title><description>Aprasymas {id}</description></text>"#,
            "<images><image>https://img.example.com/{id}.jpg</image></images>",
            "</product>"
        ),
        id = id
    )
}

/// A feed document with `count` items numbered from 1.
#[must_use]
pub fn feed_xml(count: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<products>\n");
    for i in 1..=count {
        let _ = writeln!(xml, "  {}", item_xml(&i.to_string()));
    }
    xml.push_str("</products>\n");
    xml
}

/// Configuration rooted at `root` with a single plain source and no split
/// throttle.
#[must_use]
pub fn test_config(root: &Path) -> PipelineConfig {
    PipelineConfig::new(root)
        .with_sources(vec![FetchSource::new(TEST_SOURCE, FetchContext::Plain)])
        .with_split_throttle(Duration::ZERO)
}
