use crate::types::{AggregatorError, FeedChannel, FeedDocument, FeedItem, Result};
use rss::Channel;
use tracing::debug;

pub struct FeedParser;

impl FeedParser {
    /// Parse an RSS 2.0 document. Missing optional elements become empty
    /// strings; malformed XML is a `Parse` error.
    pub fn parse(content: &[u8]) -> Result<FeedDocument> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let channel = Channel::read_from(content)
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        Ok(FeedDocument::from(channel))
    }
}

impl From<Channel> for FeedDocument {
    fn from(channel: Channel) -> Self {
        let items = channel
            .items()
            .iter()
            .map(|item| FeedItem {
                title: item.title().unwrap_or_default().to_string(),
                link: item.link().unwrap_or_default().trim().to_string(),
                description: item.description().unwrap_or_default().to_string(),
                published_at_raw: item.pub_date().unwrap_or_default().trim().to_string(),
            })
            .collect();

        FeedDocument {
            channel: FeedChannel {
                title: channel.title().to_string(),
                link: channel.link().to_string(),
                description: channel.description().to_string(),
                items,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FeedParser;
    use crate::types::AggregatorError;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Boot.dev Blog</title>
    <link>https://blog.boot.dev/</link>
    <description>Recent content on Boot.dev Blog</description>
    <item>
      <title>The Zen of Proverbs</title>
      <link>https://blog.boot.dev/zen</link>
      <description>Twenty rules &lt;b&gt;to live by&lt;/b&gt;</description>
      <pubDate>Mon, 02 Jan 2006 15:04:05 -0700</pubDate>
    </item>
    <item>
      <title>Untimed</title>
      <link> https://blog.boot.dev/untimed </link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn it_parses_channel_and_items() {
        let doc = FeedParser::parse(SAMPLE.as_bytes()).unwrap();

        assert_eq!(doc.channel.title, "Boot.dev Blog");
        assert_eq!(doc.channel.link, "https://blog.boot.dev/");
        assert_eq!(doc.channel.description, "Recent content on Boot.dev Blog");
        assert_eq!(doc.channel.items.len(), 2);

        let first = &doc.channel.items[0];
        assert_eq!(first.title, "The Zen of Proverbs");
        assert_eq!(first.link, "https://blog.boot.dev/zen");
        assert_eq!(first.description, "Twenty rules <b>to live by</b>");
        assert_eq!(first.published_at_raw, "Mon, 02 Jan 2006 15:04:05 -0700");
    }

    #[test]
    fn it_defaults_missing_fields() {
        let doc = FeedParser::parse(SAMPLE.as_bytes()).unwrap();
        let second = &doc.channel.items[1];

        assert_eq!(second.link, "https://blog.boot.dev/untimed");
        assert_eq!(second.description, "");
        assert_eq!(second.published_at_raw, "");
    }

    #[test]
    fn it_rejects_malformed_xml() {
        let result = FeedParser::parse(b"<rss><channel><title>oops</channel>");
        assert!(matches!(result, Err(AggregatorError::Parse(_))));
    }

    #[test]
    fn it_rejects_non_rss_documents() {
        let result = FeedParser::parse(b"<html><body>not a feed</body></html>");
        assert!(matches!(result, Err(AggregatorError::Parse(_))));
    }
}
