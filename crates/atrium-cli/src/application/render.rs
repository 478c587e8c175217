//! Plain-text rendering of the configuration for terminal output.

use std::io::{self, Write};

use atrium_core::{Collection, Configuration, Feed, NewsFeeds, Panel, Service, Services};

/// Terminal presentation of one ordered collection.
pub trait CollectionView: Collection {
    /// Singular noun used in messages, e.g. `"service"`.
    const NOUN: &'static str;

    fn label(item: &Self::Item) -> &str;

    fn write_row<W: Write>(out: &mut W, index: usize, item: &Self::Item) -> io::Result<()>;

    fn write_list<W: Write>(out: &mut W, items: &[Self::Item]) -> io::Result<()> {
        if items.is_empty() {
            return writeln!(out, "  (no {}s)", Self::NOUN);
        }
        for (index, item) in items.iter().enumerate() {
            Self::write_row(out, index, item)?;
        }
        Ok(())
    }
}

impl CollectionView for Services {
    const NOUN: &'static str = "service";

    fn label(item: &Service) -> &str {
        &item.name
    }

    fn write_row<W: Write>(out: &mut W, index: usize, item: &Service) -> io::Result<()> {
        write!(out, "{index:>4}  {} {:<24} {}", item.icon, item.name, item.url)?;
        if !item.color.is_empty() {
            write!(out, "  [{}]", item.color)?;
        }
        if !item.description.is_empty() {
            write!(out, "  {}", item.description)?;
        }
        writeln!(out)
    }
}

impl CollectionView for NewsFeeds {
    const NOUN: &'static str = "feed";

    fn label(item: &Feed) -> &str {
        &item.name
    }

    fn write_row<W: Write>(out: &mut W, index: usize, item: &Feed) -> io::Result<()> {
        writeln!(out, "{index:>4}  {:<24} {}", item.name, item.url)
    }
}

/// Writes the whole configuration as a readable summary.
pub fn write_summary<W: Write>(out: &mut W, config: &Configuration) -> io::Result<()> {
    let title = if config.app_title.is_empty() {
        "(default)"
    } else {
        config.app_title.as_str()
    };
    writeln!(out, "Title:          {title}")?;
    writeln!(out, "Theme:          {}", config.theme)?;
    writeln!(out, "News per feed:  {}", config.max_news_per_feed)?;

    let panels: Vec<String> = Panel::ALL
        .into_iter()
        .map(|p| format!("{p} {}", if config.panels.get(p) { "on" } else { "off" }))
        .collect();
    writeln!(out, "Panels:         {}", panels.join(", "))?;

    writeln!(out)?;
    writeln!(out, "Services ({}):", config.services.len())?;
    Services::write_list(out, &config.services)?;
    writeln!(out)?;
    writeln!(out, "Feeds ({}):", config.news_feeds.len())?;
    NewsFeeds::write_list(out, &config.news_feeds)
}

/// Writes search hits, keeping each service's collection index.
pub fn write_matches<W: Write>(out: &mut W, hits: &[(usize, &Service)]) -> io::Result<()> {
    if hits.is_empty() {
        return writeln!(out, "  (no matching services)");
    }
    for (index, service) in hits {
        Services::write_row(out, *index, service)?;
    }
    Ok(())
}
