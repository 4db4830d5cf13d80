// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, FixedOffset};
use url::Url;

use crate::error::FeedError;

/// Represents a parsed podcast feed
#[derive(Debug, Clone)]
pub struct Podcast {
    pub title: String,
    pub description: Option<String>,
    pub link: Option<Url>,
    pub feed_url: Url,
    pub episodes: Vec<Episode>,
}

/// A single podcast episode as read from the feed.
///
/// `identity` is stable across feed re-fetches: the RSS guid, falling back to
/// the enclosure URL when the feed omits one.
#[derive(Debug, Clone)]
pub struct Episode {
    pub identity: String,
    pub title: String,
    pub pub_date: Option<DateTime<FixedOffset>>,
    pub enclosure: Enclosure,
}

/// The audio file attached to an episode
#[derive(Debug, Clone)]
pub struct Enclosure {
    pub url: Url,
    pub length: Option<u64>,
    pub mime_type: Option<String>,
}

/// Parse RSS feed XML bytes into a Podcast struct
pub fn parse_feed(xml_bytes: &[u8], feed_url: Url) -> Result<Podcast, FeedError> {
    let channel = rss::Channel::read_from(xml_bytes)?;

    let episodes = channel
        .items()
        .iter()
        .filter_map(|item| parse_episode(item).ok())
        .collect();

    Ok(Podcast {
        title: html_escape::decode_html_entities(channel.title())
            .trim()
            .to_string(),
        description: Some(channel.description().to_string()).filter(|s| !s.is_empty()),
        link: Url::parse(channel.link()).ok(),
        feed_url,
        episodes,
    })
}

fn parse_episode(item: &rss::Item) -> Result<Episode, FeedError> {
    let title = item
        .title()
        .map(|t| html_escape::decode_html_entities(t).trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled Episode".to_string());

    let enclosure = item
        .enclosure()
        .ok_or_else(|| FeedError::MissingEnclosure {
            title: title.clone(),
        })?;

    let enclosure_url = Url::parse(enclosure.url())?;

    let pub_date = item
        .pub_date()
        .and_then(|date_str| DateTime::parse_from_rfc2822(date_str).ok());

    let identity = item
        .guid()
        .map(|g| g.value().to_string())
        .unwrap_or_else(|| enclosure.url().to_string());

    Ok(Episode {
        identity,
        title,
        pub_date,
        enclosure: Enclosure {
            url: enclosure_url,
            length: enclosure.length().parse().ok(),
            mime_type: Some(enclosure.mime_type().to_string()).filter(|s| !s.is_empty()),
        },
    })
}

/// Reorder episodes to ascending publish order, oldest first.
///
/// RSS feeds conventionally list newest first, but the feed's order is not
/// relied on: the list is reversed, then sorted by a total key. An undated
/// episode inherits the closest preceding date after reversal, so it keeps
/// its reversed feed position relative to its dated neighbours; the reversed
/// position itself breaks ties.
pub fn normalize_chronological(episodes: Vec<Episode>) -> Vec<Episode> {
    let mut carried: Option<DateTime<FixedOffset>> = None;
    let mut keyed: Vec<(Option<DateTime<FixedOffset>>, usize, Episode)> = episodes
        .into_iter()
        .rev()
        .enumerate()
        .map(|(position, episode)| {
            if episode.pub_date.is_some() {
                carried = episode.pub_date;
            }
            (carried, position, episode)
        })
        .collect();

    keyed.sort_by_key(|&(date, position, _)| (date, position));
    keyed.into_iter().map(|(_, _, episode)| episode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Les Aventures de No&#235;l</title>
    <description>A test podcast for unit testing</description>
    <link>https://example.com</link>
    <item>
      <title>Jour 23 &amp; fin</title>
      <pubDate>Mon, 23 Dec 2024 08:00:00 +0000</pubDate>
      <guid>ep23-guid</guid>
      <enclosure url="https://example.com/ep23.mp3" length="1234567" type="audio/mpeg"/>
    </item>
    <item>
      <title>Jour 22</title>
      <pubDate>Sun, 22 Dec 2024 08:00:00 +0000</pubDate>
      <guid>ep22-guid</guid>
      <enclosure url="https://example.com/ep22.mp3" type="audio/mpeg"/>
    </item>
    <item>
      <title>Jour 21</title>
      <enclosure url="https://example.com/ep21.mp3" type="audio/mpeg"/>
    </item>
  </channel>
</rss>"#;

    fn sample_podcast() -> Podcast {
        let feed_url = Url::parse("https://example.com/feed.xml").unwrap();
        parse_feed(SAMPLE_FEED.as_bytes(), feed_url).unwrap()
    }

    #[test]
    fn parse_feed_extracts_podcast_metadata() {
        let podcast = sample_podcast();

        assert_eq!(podcast.title, "Les Aventures de Noël");
        assert_eq!(
            podcast.description,
            Some("A test podcast for unit testing".to_string())
        );
    }

    #[test]
    fn parse_feed_decodes_entities_in_titles() {
        let podcast = sample_podcast();
        assert_eq!(podcast.episodes[0].title, "Jour 23 & fin");
    }

    #[test]
    fn guid_is_the_identity() {
        let podcast = sample_podcast();
        assert_eq!(podcast.episodes[0].identity, "ep23-guid");
    }

    #[test]
    fn missing_guid_falls_back_to_enclosure_url() {
        let podcast = sample_podcast();
        assert_eq!(podcast.episodes[2].identity, "https://example.com/ep21.mp3");
    }

    #[test]
    fn parse_feed_handles_missing_optional_fields() {
        let podcast = sample_podcast();
        let ep = &podcast.episodes[2];
        assert!(ep.pub_date.is_none());
        assert_eq!(ep.enclosure.length, None);
    }

    #[test]
    fn parse_feed_skips_items_without_enclosure() {
        let feed_no_enclosure = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Test</title>
    <description>Test</description>
    <item>
      <title>No Audio</title>
    </item>
  </channel>
</rss>"#;

        let feed_url = Url::parse("https://example.com/feed.xml").unwrap();
        let podcast = parse_feed(feed_no_enclosure.as_bytes(), feed_url).unwrap();
        assert!(podcast.episodes.is_empty());
    }

    #[test]
    fn normalize_reverses_a_newest_first_feed() {
        let podcast = sample_podcast();
        let ordered = normalize_chronological(podcast.episodes);

        assert_eq!(ordered[0].title, "Jour 21");
        assert_eq!(ordered[1].title, "Jour 22");
        assert_eq!(ordered[2].title, "Jour 23 & fin");
    }

    fn bare_episode(title: &str, date: Option<&str>) -> Episode {
        Episode {
            identity: title.to_string(),
            title: title.to_string(),
            pub_date: date.map(|d| DateTime::parse_from_rfc2822(d).unwrap()),
            enclosure: Enclosure {
                url: Url::parse("https://example.com/a.mp3").unwrap(),
                length: None,
                mime_type: None,
            },
        }
    }

    #[test]
    fn normalize_orders_an_undated_feed_by_reversed_position() {
        // Newest first, no dates anywhere
        let episodes = vec![
            bare_episode("Episode 3", None),
            bare_episode("Episode 2", None),
            bare_episode("Episode 1", None),
        ];

        let ordered = normalize_chronological(episodes);
        let titles: Vec<&str> = ordered.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Episode 1", "Episode 2", "Episode 3"]);
    }

    #[test]
    fn undated_episode_stays_between_its_dated_neighbours() {
        let episodes = vec![
            bare_episode("Third", Some("Wed, 03 Jan 2024 08:00:00 +0000")),
            bare_episode("Special", None),
            bare_episode("First", Some("Mon, 01 Jan 2024 08:00:00 +0000")),
        ];

        let ordered = normalize_chronological(episodes);
        let titles: Vec<&str> = ordered.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Special", "Third"]);
    }

    #[test]
    fn dated_episodes_sort_by_date_despite_undated_neighbours() {
        // An oldest-first feed with an undated entry must not scramble the
        // dated ones
        let episodes = vec![
            bare_episode("First", Some("Mon, 01 Jan 2024 08:00:00 +0000")),
            bare_episode("Special", None),
            bare_episode("Third", Some("Wed, 03 Jan 2024 08:00:00 +0000")),
        ];

        let ordered = normalize_chronological(episodes);
        let dated: Vec<&str> = ordered
            .iter()
            .filter(|e| e.pub_date.is_some())
            .map(|e| e.title.as_str())
            .collect();
        assert_eq!(dated, vec!["First", "Third"]);
    }

    #[test]
    fn normalize_sorts_a_shuffled_dated_list() {
        let podcast = sample_podcast();
        let mut episodes = podcast.episodes;
        episodes.retain(|e| e.pub_date.is_some());
        episodes.reverse(); // oldest first, i.e. "wrong" for an RSS feed

        let ordered = normalize_chronological(episodes);
        assert_eq!(ordered[0].title, "Jour 22");
        assert_eq!(ordered[1].title, "Jour 23 & fin");
    }
}
