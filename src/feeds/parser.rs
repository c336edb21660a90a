// src/feeds/parser.rs
//! Tolerant feed parsing.
//!
//! Job boards ship RSS that is frequently not well-formed XML (bare `&`,
//! unclosed tags, HTML pasted into `<description>`), so items are located by a
//! flat textual scan and every field is pulled out by an ordered list of
//! patterns. The first pattern that matches wins; when none match the field
//! takes its placeholder. Nothing in here returns an error: bad fragments just
//! yield fewer entries.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::feeds::types::{JobListingEntry, RawFeedDocument, NO_DESCRIPTION, NO_LINK, NO_TITLE};

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static feed regex")
}

static RE_ITEM: Lazy<Regex> = Lazy::new(|| re(r"(?s)<item(?:\s[^>]*)?>(.*?)</item>"));
static RE_ENTRY: Lazy<Regex> = Lazy::new(|| re(r"(?s)<entry(?:\s[^>]*)?>(.*?)</entry>"));

static TITLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        re(r"(?s)<title><!\[CDATA\[(.*?)\]\]></title>"),
        re(r"(?s)<title>(.*?)</title>"),
        re(r"(?s)<title[^>]*>(.*?)</title>"),
    ]
});

static LINK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        re(r"(?s)<link>(.*?)</link>"),
        re(r#"<link[^>]*href=["']([^"']*)["'][^>]*>"#),
        re(r"(?s)<guid[^>]*>(.*?)</guid>"),
    ]
});

static DESCRIPTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        re(r"(?s)<description><!\[CDATA\[(.*?)\]\]></description>"),
        re(r"(?s)<description>(.*?)</description>"),
        re(r"(?s)<summary[^>]*>(.*?)</summary>"),
        re(r"(?s)<content[^>]*>(.*?)</content>"),
    ]
});

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        re(r"(?s)<pubDate>(.*?)</pubDate>"),
        re(r"(?s)<dc:date>(.*?)</dc:date>"),
        re(r"(?s)<published>(.*?)</published>"),
        re(r"(?s)<updated>(.*?)</updated>"),
    ]
});

static RE_CDATA: Lazy<Regex> = Lazy::new(|| re(r"(?s)<!\[CDATA\[(.*?)\]\]>"));
static RE_TAGS: Lazy<Regex> = Lazy::new(|| re(r"(?s)<[^>]*>"));
static RE_WS: Lazy<Regex> = Lazy::new(|| re(r"\s+"));
static RE_RFC2822_WEEKDAY: Lazy<Regex> = Lazy::new(|| re(r"^[A-Za-z]{3,9},\s*"));
static RE_RFC2822_UTC_ZONE: Lazy<Regex> = Lazy::new(|| re(r"\s+(?:UTC|UT|Z)$"));

/// Parses raw feed text into job entries.
#[derive(Debug, Clone, Copy)]
pub struct FeedParser {
    description_cap: usize,
    now: DateTime<Utc>,
}

impl FeedParser {
    pub fn new(description_cap: usize) -> Self {
        Self {
            description_cap,
            now: Utc::now(),
        }
    }

    /// Pin the fallback timestamp (entries without a usable date get this).
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Lazily yield entries. Calling again on the same document starts over.
    pub fn entries<'a>(
        &self,
        doc: &'a RawFeedDocument,
    ) -> impl Iterator<Item = JobListingEntry> + 'a {
        let parser = *self;
        let host = source_host(&doc.url);
        let body = doc.body.as_str();
        let segments: &'static Regex = if RE_ITEM.is_match(body) {
            &*RE_ITEM
        } else {
            &*RE_ENTRY
        };

        segments
            .captures_iter(body)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .map(move |fragment| parser.parse_item(fragment, &host))
            .filter(|e| e.has_title() || e.has_link())
    }

    fn parse_item(&self, fragment: &str, host: &str) -> JobListingEntry {
        let title = first_match(&TITLE_PATTERNS, fragment)
            .map(|t| collapse_ws(&decode(&strip_cdata(t))))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| NO_TITLE.to_string());

        let link = first_match(&LINK_PATTERNS, fragment)
            .map(|l| decode(&strip_cdata(l)).trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| NO_LINK.to_string());

        let description = first_match(&DESCRIPTION_PATTERNS, fragment)
            .map(|d| truncate_chars(&clean_markup(d), self.description_cap))
            .unwrap_or_else(|| NO_DESCRIPTION.to_string());

        let published_at = DATE_PATTERNS
            .iter()
            .filter_map(|p| p.captures(fragment))
            .filter_map(|c| c.get(1))
            .find_map(|m| parse_feed_date(&strip_cdata(m.as_str())))
            .unwrap_or(self.now);

        JobListingEntry {
            title,
            link,
            description,
            published_at,
            source_host: host.to_string(),
        }
    }
}

fn first_match<'t>(patterns: &[Regex], text: &'t str) -> Option<&'t str> {
    patterns
        .iter()
        .find_map(|p| p.captures(text).and_then(|c| c.get(1)))
        .map(|m| m.as_str())
}

fn strip_cdata(s: &str) -> String {
    RE_CDATA.replace_all(s, "$1").into_owned()
}

fn decode(s: &str) -> String {
    html_escape::decode_html_entities(s).into_owned()
}

fn collapse_ws(s: &str) -> String {
    RE_WS.replace_all(s, " ").trim().to_string()
}

/// CDATA off, entities decoded (feeds often escape their HTML), tags off.
pub fn clean_markup(s: &str) -> String {
    let out = decode(&strip_cdata(s));
    let out = RE_TAGS.replace_all(&out, " ");
    collapse_ws(&out)
}

/// Cut to `cap` characters, marking the cut with `...`.
pub fn truncate_chars(s: &str, cap: usize) -> String {
    if s.chars().count() <= cap {
        return s.to_string();
    }
    let mut out: String = s.chars().take(cap).collect();
    out.truncate(out.trim_end().len());
    out.push_str("...");
    out
}

/// Hostname of the feed URL without a leading `www.`.
pub fn source_host(feed_url: &str) -> String {
    match url::Url::parse(feed_url) {
        Ok(u) => {
            let host = u.host_str().unwrap_or_default();
            host.strip_prefix("www.").unwrap_or(host).to_string()
        }
        Err(_) => feed_url.trim().to_string(),
    }
}

/// RFC 2822 as feeds actually write it: a weekday that disagrees with the
/// date is ignored, and a `UTC`/`UT`/`Z` zone is read as `+0000`.
fn parse_rfc2822_lenient(s: &str) -> Option<DateTime<Utc>> {
    let no_weekday = RE_RFC2822_WEEKDAY.replace(s, "");
    let zone_fixed = RE_RFC2822_UTC_ZONE.replace(s, " +0000");
    let both = RE_RFC2822_UTC_ZONE.replace(&*no_weekday, " +0000");

    let parsed = [s, &*no_weekday, &*zone_fixed, &*both]
        .into_iter()
        .find_map(|candidate| DateTime::parse_from_rfc2822(candidate).ok())
        .map(|dt| dt.with_timezone(&Utc));
    parsed
}

/// RFC 2822, RFC 3339 / ISO-8601 (offset optional, UTC assumed) or a bare date.
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(dt) = parse_rfc2822_lenient(s) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn doc(body: &str) -> RawFeedDocument {
        RawFeedDocument {
            url: "https://www.rozee.pk/rss/jobs".into(),
            body: body.into(),
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    fn parse(body: &str) -> Vec<JobListingEntry> {
        let d = doc(body);
        FeedParser::new(200).with_now(fixed_now()).entries(&d).collect()
    }

    #[test]
    fn drops_item_with_neither_title_nor_link() {
        let out = parse(
            "<rss><channel>\
             <item><title>Driver</title><link>https://rozee.pk/j/1</link></item>\
             <item><foo>nothing useful</foo></item>\
             </channel></rss>",
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Driver");
    }

    #[test]
    fn keeps_partial_items() {
        let out = parse(
            "<item><title>Only a title</title></item>\
             <item><link>https://rozee.pk/j/2</link></item>",
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].link, NO_LINK);
        assert_eq!(out[1].title, NO_TITLE);
    }

    #[test]
    fn title_prefers_cdata_and_decodes() {
        let out = parse(
            "<item><title><![CDATA[ Senior  Engineer &amp; Lead ]]></title>\
             <link>https://x.test/1</link></item>",
        );
        assert_eq!(out[0].title, "Senior Engineer & Lead");

        let out = parse(r#"<item><title type="text">Nurse</title><link>https://x.test/2</link></item>"#);
        assert_eq!(out[0].title, "Nurse");
    }

    #[test]
    fn link_falls_back_to_href_then_guid() {
        let out = parse(r#"<entry><title>A</title><link rel="alternate" href="https://x.test/a"/></entry>"#);
        assert_eq!(out[0].link, "https://x.test/a");

        let out = parse(r#"<item><title>B</title><guid isPermaLink="true">https://x.test/b</guid></item>"#);
        assert_eq!(out[0].link, "https://x.test/b");

        let out = parse("<item><title>C</title><link>https://x.test/c?a=1&amp;b=2</link></item>");
        assert_eq!(out[0].link, "https://x.test/c?a=1&b=2");
    }

    #[test]
    fn description_is_stripped_and_truncated() {
        let long = "word ".repeat(100);
        let body = format!(
            "<item><title>T</title><link>https://x.test</link>\
             <description><![CDATA[<p><b>{long}</b></p>]]></description></item>"
        );
        let out = parse(&body);
        let d = &out[0].description;
        assert!(d.ends_with("..."));
        assert!(d.chars().count() <= 203);
        assert!(!d.contains('<'));
    }

    #[test]
    fn short_description_is_kept_whole_and_default_applies() {
        let out = parse(
            "<item><title>T</title><link>https://x.test</link>\
             <description>&lt;p&gt;Apply now&lt;/p&gt;</description></item>\
             <item><title>U</title><link>https://x.test/u</link></item>",
        );
        assert_eq!(out[0].description, "Apply now");
        assert_eq!(out[1].description, NO_DESCRIPTION);
    }

    #[test]
    fn date_fallback_chain() {
        let out = parse(
            "<item><title>A</title><link>https://x.test/a</link>\
             <pubDate>Tue, 10 Jun 2025 04:00:00 GMT</pubDate></item>\
             <item><title>B</title><link>https://x.test/b</link>\
             <dc:date>2025-06-11T08:30:00+02:00</dc:date></item>\
             <item><title>C</title><link>https://x.test/c</link>\
             <pubDate>yesterday-ish</pubDate><updated>2025-06-12</updated></item>\
             <item><title>D</title><link>https://x.test/d</link></item>",
        );
        assert_eq!(out[0].published_at, Utc.with_ymd_and_hms(2025, 6, 10, 4, 0, 0).unwrap());
        assert_eq!(out[1].published_at, Utc.with_ymd_and_hms(2025, 6, 11, 6, 30, 0).unwrap());
        assert_eq!(out[2].published_at, Utc.with_ymd_and_hms(2025, 6, 12, 0, 0, 0).unwrap());
        assert_eq!(out[3].published_at, fixed_now());
    }

    #[test]
    fn rfc2822_with_wrong_weekday_still_parses() {
        // 10 Jun 2025 was a Tuesday
        assert_eq!(
            parse_feed_date("Mon, 10 Jun 2025 04:00:00 GMT"),
            Some(Utc.with_ymd_and_hms(2025, 6, 10, 4, 0, 0).unwrap())
        );
        assert_eq!(
            parse_feed_date("Fri, 10 Jun 2025 04:00:00 UTC"),
            Some(Utc.with_ymd_and_hms(2025, 6, 10, 4, 0, 0).unwrap())
        );
    }

    #[test]
    fn rfc2822_with_utc_zone_parses() {
        assert_eq!(
            parse_feed_date("Tue, 10 Jun 2025 04:00:00 UTC"),
            Some(Utc.with_ymd_and_hms(2025, 6, 10, 4, 0, 0).unwrap())
        );
        assert_eq!(
            parse_feed_date("10 Jun 2025 09:15:00 UT"),
            Some(Utc.with_ymd_and_hms(2025, 6, 10, 9, 15, 0).unwrap())
        );
    }

    #[test]
    fn sloppy_dates_keep_feed_order_instead_of_jumping_to_now() {
        let out = parse(
            "<item><title>Old</title><link>https://x.test/old</link>\
             <pubDate>Mon, 02 Jun 2025 04:00:00 UTC</pubDate></item>\
             <item><title>Newer</title><link>https://x.test/new</link>\
             <pubDate>Sun, 10 Jun 2025 04:00:00 GMT</pubDate></item>",
        );
        assert!(out.iter().all(|e| e.published_at != fixed_now()));
        assert!(out[1].published_at > out[0].published_at);
    }

    #[test]
    fn atom_entries_used_when_no_items() {
        let out = parse(
            r#"<feed><entry><title>Atom job</title><link href="https://x.test/atom"/>
            <summary type="html">Remote</summary><published>2025-01-02T03:04:05Z</published></entry></feed>"#,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].description, "Remote");
        assert_eq!(out[0].link, "https://x.test/atom");
    }

    #[test]
    fn multiline_items_and_source_host() {
        let out = parse("<item>\n  <title>\n Welder\n </title>\n  <link>https://x.test/w</link>\n</item>");
        assert_eq!(out[0].title, "Welder");
        assert_eq!(out[0].source_host, "rozee.pk");
        assert_eq!(source_host("https://jobs.example.com/feed"), "jobs.example.com");
    }

    #[test]
    fn iterator_is_restartable() {
        let d = doc("<item><title>A</title><link>https://x.test/a</link></item>");
        let p = FeedParser::new(200).with_now(fixed_now());
        assert_eq!(p.entries(&d).count(), 1);
        assert_eq!(p.entries(&d).count(), 1);
    }

    #[test]
    fn garbage_yields_nothing() {
        assert!(parse("").is_empty());
        assert!(parse("<html><body>503 Service Unavailable</body></html>").is_empty());
        assert!(parse("<item><title>unterminated").is_empty());
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let s = "é".repeat(10);
        assert_eq!(truncate_chars(&s, 4), "éééé...");
        assert_eq!(truncate_chars("abc", 4), "abc");
    }
}
