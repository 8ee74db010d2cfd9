//! Extraction rules for the three supported boards.

use super::ExtractionRule;

/// JKPSC homepage ticker: visible anchors inside the notification list.
pub const JKPSC: ExtractionRule = ExtractionRule {
    container: Some("ul.notificationnews"),
    entry: r#"li a[visible="true"]"#,
    link: None,
};

/// JKSSB "What's new" page: every `linkText` anchor on the page.
pub const JKSSB: ExtractionRule = ExtractionRule {
    container: None,
    entry: "a.linkText",
    link: None,
};

/// JKBOPEE homepage: rows of the notification table in `#Div1`.
pub const JKBOPEE: ExtractionRule = ExtractionRule {
    container: Some("div#Div1"),
    entry: "table tbody tr",
    link: Some("a.title"),
};

#[cfg(test)]
mod tests {
    use crate::models::NotificationRecord;
    use crate::scrapers::parse_listing;
    use crate::sources::{Source, SourceTarget};

    const JKPSC_HOME: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/jkpsc_home.html"));
    const JKSSB_WHATSNEW: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/jkssb_whatsnew.html"));
    const JKBOPEE_HOME: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/jkbopee_home.html"));

    fn parse(source: Source, html: &str) -> Vec<NotificationRecord> {
        let target = SourceTarget::new(source).unwrap();
        parse_listing(html, &target).unwrap()
    }

    fn assert_normalized(records: &[NotificationRecord]) {
        for record in records {
            assert!(!record.title.is_empty());
            assert_eq!(record.title.trim(), record.title);
            let url = url::Url::parse(&record.url).expect("absolute url");
            assert!(matches!(url.scheme(), "http" | "https"));
        }
    }

    #[test]
    fn test_jkpsc_fixture() {
        let records = parse(Source::Jkpsc, JKPSC_HOME);
        assert_normalized(&records);
        assert_eq!(
            records,
            vec![
                NotificationRecord::new(
                    "Notification for Assistant Engineer (Civil)",
                    "https://www.jkpsc.nic.in/Docs/2026/notice-ae-civil.pdf"
                ),
                NotificationRecord::new(
                    "Result: Lecturer 10+2 (Physics)",
                    "https://www.jkpsc.nic.in/Docs/2026/lecturer-result.pdf"
                ),
                NotificationRecord::new(
                    "CCE Mains Schedule",
                    "https://www.jkpsc.nic.in/Docs/2026/cce-schedule.pdf"
                ),
            ]
        );
    }

    #[test]
    fn test_jkssb_fixture_resolves_parent_relative_link() {
        let records = parse(Source::Jkssb, JKSSB_WHATSNEW);
        assert_normalized(&records);
        assert_eq!(records.len(), 4);
        assert_eq!(
            records[1].title,
            "Schedule for J&K Police Constable written test"
        );
        assert_eq!(
            records[2],
            NotificationRecord::new(
                "Result of Junior Assistant (Typing Test)",
                "https://jkssb.nic.in/Notifications/2026/junior-assistant-result.pdf"
            )
        );
        assert_eq!(
            records[3],
            NotificationRecord::new("How to apply online", "https://jkssb.nic.in/apply.html")
        );
    }

    #[test]
    fn test_jkssb_malformed_entries_are_skipped() {
        let html = r##"<html><body>
            <a class="linkText" href="first.pdf">First</a>
            <a class="linkText">No href</a>
            <a class="linkText" href="blank-title.pdf">
            </a>
            <a class="linkText" href="#top">Fragment only</a>
            <a class="linkText" href="last.pdf">Last</a>
        </body></html>"##;
        let records = parse(Source::Jkssb, html);
        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Last"]);
    }

    #[test]
    fn test_jkbopee_fixture() {
        let records = parse(Source::Jkbopee, JKBOPEE_HOME);
        assert_normalized(&records);
        assert_eq!(
            records,
            vec![
                NotificationRecord::new(
                    "CET 2026 Counselling Notice",
                    "https://www.jkbopee.gov.in/Notifications/2026/cet-counselling.pdf"
                ),
                NotificationRecord::new(
                    "B.Sc Nursing Entrance Result",
                    "https://www.jkbopee.gov.in/Notifications/2026/bsc-nursing-result.pdf"
                ),
                NotificationRecord::new(
                    "Paramedical Provisional Merit List",
                    "https://www.jkbopee.gov.in/Notifications/2026/paramedical.pdf"
                ),
            ]
        );
    }

    #[test]
    fn test_missing_container_is_parse_error() {
        let target = SourceTarget::new(Source::Jkbopee).unwrap();
        let err = parse_listing("<html><body><div id=\"Div2\"></div></body></html>", &target)
            .unwrap_err();
        assert!(err.is_parse());
        assert!(err.to_string().contains("div#Div1"));

        let target = SourceTarget::new(Source::Jkpsc).unwrap();
        let err = parse_listing("<html><body><ul class=\"menu\"></ul></body></html>", &target)
            .unwrap_err();
        assert!(err.is_parse());
    }
}
