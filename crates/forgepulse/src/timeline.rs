//! Time-based ordering, windowing and recency classification.
//!
//! Timestamps are always UTC. Recency compares calendar dates in the local
//! timezone; the `*_in` variants take the zone and "today" explicitly so the
//! bucketing rules can be tested without depending on the host clock.

use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::model::{ActivityData, CommitRecord, PrStatus, PullRequestRecord, RepositoryRef};

/// Days counted as "this week" in digests.
pub const DAYS_IN_WEEK: i64 = 7;

/// Recency bucket of a timestamp relative to the local date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recency {
    Today,
    Yesterday,
    ThisWeek,
    Older,
}

impl Recency {
    /// Display color token.
    pub const fn color(self) -> &'static str {
        match self {
            Recency::Today => "#9C27B0",
            Recency::Yesterday => "#43A047",
            Recency::ThisWeek => "#FB8C00",
            Recency::Older => "#FFFFFF",
        }
    }

    /// Display badge token.
    pub const fn badge(self) -> &'static str {
        match self {
            Recency::Today => "🌟",
            Recency::Yesterday => "🌙",
            Recency::ThisWeek => "☄️",
            Recency::Older => "⭐",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Recency::Today => "today",
            Recency::Yesterday => "yesterday",
            Recency::ThisWeek => "this_week",
            Recency::Older => "older",
        }
    }
}

/// Bucket a calendar date against `today`.
pub fn recency_on(date: NaiveDate, today: NaiveDate) -> Recency {
    let yesterday = today - Duration::days(1);
    let week_ago = today - Duration::days(DAYS_IN_WEEK);
    if date == today {
        Recency::Today
    } else if date == yesterday {
        Recency::Yesterday
    } else if date >= week_ago {
        Recency::ThisWeek
    } else {
        Recency::Older
    }
}

/// Bucket `ts` using its date in `tz`.
pub fn recency_in<Tz: TimeZone>(ts: DateTime<Utc>, tz: &Tz, today: NaiveDate) -> Recency {
    recency_on(ts.with_timezone(tz).date_naive(), today)
}

/// Bucket `ts` against the local date.
pub fn recency(ts: DateTime<Utc>) -> Recency {
    recency_in(ts, &Local, Local::now().date_naive())
}

/// `(color, badge)` tokens for `ts`.
pub fn classify(ts: DateTime<Utc>) -> (&'static str, &'static str) {
    let bucket = recency(ts);
    (bucket.color(), bucket.badge())
}

/// Whether `ts` falls on the local calendar date of today.
pub fn is_today(ts: DateTime<Utc>) -> bool {
    recency(ts) == Recency::Today
}

/// Whole local calendar days between `ts` and `today`.
pub fn days_ago_in<Tz: TimeZone>(ts: DateTime<Utc>, tz: &Tz, today: NaiveDate) -> i64 {
    (today - ts.with_timezone(tz).date_naive()).num_days()
}

pub fn days_ago(ts: DateTime<Utc>) -> i64 {
    days_ago_in(ts, &Local, Local::now().date_naive())
}

/// `YYYY-MM-DD HH:MM AM` in the local timezone.
pub fn format_local(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %I:%M %p").to_string()
}

/// Shorten `text` to at most `max_chars` characters, ending with `suffix`.
pub fn truncate_text(text: &str, max_chars: usize, suffix: &str) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(suffix.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(suffix);
    out
}

/// Parse an RFC 3339 timestamp (`Z` or explicit offset) into UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Anything with a point in time used for ordering and windowing.
pub trait Timestamped {
    /// `None` when the item has no usable timestamp.
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

impl Timestamped for CommitRecord {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.committed_at)
    }
}

impl Timestamped for PullRequestRecord {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        Some(self.timestamp)
    }
}

impl Timestamped for RepositoryRef {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.last_pushed_at
    }
}

/// Raw records carry their time in a `date` string.
impl Timestamped for Value {
    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.get("date")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
    }
}

/// Start of the trailing `window_days` window ending at `now`.
///
/// Windows reaching past the representable range start at the earliest
/// representable instant.
pub fn window_start(now: DateTime<Utc>, window_days: i64) -> DateTime<Utc> {
    Duration::try_days(window_days)
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Keep items whose timestamp lies in `[now - window_days, now]`.
///
/// Items without a parseable timestamp are dropped.
pub fn filter_window<T: Timestamped + Clone>(
    records: &[T],
    window_days: i64,
    now: DateTime<Utc>,
) -> Vec<T> {
    let cutoff = window_start(now, window_days);
    records
        .iter()
        .filter(|r| r.timestamp().is_some_and(|ts| ts >= cutoff && ts <= now))
        .cloned()
        .collect()
}

/// Stable sort, newest first. Items without a timestamp go last.
pub fn sort_newest_first<T: Timestamped>(records: &mut [T]) {
    records.sort_by_key(|r| Reverse(r.timestamp()));
}

/// Concatenate two collections and sort the result newest first.
pub fn merge_newest_first<T: Timestamped>(first: Vec<T>, second: Vec<T>) -> Vec<T> {
    let mut merged = first;
    merged.extend(second);
    sort_newest_first(&mut merged);
    merged
}

/// Activity from the trailing week.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeeklyDigest {
    pub commits: Vec<CommitRecord>,
    /// Open and merged PRs together, newest first.
    pub pull_requests: Vec<PullRequestRecord>,
}

/// Commits and pull requests from the last [`DAYS_IN_WEEK`] days.
pub fn weekly_digest(data: &ActivityData, now: DateTime<Utc>) -> WeeklyDigest {
    let commits = filter_window(&data.commits, DAYS_IN_WEEK, now);

    let tag = |prs: &[PullRequestRecord], status: PrStatus| {
        filter_window(prs, DAYS_IN_WEEK, now)
            .into_iter()
            .map(|mut pr| {
                pr.status = status;
                pr
            })
            .collect::<Vec<_>>()
    };
    let pull_requests = merge_newest_first(
        tag(&data.open_prs, PrStatus::Open),
        tag(&data.merged_prs, PrStatus::Merged),
    );

    WeeklyDigest {
        commits,
        pull_requests,
    }
}

/// Records that name an author.
pub trait Authored {
    fn author(&self) -> &str;
}

impl Authored for CommitRecord {
    fn author(&self) -> &str {
        &self.author_name
    }
}

impl Authored for PullRequestRecord {
    fn author(&self) -> &str {
        &self.author_login
    }
}

/// Number of records attributed to one author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorCount {
    pub author: String,
    pub count: usize,
}

/// Per-author record counts, highest first, ties by name, at most `top_n`.
pub fn author_activity<T: Authored>(records: &[T], top_n: usize) -> Vec<AuthorCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.author()).or_default() += 1;
    }

    let mut ranked: Vec<AuthorCount> = counts
        .into_iter()
        .map(|(author, count)| AuthorCount {
            author: author.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.author.cmp(&b.author)));
    ranked.truncate(top_n);
    ranked
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use serde_json::json;

    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        parse_timestamp(s).expect("valid timestamp")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn commit(author: &str, at: &str) -> CommitRecord {
        CommitRecord {
            repo: "acme/core".to_string(),
            repo_url: "https://github.com/acme/core".to_string(),
            branch_name: "main".to_string(),
            branch_url: "https://github.com/acme/core/tree/main".to_string(),
            sha: "abcdef1".to_string(),
            message_headline: "change".to_string(),
            author_name: author.to_string(),
            committed_at: utc(at),
            url: String::new(),
        }
    }

    fn pr(number: u64, at: &str) -> PullRequestRecord {
        PullRequestRecord {
            repo: "acme/core".to_string(),
            repo_url: "https://github.com/acme/core".to_string(),
            pr_number: number,
            title: format!("PR {number}"),
            author_login: "ada".to_string(),
            status: PrStatus::Open,
            timestamp: utc(at),
            url: String::new(),
        }
    }

    #[test]
    fn test_recency_buckets_in_precedence_order() {
        let today = date(2025, 3, 10);
        assert_eq!(recency_on(date(2025, 3, 10), today), Recency::Today);
        assert_eq!(recency_on(date(2025, 3, 9), today), Recency::Yesterday);
        assert_eq!(recency_on(date(2025, 3, 3), today), Recency::ThisWeek);
        assert_eq!(recency_on(date(2025, 3, 2), today), Recency::Older);
    }

    #[test]
    fn test_recency_uses_local_date_not_utc_date() {
        // 23:30 UTC on the 9th is already the 10th at UTC+2.
        let ts = utc("2025-03-09T23:30:00Z");
        let plus_two = FixedOffset::east_opt(2 * 3600).expect("offset");
        assert_eq!(recency_in(ts, &plus_two, date(2025, 3, 10)), Recency::Today);
        assert_eq!(recency_in(ts, &Utc, date(2025, 3, 10)), Recency::Yesterday);
    }

    #[test]
    fn test_tokens() {
        assert_eq!(Recency::Today.color(), "#9C27B0");
        assert_eq!(Recency::Older.badge(), "⭐");
        assert_eq!(Recency::ThisWeek.as_str(), "this_week");
    }

    #[test]
    fn test_classify_now_and_eight_days_ago() {
        let now = Utc::now();
        assert_eq!(classify(now), (Recency::Today.color(), Recency::Today.badge()));
        assert!(is_today(now));
        assert_eq!(recency(now - Duration::days(8)), Recency::Older);
        assert!(!is_today(now - Duration::days(8)));
    }

    #[test]
    fn test_parse_timestamp_accepts_offsets() {
        assert_eq!(
            parse_timestamp("2025-01-02T05:00:00+05:00"),
            Some(utc("2025-01-02T00:00:00Z"))
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_filter_window_bounds_are_inclusive() {
        let now = utc("2025-03-10T12:00:00Z");
        let records = vec![
            commit("a", "2025-03-03T12:00:00Z"), // exactly 7 days
            commit("b", "2025-03-03T11:59:59Z"), // just outside
            commit("c", "2025-03-10T12:00:00Z"), // exactly now
            commit("d", "2025-03-10T12:00:01Z"), // future
        ];
        let kept: Vec<_> = filter_window(&records, 7, now)
            .into_iter()
            .map(|c| c.author_name)
            .collect();
        assert_eq!(kept, vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_huge_windows_reach_back_to_the_earliest_instant() {
        let now = utc("2025-03-10T12:00:00Z");
        assert_eq!(window_start(now, 7), utc("2025-03-03T12:00:00Z"));
        assert_eq!(window_start(now, 1_000_000_000), DateTime::<Utc>::MIN_UTC);
        assert_eq!(window_start(now, i64::MAX), DateTime::<Utc>::MIN_UTC);

        let records = vec![
            commit("old", "1970-01-01T00:00:00Z"),
            commit("future", "2025-03-11T00:00:00Z"),
        ];
        for days in [1_000_000_000, i64::MAX] {
            let kept: Vec<_> = filter_window(&records, days, now)
                .into_iter()
                .map(|c| c.author_name)
                .collect();
            assert_eq!(kept, vec!["old".to_string()]);
        }
    }

    #[test]
    fn test_filter_window_drops_unparseable_raw_records() {
        let now = Utc::now();
        let records = vec![
            json!({"date": (now - Duration::days(3)).to_rfc3339()}),
            json!({"date": "not a date"}),
            json!({"other": 1}),
        ];
        assert_eq!(filter_window(&records, 7, now).len(), 1);
    }

    #[test]
    fn test_merge_sorts_newest_first_and_keeps_ties_stable() {
        let merged = merge_newest_first(
            vec![pr(1, "2025-01-01T00:00:00Z"), pr(2, "2025-01-03T00:00:00Z")],
            vec![pr(3, "2025-01-02T00:00:00Z"), pr(4, "2025-01-03T00:00:00Z")],
        );
        let numbers: Vec<u64> = merged.iter().map(|p| p.pr_number).collect();
        assert_eq!(numbers, vec![2, 4, 3, 1]);
    }

    #[test]
    fn test_sort_puts_missing_timestamps_last() {
        let mut repos = vec![
            RepositoryRef::new("a/none", None),
            RepositoryRef::new("a/old", Some(utc("2024-01-01T00:00:00Z"))),
            RepositoryRef::new("a/new", Some(utc("2025-01-01T00:00:00Z"))),
        ];
        sort_newest_first(&mut repos);
        let names: Vec<&str> = repos.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["a/new", "a/old", "a/none"]);
    }

    #[test]
    fn test_weekly_digest_tags_status() {
        let now = utc("2025-03-10T12:00:00Z");
        let data = ActivityData {
            commits: vec![
                commit("a", "2025-03-09T00:00:00Z"),
                commit("b", "2025-02-01T00:00:00Z"),
            ],
            open_prs: vec![pr(1, "2025-03-08T00:00:00Z")],
            merged_prs: vec![pr(2, "2025-03-09T00:00:00Z"), pr(3, "2025-01-01T00:00:00Z")],
        };

        let digest = weekly_digest(&data, now);
        assert_eq!(digest.commits.len(), 1);
        let prs: Vec<(u64, PrStatus)> = digest
            .pull_requests
            .iter()
            .map(|p| (p.pr_number, p.status))
            .collect();
        assert_eq!(prs, vec![(2, PrStatus::Merged), (1, PrStatus::Open)]);
    }

    #[test]
    fn test_author_activity_ranks_and_truncates() {
        let records = vec![
            commit("bob", "2025-01-01T00:00:00Z"),
            commit("ada", "2025-01-01T00:00:00Z"),
            commit("bob", "2025-01-01T00:00:00Z"),
            commit("cy", "2025-01-01T00:00:00Z"),
        ];
        let top = author_activity(&records, 2);
        assert_eq!(
            top,
            vec![
                AuthorCount {
                    author: "bob".to_string(),
                    count: 2
                },
                AuthorCount {
                    author: "ada".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_days_ago_and_truncate() {
        let ts = utc("2025-03-07T10:00:00Z");
        assert_eq!(days_ago_in(ts, &Utc, date(2025, 3, 10)), 3);
        assert_eq!(truncate_text("short", 10, "..."), "short");
        assert_eq!(truncate_text("abcdefghij", 6, "..."), "abc...");
        assert_eq!(truncate_text("héllo wörld", 8, "…"), "héllo w…");
    }
}
