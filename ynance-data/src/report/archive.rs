use super::Report;
use std::collections::VecDeque;

/// Reports generated during the session, newest first. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportArchive {
    reports: VecDeque<Report>,
}

impl ReportArchive {
    pub fn push(&mut self, report: Report) {
        self.reports.push_front(report);
    }

    pub fn latest(&self) -> Option<&Report> {
        self.reports.front()
    }

    pub fn get(&self, index: usize) -> Option<&Report> {
        self.reports.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Report> {
        self.reports.iter()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportKind, ReportSource};
    use chrono::NaiveDate;

    fn report(day: u32) -> Report {
        Report {
            kind: ReportKind::Daily,
            title: ReportKind::Daily.title().to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            body: String::new(),
            source: ReportSource::Fallback,
        }
    }

    #[test]
    fn test_archive_is_newest_first() {
        let mut archive = ReportArchive::default();
        assert!(archive.latest().is_none());

        archive.push(report(1));
        archive.push(report(2));

        assert_eq!(archive.len(), 2);
        assert_eq!(archive.latest().unwrap().date.to_string(), "2024-03-02");
        let days: Vec<String> = archive.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(days, vec!["2024-03-02", "2024-03-01"]);
    }
}
