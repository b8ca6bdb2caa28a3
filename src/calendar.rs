use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Per-date attendance counts for one subject, keyed by `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttendanceDetail {
    #[serde(default, deserialize_with = "lenient_counts")]
    pub present: BTreeMap<String, u32>,
    #[serde(default, deserialize_with = "lenient_counts")]
    pub absent: BTreeMap<String, u32>,
}

/// Counts arrive as numbers or numeric strings; anything else is zero.
fn lenient_counts<'de, D>(deserializer: D) -> Result<BTreeMap<String, u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(date, v)| (date_key(&date), count_of(&v)))
        .collect())
}

fn date_key(raw: &str) -> String {
    raw.chars().take(10).collect()
}

pub fn count_of(v: &Value) -> u32 {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match n {
        Some(n) if n.is_finite() && n > 0.0 => n.trunc().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    /// 1..=12
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                month: self.month - 1,
                ..self
            }
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                month: self.month + 1,
                ..self
            }
        }
    }

    pub fn label(self) -> String {
        let name = MONTH_NAMES
            .get(self.month.saturating_sub(1) as usize)
            .copied()
            .unwrap_or("?");
        format!("{} {}", name, self.year)
    }

    fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    fn days(self) -> u32 {
        match (self.first_day(), self.next().first_day()) {
            (Some(a), Some(b)) => (b - a).num_days() as u32,
            _ => 0,
        }
    }

    fn contains_key(self, key: &str) -> bool {
        let mut parts = key.split('-');
        let y = parts.next().and_then(|p| p.parse::<i32>().ok());
        let m = parts.next().and_then(|p| p.parse::<u32>().ok());
        y == Some(self.year) && m == Some(self.month)
    }
}

/// Month the calendar opens on: the latest present date, else `today`.
pub fn initial_month(detail: &AttendanceDetail, today: NaiveDate) -> YearMonth {
    detail
        .present
        .keys()
        .filter_map(|k| NaiveDate::parse_from_str(k, "%Y-%m-%d").ok())
        .max()
        .map(YearMonth::of)
        .unwrap_or_else(|| YearMonth::of(today))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub day: u32,
    pub date: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub badges: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthGrid {
    pub label: String,
    pub year: i32,
    pub month: u32,
    /// Empty cells before day 1 in a Sunday-first week.
    pub leading_blanks: u32,
    pub days: Vec<DayCell>,
    pub has_any_for_month: bool,
}

impl MonthGrid {
    fn blank(ym: YearMonth) -> Self {
        let leading_blanks = ym
            .first_day()
            .map(|d| d.weekday().num_days_from_sunday())
            .unwrap_or(0);
        let days = (1..=ym.days())
            .map(|day| DayCell {
                day,
                date: format!("{:04}-{:02}-{:02}", ym.year, ym.month, day),
                badges: Vec::new(),
                selected: false,
            })
            .collect();
        Self {
            label: ym.label(),
            year: ym.year,
            month: ym.month,
            leading_blanks,
            days,
            has_any_for_month: false,
        }
    }
}

pub fn month_grid(detail: &AttendanceDetail, ym: YearMonth) -> MonthGrid {
    let mut grid = MonthGrid::blank(ym);
    for cell in &mut grid.days {
        let p = detail.present.get(&cell.date).copied().unwrap_or(0);
        let a = detail.absent.get(&cell.date).copied().unwrap_or(0);
        if p > 0 {
            cell.badges.push(format!("P:{p}"));
        }
        if a > 0 {
            cell.badges.push(format!("A:{a}"));
        }
    }
    grid.has_any_for_month = detail
        .present
        .keys()
        .chain(detail.absent.keys())
        .any(|k| ym.contains_key(k));
    grid
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub present: u64,
    pub absent: u64,
    pub total: u64,
    pub percentage: u32,
}

/// Per-date counts are `u32`, so a `u64` total cannot overflow.
fn total_of(counts: &BTreeMap<String, u32>) -> u64 {
    counts.values().map(|&n| u64::from(n)).sum()
}

impl Summary {
    pub fn of(detail: &AttendanceDetail) -> Self {
        let present = total_of(&detail.present);
        let absent = total_of(&detail.absent);
        let total = present.saturating_add(absent);
        let percentage = if total == 0 {
            0
        } else {
            ((present as f64 * 100.0) / total as f64).round() as u32
        };
        Self {
            present,
            absent,
            total,
            percentage,
        }
    }

    pub fn zero() -> Self {
        Self {
            present: 0,
            absent: 0,
            total: 0,
            percentage: 0,
        }
    }
}

/// Calendar the student is browsing for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceView {
    pub subject: String,
    pub detail: AttendanceDetail,
    pub month: YearMonth,
}

impl AttendanceView {
    pub fn open(subject: String, detail: AttendanceDetail, today: NaiveDate) -> Self {
        let month = initial_month(&detail, today);
        Self {
            subject,
            detail,
            month,
        }
    }

    pub fn grid(&self) -> MonthGrid {
        month_grid(&self.detail, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisputeSubmission {
    pub subject: String,
    pub dates: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisputeDraft {
    pub subject: Option<String>,
    pub month: YearMonth,
    pub dates: BTreeSet<String>,
}

impl DisputeDraft {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            subject: None,
            month: YearMonth::of(today),
            dates: BTreeSet::new(),
        }
    }

    /// Returns whether the date is selected afterwards.
    pub fn toggle(&mut self, date: &str) -> bool {
        let key = date_key(date);
        if self.dates.remove(&key) {
            false
        } else {
            self.dates.insert(key);
            true
        }
    }

    pub fn grid(&self) -> MonthGrid {
        let mut grid = MonthGrid::blank(self.month);
        for cell in &mut grid.days {
            cell.selected = self.dates.contains(&cell.date);
        }
        grid.has_any_for_month = grid.days.iter().any(|c| c.selected);
        grid
    }

    /// Validates the draft. Dates come out sorted.
    pub fn submission(&self, description: &str) -> Option<DisputeSubmission> {
        let subject = self.subject.clone().filter(|s| !s.trim().is_empty())?;
        let description = description.trim();
        if description.is_empty() || self.dates.is_empty() {
            return None;
        }
        Some(DisputeSubmission {
            subject,
            dates: self.dates.iter().cloned().collect(),
            description: description.to_string(),
        })
    }
}
