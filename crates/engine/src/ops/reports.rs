//! Report aggregation.
//!
//! Reports pull whole collections into memory and fold them with maps, the
//! same shape the dashboard consumes. Date windows are fixed day offsets
//! from a caller-supplied `now` anchor; there is no timezone handling.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use uuid::Uuid;

use crate::store::{DocumentStore, Query};
use crate::util::from_doc;
use crate::{
    Donation, DonationStatus, EngineError, Program, ProgramStatus, ResultEngine, Volunteer,
    VolunteerStatus, donations, programs, volunteers,
};

use super::Engine;

/// Date window for reports, anchored on `now`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportRange {
    Last7Days,
    #[default]
    Last30Days,
    Last90Days,
    ThisYear,
    All,
}

impl ReportRange {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Last7Days => "last7days",
            Self::Last30Days => "last30days",
            Self::Last90Days => "last90days",
            Self::ThisYear => "thisYear",
            Self::All => "all",
        }
    }

    /// First included date, or `None` for an unbounded window.
    pub fn start(self, now: DateTime<Utc>) -> Option<NaiveDate> {
        let today = now.date_naive();
        let days_back = |n: u64| today.checked_sub_days(Days::new(n)).unwrap_or(NaiveDate::MIN);
        match self {
            Self::Last7Days => Some(days_back(7)),
            Self::Last30Days => Some(days_back(30)),
            Self::Last90Days => Some(days_back(90)),
            Self::ThisYear => NaiveDate::from_ymd_opt(today.year(), 1, 1),
            Self::All => None,
        }
    }

    /// Whether a dated record falls inside the window.
    pub fn contains(self, now: DateTime<Utc>, date: NaiveDate) -> bool {
        match self.start(now) {
            Some(start) => date >= start,
            None => true,
        }
    }
}

impl TryFrom<&str> for ReportRange {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "last7days" => Ok(Self::Last7Days),
            "last30days" => Ok(Self::Last30Days),
            "last90days" => Ok(Self::Last90Days),
            "thisYear" => Ok(Self::ThisYear),
            "all" => Ok(Self::All),
            other => Err(EngineError::InvalidField(format!(
                "invalid report range: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DonationReportRow {
    pub date: NaiveDate,
    pub donor: String,
    pub program: String,
    pub amount_minor: i64,
    pub status: DonationStatus,
    pub payment_method: String,
}

#[derive(Clone, Debug)]
pub struct DonationsReport {
    pub rows: Vec<DonationReportRow>,
    pub total_minor: i64,
    pub count: u64,
}

#[derive(Clone, Debug)]
pub struct ProgramReportRow {
    pub title: String,
    pub category: String,
    pub target_minor: i64,
    pub raised_minor: i64,
    /// raised / target, in percent.
    pub progress_pct: f64,
    pub status: ProgramStatus,
    pub volunteers: u64,
}

#[derive(Clone, Debug)]
pub struct VolunteerReportRow {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub program: String,
    pub role: String,
    pub status: VolunteerStatus,
    pub joined_date: NaiveDate,
}

#[derive(Clone, Debug)]
pub struct CategorySlice {
    pub category: String,
    pub raised_minor: i64,
    pub share_pct: f64,
}

#[derive(Clone, Debug)]
pub struct DashboardSummary {
    pub total_raised_minor: i64,
    pub donation_count: u64,
    pub active_programs: u64,
    pub active_volunteers: u64,
    pub by_category: Vec<CategorySlice>,
}

const DELETED_PROGRAM: &str = "(deleted program)";

impl Engine {
    /// Donation rows inside the window, newest first, with totals.
    pub async fn donations_report(
        &self,
        range: ReportRange,
        now: DateTime<Utc>,
    ) -> ResultEngine<DonationsReport> {
        let titles = self.program_titles().await?;
        let all = self.all_donations().await?;

        let mut rows: Vec<DonationReportRow> = all
            .into_iter()
            .filter(|donation| range.contains(now, donation.date))
            .map(|donation| DonationReportRow {
                date: donation.date,
                donor: if donation.is_anonymous {
                    "Anonymous".to_string()
                } else {
                    donation.donor_name
                },
                program: titles
                    .get(&donation.program_id)
                    .cloned()
                    .unwrap_or_else(|| DELETED_PROGRAM.to_string()),
                amount_minor: donation.amount_minor,
                status: donation.status,
                payment_method: donation.payment_method,
            })
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));

        let total_minor = rows.iter().map(|row| row.amount_minor).sum();
        let count = rows.len() as u64;
        Ok(DonationsReport {
            rows,
            total_minor,
            count,
        })
    }

    pub async fn programs_report(&self) -> ResultEngine<Vec<ProgramReportRow>> {
        let docs = self.store.find(programs::COLLECTION, Query::new()).await?;
        let mut rows = Vec::with_capacity(docs.len());
        for doc in docs {
            let program: Program = from_doc(doc, "program")?;
            let progress_pct = if program.target_minor > 0 {
                program.raised_minor as f64 / program.target_minor as f64 * 100.0
            } else {
                0.0
            };
            rows.push(ProgramReportRow {
                title: program.title,
                category: program.category,
                target_minor: program.target_minor,
                raised_minor: program.raised_minor,
                progress_pct,
                status: program.status,
                volunteers: program.volunteers,
            });
        }
        rows.sort_by(|a, b| b.raised_minor.cmp(&a.raised_minor));
        Ok(rows)
    }

    pub async fn volunteers_report(&self) -> ResultEngine<Vec<VolunteerReportRow>> {
        let titles = self.program_titles().await?;
        let docs = self.store.find(volunteers::COLLECTION, Query::new()).await?;
        let mut rows = Vec::with_capacity(docs.len());
        for doc in docs {
            let volunteer: Volunteer = from_doc(doc, "volunteer")?;
            rows.push(VolunteerReportRow {
                name: volunteer.name,
                email: volunteer.email,
                phone: volunteer.phone,
                program: titles
                    .get(&volunteer.program_id)
                    .cloned()
                    .unwrap_or_else(|| DELETED_PROGRAM.to_string()),
                role: volunteer.role,
                status: volunteer.status,
                joined_date: volunteer.joined_date,
            });
        }
        rows.sort_by(|a, b| b.joined_date.cmp(&a.joined_date));
        Ok(rows)
    }

    /// Dashboard aggregates over the full collections.
    pub async fn summary(&self) -> ResultEngine<DashboardSummary> {
        let donations = self.all_donations().await?;
        let program_docs = self.store.find(programs::COLLECTION, Query::new()).await?;
        let mut categories: HashMap<Uuid, String> = HashMap::new();
        let mut active_programs = 0u64;
        for doc in program_docs {
            let program: Program = from_doc(doc, "program")?;
            if program.status == ProgramStatus::Active {
                active_programs += 1;
            }
            categories.insert(program.id, program.category);
        }

        let mut total_raised_minor = 0i64;
        let mut by_category: HashMap<String, i64> = HashMap::new();
        for donation in &donations {
            if donation.status != DonationStatus::Completed {
                continue;
            }
            total_raised_minor += donation.amount_minor;
            let category = categories
                .get(&donation.program_id)
                .cloned()
                .unwrap_or_else(|| "Uncategorized".to_string());
            *by_category.entry(category).or_insert(0) += donation.amount_minor;
        }

        let mut by_category: Vec<CategorySlice> = by_category
            .into_iter()
            .map(|(category, raised_minor)| CategorySlice {
                category,
                raised_minor,
                share_pct: if total_raised_minor > 0 {
                    raised_minor as f64 / total_raised_minor as f64 * 100.0
                } else {
                    0.0
                },
            })
            .collect();
        by_category.sort_by(|a, b| b.raised_minor.cmp(&a.raised_minor));

        let active_volunteers = self
            .store
            .find(
                volunteers::COLLECTION,
                Query::new().filter("status", VolunteerStatus::Active.as_str()),
            )
            .await?
            .len() as u64;

        Ok(DashboardSummary {
            total_raised_minor,
            donation_count: donations.len() as u64,
            active_programs,
            active_volunteers,
            by_category,
        })
    }

    async fn all_donations(&self) -> ResultEngine<Vec<Donation>> {
        let docs = self.store.find(donations::COLLECTION, Query::new()).await?;
        docs.into_iter()
            .map(|doc| from_doc(doc, "donation"))
            .collect()
    }

    async fn program_titles(&self) -> ResultEngine<HashMap<Uuid, String>> {
        let docs = self.store.find(programs::COLLECTION, Query::new()).await?;
        let mut titles = HashMap::with_capacity(docs.len());
        for doc in docs {
            let program: Program = from_doc(doc, "program")?;
            titles.insert(program.id, program.title);
        }
        Ok(titles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn last7days_excludes_day_eight() {
        let now = anchor();
        assert!(ReportRange::Last7Days.contains(now, day(2025, 6, 13)));
        assert!(ReportRange::Last7Days.contains(now, day(2025, 6, 8)));
        assert!(!ReportRange::Last7Days.contains(now, day(2025, 6, 7)));
    }

    #[test]
    fn this_year_starts_on_january_first() {
        let now = anchor();
        assert!(ReportRange::ThisYear.contains(now, day(2025, 1, 1)));
        assert!(!ReportRange::ThisYear.contains(now, day(2024, 12, 31)));
    }

    #[test]
    fn all_is_unbounded() {
        assert!(ReportRange::All.contains(anchor(), day(1999, 1, 1)));
    }

    #[test]
    fn range_parses_canonical_names() {
        assert_eq!(
            ReportRange::try_from("last30days").unwrap(),
            ReportRange::Last30Days
        );
        assert!(ReportRange::try_from("lastCentury").is_err());
    }
}
