//! CSV renderings of ledgers, range reports, the registry and the audit trail.

use crate::error::ExportError;
use crate::ledger::{collection_rate, LedgerEntry, LedgerKind, Period, PeriodTotals, RangeTotals};
use csv::{Writer, WriterBuilder};
use senior_db_entity::db::activity_log::Model as ActivityLogModel;
use senior_db_entity::db::senior::Model as SeniorModel;
use std::path::{Path, PathBuf};
use tracing::info;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn writer() -> Writer<Vec<u8>> {
    WriterBuilder::new().flexible(true).from_writer(vec![])
}

fn finish(writer: Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    writer
        .into_inner()
        .map_err(|error| ExportError::Io(error.into_error()))
}

fn into_string(bytes: Vec<u8>) -> Result<String, ExportError> {
    String::from_utf8(bytes).map_err(|_| ExportError::Encoding)
}

/// `<kind>_<year>_<MM>.csv`
pub fn file_name(kind: LedgerKind, period: Period) -> String {
    format!("{}_{}_{:02}.csv", kind, period.year, period.month)
}

pub fn range_file_name(kind: LedgerKind, from: Period, to: Period) -> String {
    format!(
        "{}_{}_{:02}_to_{}_{:02}.csv",
        kind, from.year, from.month, to.year, to.month
    )
}

/// Entry table, a blank line, then the summary block.
pub fn period_csv(
    kind: LedgerKind,
    period: Period,
    entries: &[LedgerEntry],
    new_entrants: u64,
) -> Result<String, ExportError> {
    let mut table = writer();
    table.write_record(["No.", "SCCN", "Name", "Zone", "Pension Type", "Status", "Date"])?;
    for (index, entry) in entries.iter().enumerate() {
        let status = if entry.settled {
            kind.settled_label()
        } else {
            kind.unsettled_label()
        };
        let date = entry
            .settled_at
            .map(|at| at.format(DATE_FORMAT).to_string())
            .unwrap_or_default();
        table.write_record([
            (index + 1).to_string(),
            entry.sccn.to_owned(),
            entry.name.to_owned(),
            entry.zone.to_owned(),
            entry.pension_type.to_owned().unwrap_or_default(),
            status.to_owned(),
            date,
        ])?;
    }
    let mut output = finish(table)?;
    output.push(b'\n');

    let totals = PeriodTotals::of(entries);
    let rate = collection_rate(totals.settled as i64, totals.total as i64);
    let mut summary = writer();
    for (label, value) in [
        ("Summary", period.to_string()),
        ("Total Seniors", totals.total.to_string()),
        (kind.settled_label(), totals.settled.to_string()),
        (kind.unsettled_label(), totals.unsettled.to_string()),
        ("New Entrants", new_entrants.to_string()),
        ("Collection Rate", format!("{}%", rate)),
    ] {
        summary.write_record([label, value.as_str()])?;
    }
    output.extend(finish(summary)?);

    into_string(output)
}

pub fn range_csv(kind: LedgerKind, totals: &RangeTotals) -> Result<String, ExportError> {
    let mut csv = writer();
    csv.write_record([
        "Month",
        "Year",
        "Total Seniors",
        kind.settled_label(),
        kind.unsettled_label(),
        "Collection Rate",
    ])?;
    for row in &totals.rows {
        csv.write_record([
            row.month_name.to_owned(),
            row.year.to_string(),
            row.total_seniors.to_string(),
            row.settled.to_string(),
            row.unsettled.to_string(),
            format!("{}%", row.collection_rate),
        ])?;
    }
    csv.write_record([
        "Total".to_owned(),
        String::new(),
        totals.total_seniors.to_string(),
        totals.settled.to_string(),
        totals.unsettled.to_string(),
        format!("{}%", totals.collection_rate),
    ])?;
    into_string(finish(csv)?)
}

pub fn seniors_csv(seniors: &[SeniorModel]) -> Result<String, ExportError> {
    let mut csv = writer();
    csv.write_record([
        "SCCN",
        "Last Name",
        "First Name",
        "Middle Name",
        "Birth Date",
        "Sex",
        "Zone",
        "Pension Type",
        "Status",
    ])?;
    for senior in seniors {
        csv.write_record([
            senior.sccn.to_owned(),
            senior.last_name.to_owned(),
            senior.first_name.to_owned(),
            senior.middle_name.to_owned().unwrap_or_default(),
            senior.birth_date.format("%Y-%m-%d").to_string(),
            senior.sex.to_owned(),
            senior.zone.to_owned(),
            senior.pension_type.to_owned().unwrap_or_default(),
            senior.status.to_owned(),
        ])?;
    }
    into_string(finish(csv)?)
}

pub fn activity_csv(activities: &[ActivityLogModel]) -> Result<String, ExportError> {
    let mut csv = writer();
    csv.write_record(["Date", "User", "Action", "Description"])?;
    for activity in activities {
        csv.write_record([
            activity.created_at.format(DATE_FORMAT).to_string(),
            activity.username.to_owned(),
            activity.action.to_owned(),
            activity.description.to_owned(),
        ])?;
    }
    into_string(finish(csv)?)
}

/// Writes a period export to `logs_dir/<kind>/<kind>_<year>_<MM>.csv`,
/// creating the directory when needed.
pub async fn persist(
    logs_dir: &Path,
    kind: LedgerKind,
    period: Period,
    contents: &str,
) -> Result<PathBuf, ExportError> {
    let directory = logs_dir.join(kind.as_str());
    tokio::fs::create_dir_all(&directory).await?;

    let path = directory.join(file_name(kind, period));
    tokio::fs::write(&path, contents).await?;
    info!("Saved {} export for {} to {}", kind, period, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn entry(id: i32, name: &str, settled: bool) -> LedgerEntry {
        LedgerEntry {
            id,
            senior_id: id,
            sccn: format!("10000000000{}", id),
            name: name.to_owned(),
            zone: "Zone 2".to_owned(),
            pension_type: Some("SSS".to_owned()),
            settled,
            settled_at: settled.then(|| Utc.with_ymd_and_hms(2025, 1, 10, 9, 30, 0).unwrap()),
        }
    }

    fn january() -> Period {
        Period::new(1, 2025).unwrap()
    }

    #[test]
    fn file_names_pad_the_month() {
        assert_eq!(file_name(LedgerKind::Dues, january()), "dues_2025_01.csv");
        assert_eq!(
            range_file_name(LedgerKind::Pension, january(), Period::new(11, 2025).unwrap()),
            "pension_2025_01_to_2025_11.csv"
        );
    }

    #[test]
    fn empty_period_exports_header_and_zero_totals() {
        let csv = period_csv(LedgerKind::Dues, january(), &[], 0).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "No.,SCCN,Name,Zone,Pension Type,Status,Date");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "Summary,January 2025");
        assert_eq!(lines[3], "Total Seniors,0");
        assert_eq!(lines[4], "Paid,0");
        assert_eq!(lines[5], "Unpaid,0");
        assert_eq!(lines[6], "New Entrants,0");
        assert_eq!(lines[7], "Collection Rate,0.00%");
    }

    #[test]
    fn period_rows_are_numbered_and_labelled() {
        let entries = vec![
            entry(1, "Aquino, Juan", true),
            entry(2, "Bautista, Juan", false),
        ];
        let csv = period_csv(LedgerKind::Pension, january(), &entries, 2).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[1],
            "1,100000000001,\"Aquino, Juan\",Zone 2,SSS,Claimed,2025-01-10 09:30:00"
        );
        assert_eq!(lines[2], "2,100000000002,\"Bautista, Juan\",Zone 2,SSS,Unclaimed,");
        assert!(lines.contains(&"Claimed,1"));
        assert!(lines.contains(&"New Entrants,2"));
        assert!(lines.contains(&"Collection Rate,50.00%"));
    }

    #[test]
    fn range_export_ends_with_totals_row() {
        let totals = RangeTotals {
            periods: 1,
            total_seniors: 7,
            settled: 3,
            unsettled: 4,
            collection_rate: "42.86".to_owned(),
            rows: vec![crate::ledger::RangeRow {
                month: 1,
                month_name: "January",
                year: 2025,
                total_seniors: 7,
                settled: 3,
                unsettled: 4,
                collection_rate: "42.86".to_owned(),
            }],
        };
        let csv = range_csv(LedgerKind::Dues, &totals).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "Month,Year,Total Seniors,Paid,Unpaid,Collection Rate");
        assert_eq!(lines[1], "January,2025,7,3,4,42.86%");
        assert_eq!(lines[2], "Total,,7,3,4,42.86%");
    }

    #[test]
    fn senior_export_leaves_missing_fields_blank() {
        let senior = SeniorModel {
            id: 1,
            sccn: "123456789012".to_owned(),
            first_name: "Luz".to_owned(),
            middle_name: None,
            last_name: "Dizon".to_owned(),
            birth_date: NaiveDate::from_ymd_opt(1944, 2, 29).unwrap(),
            sex: "F".to_owned(),
            zone: "Zone 4".to_owned(),
            contact_number: None,
            pension_type: None,
            status: "active".to_owned(),
            created_at: Utc::now(),
            archived_at: None,
        };
        let csv = seniors_csv(&[senior]).unwrap();
        assert_eq!(
            csv.lines().nth(1),
            Some("123456789012,Dizon,Luz,,1944-02-29,F,Zone 4,,active")
        );
    }

    #[tokio::test]
    async fn persisted_exports_land_under_the_kind_directory() {
        let workspace = tempfile::tempdir().unwrap();
        let logs_dir = workspace.path().join("logs");
        let path = persist(&logs_dir, LedgerKind::Dues, january(), "No.\n")
            .await
            .unwrap();

        assert_eq!(path, logs_dir.join("dues").join("dues_2025_01.csv"));
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "No.\n");
    }
}
