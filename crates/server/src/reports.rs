//! Report endpoints: dashboard aggregates plus spreadsheet downloads.
//!
//! Each report is aggregated by the engine and serialized here to an
//! `.xlsx` workbook (or CSV on request) with literal per-report headers.

use api_types::report::{ReportFormat, ReportQuery, ReportRange as ApiRange};
use api_types::stats::{CategorySlice, DashboardSummary};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use chrono::Utc;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

use engine::{MoneyCents, ReportRange, StoreError};

use crate::{
    ServerError,
    server::{AuthUser, ServerState, require_admin},
};

fn map_range(range: ApiRange) -> ReportRange {
    match range {
        ApiRange::Last7Days => ReportRange::Last7Days,
        ApiRange::Last30Days => ReportRange::Last30Days,
        ApiRange::Last90Days => ReportRange::Last90Days,
        ApiRange::ThisYear => ReportRange::ThisYear,
        ApiRange::All => ReportRange::All,
    }
}

/// Report serialization failures are server-side faults, logged in detail
/// and surfaced as a generic 500.
fn report_failed(err: impl std::fmt::Display) -> ServerError {
    ServerError::Engine(engine::EngineError::Store(StoreError::Backend(format!(
        "report serialization failed: {err}"
    ))))
}

fn download(bytes: Vec<u8>, stem: &str, format: ReportFormat) -> impl IntoResponse {
    let (content_type, extension) = match format {
        ReportFormat::Xlsx => (
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "xlsx",
        ),
        ReportFormat::Csv => ("text/csv", "csv"),
    };
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{stem}.{extension}\""),
            ),
        ],
        bytes,
    )
}

pub async fn stats(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<DashboardSummary>, ServerError> {
    require_admin(&user)?;
    let summary = state.engine.summary().await?;
    Ok(Json(DashboardSummary {
        total_raised_minor: summary.total_raised_minor,
        donation_count: summary.donation_count,
        active_programs: summary.active_programs,
        active_volunteers: summary.active_volunteers,
        by_category: summary
            .by_category
            .into_iter()
            .map(|slice| CategorySlice {
                category: slice.category,
                raised_minor: slice.raised_minor,
                share_pct: slice.share_pct,
            })
            .collect(),
    }))
}

pub async fn donations_report(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ServerError> {
    require_admin(&user)?;
    let range = map_range(query.range.unwrap_or_default());
    let format = query.format.unwrap_or_default();
    let report = state.engine.donations_report(range, Utc::now()).await?;

    const HEADERS: [&str; 6] = ["Date", "Donor", "Program", "Amount", "Status", "Payment Method"];
    let bytes = match format {
        ReportFormat::Xlsx => {
            let mut workbook = Workbook::new();
            let build = |workbook: &mut Workbook| -> Result<(), XlsxError> {
                let bold = Format::new().set_bold();
                let money = Format::new().set_num_format("$#,##0.00");
                let worksheet = workbook.add_worksheet();
                worksheet.set_name("Donations")?;
                for (col, title) in HEADERS.iter().enumerate() {
                    worksheet.write_string_with_format(0, col as u16, *title, &bold)?;
                }
                for (index, row) in report.rows.iter().enumerate() {
                    let r = index as u32 + 1;
                    worksheet.write_string(r, 0, row.date.to_string())?;
                    worksheet.write_string(r, 1, row.donor.as_str())?;
                    worksheet.write_string(r, 2, row.program.as_str())?;
                    worksheet.write_number_with_format(
                        r,
                        3,
                        MoneyCents::new(row.amount_minor).to_major(),
                        &money,
                    )?;
                    worksheet.write_string(r, 4, row.status.as_str())?;
                    worksheet.write_string(r, 5, row.payment_method.as_str())?;
                }
                let total_row = report.rows.len() as u32 + 1;
                worksheet.write_string_with_format(total_row, 2, "Total", &bold)?;
                worksheet.write_number_with_format(
                    total_row,
                    3,
                    MoneyCents::new(report.total_minor).to_major(),
                    &money,
                )?;
                worksheet.set_column_width(1, 24)?;
                worksheet.set_column_width(2, 28)?;
                Ok(())
            };
            build(&mut workbook).map_err(report_failed)?;
            workbook.save_to_buffer().map_err(report_failed)?
        }
        ReportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(HEADERS).map_err(report_failed)?;
            for row in &report.rows {
                writer
                    .write_record([
                        row.date.to_string(),
                        row.donor.clone(),
                        row.program.clone(),
                        MoneyCents::new(row.amount_minor).to_string(),
                        row.status.as_str().to_string(),
                        row.payment_method.clone(),
                    ])
                    .map_err(report_failed)?;
            }
            writer.into_inner().map_err(report_failed)?
        }
    };

    Ok(download(bytes, "donations-report", format))
}

pub async fn programs_report(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ServerError> {
    require_admin(&user)?;
    let format = query.format.unwrap_or_default();
    let rows = state.engine.programs_report().await?;

    const HEADERS: [&str; 7] = [
        "Title",
        "Category",
        "Target",
        "Raised",
        "Progress %",
        "Status",
        "Volunteers",
    ];
    let bytes = match format {
        ReportFormat::Xlsx => {
            let mut workbook = Workbook::new();
            let build = |workbook: &mut Workbook| -> Result<(), XlsxError> {
                let bold = Format::new().set_bold();
                let money = Format::new().set_num_format("$#,##0.00");
                let percent = Format::new().set_num_format("0.0");
                let worksheet = workbook.add_worksheet();
                worksheet.set_name("Programs")?;
                for (col, title) in HEADERS.iter().enumerate() {
                    worksheet.write_string_with_format(0, col as u16, *title, &bold)?;
                }
                for (index, row) in rows.iter().enumerate() {
                    let r = index as u32 + 1;
                    worksheet.write_string(r, 0, row.title.as_str())?;
                    worksheet.write_string(r, 1, row.category.as_str())?;
                    worksheet.write_number_with_format(
                        r,
                        2,
                        MoneyCents::new(row.target_minor).to_major(),
                        &money,
                    )?;
                    worksheet.write_number_with_format(
                        r,
                        3,
                        MoneyCents::new(row.raised_minor).to_major(),
                        &money,
                    )?;
                    worksheet.write_number_with_format(r, 4, row.progress_pct, &percent)?;
                    worksheet.write_string(r, 5, row.status.as_str())?;
                    worksheet.write_number(r, 6, row.volunteers as f64)?;
                }
                worksheet.set_column_width(0, 28)?;
                Ok(())
            };
            build(&mut workbook).map_err(report_failed)?;
            workbook.save_to_buffer().map_err(report_failed)?
        }
        ReportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(HEADERS).map_err(report_failed)?;
            for row in &rows {
                writer
                    .write_record([
                        row.title.clone(),
                        row.category.clone(),
                        MoneyCents::new(row.target_minor).to_string(),
                        MoneyCents::new(row.raised_minor).to_string(),
                        format!("{:.1}", row.progress_pct),
                        row.status.as_str().to_string(),
                        row.volunteers.to_string(),
                    ])
                    .map_err(report_failed)?;
            }
            writer.into_inner().map_err(report_failed)?
        }
    };

    Ok(download(bytes, "programs-report", format))
}

pub async fn volunteers_report(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ServerError> {
    require_admin(&user)?;
    let format = query.format.unwrap_or_default();
    let rows = state.engine.volunteers_report().await?;

    const HEADERS: [&str; 7] = [
        "Name",
        "Email",
        "Phone",
        "Program",
        "Role",
        "Status",
        "Joined",
    ];
    let bytes = match format {
        ReportFormat::Xlsx => {
            let mut workbook = Workbook::new();
            let build = |workbook: &mut Workbook| -> Result<(), XlsxError> {
                let bold = Format::new().set_bold();
                let worksheet = workbook.add_worksheet();
                worksheet.set_name("Volunteers")?;
                for (col, title) in HEADERS.iter().enumerate() {
                    worksheet.write_string_with_format(0, col as u16, *title, &bold)?;
                }
                for (index, row) in rows.iter().enumerate() {
                    let r = index as u32 + 1;
                    worksheet.write_string(r, 0, row.name.as_str())?;
                    worksheet.write_string(r, 1, row.email.as_str())?;
                    worksheet.write_string(r, 2, row.phone.as_deref().unwrap_or(""))?;
                    worksheet.write_string(r, 3, row.program.as_str())?;
                    worksheet.write_string(r, 4, row.role.as_str())?;
                    worksheet.write_string(r, 5, row.status.as_str())?;
                    worksheet.write_string(r, 6, row.joined_date.to_string())?;
                }
                worksheet.set_column_width(1, 26)?;
                worksheet.set_column_width(3, 28)?;
                Ok(())
            };
            build(&mut workbook).map_err(report_failed)?;
            workbook.save_to_buffer().map_err(report_failed)?
        }
        ReportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            writer.write_record(HEADERS).map_err(report_failed)?;
            for row in &rows {
                writer
                    .write_record([
                        row.name.clone(),
                        row.email.clone(),
                        row.phone.clone().unwrap_or_default(),
                        row.program.clone(),
                        row.role.clone(),
                        row.status.as_str().to_string(),
                        row.joined_date.to_string(),
                    ])
                    .map_err(report_failed)?;
            }
            writer.into_inner().map_err(report_failed)?
        }
    };

    Ok(download(bytes, "volunteers-report", format))
}
