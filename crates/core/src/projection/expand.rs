use crate::domain::error::ValidationError;
use crate::domain::occurrence::Occurrence;
use crate::domain::template::{Frequency, TemplateRow};
use crate::time::calendar;
use chrono::{Days, NaiveDate};

#[derive(Debug, Clone)]
pub struct ExpandOptions {
    /// How far past `now` occurrences are generated.
    pub horizon_months: u32,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            horizon_months: calendar::DEFAULT_HORIZON_MONTHS,
        }
    }
}

/// Expands every template into its dated occurrences up to `now` + one year.
///
/// Output keeps template input order; callers sort by date before display.
pub fn expand(templates: &[TemplateRow], now: NaiveDate) -> Result<Vec<Occurrence>, ValidationError> {
    expand_with(templates, now, &ExpandOptions::default())
}

pub fn expand_with(
    templates: &[TemplateRow],
    now: NaiveDate,
    opts: &ExpandOptions,
) -> Result<Vec<Occurrence>, ValidationError> {
    let horizon = calendar::projection_horizon(now, opts.horizon_months);

    let mut out = Vec::new();
    for row in templates {
        expand_row(row, horizon, &mut out)?;
    }

    tracing::debug!(
        %now,
        %horizon,
        templates = templates.len(),
        occurrences = out.len(),
        "expanded budget templates"
    );
    Ok(out)
}

fn expand_row(
    row: &TemplateRow,
    horizon: NaiveDate,
    out: &mut Vec<Occurrence>,
) -> Result<(), ValidationError> {
    let start = calendar::parse_date(&row.start_date).map_err(|e| {
        ValidationError::new("start_date", format!("{e} (template {:?})", row.description))
    })?;
    let frequency = resolve_frequency(row)?;

    let mut k: u32 = 0;
    while let Some(date) = nth_occurrence(start, frequency, k) {
        if date > horizon {
            break;
        }
        out.push(Occurrence {
            description: row.description.clone(),
            amount: row.amount,
            date,
        });
        k += 1;
    }
    Ok(())
}

fn resolve_frequency(row: &TemplateRow) -> Result<Frequency, ValidationError> {
    let raw = row
        .frequency
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            ValidationError::new(
                "frequency",
                format!("missing for template {:?}", row.description),
            )
        })?;

    match raw.parse::<Frequency>() {
        Ok(f) => Ok(f),
        Err(e) => {
            tracing::warn!(
                description = %row.description,
                error = %e,
                "unrecognized frequency; treating as one-time"
            );
            Ok(Frequency::OneTime)
        }
    }
}

// Occurrence k is measured from the start date, not from occurrence k-1, so clamping in a
// short month never shifts later occurrences.
fn nth_occurrence(start: NaiveDate, frequency: Frequency, k: u32) -> Option<NaiveDate> {
    match frequency {
        Frequency::OneTime => (k == 0).then_some(start),
        Frequency::Weekly => start.checked_add_days(Days::new(u64::from(k) * 7)),
        Frequency::Monthly => calendar::add_months_clamped(start, k),
        Frequency::Quarterly => calendar::add_months_clamped(start, k.checked_mul(3)?),
        Frequency::Yearly => calendar::add_years_clamped(start, k),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use rust_decimal::Decimal;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(amount: i64, frequency: &str, start_date: &str) -> TemplateRow {
        TemplateRow {
            description: format!("{frequency} item"),
            amount: Decimal::new(amount, 0),
            frequency: Some(frequency.to_string()),
            start_date: start_date.to_string(),
        }
    }

    fn dates(occurrences: &[Occurrence]) -> Vec<NaiveDate> {
        occurrences.iter().map(|o| o.date).collect()
    }

    #[test]
    fn weekly_runs_through_horizon() {
        let out = expand(&[row(-50, "weekly", "2024-01-01")], d(2024, 1, 15)).unwrap();
        let got = dates(&out);

        assert_eq!(
            &got[..4],
            &[d(2024, 1, 1), d(2024, 1, 8), d(2024, 1, 15), d(2024, 1, 22)]
        );
        // 2024-01-01 is a Monday, as is 2025-01-13; the next Monday is past 2025-01-15.
        assert_eq!(*got.last().unwrap(), d(2025, 1, 13));
        assert!(out.iter().all(|o| o.amount == Decimal::new(-50, 0)));
    }

    #[test]
    fn monthly_on_the_31st_clamps_without_drift() {
        let out = expand(&[row(1000, "monthly", "2024-01-31")], d(2024, 1, 31)).unwrap();
        let got = dates(&out);

        assert_eq!(
            &got[..5],
            &[
                d(2024, 1, 31),
                d(2024, 2, 29),
                d(2024, 3, 31),
                d(2024, 4, 30),
                d(2024, 5, 31)
            ]
        );
        for date in &got {
            let last = calendar::days_in_month(date.year(), date.month()).unwrap();
            assert_eq!(date.day(), last, "{date} is not the last day of its month");
        }
        assert_eq!(*got.last().unwrap(), d(2025, 1, 31));
    }

    #[test]
    fn past_one_time_entry_still_surfaces() {
        let out = expand(&[row(200, "one-time", "2023-01-01")], d(2024, 6, 1)).unwrap();
        assert_eq!(dates(&out), vec![d(2023, 1, 1)]);
        assert_eq!(out[0].amount, Decimal::new(200, 0));
    }

    #[test]
    fn one_time_yields_exactly_its_start_date() {
        for now in [d(2020, 1, 1), d(2024, 6, 1), d(2030, 12, 31)] {
            let out = expand(&[row(5, "one-time", "2024-06-01")], now).unwrap();
            if d(2024, 6, 1) <= calendar::projection_horizon(now, 12) {
                assert_eq!(dates(&out), vec![d(2024, 6, 1)]);
            } else {
                assert!(out.is_empty());
            }
        }
    }

    #[test]
    fn quarterly_and_yearly_steps() {
        let out = expand(&[row(10, "quarterly", "2024-11-30")], d(2024, 12, 1)).unwrap();
        assert_eq!(
            dates(&out),
            vec![d(2024, 11, 30), d(2025, 2, 28), d(2025, 5, 30), d(2025, 8, 30), d(2025, 11, 30)]
        );

        let out = expand(&[row(10, "yearly", "2020-02-29")], d(2024, 1, 1)).unwrap();
        assert_eq!(
            dates(&out),
            vec![
                d(2020, 2, 29),
                d(2021, 2, 28),
                d(2022, 2, 28),
                d(2023, 2, 28),
                d(2024, 2, 29)
            ]
        );
    }

    #[test]
    fn unrecognized_frequency_falls_back_to_one_time() {
        let out = expand(&[row(7, "fortnightly", "2024-03-01")], d(2024, 3, 1)).unwrap();
        assert_eq!(dates(&out), vec![d(2024, 3, 1)]);
    }

    #[test]
    fn stored_tags_must_match_exactly() {
        for tag in ["Monthly", "WEEKLY", "annually", "once", " weekly"] {
            let out = expand(&[row(7, tag, "2024-01-01")], d(2024, 1, 1)).unwrap();
            assert_eq!(dates(&out), vec![d(2024, 1, 1)], "{tag}");
        }
    }

    #[test]
    fn start_after_horizon_yields_nothing() {
        let out = expand(&[row(7, "monthly", "2026-01-01")], d(2024, 1, 1)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn horizon_day_is_included() {
        let out = expand(&[row(7, "yearly", "2024-05-10")], d(2024, 5, 10)).unwrap();
        assert_eq!(dates(&out), vec![d(2024, 5, 10), d(2025, 5, 10)]);
    }

    #[test]
    fn horizon_boundary_holds_for_every_frequency() {
        let now = d(2024, 3, 17);
        let horizon = calendar::projection_horizon(now, 12);
        for f in ["weekly", "monthly", "quarterly", "yearly"] {
            let template = row(1, f, "2023-08-31");
            let out = expand(std::slice::from_ref(&template), now).unwrap();
            let got = dates(&out);

            assert!(got.iter().all(|date| *date <= horizon), "{f}");
            assert!(got.windows(2).all(|w| w[0] < w[1]), "{f} not increasing");

            let frequency: Frequency = f.parse().unwrap();
            let start = d(2023, 8, 31);
            let next = nth_occurrence(start, frequency, got.len() as u32).unwrap();
            assert!(next > horizon, "{f}: next occurrence {next} is within horizon");
        }
    }

    #[test]
    fn output_keeps_template_order() {
        let templates = [
            row(1, "one-time", "2024-06-01"),
            row(2, "one-time", "2024-01-01"),
        ];
        let out = expand(&templates, d(2024, 1, 1)).unwrap();
        assert_eq!(dates(&out), vec![d(2024, 6, 1), d(2024, 1, 1)]);
    }

    #[test]
    fn expansion_is_idempotent() {
        let templates = [
            row(-50, "weekly", "2024-01-01"),
            row(1000, "monthly", "2024-01-31"),
            row(200, "one-time", "2023-01-01"),
        ];
        let now = d(2024, 1, 15);
        assert_eq!(expand(&templates, now).unwrap(), expand(&templates, now).unwrap());
    }

    #[test]
    fn malformed_rows_are_rejected() {
        let err = expand(&[row(1, "weekly", "2024/01/01")], d(2024, 1, 1)).unwrap_err();
        assert_eq!(err.field, "start_date");

        let mut missing = row(1, "weekly", "2024-01-01");
        missing.frequency = None;
        let err = expand(&[missing], d(2024, 1, 1)).unwrap_err();
        assert_eq!(err.field, "frequency");

        let blank = row(1, "  ", "2024-01-01");
        let err = expand(&[blank], d(2024, 1, 1)).unwrap_err();
        assert_eq!(err.field, "frequency");
    }

    #[test]
    fn custom_horizon_limits_output() {
        let opts = ExpandOptions { horizon_months: 1 };
        let out = expand_with(&[row(1, "weekly", "2024-01-01")], d(2024, 1, 1), &opts).unwrap();
        assert_eq!(*dates(&out).last().unwrap(), d(2024, 1, 29));
    }
}
