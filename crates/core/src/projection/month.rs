use crate::domain::occurrence::Occurrence;
use crate::time::calendar::YearMonth;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthRow {
    #[serde(flatten)]
    pub occurrence: Occurrence,
    pub running_total: Decimal,
}

/// Occurrences falling in one calendar month, sorted by date, with their sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthView {
    pub month: YearMonth,
    pub rows: Vec<MonthRow>,
    pub total: Decimal,
}

impl MonthView {
    pub fn build(occurrences: Vec<Occurrence>, month: YearMonth) -> Self {
        let mut selected: Vec<Occurrence> = occurrences
            .into_iter()
            .filter(|o| month.contains(o.date))
            .collect();
        // Stable: same-day occurrences keep template order.
        selected.sort_by_key(|o| o.date);

        let mut total = Decimal::ZERO;
        let rows = selected
            .into_iter()
            .map(|occurrence| {
                total += occurrence.amount;
                MonthRow {
                    occurrence,
                    running_total: total,
                }
            })
            .collect();

        Self { month, rows, total }
    }

    /// Same as [`MonthView::build`], defaulting to the month containing `today`.
    pub fn for_selection(
        occurrences: Vec<Occurrence>,
        month: Option<YearMonth>,
        today: NaiveDate,
    ) -> Self {
        Self::build(occurrences, month.unwrap_or_else(|| YearMonth::of(today)))
    }
}
