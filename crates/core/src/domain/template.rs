use crate::domain::error::ValidationError;
use crate::time::calendar;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    OneTime,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::OneTime => "one-time",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFrequency(pub String);

impl fmt::Display for UnknownFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown frequency {:?}", self.0)
    }
}

impl std::error::Error for UnknownFrequency {}

/// Matches the stored tags exactly; case and whitespace are not forgiven.
impl FromStr for Frequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one-time" => Ok(Frequency::OneTime),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(UnknownFrequency(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    /// Credits are stored positive, debits as a negative magnitude.
    pub fn normalize(self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Credit => amount.abs(),
            TransactionKind::Debit => -amount.abs(),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credit" | "income" => Ok(TransactionKind::Credit),
            "debit" | "expense" => Ok(TransactionKind::Debit),
            other => anyhow::bail!("unknown transaction kind {other:?} (expected credit|debit)"),
        }
    }
}

/// A template row exactly as persisted. `frequency` and `start_date` are kept as text so
/// that the expander, not the store, decides what is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRow {
    pub description: String,
    pub amount: Decimal,
    pub frequency: Option<String>,
    pub start_date: String,
}

/// A template row together with its identity, as listed for editing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub id: i64,
    pub owner_id: i64,
    #[serde(flatten)]
    pub row: TemplateRow,
}

/// A validated template, sign already normalized, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTemplate {
    pub description: String,
    pub amount: Decimal,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
}

impl NewTemplate {
    pub fn to_row(&self) -> TemplateRow {
        TemplateRow {
            description: self.description.clone(),
            amount: self.amount,
            frequency: Some(self.frequency.as_str().to_string()),
            start_date: self.start_date.format(calendar::DATE_FORMAT).to_string(),
        }
    }
}

/// User-supplied entry fields before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryInput {
    pub description: String,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub frequency: String,
    pub date: String,
}

impl EntryInput {
    pub fn validate(self) -> Result<NewTemplate, ValidationError> {
        let description = self.description.trim().to_string();
        if description.is_empty() {
            return Err(ValidationError::new("description", "must be non-empty"));
        }

        // User input is normalized here so that only canonical tags reach storage.
        let frequency: Frequency = self
            .frequency
            .trim()
            .to_ascii_lowercase()
            .parse()
            .map_err(|e: UnknownFrequency| ValidationError::new("frequency", e.to_string()))?;

        let start_date = calendar::parse_date(&self.date)
            .map_err(|e| ValidationError::new("start_date", e.to_string()))?;

        Ok(NewTemplate {
            description,
            amount: self.kind.normalize(self.amount),
            frequency,
            start_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(kind: TransactionKind, amount: i64, frequency: &str, date: &str) -> EntryInput {
        EntryInput {
            description: "Rent".to_string(),
            amount: Decimal::new(amount, 0),
            kind,
            frequency: frequency.to_string(),
            date: date.to_string(),
        }
    }

    #[test]
    fn debit_is_stored_negative() {
        let t = input(TransactionKind::Debit, 50, "weekly", "2024-01-01")
            .validate()
            .unwrap();
        assert_eq!(t.amount, Decimal::new(-50, 0));

        let t = input(TransactionKind::Debit, -50, "weekly", "2024-01-01")
            .validate()
            .unwrap();
        assert_eq!(t.amount, Decimal::new(-50, 0));
    }

    #[test]
    fn credit_is_stored_positive() {
        let t = input(TransactionKind::Credit, 1000, "monthly", "2024-01-31")
            .validate()
            .unwrap();
        assert_eq!(t.amount, Decimal::new(1000, 0));
        assert_eq!(t.frequency, Frequency::Monthly);
    }

    #[test]
    fn rejects_bad_date_and_frequency() {
        let err = input(TransactionKind::Credit, 1, "monthly", "2024-02-30")
            .validate()
            .unwrap_err();
        assert_eq!(err.field, "start_date");

        let err = input(TransactionKind::Credit, 1, "fortnightly", "2024-02-01")
            .validate()
            .unwrap_err();
        assert_eq!(err.field, "frequency");
    }

    #[test]
    fn frequency_parse_is_exact() {
        assert_eq!("monthly".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert_eq!("one-time".parse::<Frequency>().unwrap(), Frequency::OneTime);
        assert!("Monthly".parse::<Frequency>().is_err());
        assert!(" weekly".parse::<Frequency>().is_err());
        assert!("annually".parse::<Frequency>().is_err());
        assert!("biweekly".parse::<Frequency>().is_err());
    }

    #[test]
    fn entry_input_stores_canonical_frequency() {
        let t = input(TransactionKind::Credit, 10, " Monthly ", "2024-01-01")
            .validate()
            .unwrap();
        assert_eq!(t.frequency, Frequency::Monthly);
        assert_eq!(t.to_row().frequency.as_deref(), Some("monthly"));
    }

    #[test]
    fn new_template_round_trips_to_row() {
        let t = input(TransactionKind::Debit, 200, "quarterly", "2023-01-01")
            .validate()
            .unwrap();
        let row = t.to_row();
        assert_eq!(row.frequency.as_deref(), Some("quarterly"));
        assert_eq!(row.start_date, "2023-01-01");
        assert_eq!(row.amount, Decimal::new(-200, 0));
    }
}
