use std::io::Read;
use std::sync::OnceLock;

use log::debug;
use serde::{Deserialize, Serialize};

use super::error::{ProjectionError, Result};

const EMBEDDED_CSV: &str = include_str!("../../data/ipca_monthly.csv");

static EMBEDDED: OnceLock<HistoricalIndex> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalSample {
    pub date: String,
    pub rate: f64,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    variation_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalIndex {
    samples: Vec<HistoricalSample>,
}

impl HistoricalIndex {
    pub fn from_samples(samples: Vec<HistoricalSample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(ProjectionError::History("series is empty".to_string()));
        }

        let mut previous: Option<(i32, u32)> = None;
        for sample in &samples {
            let key = parse_year_month(&sample.date)?;
            if previous.is_some_and(|prev| key <= prev) {
                return Err(ProjectionError::History(format!(
                    "{} is out of chronological order or duplicated",
                    sample.date
                )));
            }
            if !sample.rate.is_finite() || sample.rate <= -1.0 {
                return Err(ProjectionError::History(format!(
                    "{} has an invalid rate {}",
                    sample.date, sample.rate
                )));
            }
            previous = Some(key);
        }

        Ok(Self { samples })
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut samples = Vec::new();
        for (line, row) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = row.map_err(|e| {
                ProjectionError::History(format!("row {}: {e}", line + 1))
            })?;
            samples.push(HistoricalSample {
                date: row.date,
                rate: row.variation_pct / 100.0,
            });
        }
        Self::from_samples(samples)
    }

    pub fn embedded() -> Result<&'static HistoricalIndex> {
        if let Some(index) = EMBEDDED.get() {
            return Ok(index);
        }
        let index = Self::from_csv_reader(EMBEDDED_CSV.as_bytes())?;
        debug!(
            "loaded {} historical samples ({} to {})",
            index.len(),
            index.samples[0].date,
            index.samples[index.len() - 1].date
        );
        Ok(EMBEDDED.get_or_init(|| index))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HistoricalSample> {
        self.samples.get(index)
    }

    pub fn samples(&self) -> &[HistoricalSample] {
        &self.samples
    }

    pub fn first(&self) -> Option<&HistoricalSample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&HistoricalSample> {
        self.samples.last()
    }

    pub fn range_label(&self, start: usize, end: usize) -> Option<String> {
        let first = self.get(start)?;
        let last = self.get(end)?;
        Some(format!("{} to {}", first.date, last.date))
    }

    pub fn annualized(&self, year: i32) -> Option<f64> {
        let prefix = format!("{year:04}-");
        let months: Vec<f64> = self
            .samples
            .iter()
            .filter(|s| s.date.starts_with(&prefix))
            .map(|s| s.rate)
            .collect();
        if months.len() != 12 {
            return None;
        }
        Some(months.iter().fold(1.0, |acc, rate| acc * (1.0 + rate)) - 1.0)
    }

    pub fn annual_rates(&self) -> Vec<(i32, f64)> {
        let mut years: Vec<i32> = self
            .samples
            .iter()
            .filter_map(|s| parse_year_month(&s.date).ok().map(|(y, _)| y))
            .collect();
        years.dedup();
        years
            .into_iter()
            .filter_map(|y| self.annualized(y).map(|rate| (y, rate)))
            .collect()
    }
}

fn parse_year_month(date: &str) -> Result<(i32, u32)> {
    let invalid = || ProjectionError::History(format!("{date:?} is not a YYYY-MM date"));
    let (year, month) = date.split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn sample(date: &str, rate: f64) -> HistoricalSample {
        HistoricalSample {
            date: date.to_string(),
            rate,
        }
    }

    #[test]
    fn embedded_series_covers_2010_through_2025() {
        let index = HistoricalIndex::embedded().expect("embedded series parses");
        assert_eq!(index.len(), 192);
        assert_eq!(index.first().map(|s| s.date.as_str()), Some("2010-01"));
        assert_eq!(index.last().map(|s| s.date.as_str()), Some("2025-12"));
        assert_eq!(index.get(72).map(|s| s.date.as_str()), Some("2016-01"));
    }

    #[test]
    fn embedded_series_is_loaded_once() {
        let a = HistoricalIndex::embedded().expect("loads");
        let b = HistoricalIndex::embedded().expect("loads");
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn csv_percentages_are_converted_to_fractions() {
        let csv = "date,variation_pct\n2020-01,0.21\n2020-02, -0.5\n";
        let index = HistoricalIndex::from_csv_reader(csv.as_bytes()).expect("parses");
        assert_eq!(index.len(), 2);
        assert!((index.samples()[0].rate - 0.0021).abs() < EPS);
        assert!((index.samples()[1].rate + 0.005).abs() < EPS);
    }

    #[test]
    fn rejects_malformed_rows() {
        let csv = "date,variation_pct\n2020-01,abc\n";
        let err = HistoricalIndex::from_csv_reader(csv.as_bytes()).expect_err("bad number");
        assert!(matches!(err, ProjectionError::History(_)));
    }

    #[test]
    fn rejects_empty_and_unordered_series() {
        assert!(HistoricalIndex::from_samples(Vec::new()).is_err());

        let unordered = vec![sample("2020-02", 0.01), sample("2020-01", 0.01)];
        assert!(HistoricalIndex::from_samples(unordered).is_err());

        let duplicated = vec![sample("2020-01", 0.01), sample("2020-01", 0.01)];
        assert!(HistoricalIndex::from_samples(duplicated).is_err());
    }

    #[test]
    fn rejects_bad_dates_and_rates() {
        assert!(HistoricalIndex::from_samples(vec![sample("2020-13", 0.01)]).is_err());
        assert!(HistoricalIndex::from_samples(vec![sample("2020/01", 0.01)]).is_err());
        assert!(HistoricalIndex::from_samples(vec![sample("2020-01", -1.0)]).is_err());
        assert!(HistoricalIndex::from_samples(vec![sample("2020-01", f64::NAN)]).is_err());
    }

    #[test]
    fn range_label_uses_sample_dates() {
        let index = HistoricalIndex::from_samples(vec![
            sample("2020-01", 0.0),
            sample("2020-02", 0.0),
            sample("2020-03", 0.0),
        ])
        .expect("valid");
        assert_eq!(index.range_label(1, 2).as_deref(), Some("2020-02 to 2020-03"));
        assert_eq!(index.range_label(1, 3), None);
    }

    #[test]
    fn annualized_requires_a_full_year() {
        let mut samples: Vec<HistoricalSample> = (1..=12)
            .map(|m| sample(&format!("2021-{m:02}"), 0.01))
            .collect();
        samples.push(sample("2022-01", 0.02));
        let index = HistoricalIndex::from_samples(samples).expect("valid");

        let expected = 1.01f64.powi(12) - 1.0;
        assert!((index.annualized(2021).expect("full year") - expected).abs() < EPS);
        assert_eq!(index.annualized(2022), None);
        assert_eq!(index.annual_rates().len(), 1);
    }
}
