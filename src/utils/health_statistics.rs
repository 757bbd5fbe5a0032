use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::health_record::{round_to, HealthRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Weight,
    BloodPressure,
    HeartRate,
    BloodSugar,
}

impl MetricType {
    /// `None` defaults to weight; unknown names are rejected.
    pub fn from_param(param: Option<&str>) -> Result<Self, String> {
        match param.unwrap_or("weight") {
            "weight" => Ok(MetricType::Weight),
            "bloodPressure" => Ok(MetricType::BloodPressure),
            "heartRate" => Ok(MetricType::HeartRate),
            "bloodSugar" => Ok(MetricType::BloodSugar),
            other => Err(format!("Unsupported record type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Week,
    Month,
    Quarter,
    All,
}

impl Period {
    /// `None` defaults to a week; unrecognised values mean the full history.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.unwrap_or("week") {
            "week" => Period::Week,
            "month" => Period::Month,
            "quarter" => Period::Quarter,
            _ => Period::All,
        }
    }

    pub fn start_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        let days = match self {
            Period::Week => 7,
            Period::Month => 30,
            Period::Quarter => 90,
            Period::All => return None,
        };
        Some(today - Duration::days(days))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TrendPoint {
    Pressure {
        date: NaiveDate,
        systolic: i64,
        diastolic: i64,
    },
    Value {
        date: NaiveDate,
        value: StatValue,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub average: StatValue,
    pub max: StatValue,
    pub min: StatValue,
    pub count: usize,
    pub data: Vec<TrendPoint>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Aggregate {
    sum: f64,
    max: f64,
    min: f64,
    count: usize,
}

impl Aggregate {
    fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.max = value;
            self.min = value;
        } else {
            self.max = self.max.max(value);
            self.min = self.min.min(value);
        }
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Aggregate one metric over `records`; empty input yields zeroed statistics.
pub fn summarize(metric: MetricType, records: &[HealthRecord]) -> Statistics {
    match metric {
        MetricType::BloodPressure => summarize_pressure(records),
        MetricType::Weight => summarize_scalar(records, |r| Some(r.weight), Precision::Hundredths),
        MetricType::HeartRate => {
            summarize_scalar(records, |r| Some(f64::from(r.heart_rate)), Precision::Whole)
        }
        MetricType::BloodSugar => summarize_scalar(records, |r| r.blood_sugar, Precision::Tenths),
    }
}

/// Output precision of a scalar metric.
#[derive(Debug, Clone, Copy)]
enum Precision {
    /// Two decimals, rendered as numbers.
    Hundredths,
    /// Whole numbers, summary rendered as text.
    Whole,
    /// One decimal, summary rendered as text.
    Tenths,
}

impl Precision {
    fn summary(self, value: f64) -> StatValue {
        match self {
            Precision::Hundredths => StatValue::Decimal(round_to(value, 2)),
            Precision::Whole => StatValue::Text(format!("{}", value.round() as i64)),
            Precision::Tenths => StatValue::Text(format!("{:.1}", round_to(value, 1))),
        }
    }

    fn trend(self, value: f64) -> StatValue {
        match self {
            Precision::Hundredths => StatValue::Decimal(round_to(value, 2)),
            Precision::Whole => StatValue::Integer(value.round() as i64),
            Precision::Tenths => StatValue::Decimal(round_to(value, 1)),
        }
    }
}

fn summarize_scalar<E>(records: &[HealthRecord], extract: E, precision: Precision) -> Statistics
where
    E: Fn(&HealthRecord) -> Option<f64>,
{
    let mut overall = Aggregate::default();
    let mut daily: BTreeMap<NaiveDate, Aggregate> = BTreeMap::new();

    for record in records {
        if let Some(value) = extract(record) {
            overall.push(value);
            daily
                .entry(record.record_time.date_naive())
                .or_default()
                .push(value);
        }
    }

    let data = daily
        .into_iter()
        .map(|(date, day)| TrendPoint::Value {
            date,
            value: precision.trend(day.mean()),
        })
        .collect();

    Statistics {
        average: precision.summary(overall.mean()),
        max: precision.summary(overall.max),
        min: precision.summary(overall.min),
        count: overall.count,
        data,
    }
}

fn summarize_pressure(records: &[HealthRecord]) -> Statistics {
    let mut systolic = Aggregate::default();
    let mut diastolic = Aggregate::default();
    let mut daily: BTreeMap<NaiveDate, (Aggregate, Aggregate)> = BTreeMap::new();

    for record in records {
        let sys = f64::from(record.systolic_pressure);
        let dia = f64::from(record.diastolic_pressure);
        systolic.push(sys);
        diastolic.push(dia);

        let day = daily.entry(record.record_time.date_naive()).or_default();
        day.0.push(sys);
        day.1.push(dia);
    }

    let pair = |sys: f64, dia: f64| {
        StatValue::Text(format!("{}/{}", sys.round() as i64, dia.round() as i64))
    };

    let data = daily
        .into_iter()
        .map(|(date, (sys, dia))| TrendPoint::Pressure {
            date,
            systolic: sys.mean().round() as i64,
            diastolic: dia.mean().round() as i64,
        })
        .collect();

    Statistics {
        average: pair(systolic.mean(), diastolic.mean()),
        max: pair(systolic.max, diastolic.max),
        min: pair(systolic.min, diastolic.min),
        count: systolic.count,
        data,
    }
}
