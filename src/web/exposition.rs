//! Prometheus text exposition of a [`Reading`].
//!
//! The metric set and its order are fixed so scrapers always see the same
//! series, whether or not the sensor has produced data yet.

use crate::metrics::data::Reading;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Value rendered for a metric without data.
///
/// Applies before the first successful reading and to every field the sensor
/// reports as unavailable: absent humidity, temperature and NOx, and PM or VOC
/// values decoded as `NaN`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NoDataValue {
    /// Render `0`
    #[default]
    Zero,
    /// Render `NaN`
    Nan,
}

impl NoDataValue {
    fn value(self) -> f32 {
        match self {
            NoDataValue::Zero => 0.0,
            NoDataValue::Nan => f32::NAN,
        }
    }
}

struct MetricDef {
    name: &'static str,
    help: &'static str,
    value: fn(&Reading) -> Option<f32>,
}

const METRICS: [MetricDef; 8] = [
    MetricDef {
        name: "sen5x_ppm1_0",
        help: "Particulate Matter 1.0 measurement",
        value: |r| Some(r.pm1_0),
    },
    MetricDef {
        name: "sen5x_ppm2_5",
        help: "Particulate Matter 2.5 measurement",
        value: |r| Some(r.pm2_5),
    },
    MetricDef {
        name: "sen5x_ppm4_0",
        help: "Particulate Matter 4.0 measurement",
        value: |r| Some(r.pm4_0),
    },
    MetricDef {
        name: "sen5x_ppm10_0",
        help: "Particulate Matter 10.0 measurement",
        value: |r| Some(r.pm10_0),
    },
    MetricDef {
        name: "sen5x_humidity",
        help: "Humidity measurement",
        value: |r| r.humidity,
    },
    MetricDef {
        name: "sen5x_temperature",
        help: "Temperature measurement",
        value: |r| r.temperature,
    },
    MetricDef {
        name: "sen5x_voc",
        help: "VOC measurement",
        value: |r| Some(r.voc),
    },
    MetricDef {
        name: "sen5x_nox",
        help: "NOx measurement",
        value: |r| r.nox,
    },
];

/// Metric names in exposition order.
pub fn metric_names() -> impl Iterator<Item = &'static str> {
    METRICS.iter().map(|metric| metric.name)
}

/// Render a sample value the way Prometheus parses it.
fn format_value(value: f32) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f32::INFINITY {
        "+Inf".to_string()
    } else if value == f32::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

/// Encode the snapshot contents as Prometheus text.
pub fn encode(reading: Option<&Reading>, no_data: NoDataValue) -> String {
    let mut out = String::with_capacity(1024);
    for metric in &METRICS {
        let value = reading
            .and_then(|r| (metric.value)(r))
            .filter(|value| !value.is_nan())
            .unwrap_or_else(|| no_data.value());

        // Writing to a String cannot fail.
        let _ = writeln!(out, "# HELP {} {}", metric.name, metric.help);
        let _ = writeln!(out, "# TYPE {} gauge", metric.name);
        let _ = writeln!(out, "{} {}", metric.name, format_value(value));
    }
    out
}
