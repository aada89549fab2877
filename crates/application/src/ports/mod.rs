//! Port definitions for external collaborators

mod forecast_source;

pub use forecast_source::{ForecastSourcePort, ForecastStream};

#[cfg(test)]
pub use forecast_source::MockForecastSourcePort;
