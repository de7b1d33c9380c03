//! ARIMA(p, d, q) fitted by conditional sum of squares.

mod diff;
mod model;

pub use diff::{difference, integrate};
pub use model::{Arima, ArimaFit, ArimaOrder};
