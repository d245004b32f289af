//! Journal performance statistics.

mod calculator;

pub use calculator::StatsCalculator;
