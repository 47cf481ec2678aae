use std::time::{Duration, Instant};
use tracing::info;

/// A simple wall-clock timer for logging elapsed time.
pub struct Timer {
    label: String,
    start: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        info!("⏱  Starting: {}", label);
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!(
            "⏱  Finished: {} (took {:.2?})",
            self.label,
            self.start.elapsed()
        );
    }
}

/// Format a currency amount with thousands separators and cents.
/// 1234567.5 → "1,234,567.50"
pub fn fmt_money(n: f64) -> String {
    let negative = n < 0.0;
    let cents = (n.abs() * 100.0).round() as i64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::new();
    for (i, ch) in whole.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let whole: String = grouped.chars().rev().collect();

    format!("{}{}.{:02}", if negative { "-" } else { "" }, whole, frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_money() {
        assert_eq!(fmt_money(1_234_567.5), "1,234,567.50");
        assert_eq!(fmt_money(0.0), "0.00");
        assert_eq!(fmt_money(-42_000.0), "-42,000.00");
        assert_eq!(fmt_money(999.999), "1,000.00");
    }
}
