/// Milliseconds since the Unix epoch, used for row and snapshot timestamps
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Format an amount as `$1,234.56`.
///
/// Negative amounts keep the sign in front of the currency symbol.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let units = (cents / 100).to_string();
    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, ch) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}
