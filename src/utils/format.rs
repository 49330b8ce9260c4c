//! Number formatting for the text report and chart axis labels.
//!
//! Prices and market caps carry thousands separators; percent changes keep
//! their sign and exactly two decimals. The separator is always a comma, the
//! decimal point always a dot, independent of the machine's locale.

/// Format a value with thousands separators and a fixed number of decimals.
///
/// # Examples
/// * `group_thousands(67890.5, 2)` -> `"67,890.50"`
/// * `group_thousands(67890.4, 0)` -> `"67,890"`
/// * `group_thousands(-1234.5, 2)` -> `"-1,234.50"`
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value);
    let (sign, digits) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    format!("{}{}", sign, grouped)
}

/// Dollar amount with two decimals, e.g. `$67,890.50`
pub fn format_usd(value: f64) -> String {
    format!("${}", group_thousands(value, 2))
}

/// Krone amount with two decimals and the `NOK` suffix, e.g. `720,123.25 NOK`
pub fn format_nok(value: f64) -> String {
    format!("{} NOK", group_thousands(value, 2))
}

/// Percent change with two decimals and no separators, e.g. `-3.40%`
pub fn format_pct(value: f64) -> String {
    format!("{:.2}%", value)
}
