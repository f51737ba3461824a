//! Display formatting for amounts.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};

/// Format `number` as dollars with two decimal places, e.g. "$1.50" or
/// "-$12.30".
pub fn currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();
    static NEGATIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let (formatter, prefix) = if number < 0.0 {
        (NEGATIVE_FMT.get_or_init(|| currency_formatter("-$")), "-$")
    } else if number > 0.0 {
        (POSITIVE_FMT.get_or_init(|| currency_formatter("$")), "$")
    } else {
        // numfmt renders zero as "0"
        return "$0.00".to_owned();
    };

    let formatted = match formatter {
        Some(formatter) => formatter.fmt_string(number.abs()),
        None => return format!("{prefix}{:.2}", number.abs()),
    };

    pad_decimals(formatted)
}

fn currency_formatter(prefix: &str) -> Option<Formatter> {
    Formatter::currency(prefix)
        .ok()
        .map(|formatter| formatter.precision(Precision::Decimals(2)))
}

/// numfmt drops trailing zeros, e.g. "12.30" comes out as "12.3".
fn pad_decimals(mut formatted: String) -> String {
    match formatted.rfind('.') {
        None => formatted.push_str(".00"),
        Some(point) => {
            for _ in formatted.len() - point - 1..2 {
                formatted.push('0');
            }
        }
    }

    formatted
}
