use numfmt::{Formatter, Precision, Scales};

#[derive(Debug, Clone, PartialEq)]
pub struct NumberFormat {
    pub decimals: usize,
    pub thousands_separator: Option<char>,
    pub decimal_separator: char,
    pub currency_symbol: Option<String>,
}

impl NumberFormat {
    pub fn nl_be() -> Self {
        Self {
            decimals: 2,
            thousands_separator: Some('.'),
            decimal_separator: ',',
            currency_symbol: Some("€".to_string()),
        }
    }

    pub fn plain(decimals: usize) -> Self {
        Self {
            decimals,
            thousands_separator: None,
            decimal_separator: '.',
            currency_symbol: None,
        }
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self::nl_be()
    }
}

pub fn format_amount(value: f64, format: &NumberFormat) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }

    let symbol = format.currency_symbol.as_deref().unwrap_or("");
    let magnitude = value.abs();

    // numfmt renders zero as a bare "0", so anything that rounds to zero is built here.
    let rounded = format!("{:.*}", format.decimals, magnitude);
    if rounded.bytes().all(|b| b == b'0' || b == b'.') {
        return format!("{symbol}{}", localize("0", format));
    }

    let prefix = if value < 0.0 { format!("-{symbol}") } else { symbol.to_string() };
    let body = match formatter(format, &prefix) {
        Some(formatter) => {
            let rendered = formatter.fmt_string(magnitude);
            match rendered.strip_prefix(prefix.as_str()) {
                Some(body) => body.to_string(),
                None => rendered,
            }
        }
        None => rounded,
    };

    format!("{prefix}{}", localize(&body, format))
}

fn formatter(format: &NumberFormat, prefix: &str) -> Option<Formatter> {
    let decimals = u8::try_from(format.decimals).ok()?;
    let mut formatter = Formatter::new()
        .scales(Scales::none())
        .precision(Precision::Decimals(decimals));
    if format.thousands_separator.is_some() {
        formatter = formatter.separator(',').ok()?;
    }
    if !prefix.is_empty() {
        formatter = formatter.prefix(prefix).ok()?;
    }
    Some(formatter)
}

// numfmt trims trailing zeros and always groups with ',' and '.'.
fn localize(body: &str, format: &NumberFormat) -> String {
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));

    let mut out: String = int_part
        .chars()
        .filter_map(|c| match c {
            ',' => format.thousands_separator,
            c => Some(c),
        })
        .collect();
    if format.decimals > 0 {
        out.push(format.decimal_separator);
        out.extend(frac_part.chars().chain(std::iter::repeat('0')).take(format.decimals));
    }
    out
}

pub fn format_percentage(ratio: f64) -> String {
    if !ratio.is_finite() {
        return "-".to_string();
    }
    format!("{:.2}%", ratio * 100.0)
}
