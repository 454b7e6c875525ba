// printf-style number formatting for `_format` specifiers

#[derive(Debug, Default)]
struct Conversion {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    width: usize,
    precision: Option<usize>,
}

/// Format a value with a printf-style specifier such as `%.2f` or `%5d%%`.
/// Text around conversions is copied through; unknown conversions are kept
/// verbatim.
pub fn sprintf(format: &str, value: f64) -> String {
    let mut out = String::with_capacity(format.len() + 8);
    let mut chars = format.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut raw = String::from("%");
        let mut conv = Conversion::default();

        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => conv.left = true,
                '+' => conv.plus = true,
                ' ' => conv.space = true,
                '0' => conv.zero = true,
                _ => break,
            }
            raw.push(flag);
            chars.next();
        }

        while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
            conv.width = conv.width * 10 + d as usize;
            raw.push(chars.next().unwrap_or_default());
        }

        if chars.peek() == Some(&'.') {
            raw.push('.');
            chars.next();
            let mut precision = 0;
            while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                precision = precision * 10 + d as usize;
                raw.push(chars.next().unwrap_or_default());
            }
            conv.precision = Some(precision);
        }

        let Some(conversion) = chars.next() else {
            out.push_str(&raw);
            break;
        };

        let (body, numeric) = match conversion {
            '%' => {
                out.push('%');
                continue;
            }
            'd' | 'i' => (format!("{}", value.trunc() as i64), true),
            'f' => (format!("{:.*}", conv.precision.unwrap_or(6), value), true),
            'e' => (exponential(value, conv.precision.unwrap_or(6)), true),
            'g' => (value.to_string(), true),
            'x' => (format!("{:x}", value.trunc() as i64 as u32), false),
            'X' => (format!("{:X}", value.trunc() as i64 as u32), false),
            's' => {
                let mut text = value.to_string();
                if let Some(p) = conv.precision {
                    text = text.chars().take(p).collect();
                }
                (text, false)
            }
            other => {
                out.push_str(&raw);
                out.push(other);
                continue;
            }
        };

        out.push_str(&pad(body, numeric, &conv));
    }

    out
}

/// `1.5e3` becomes `1.50e+3`, matching the C-style exponent sign
fn exponential(value: f64, precision: usize) -> String {
    let text = format!("{:.*e}", precision, value);
    match text.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
        _ => text,
    }
}

fn pad(body: String, numeric: bool, conv: &Conversion) -> String {
    let (sign, digits) = match body.strip_prefix('-') {
        Some(digits) => ("-", digits.to_string()),
        None if numeric && conv.plus => ("+", body),
        None if numeric && conv.space => (" ", body),
        None => ("", body),
    };

    let len = sign.len() + digits.chars().count();
    if len >= conv.width {
        return format!("{}{}", sign, digits);
    }

    let fill = conv.width - len;
    if conv.left {
        format!("{}{}{}", sign, digits, " ".repeat(fill))
    } else if conv.zero && numeric {
        format!("{}{}{}", sign, "0".repeat(fill), digits)
    } else {
        format!("{}{}{}", " ".repeat(fill), sign, digits)
    }
}
