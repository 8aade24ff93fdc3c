const CURRENCY_SYMBOL: &str = "R$";

const COMPACT_UNITS: [(f64, &str); 4] = [
    (1e12, "tri"),
    (1e9, "bi"),
    (1e6, "mi"),
    (1e3, "mil"),
];

pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return format!("{CURRENCY_SYMBOL} -");
    }
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{sign}{CURRENCY_SYMBOL} {},{:02}",
        group_thousands(cents / 100),
        cents % 100
    )
}

pub fn format_compact(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();

    let mut chosen: Option<usize> = COMPACT_UNITS.iter().position(|(unit, _)| magnitude >= *unit);
    loop {
        match chosen {
            Some(i) => {
                let (unit, suffix) = COMPACT_UNITS[i];
                let tenths = (magnitude / unit * 10.0).round() as u64;
                // 999.96 mil rounds to 1000 mil; promote to the next unit when there is one.
                if tenths >= 10_000 && i > 0 {
                    chosen = Some(i - 1);
                    continue;
                }
                return format!("{sign}{} {suffix}", one_decimal(tenths));
            }
            None => {
                let tenths = (magnitude * 10.0).round() as u64;
                if tenths >= 10_000 {
                    chosen = Some(COMPACT_UNITS.len() - 1);
                    continue;
                }
                let body = one_decimal(tenths);
                return if body == "0" {
                    body
                } else {
                    format!("{sign}{body}")
                };
            }
        }
    }
}

pub fn format_monthly_rate(rate: f64) -> String {
    format!("{} a.m.", format_percent(rate))
}

pub fn format_annual_rate(rate: f64) -> String {
    format!("{} a.a.", format_percent(rate))
}

fn format_percent(rate: f64) -> String {
    let hundredths = (rate * 10_000.0).round() as i64;
    if hundredths == 0 {
        return "0%".to_string();
    }
    let sign = if hundredths < 0 { "-" } else { "" };
    let abs = hundredths.unsigned_abs();
    format!("{sign}{},{:02}%", group_thousands(abs / 100), abs % 100)
}

fn one_decimal(tenths: u64) -> String {
    let whole = group_thousands(tenths / 10);
    match tenths % 10 {
        0 => whole,
        fraction => format!("{whole},{fraction}"),
    }
}

fn group_thousands(mut n: u64) -> String {
    let mut groups = Vec::new();
    while n >= 1000 {
        groups.push(format!("{:03}", n % 1000));
        n /= 1000;
    }
    groups.push(n.to_string());
    groups.reverse();
    groups.join(".")
}
