use crate::domain::store::NumberingFormat;

/// Renders a reserved quote number in the store's configured style.
pub fn format_quote_number(format: NumberingFormat, prefix: &str, number: i64, year: i32) -> String {
    match format {
        NumberingFormat::YearSequential => format!("{prefix}{year}-{number:04}"),
        NumberingFormat::Sequential | NumberingFormat::Custom => format!("{prefix}{number}"),
    }
}
