//! Cell type inference for delimited text fields

use phf::phf_set;

use super::config::LoaderConfig;
use crate::sheet::CellValue;

/// Field texts read as missing values when `keep_default_na` is on.
pub static NA_VALUES: phf::Set<&'static str> = phf_set! {
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan",
    "1.#IND", "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None",
    "n/a", "nan", "null",
};

/// Determine the cell value of a raw field.
///
/// Empty fields are always [`CellValue::Empty`]. With inference on, integers
/// win over floats, and only `true`/`false` in lower, title or upper case
/// are booleans. A field that parses as NaN is never a float: it is missing
/// when `keep_default_na` is on and a string otherwise.
pub fn infer_cell(field: String, config: &LoaderConfig) -> CellValue {
    if field.is_empty() || (config.keep_default_na && NA_VALUES.contains(field.as_str())) {
        return CellValue::Empty;
    }

    if !config.infer_types {
        return CellValue::String(field);
    }

    if let Ok(int_val) = field.parse::<i64>() {
        return CellValue::Int(int_val);
    }

    match parse_float(&field, config.decimal) {
        // Spellings of NaN outside NA_VALUES ("NAN", "+nan", ...)
        Some(float_val) if float_val.is_nan() => {
            return if config.keep_default_na {
                CellValue::Empty
            } else {
                CellValue::String(field)
            };
        },
        Some(float_val) => return CellValue::Float(float_val),
        None => {},
    }

    match field.as_str() {
        "true" | "True" | "TRUE" => CellValue::Bool(true),
        "false" | "False" | "FALSE" => CellValue::Bool(false),
        _ => CellValue::String(field),
    }
}

fn parse_float(field: &str, decimal: char) -> Option<f64> {
    if decimal == '.' {
        return fast_float2::parse::<f64, _>(field).ok();
    }
    if field.contains('.') {
        return None;
    }
    fast_float2::parse::<f64, _>(field.replace(decimal, ".")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infer(field: &str) -> CellValue {
        infer_cell(field.to_string(), &LoaderConfig::default())
    }

    #[test]
    fn test_type_inference() {
        assert_eq!(infer("42"), CellValue::Int(42));
        assert_eq!(infer("-7"), CellValue::Int(-7));
        assert_eq!(infer("10.5"), CellValue::Float(10.5));
        assert_eq!(infer("1e3"), CellValue::Float(1000.0));
        assert_eq!(infer("TRUE"), CellValue::Bool(true));
        assert_eq!(infer("false"), CellValue::Bool(false));
        assert_eq!(infer("yes"), CellValue::String("yes".to_string()));
        assert_eq!(infer("Basqueta"), CellValue::String("Basqueta".to_string()));
        assert_eq!(infer(""), CellValue::Empty);
    }

    #[test]
    fn test_na_tokens() {
        assert_eq!(infer("NA"), CellValue::Empty);
        assert_eq!(infer("NaN"), CellValue::Empty);
        assert_eq!(infer("null"), CellValue::Empty);
        assert_eq!(infer("NAN"), CellValue::Empty);

        let config = LoaderConfig::default().with_keep_default_na(false);
        assert_eq!(
            infer_cell("NA".to_string(), &config),
            CellValue::String("NA".to_string())
        );
        assert_eq!(
            infer_cell("NAN".to_string(), &config),
            CellValue::String("NAN".to_string())
        );
    }

    #[test]
    fn test_inference_disabled() {
        let config = LoaderConfig::default().with_infer_types(false);
        assert_eq!(
            infer_cell("001".to_string(), &config),
            CellValue::String("001".to_string())
        );
        assert_eq!(infer_cell("".to_string(), &config), CellValue::Empty);
    }

    #[test]
    fn test_decimal_comma() {
        let config = LoaderConfig::default().with_decimal(',');
        assert_eq!(infer_cell("19,5".to_string(), &config), CellValue::Float(19.5));
        assert_eq!(infer_cell("19".to_string(), &config), CellValue::Int(19));
        assert_eq!(
            infer_cell("1.234,5".to_string(), &config),
            CellValue::String("1.234,5".to_string())
        );
    }
}
