//! # Brazilian Document Validation and Formatting
//!
//! Pure functions for CPF, CNPJ, CEP, and phone numbers. Documents are
//! stored digits-only (every non-numeric character stripped) and
//! round-tripped through the display formatters for the UI and the
//! proposal documents.
//!
//! CPF and CNPJ are validated with the official mod-11 check-digit
//! algorithms; all-same-digit sequences are rejected even though they
//! pass the checksum.

/// Strip every non-digit character.
pub fn normalize_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Validate a CPF (11-digit individual taxpayer number), with or
/// without formatting.
pub fn validate_cpf(cpf: &str) -> bool {
    let digits = normalize_digits(cpf);
    if digits.len() != 11 {
        return false;
    }
    let d: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    if d.windows(2).all(|w| w[0] == w[1]) {
        return false;
    }

    // First check digit: weights 10..2 over the first 9 digits.
    let sum: u32 = d[..9]
        .iter()
        .enumerate()
        .map(|(i, v)| v * (10 - i as u32))
        .sum();
    let mut remainder = (sum * 10) % 11;
    if remainder >= 10 {
        remainder = 0;
    }
    if remainder != d[9] {
        return false;
    }

    // Second check digit: weights 11..2 over the first 10 digits.
    let sum: u32 = d[..10]
        .iter()
        .enumerate()
        .map(|(i, v)| v * (11 - i as u32))
        .sum();
    let mut remainder = (sum * 10) % 11;
    if remainder >= 10 {
        remainder = 0;
    }
    remainder == d[10]
}

/// Validate a CNPJ (14-digit company registry number), with or without
/// formatting.
pub fn validate_cnpj(cnpj: &str) -> bool {
    let digits = normalize_digits(cnpj);
    if digits.len() != 14 {
        return false;
    }
    let d: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    if d.windows(2).all(|w| w[0] == w[1]) {
        return false;
    }

    cnpj_check_digit(&d[..12]) == d[12] && cnpj_check_digit(&d[..13]) == d[13]
}

/// CNPJ check digit over a 12- or 13-digit prefix. Weights cycle
/// 2,3,...,9 from the rightmost digit leftwards.
fn cnpj_check_digit(prefix: &[u32]) -> u32 {
    let mut weight = 2;
    let mut sum = 0;
    for v in prefix.iter().rev() {
        sum += v * weight;
        weight = if weight == 9 { 2 } else { weight + 1 };
    }
    let remainder = sum % 11;
    if remainder < 2 {
        0
    } else {
        11 - remainder
    }
}

/// Validate a CEP: exactly 8 digits after stripping formatting.
pub fn validate_cep(cep: &str) -> bool {
    normalize_digits(cep).len() == 8
}

/// Format a CPF as `000.000.000-00`. Returns the input unchanged when
/// it does not hold exactly 11 digits.
pub fn format_cpf(cpf: &str) -> String {
    let d = normalize_digits(cpf);
    if d.len() != 11 {
        return cpf.to_string();
    }
    format!("{}.{}.{}-{}", &d[..3], &d[3..6], &d[6..9], &d[9..])
}

/// Format a CNPJ as `00.000.000/0000-00`. Returns the input unchanged
/// when it does not hold exactly 14 digits.
pub fn format_cnpj(cnpj: &str) -> String {
    let d = normalize_digits(cnpj);
    if d.len() != 14 {
        return cnpj.to_string();
    }
    format!(
        "{}.{}.{}/{}-{}",
        &d[..2],
        &d[2..5],
        &d[5..8],
        &d[8..12],
        &d[12..]
    )
}

/// Format a CEP as `00000-000`. Returns the input unchanged when it
/// does not hold exactly 8 digits.
pub fn format_cep(cep: &str) -> String {
    let d = normalize_digits(cep);
    if d.len() != 8 {
        return cep.to_string();
    }
    format!("{}-{}", &d[..5], &d[5..])
}

/// Format a Brazilian phone number with the +55 country code:
/// `+55 (00) 00000-0000` for mobile (11 digits) or
/// `+55 (00) 0000-0000` for landline (10 digits). A leading `55` in the
/// input is treated as an already-present country code. Returns the
/// input unchanged for any other digit count.
pub fn format_phone(phone: &str) -> String {
    let digits = normalize_digits(phone);
    let national = digits.strip_prefix("55").unwrap_or(&digits);

    match national.len() {
        11 => format!(
            "+55 ({}) {}-{}",
            &national[..2],
            &national[2..7],
            &national[7..]
        ),
        10 => format!(
            "+55 ({}) {}-{}",
            &national[..2],
            &national[2..6],
            &national[6..]
        ),
        _ => phone.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_digits() {
        assert_eq!(normalize_digits("529.982.247-25"), "52998224725");
        assert_eq!(normalize_digits("(21) 99999-9999"), "21999999999");
        assert_eq!(normalize_digits("abc"), "");
    }

    #[test]
    fn test_valid_cpfs() {
        assert!(validate_cpf("529.982.247-25"));
        assert!(validate_cpf("52998224725"));
        assert!(validate_cpf("111.444.777-35"));
    }

    #[test]
    fn test_invalid_cpfs() {
        assert!(!validate_cpf("529.982.247-26")); // wrong check digit
        assert!(!validate_cpf("111.111.111-11")); // all same digit
        assert!(!validate_cpf("5299822472")); // 10 digits
        assert!(!validate_cpf("529982247250")); // 12 digits
        assert!(!validate_cpf(""));
    }

    #[test]
    fn test_valid_cnpjs() {
        assert!(validate_cnpj("04.252.011/0001-10"));
        assert!(validate_cnpj("04252011000110"));
        assert!(validate_cnpj("11.222.333/0001-81"));
    }

    #[test]
    fn test_invalid_cnpjs() {
        assert!(!validate_cnpj("04.252.011/0001-11")); // wrong check digit
        assert!(!validate_cnpj("11.111.111/1111-11")); // all same digit
        assert!(!validate_cnpj("0425201100011")); // 13 digits
    }

    #[test]
    fn test_cep() {
        assert!(validate_cep("20040-020"));
        assert!(validate_cep("20040020"));
        assert!(!validate_cep("2004002"));
        assert_eq!(format_cep("20040020"), "20040-020");
        assert_eq!(format_cep("123"), "123");
    }

    #[test]
    fn test_format_cpf() {
        assert_eq!(format_cpf("52998224725"), "529.982.247-25");
        assert_eq!(format_cpf("529.982.247-25"), "529.982.247-25");
        assert_eq!(format_cpf("123"), "123");
    }

    #[test]
    fn test_format_cnpj() {
        assert_eq!(format_cnpj("04252011000110"), "04.252.011/0001-10");
        assert_eq!(format_cnpj("123"), "123");
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("21999999999"), "+55 (21) 99999-9999");
        assert_eq!(format_phone("2133334444"), "+55 (21) 3333-4444");
        assert_eq!(format_phone("5521999999999"), "+55 (21) 99999-9999");
        assert_eq!(format_phone("123"), "123");
    }

    proptest! {
        #[test]
        fn prop_normalize_output_is_digits_only(input in ".*") {
            prop_assert!(normalize_digits(&input).chars().all(|c| c.is_ascii_digit()));
        }

        #[test]
        fn prop_cpf_validation_is_format_insensitive(digits in proptest::collection::vec(0u32..10, 11)) {
            let plain: String = digits.iter().map(|d| char::from_digit(*d, 10).unwrap()).collect();
            let formatted = format!(
                "{}.{}.{}-{}",
                &plain[..3], &plain[3..6], &plain[6..9], &plain[9..]
            );
            prop_assert_eq!(validate_cpf(&plain), validate_cpf(&formatted));
        }

        #[test]
        fn prop_format_cpf_preserves_digits(digits in proptest::collection::vec(0u32..10, 11)) {
            let plain: String = digits.iter().map(|d| char::from_digit(*d, 10).unwrap()).collect();
            prop_assert_eq!(normalize_digits(&format_cpf(&plain)), plain);
        }
    }
}
