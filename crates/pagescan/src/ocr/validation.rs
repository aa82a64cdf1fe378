use super::error::OcrError;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Language codes shipped as Tesseract traineddata.
pub const TESSERACT_LANGUAGE_CODES: &[&str] = &[
    "afr", "amh", "ara", "asm", "aze", "aze_cyrl", "bel", "ben", "bod", "bos", "bre", "bul", "cat", "ceb", "ces",
    "chi_sim", "chi_sim_vert", "chi_tra", "chi_tra_vert", "chr", "cos", "cym", "dan", "deu", "div", "dzo", "ell",
    "eng", "enm", "epo", "equ", "est", "eus", "fao", "fas", "fil", "fin", "fra", "frk", "frm", "fry", "gla", "gle",
    "glg", "grc", "guj", "hat", "heb", "hin", "hrv", "hun", "hye", "iku", "ind", "isl", "ita", "ita_old", "jav",
    "jpn", "jpn_vert", "kan", "kat", "kat_old", "kaz", "khm", "kir", "kmr", "kor", "lao", "lat", "lav", "lit", "ltz",
    "mal", "mar", "mkd", "mlt", "mon", "mri", "msa", "mya", "nep", "nld", "nor", "oci", "ori", "osd", "pan", "pol",
    "por", "pus", "que", "ron", "rus", "san", "sin", "slk", "slv", "snd", "spa", "spa_old", "sqi", "srp", "srp_latn",
    "sun", "swa", "swe", "syr", "tam", "tat", "tel", "tgk", "tha", "tir", "ton", "tur", "uig", "ukr", "urd", "uzb",
    "uzb_cyrl", "vie", "yid", "yor",
];

static SUPPORTED: Lazy<HashSet<&'static str>> = Lazy::new(|| TESSERACT_LANGUAGE_CODES.iter().copied().collect());

pub fn is_supported_language(code: &str) -> bool {
    SUPPORTED.contains(code)
}

/// Validate a single code or a `+`-joined set such as `eng+hin`.
pub fn validate_language_code(lang_code: &str) -> Result<(), OcrError> {
    if lang_code.trim().is_empty() {
        return Err(OcrError::InvalidLanguageCode("language must not be empty".to_string()));
    }

    for code in lang_code.split('+') {
        if !is_supported_language(code) {
            return Err(OcrError::InvalidLanguageCode(format!(
                "Language code '{}' is not supported by Tesseract",
                code
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_language_code_valid() {
        assert!(validate_language_code("eng").is_ok());
        assert!(validate_language_code("hin").is_ok());
        assert!(validate_language_code("chi_sim").is_ok());
    }

    #[test]
    fn test_validate_language_code_multiple() {
        assert!(validate_language_code("eng+hin").is_ok());
        assert!(validate_language_code("eng+fra+deu").is_ok());
    }

    #[test]
    fn test_validate_language_code_invalid() {
        let result = validate_language_code("invalid_lang");
        assert!(matches!(result.unwrap_err(), OcrError::InvalidLanguageCode(_)));
    }

    #[test]
    fn test_validate_language_code_mixed_valid_invalid() {
        assert!(validate_language_code("eng+invalid").is_err());
    }

    #[test]
    fn test_validate_language_code_empty_segment() {
        assert!(validate_language_code("eng+").is_err());
        assert!(validate_language_code("").is_err());
    }

    #[test]
    fn test_language_table_has_no_duplicates() {
        assert_eq!(SUPPORTED.len(), TESSERACT_LANGUAGE_CODES.len());
    }
}
