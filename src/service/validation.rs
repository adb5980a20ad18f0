use crate::models::Field;
use once_cell::sync::Lazy;
use regex::Regex;

pub const NAME_ERROR: &str = "이름을 다시 입력해주세요.";
pub const PHONE_ERROR: &str = "전화번호 뒷자리를 숫자 8자리로 입력해주세요.";
pub const IDENTITY_ERROR: &str = "생년월일은 숫자 8자리로 입력해주세요.";

static HANGUL_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[가-힣]+$").expect("hangul pattern"));

static BIRTH_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(19|20)\d{2}(0[1-9]|1[0-2])(0[1-9]|[12][0-9]|3[01])$").expect("birth date pattern")
});

const MAX_DIGITS: usize = 8;

/// 单个字段的清洗结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCheck {
    pub value: String,
    pub error: Option<&'static str>,
}

fn is_hangul_syllable(c: char) -> bool {
    ('가'..='힣').contains(&c)
}

fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).take(MAX_DIGITS).collect()
}

/// 姓名: 只允许韩文音节，其余字符剔除
pub fn check_name(raw: &str) -> FieldCheck {
    if HANGUL_NAME.is_match(raw) {
        return FieldCheck { value: raw.to_string(), error: None };
    }
    FieldCheck {
        value: raw.chars().filter(|&c| is_hangul_syllable(c)).collect(),
        error: Some(NAME_ERROR),
    }
}

/// 手机号后 8 位
pub fn check_phone_suffix(raw: &str) -> FieldCheck {
    let value = digits(raw);
    let error = (value.len() != MAX_DIGITS).then_some(PHONE_ERROR);
    FieldCheck { value, error }
}

/// 生日 YYYYMMDD
pub fn check_birth_date(raw: &str) -> FieldCheck {
    let value = digits(raw);
    let error = (!BIRTH_DATE.is_match(&value)).then_some(IDENTITY_ERROR);
    FieldCheck { value, error }
}

pub fn check_field(field: Field, raw: &str) -> FieldCheck {
    match field {
        Field::Name => check_name(raw),
        Field::Phone => check_phone_suffix(raw),
        Field::Identity => check_birth_date(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_accepts_hangul_only() {
        assert_eq!(check_name("홍길동"), FieldCheck { value: "홍길동".into(), error: None });

        let mixed = check_name("홍a길1동 ");
        assert_eq!(mixed.value, "홍길동");
        assert_eq!(mixed.error, Some(NAME_ERROR));

        // 자모 단독 입력은 음절이 아님
        let jamo = check_name("ㅎㄱㄷ");
        assert_eq!(jamo.value, "");
        assert!(jamo.error.is_some());

        assert!(check_name("").error.is_some());
    }

    #[test]
    fn phone_suffix_needs_exactly_eight_digits() {
        assert_eq!(check_phone_suffix("1234-5678").value, "12345678");
        assert!(check_phone_suffix("1234-5678").error.is_none());
        assert_eq!(check_phone_suffix("1234567").error, Some(PHONE_ERROR));

        let long = check_phone_suffix("123456789");
        assert_eq!(long.value, "12345678");
        assert!(long.error.is_none());

        assert!(check_phone_suffix("abcdefgh").error.is_some());
    }

    #[test]
    fn birth_date_pattern() {
        assert!(check_birth_date("19990101").error.is_none());
        assert!(check_birth_date("2000.12.31").error.is_none());
        assert_eq!(check_birth_date("2000.12.31").value, "20001231");
        assert!(check_birth_date("1899 01 01").error.is_some());
        assert!(check_birth_date("19991301").error.is_some());
        assert!(check_birth_date("19990132").error.is_some());
        assert!(check_birth_date("19990100").error.is_some());
        assert!(check_birth_date("1999010").error.is_some());
        // 9 자리는 8 자리로 잘린 뒤 판단
        assert!(check_birth_date("199901019").error.is_none());
    }

    #[test]
    fn birth_date_error_iff_truncated_digits_mismatch() {
        for raw in ["19990101", "20251231", "2025-02-30", "x1999y0101", "30000101", "2025011"] {
            let check = check_birth_date(raw);
            assert_eq!(check.error.is_none(), BIRTH_DATE.is_match(&digits(raw)), "input {raw}");
        }
    }
}
