use crate::error::{AppError, AppResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// 尼日利亚手机号：+234 或 0 开头，运营商前缀 [7-9][0-1]，后接 8 位数字
static NG_MOBILE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\+234|0)[7-9][0-1][0-9]{8}$").expect("phone regex must compile")
});

/// 已校验的手机号，统一保存为 E.164 (+234XXXXXXXXXX)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> AppResult<Self> {
        if !NG_MOBILE_REGEX.is_match(raw) {
            return Err(AppError::ValidationError(
                "Invalid Nigerian phone number".to_string(),
            ));
        }

        let national = raw
            .strip_prefix("+234")
            .or_else(|| raw.strip_prefix('0'))
            .unwrap_or(raw);

        Ok(Self(format!("+234{national}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

/// 日志中隐藏中间位，只保留前 7 位和后 2 位
pub fn mask_phone(phone: &str) -> String {
    if phone.len() <= 9 {
        return "*".repeat(phone.len());
    }
    let (head, rest) = phone.split_at(7);
    let tail = &rest[rest.len() - 2..];
    format!("{head}{}{tail}", "*".repeat(rest.len() - 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nigerian_mobile() {
        assert_eq!(
            PhoneNumber::parse("08031234567").unwrap().as_str(),
            "+2348031234567"
        );
        assert_eq!(
            PhoneNumber::parse("+2347011234567").unwrap().as_str(),
            "+2347011234567"
        );
        assert_eq!(
            PhoneNumber::parse("09091234567").unwrap().as_str(),
            "+2349091234567"
        );
    }

    #[test]
    fn test_both_forms_are_the_same_number() {
        assert_eq!(
            PhoneNumber::parse("08031234567").unwrap(),
            PhoneNumber::parse("+2348031234567").unwrap()
        );
    }

    #[test]
    fn test_reject_invalid_numbers() {
        assert!(PhoneNumber::parse("12345").is_err());
        assert!(PhoneNumber::parse("").is_err());
        assert!(PhoneNumber::parse("06031234567").is_err()); // 前缀 6 不合法
        assert!(PhoneNumber::parse("08231234567").is_err()); // 第二位必须是 0/1
        assert!(PhoneNumber::parse("0803123456").is_err()); // 少一位
        assert!(PhoneNumber::parse("2348031234567").is_err()); // 缺少 +
        assert!(PhoneNumber::parse(" 08031234567").is_err());
    }

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("+2348031234567"), "+234803*****67");
        assert_eq!(mask_phone("12345"), "*****");
    }
}
