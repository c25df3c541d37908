//! ドメインサービス: 再生位置フォーマット
//!
//! 秒数を検索結果に表示する固定幅の `MM:SS` 文字列に変換する。

use crate::domain::error::DomainError;

/// 秒数を `MM:SS` 形式に変換する
///
/// 小数部は切り捨て、分・秒ともに2桁でゼロ埋めします。
/// 分は繰り上げないため、1時間以上は `60:00` のように表示されます。
///
/// # エラー
/// 負数・NaN・無限大は `DomainError::InvalidTimestamp` を返します。
pub fn format_clock(seconds: f64) -> Result<String, DomainError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(DomainError::InvalidTimestamp { value: seconds });
    }

    let total = seconds.trunc() as u64;
    Ok(format!("{:02}:{:02}", total / 60, total % 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock_minutes_and_seconds() {
        assert_eq!(format_clock(125.0).unwrap(), "02:05");
        assert_eq!(format_clock(59.0).unwrap(), "00:59");
        assert_eq!(format_clock(3600.0).unwrap(), "60:00");
    }

    #[test]
    fn test_format_clock_truncates_fraction() {
        assert_eq!(format_clock(12.4).unwrap(), "00:12");
        assert_eq!(format_clock(59.999).unwrap(), "00:59");
        assert_eq!(format_clock(0.0).unwrap(), "00:00");
    }

    #[test]
    fn test_format_clock_wide_minutes() {
        assert_eq!(format_clock(6000.0).unwrap(), "100:00");
    }

    #[test]
    fn test_format_clock_rejects_out_of_contract_input() {
        assert!(matches!(
            format_clock(-1.0),
            Err(DomainError::InvalidTimestamp { .. })
        ));
        assert!(format_clock(f64::NAN).is_err());
        assert!(format_clock(f64::INFINITY).is_err());
    }
}
