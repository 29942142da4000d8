//! Plural form selection.

use crate::translation::PluralRecord;

/// Placeholder replaced by the decimal count inside the `+2` form (and
/// inside fallback text on a plural lookup miss).
pub const COUNT_PLACEHOLDER: char = '#';

/// Replaces every literal `#` with the decimal string of `count`.
#[must_use]
pub fn substitute_count(text: &str, count: i64) -> String {
    text.replace(COUNT_PLACEHOLDER, &count.to_string())
}

/// Picks the applicable plural form for `count`, first match wins:
///
/// 1. `count == 0` and a non-empty `zero` form
/// 2. `count == 1` and a non-empty `one` form
/// 3. `many`/`manyLimit` both set and `count > manyLimit`
/// 4. a non-empty `+2` form, with `#` replaced by the count
///
/// Exact small-count forms always beat `many`; `many` beats the generic
/// `+2`. Returns `None` when no form applies so the caller can degrade to
/// its fallback text.
#[must_use]
pub fn select_form(count: i64, record: &PluralRecord) -> Option<String> {
    if count == 0
        && let Some(zero) = non_empty(record.zero.as_deref())
    {
        return Some(zero.to_string());
    }

    if count == 1
        && let Some(one) = non_empty(record.one.as_deref())
    {
        return Some(one.to_string());
    }

    if let (Some(many), Some(limit)) = (non_empty(record.many.as_deref()), record.many_limit)
        && count > limit
    {
        return Some(many.to_string());
    }

    non_empty(record.two_plus.as_deref()).map(|form| substitute_count(form, count))
}

/// Treats empty strings the same as absent forms.
fn non_empty(form: Option<&str>) -> Option<&str> {
    form.filter(|text| !text.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::translation::PluralRecord;

    /// 全フォームを持つレコード
    fn full_record() -> PluralRecord {
        PluralRecord {
            zero: Some("Z".to_string()),
            one: Some("O".to_string()),
            many: Some("M".to_string()),
            many_limit: Some(3),
            two_plus: Some("#x".to_string()),
        }
    }

    #[rstest]
    #[case::zero(0, Some("Z"))]
    #[case::one(1, Some("O"))]
    #[case::two_within_limit(2, Some("2x"))]
    #[case::at_limit(3, Some("3x"))]
    #[case::above_limit(5, Some("M"))]
    #[case::negative(-1, Some("-1x"))]
    fn test_select_form_order(#[case] count: i64, #[case] expected: Option<&str>) {
        let record = full_record();

        assert_that!(select_form(count, &record).as_deref(), eq(expected));
    }

    #[googletest::test]
    fn test_select_form_substitutes_count_in_two_plus() {
        let record = PluralRecord { two_plus: Some("# x".to_string()), ..PluralRecord::default() };

        assert_that!(select_form(5, &record), some(eq("5 x")));
    }

    #[googletest::test]
    fn test_select_form_many_without_limit_falls_through() {
        let record = PluralRecord {
            many: Some("M".to_string()),
            two_plus: Some("#x".to_string()),
            ..PluralRecord::default()
        };

        // manyLimit が無ければ many は選ばれない
        assert_that!(select_form(100, &record), some(eq("100x")));
    }

    #[googletest::test]
    fn test_select_form_empty_record_signals_no_form() {
        let record = PluralRecord::default();

        assert_that!(select_form(5, &record), none());
    }

    #[googletest::test]
    fn test_select_form_empty_strings_count_as_absent() {
        let record = PluralRecord {
            zero: Some(String::new()),
            two_plus: Some("#x".to_string()),
            ..PluralRecord::default()
        };

        assert_that!(select_form(0, &record), some(eq("0x")));
    }

    #[googletest::test]
    fn test_substitute_count_replaces_every_occurrence() {
        assert_that!(substitute_count("# of # items", 7), eq("7 of 7 items"));
    }
}
