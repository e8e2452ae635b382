pub const DEFAULT_ENDPOINT: &str = "https://vod.cn-shanghai.aliyuncs.com";
pub const DEFAULT_API_VERSION: &str = "2017-03-21";
pub const DEFAULT_SIGNATURE_VERSION: &str = "1.0";

/// ISO-8601 in UTC with millisecond precision, e.g. `2024-01-01T00:00:00.000Z`
pub const ISO_TIMESTAMP: &[time::format_description::BorrowedFormatItem<'static>] = time::macros::format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
);
/// RFC 1123 date as OSS expects it in the `Date` header
pub const HTTP_DATE: &[time::format_description::BorrowedFormatItem<'static>] = time::macros::format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

pub const OSS_SECURITY_TOKEN: &str = "x-oss-security-token";
