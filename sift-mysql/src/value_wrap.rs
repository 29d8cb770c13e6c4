use sift_core::Value;
use time::{Date, Month, PrimitiveDateTime, Time};

pub(crate) struct ValueWrap(pub(crate) Value);

impl From<Value> for ValueWrap {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
impl From<ValueWrap> for Value {
    fn from(value: ValueWrap) -> Self {
        value.0
    }
}

impl mysql_async::prelude::FromValue for ValueWrap {
    type Intermediate = ValueWrap;
}

impl TryFrom<mysql_async::Value> for ValueWrap {
    type Error = mysql_async::FromValueError;
    fn try_from(value: mysql_async::Value) -> Result<Self, Self::Error> {
        Ok(match value {
            mysql_async::Value::NULL => Value::Null,
            mysql_async::Value::Bytes(v) => Value::Blob(Some(v.into())),
            mysql_async::Value::Int(v) => Value::Int64(Some(v)),
            mysql_async::Value::UInt(v) => Value::UInt64(Some(v)),
            mysql_async::Value::Float(v) => Value::Float32(Some(v)),
            mysql_async::Value::Double(v) => Value::Float64(Some(v)),
            mysql_async::Value::Date(year, month, day, hour, minute, second, microsecond) => {
                let Ok(month) = Month::try_from(month) else {
                    return Err(mysql_async::FromValueError(value));
                };
                let Ok(date) = Date::from_calendar_date(year as _, month, day) else {
                    return Err(mysql_async::FromValueError(value));
                };
                let Ok(time) = Time::from_hms_micro(hour, minute, second, microsecond) else {
                    return Err(mysql_async::FromValueError(value));
                };
                Value::Timestamp(Some(PrimitiveDateTime::new(date, time)))
            }
            mysql_async::Value::Time(negative, days, hours, minutes, seconds, micro) => {
                if negative || days > 0 {
                    // Durations outside a single day keep the text form MySQL prints.
                    let hours = days * 24 + hours as u32;
                    Value::Varchar(Some(format!(
                        "{}{hours:02}:{minutes:02}:{seconds:02}.{micro:06}",
                        if negative { "-" } else { "" },
                    )))
                } else {
                    let Ok(time) = Time::from_hms_micro(hours, minutes, seconds, micro) else {
                        return Err(mysql_async::FromValueError(value));
                    };
                    Value::Time(Some(time))
                }
            }
        }
        .into())
    }
}
