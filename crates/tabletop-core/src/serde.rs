// Module name shadows the `serde` crate; use `::serde` for the external crate.
use ::serde::de::{self, Deserializer};
use ::serde::{Deserialize, Serializer};
use chrono::{DateTime, SecondsFormat, Utc};

/// Serialize `DateTime<Utc>` as RFC 3339 with 3-digit fractional seconds.
pub fn to_rfc3339_ms<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Optional variant of [`to_rfc3339_ms`]; `None` becomes `null`.
pub fn to_rfc3339_ms_opt<S>(dt: &Option<DateTime<Utc>>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => to_rfc3339_ms(dt, s),
        None => s.serialize_none(),
    }
}

/// Serialize a `BIGSERIAL` id as a JSON string so it survives JavaScript number precision.
pub fn id_to_string<S>(id: &i64, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.collect_str(id)
}

/// Optional variant of [`id_to_string`].
pub fn id_to_string_opt<S>(id: &Option<i64>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match id {
        Some(id) => s.collect_str(id),
        None => s.serialize_none(),
    }
}

/// Serialize a list of ids as JSON strings.
pub fn ids_to_strings<S>(ids: &[i64], s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.collect_seq(ids.iter().map(i64::to_string))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Int(i64),
    Str(String),
}

impl IdRepr {
    fn into_id<E: de::Error>(self) -> Result<i64, E> {
        match self {
            IdRepr::Int(id) => Ok(id),
            IdRepr::Str(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid id: {s}"))),
        }
    }
}

/// Accept an id as either a JSON number or a numeric string.
pub fn id_from_str_or_int<'de, D>(d: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    IdRepr::deserialize(d)?.into_id()
}

/// Optional variant of [`id_from_str_or_int`]. Use with `#[serde(default)]`.
pub fn id_from_str_or_int_opt<'de, D>(d: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<IdRepr>::deserialize(d)?
        .map(IdRepr::into_id)
        .transpose()
}

/// List variant of [`id_from_str_or_int`].
pub fn ids_from_str_or_int<'de, D>(d: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<IdRepr>::deserialize(d)?
        .into_iter()
        .map(IdRepr::into_id)
        .collect()
}

/// Tell an absent field (`None`) from an explicit `null` (`Some(None)`).
/// Use with `#[serde(default)]`.
pub fn nullable<'de, D, T>(d: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}
