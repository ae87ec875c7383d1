use serde::{Deserialize, Deserializer};

/// `YYYY-MM-DD` calendar dates, the key format of meal plans and provenance records.
pub mod iso_date {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use time::{macros::format_description, Date};

    pub fn parse(s: &str) -> Option<Date> {
        Date::parse(s.trim(), format_description!("[year]-[month]-[day]")).ok()
    }

    pub fn format(date: &Date) -> String {
        date.format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_else(|_| date.to_string())
    }

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid date `{raw}`, expected YYYY-MM-DD")))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(f64),
}

/// Ingredient amounts are free-form text, but older clients send bare numbers.
pub fn amount_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Option::<TextOrNumber>::deserialize(d)? {
        Some(TextOrNumber::Text(s)) => s,
        Some(TextOrNumber::Number(n)) => n.to_string(),
        None => String::new(),
    })
}
