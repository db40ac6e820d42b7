//! Deterministic daily prompt selection.
//!
//! The pick for a precept depends only on the date, the precept number and the
//! pool, so the same prompt is shown all day and changes the next day.

use chrono::NaiveDate;

/// 31-multiplier string hash over UTF-16 code units, wrapping at 32 bits.
#[must_use]
pub fn hash_key(key: &str) -> u32 {
    key.encode_utf16()
        .fold(0_i32, |h, unit| {
            h.wrapping_mul(31).wrapping_add(i32::from(unit))
        })
        .unsigned_abs()
}

/// Choose the prompt for `precept_number` on `date`.
///
/// When the hashed pick equals `previous` (normally the prior day's prompt),
/// the next prompt in the pool is used instead.
#[must_use]
pub fn prompt_for_day<'a>(
    precept_number: i64,
    date: NaiveDate,
    pool: &'a [String],
    previous: Option<&str>,
) -> Option<&'a str> {
    match pool {
        [] => None,
        [only] => Some(only.as_str()),
        _ => {
            let hash = hash_key(&format!("{date}:{precept_number}")) as usize;
            let mut index = hash % pool.len();
            if previous == Some(pool[index].as_str()) {
                index = (index + 1) % pool.len();
            }
            Some(pool[index].as_str())
        }
    }
}

/// The prompt after `current`, wrapping to the start. A prompt not in the pool
/// maps to the first one.
#[must_use]
pub fn next_prompt<'a>(current: &str, pool: &'a [String]) -> Option<&'a str> {
    let next = match pool.iter().position(|p| p == current) {
        Some(i) => (i + 1) % pool.len(),
        None => 0,
    };
    pool.get(next).map(String::as_str)
}
