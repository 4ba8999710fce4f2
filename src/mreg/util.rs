use rand::distributions::uniform::SampleUniform;
use rand::Rng;
use std::ops::Range;

pub type Fields = serde_json::Map<String, serde_json::Value>;

pub trait RangeRandExtS<T> {
    fn rand(self) -> T;
}

impl<T: SampleUniform + PartialOrd> RangeRandExtS<T> for Range<T> {
    fn rand(self) -> T {
        let mut rng = rand::thread_rng();
        rng.gen_range(self)
    }
}

/// Builds a `Fields` map from `key => value` pairs.
#[macro_export]
macro_rules! fields {
    () => {
        $crate::mreg::util::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::mreg::util::Fields::new();
        $(map.insert(String::from($key), serde_json::json!($value));)+
        map
    }};
}

/// Returns `true` if the force word `y` was given among the arguments.
pub fn forced(args: &[String]) -> bool {
    args.iter().any(|a| a == "y")
}

/// Returns the value following `flag` in `args`, e.g. `-comment text`.
pub fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

/// Splits a command line into words. Double quotes group words together.
pub fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut cur = String::new();
    let mut quoted = false;
    let mut pending = false;
    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                pending = true;
            }
            c if c.is_whitespace() && !quoted => {
                if pending {
                    words.push(std::mem::take(&mut cur));
                    pending = false;
                }
            }
            c => {
                cur.push(c);
                pending = true;
            }
        }
    }
    if pending {
        words.push(cur);
    }
    words
}

/// Encodes `pairs` as an `application/x-www-form-urlencoded` query string.
pub fn query_string<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Renders a JSON value the way a user typed it: strings without quotes.
pub fn plain(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        v => v.to_string(),
    }
}
