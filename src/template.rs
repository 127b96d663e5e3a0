//! `${Name}` token substitution.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"\$\{([a-zA-Z0-9_]+)\}").expect("token pattern is valid");
}

/// Named string properties a template can refer to.
///
/// Implement this for your own types to expose their fields:
///
/// ```
/// # use category_logger::template::{replace_tokens, PropertySource};
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// impl PropertySource for Person {
///     fn property(&self, name: &str) -> Option<String> {
///         match name {
///             "Name" => Some(self.name.clone()),
///             "Age" => Some(self.age.to_string()),
///             _ => None,
///         }
///     }
/// }
///
/// let person = Person { name: "Ada".into(), age: 36 };
/// let text = replace_tokens("Hello, my name is ${Name} and I am ${Age} years old.", &person).unwrap();
/// assert_eq!(text, "Hello, my name is Ada and I am 36 years old.");
/// ```
pub trait PropertySource {
    fn property(&self, name: &str) -> Option<String>;
}

impl<S: BuildHasher> PropertySource for HashMap<String, String, S> {
    fn property(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl PropertySource for BTreeMap<String, String> {
    fn property(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<P: PropertySource + ?Sized> PropertySource for &P {
    fn property(&self, name: &str) -> Option<String> {
        (**self).property(name)
    }
}

/// Replaces every `${Name}` in `template` with `data`'s property `Name`.
///
/// Names are ASCII letters, digits and underscores. Anything that does not
/// form a token is copied verbatim.
pub fn replace_tokens<P: PropertySource + ?Sized>(template: &str, data: &P) -> Result<String> {
    let mut output = String::with_capacity(template.len());
    let mut last = 0;

    for caps in TOKEN.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = data
            .property(name.as_str())
            .ok_or_else(|| Error::MissingProperty(name.as_str().to_string()))?;

        output.push_str(&template[last..whole.start()]);
        output.push_str(&value);
        last = whole.end();
    }

    output.push_str(&template[last..]);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> HashMap<String, String> {
        HashMap::from([
            ("Name".to_string(), "Matt".to_string()),
            ("Age".to_string(), "27".to_string()),
        ])
    }

    #[test]
    fn test_replaces_all_tokens() {
        let text = replace_tokens("${Name} is ${Age}; ${Name}!", &props()).unwrap();
        assert_eq!(text, "Matt is 27; Matt!");
    }

    #[test]
    fn test_text_without_tokens_is_unchanged() {
        let text = "no tokens here, not even $Name or ${} or ${bad-name}";
        assert_eq!(replace_tokens(text, &props()).unwrap(), text);
    }

    #[test]
    fn test_missing_property() {
        let err = replace_tokens("hi ${Nickname}", &props()).unwrap_err();
        assert!(matches!(err, Error::MissingProperty(name) if name == "Nickname"));
    }

    #[test]
    fn test_btreemap_source() {
        let map = BTreeMap::from([("x_1".to_string(), "ok".to_string())]);
        assert_eq!(replace_tokens("[${x_1}]", &map).unwrap(), "[ok]");
    }
}
