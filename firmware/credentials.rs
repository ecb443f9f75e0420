//! Access point credential lookup shared by the build script and its tests.

use std::env::VarError;

/// Resolves one build-time credential.
///
/// Only an unset variable takes `fallback`. Any value that is set, including
/// an empty one or one with surrounding spaces, is used exactly as given.
pub fn resolve(value: Result<String, VarError>, fallback: &str) -> Result<String, VarError> {
    match value {
        Ok(value) => Ok(value),
        Err(VarError::NotPresent) => Ok(fallback.to_owned()),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    #[test]
    fn unset_variable_takes_the_default() {
        assert_eq!(resolve(Err(VarError::NotPresent), "12345678"), Ok("12345678".to_owned()));
    }

    #[test]
    fn empty_password_stays_empty() {
        assert_eq!(resolve(Ok(String::new()), "12345678"), Ok(String::new()));
    }

    #[test]
    fn surrounding_spaces_are_kept() {
        assert_eq!(
            resolve(Ok(" pass phrase ".to_owned()), "12345678"),
            Ok(" pass phrase ".to_owned())
        );
    }

    #[test]
    fn non_unicode_value_is_an_error() {
        let raw = OsString::from("x");
        assert_eq!(
            resolve(Err(VarError::NotUnicode(raw.clone())), "12345678"),
            Err(VarError::NotUnicode(raw))
        );
    }
}
