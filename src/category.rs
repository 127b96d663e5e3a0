//! Deriving dot-delimited categories from Rust paths.

/// Category for a type: its fully qualified path with `::` replaced by `.`.
///
/// ```
/// # use category_logger::category_for;
/// struct Downloader;
/// assert!(category_for::<Downloader>().ends_with(".Downloader"));
/// assert_eq!(category_for::<String>(), "alloc.string.String");
/// ```
pub fn category_for<T: ?Sized>() -> String {
    from_path(std::any::type_name::<T>())
}

/// Converts a Rust path (`a::b::C`) into a category (`a.b.C`).
pub fn from_path(path: &str) -> String {
    path.replace("::", ".")
}

/// Category for the calling module.
///
/// ```
/// # use category_logger::module_category;
/// let category = module_category!();
/// assert!(!category.is_empty() && !category.contains("::"));
/// ```
#[macro_export]
macro_rules! module_category {
    () => {
        $crate::category::from_path(module_path!())
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Local;

    #[test]
    fn test_category_for_local_type() {
        assert_eq!(category_for::<Local>(), "category_logger.category.tests.Local");
    }

    #[test]
    fn test_module_category() {
        assert_eq!(crate::module_category!(), "category_logger.category.tests");
    }

    #[test]
    fn test_from_path() {
        assert_eq!(from_path("a::b::C"), "a.b.C");
        assert_eq!(from_path("plain"), "plain");
    }
}
