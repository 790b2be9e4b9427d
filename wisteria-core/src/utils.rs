//! Utility functions for the container

/// Naming utilities
pub mod naming {
    /// Lower-case the first character of a name
    ///
    /// # Examples
    ///
    /// ```
    /// use wisteria_core::utils::naming::lower_first;
    ///
    /// assert_eq!(lower_first("UserService"), "userService");
    /// assert_eq!(lower_first("x"), "x");
    /// assert_eq!(lower_first(""), "");
    /// ```
    pub fn lower_first(s: &str) -> String {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }

    /// Strip the module path and generic parameters from a Rust type name
    ///
    /// # Examples
    ///
    /// ```
    /// use wisteria_core::utils::naming::simple_type_name;
    ///
    /// assert_eq!(simple_type_name("my_app::service::UserService"), "UserService");
    /// assert_eq!(simple_type_name("alloc::vec::Vec<u8>"), "Vec");
    /// assert_eq!(simple_type_name("UserService"), "UserService");
    /// ```
    pub fn simple_type_name(type_name: &str) -> &str {
        let base = type_name.split('<').next().unwrap_or(type_name);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Derive a default bean name from a fully qualified type name
    pub fn default_bean_name(type_name: &str) -> String {
        lower_first(simple_type_name(type_name))
    }
}
