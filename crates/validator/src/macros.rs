//! Macros for declaring property validators with minimal boilerplate.
//!
//! ```rust,ignore
//! use ruleweave_validator::property_validator;
//!
//! // Unit validator (no fields)
//! property_validator! {
//!     pub NotBlank;
//!     code = "not_blank";
//!     message = "'{PropertyName}' must not be blank.";
//!     rule(value) { value.as_str().is_some_and(|s| !s.trim().is_empty()) }
//!     fn not_blank();
//! }
//!
//! // Struct with fields
//! property_validator! {
//!     pub MaxItems { max: usize };
//!     code = "max_items";
//!     message = "'{PropertyName}' must contain at most {MaxItems} items.";
//!     rule(self, value) { value.as_array().is_none_or(|a| a.len() <= self.max) }
//!     placeholders(self, value, formatter) { formatter.append("MaxItems", self.max); }
//!     fn max_items(max: usize);
//! }
//! ```

/// Declares a struct, its `PropertyValidator` implementation and a factory
/// function.
///
/// `#[derive(Debug, Clone)]` is always applied.
#[macro_export]
macro_rules! property_validator {
    // ── Unit validator ───────────────────────────────────────────────────
    (
        $(#[$meta:meta])*
        $vis:vis $name:ident;
        code = $code:literal;
        message = $message:literal;
        rule($value:ident) $rule:block
        fn $factory:ident();
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name;

        impl $crate::validators::PropertyValidator for $name {
            fn code(&self) -> &'static str {
                $code
            }

            fn message_template(&self) -> &str {
                $message
            }

            fn is_valid(
                &self,
                ctx: &$crate::context::PropertyContext<'_>,
            ) -> $crate::error::EngineResult<bool> {
                let $value: &::serde_json::Value = ctx.value();
                Ok($rule)
            }
        }

        #[must_use]
        $vis const fn $factory() -> $name {
            $name
        }
    };

    // ── Struct with fields ───────────────────────────────────────────────
    (
        $(#[$meta:meta])*
        $vis:vis $name:ident { $($field:ident: $fty:ty),+ $(,)? };
        code = $code:literal;
        message = $message:literal;
        rule($self_:ident, $value:ident) $rule:block
        placeholders($self2:ident, $pvalue:ident, $formatter:ident) $placeholders:block
        fn $factory:ident($($farg:ident: $faty:ty),* $(,)?);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        $vis struct $name {
            $($field: $fty),+
        }

        impl $name {
            #[must_use]
            pub fn new($($field: $fty),+) -> Self {
                Self { $($field),+ }
            }
        }

        impl $crate::validators::PropertyValidator for $name {
            fn code(&self) -> &'static str {
                $code
            }

            fn message_template(&self) -> &str {
                $message
            }

            fn is_valid(
                &$self_,
                ctx: &$crate::context::PropertyContext<'_>,
            ) -> $crate::error::EngineResult<bool> {
                let $value: &::serde_json::Value = ctx.value();
                Ok($rule)
            }

            #[allow(unused_variables)]
            fn append_placeholders(
                &$self2,
                ctx: &$crate::context::PropertyContext<'_>,
                $formatter: &mut $crate::failure::MessageFormatter,
            ) {
                let $pvalue: &::serde_json::Value = ctx.value();
                $placeholders
            }
        }

        #[must_use]
        $vis fn $factory($($farg: $faty),*) -> $name {
            $name::new($($farg),*)
        }
    };
}
