//! Helper macro for port error enums.
//!
//! Each variant gets a snake_case constructor whose fields accept anything
//! convertible into the declared type, so adapters can write
//! `StoreError::query(err.to_string())` or `StoreError::query("boom")`.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@constructor $name $variant $( { $($field : $ty),* } )?);
            )*
        }
    };

    (@constructor $name:ident $variant:ident) => {
        ::paste::paste! {
            #[doc = concat!("Build [`", stringify!($name), "::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@constructor $name:ident $variant:ident { $($field:ident : $ty:ty),* }) => {
        ::paste::paste! {
            #[doc = concat!("Build [`", stringify!($name), "::", stringify!($variant), "`].")]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant {
                    $($field: $field.into()),*
                }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    define_port_error! {
        pub enum RelayError {
            Offline => "relay offline",
            Refused { message: String } => "relay refused: {message}",
            Slow { message: String, elapsed_ms: u64 } => "relay slow: {message} after {elapsed_ms}ms",
        }
    }

    #[test]
    fn unit_variants_get_nullary_constructors() {
        assert_eq!(RelayError::offline(), RelayError::Offline);
        assert_eq!(RelayError::offline().to_string(), "relay offline");
    }

    #[test]
    fn string_fields_accept_str() {
        let err = RelayError::refused("queue full");
        assert_eq!(err.to_string(), "relay refused: queue full");
    }

    #[test]
    fn mixed_fields_keep_declared_types() {
        let err = RelayError::slow("timeout", 250_u64);
        assert_eq!(err.to_string(), "relay slow: timeout after 250ms");
    }
}
