//! Record descriptor generation.

/// Implement `Record` for a struct from its ordered field list.
///
/// The listed order is the flatten/unflatten order and must match the
/// struct's declaration order.
macro_rules! impl_record {
    ($ty:ident { $($field:ident),+ $(,)? }) => {
        impl $crate::record::Record for $ty {
            const NAME: &'static str = stringify!($ty);

            fn field_names() -> &'static [&'static str] {
                &[$(stringify!($field)),+]
            }

            fn field(&self, name: &str) -> Option<$crate::record::FieldValue> {
                match name {
                    $(stringify!($field) => {
                        Some($crate::record::Field::to_value(&self.$field))
                    })+
                    _ => None,
                }
            }

            fn from_fields(mut fields: $crate::record::NamedFields) -> $crate::Result<Self> {
                Ok(Self {
                    $($field: fields.take(stringify!($field))?,)+
                })
            }

            fn into_fields(self) -> $crate::types::Vec<$crate::record::FieldValue> {
                let mut out = $crate::types::Vec::with_capacity(<Self as $crate::record::Record>::arity());
                $(out.push($crate::record::Field::into_value(self.$field));)+
                out
            }
        }
    };
}
